//! Canonical demo dataset: two vans, one customer with a completed rental,
//! and one pending request for the review queue. Seeded through the gateway
//! so the rows carry store-assigned ids.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use fleetdesk_core::domain::{
    CustomerDraft, CustomerId, NewRental, NewRentalRequest, NewVehicle, RateTable, RentalStatus,
    Signature, VehicleId,
};
use fleetdesk_core::gateway::{StoreError, StoreGateway};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub vehicles: usize,
    pub customers: usize,
    pub rentals: usize,
    pub requests: usize,
}

pub fn demo_vehicles() -> Vec<NewVehicle> {
    vec![
        NewVehicle {
            brand: "Ford Transit".into(),
            license_plate: "1AB 1234".into(),
            vin: "ABC123XYZ".into(),
            year: 2022,
            rates: RateTable::day_only(Decimal::from(1500)),
            inspection_until: date(2026, 4, 1),
            insurance_note: "ČSOB, č. 123456".into(),
            vignette_until: date(2025, 1, 31),
        },
        NewVehicle {
            brand: "Renault Master".into(),
            license_plate: "2CD 5678".into(),
            vin: "DEF456ABC".into(),
            year: 2023,
            rates: RateTable::day_only(Decimal::from(1600)),
            inspection_until: date(2027, 7, 1),
            insurance_note: "Allianz, č. 789012".into(),
            vignette_until: date(2025, 6, 30),
        },
    ]
}

pub fn demo_customer() -> CustomerDraft {
    CustomerDraft {
        first_name: "Jan".into(),
        last_name: "Novák".into(),
        email: "jan.novak@email.cz".into(),
        phone: "+420 123 456 789".into(),
        id_card_number: "123456789".into(),
        license_number: "987654321".into(),
        license_image: None,
    }
}

/// A finished booking so the dashboard has revenue to show.
pub fn demo_rental(vehicle_id: VehicleId, customer_id: CustomerId) -> NewRental {
    NewRental {
        vehicle_id,
        customer_id,
        start_date: timestamp(2024, 6, 10, 9, 0),
        end_date: timestamp(2024, 6, 12, 17, 0),
        total_price: Decimal::from(4500),
        status: RentalStatus::Completed,
        customer_signature: Some(Signature("data:image/png;base64,iVBORw0KGgo".into())),
        company_signature: None,
        digital_consent_at: Some(timestamp(2024, 6, 10, 8, 45)),
    }
}

pub fn demo_request() -> NewRentalRequest {
    NewRentalRequest {
        first_name: "Petra".into(),
        last_name: "Svobodová".into(),
        email: "petra.svobodova@email.com".into(),
        phone: "+420 987 654 321".into(),
        id_card_number: "555444333".into(),
        license_number: "333444555".into(),
        license_image: None,
        digital_consent_at: timestamp(2024, 6, 1, 12, 0),
    }
}

/// Inserts the demo dataset through the gateway and reports what landed.
pub async fn seed(gateway: &dyn StoreGateway) -> Result<SeedSummary, StoreError> {
    let mut summary = SeedSummary::default();

    let mut first_vehicle = None;
    for vehicle in demo_vehicles() {
        let inserted = gateway.insert_vehicle(&vehicle).await?;
        first_vehicle.get_or_insert(inserted.id);
        summary.vehicles += 1;
    }

    let customer = gateway.insert_customer(&demo_customer()).await?;
    summary.customers += 1;

    if let Some(vehicle_id) = first_vehicle {
        gateway.insert_rental(&demo_rental(vehicle_id, customer.id)).await?;
        summary.rentals += 1;
    }

    gateway.insert_request(&demo_request()).await?;
    summary.requests += 1;

    Ok(summary)
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn timestamp(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).single().unwrap_or_default()
}
