use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub i64);

/// Per-tier rates in CZK. Any subset may be absent; only the day rate
/// participates in the default price calculation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub hour4: Option<Decimal>,
    pub hour12: Option<Decimal>,
    pub day: Option<Decimal>,
    pub month: Option<Decimal>,
}

impl RateTable {
    pub fn day_only(rate: Decimal) -> Self {
        Self { day: Some(rate), ..Self::default() }
    }

    pub fn has_day_rate(&self) -> bool {
        self.day.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub brand: String,
    pub license_plate: String,
    pub vin: String,
    pub year: i32,
    pub rates: RateTable,
    pub inspection_until: NaiveDate,
    pub insurance_note: String,
    pub vignette_until: NaiveDate,
}

impl Vehicle {
    pub fn label(&self) -> String {
        format!("{} ({})", self.brand, self.license_plate)
    }
}

/// Fleet-entry payload; the store assigns the id on insert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewVehicle {
    pub brand: String,
    pub license_plate: String,
    pub vin: String,
    pub year: i32,
    pub rates: RateTable,
    pub inspection_until: NaiveDate,
    pub insurance_note: String,
    pub vignette_until: NaiveDate,
}

impl NewVehicle {
    pub fn into_vehicle(self, id: VehicleId) -> Vehicle {
        Vehicle {
            id,
            brand: self.brand,
            license_plate: self.license_plate,
            vin: self.vin,
            year: self.year,
            rates: self.rates,
            inspection_until: self.inspection_until,
            insurance_note: self.insurance_note,
            vignette_until: self.vignette_until,
        }
    }
}
