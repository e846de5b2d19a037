//! Wire records for the store's four collections and the mapping to the
//! domain model. All column-name knowledge lives here; nothing outside
//! this module spells `stk_date` or `drivers_license_number`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fleetdesk_core::domain::{
    Customer, CustomerDraft, CustomerId, NewRental, NewRentalRequest, NewVehicle, RateTable,
    Rental, RentalId, RentalRequest, RentalStatus, RequestId, RequestStatus, Signature, Vehicle,
    VehicleId,
};
use fleetdesk_core::gateway::{RentalPatch, StoreError};

#[derive(Clone, Debug, Deserialize)]
pub struct VehicleRecord {
    pub id: i64,
    pub brand: String,
    pub license_plate: String,
    pub vin: String,
    pub year: i32,
    #[serde(default)]
    pub price_4h: Option<Decimal>,
    #[serde(default)]
    pub price_12h: Option<Decimal>,
    #[serde(default)]
    pub price_day: Option<Decimal>,
    #[serde(default)]
    pub price_month: Option<Decimal>,
    pub stk_date: NaiveDate,
    pub insurance_info: String,
    pub vignette_until: NaiveDate,
}

impl VehicleRecord {
    pub fn into_domain(self) -> Vehicle {
        Vehicle {
            id: VehicleId(self.id),
            brand: self.brand,
            license_plate: self.license_plate,
            vin: self.vin,
            year: self.year,
            rates: RateTable {
                hour4: self.price_4h,
                hour12: self.price_12h,
                day: self.price_day,
                month: self.price_month,
            },
            inspection_until: self.stk_date,
            insurance_note: self.insurance_info,
            vignette_until: self.vignette_until,
        }
    }
}

/// Insert payload for the vehicles collection; the store assigns the id.
#[derive(Clone, Debug, Serialize)]
pub struct NewVehicleRecord {
    pub brand: String,
    pub license_plate: String,
    pub vin: String,
    pub year: i32,
    pub price_4h: Option<Decimal>,
    pub price_12h: Option<Decimal>,
    pub price_day: Option<Decimal>,
    pub price_month: Option<Decimal>,
    pub stk_date: NaiveDate,
    pub insurance_info: String,
    pub vignette_until: NaiveDate,
}

impl From<&NewVehicle> for NewVehicleRecord {
    fn from(new: &NewVehicle) -> Self {
        Self {
            brand: new.brand.clone(),
            license_plate: new.license_plate.clone(),
            vin: new.vin.clone(),
            year: new.year,
            price_4h: new.rates.hour4,
            price_12h: new.rates.hour12,
            price_day: new.rates.day,
            price_month: new.rates.month,
            stk_date: new.inspection_until,
            insurance_info: new.insurance_note.clone(),
            vignette_until: new.vignette_until,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CustomerRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_card_number: String,
    pub drivers_license_number: String,
    #[serde(default)]
    pub drivers_license_image_path: Option<String>,
}

impl CustomerRecord {
    pub fn into_domain(self) -> Customer {
        Customer {
            id: CustomerId(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            id_card_number: self.id_card_number,
            license_number: self.drivers_license_number,
            license_image: self.drivers_license_image_path,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NewCustomerRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_card_number: String,
    pub drivers_license_number: String,
    pub drivers_license_image_path: Option<String>,
}

impl From<&CustomerDraft> for NewCustomerRecord {
    fn from(draft: &CustomerDraft) -> Self {
        Self {
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            id_card_number: draft.id_card_number.clone(),
            drivers_license_number: draft.license_number.clone(),
            drivers_license_image_path: draft.license_image.clone(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RentalRecord {
    pub id: i64,
    pub vehicle_id: i64,
    pub customer_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: Decimal,
    pub status: String,
    #[serde(default)]
    pub customer_signature: Option<String>,
    #[serde(default)]
    pub company_signature: Option<String>,
    #[serde(default)]
    pub digital_consent_at: Option<DateTime<Utc>>,
}

impl RentalRecord {
    pub fn into_domain(self) -> Result<Rental, StoreError> {
        let status = parse_rental_status(&self.status)?;
        Ok(Rental {
            id: RentalId(self.id),
            vehicle_id: VehicleId(self.vehicle_id),
            customer_id: CustomerId(self.customer_id),
            start_date: self.start_date,
            end_date: self.end_date,
            total_price: self.total_price,
            status,
            customer_signature: self.customer_signature.map(Signature),
            company_signature: self.company_signature.map(Signature),
            digital_consent_at: self.digital_consent_at,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NewRentalRecord {
    pub vehicle_id: i64,
    pub customer_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: Decimal,
    pub status: &'static str,
    pub customer_signature: Option<String>,
    pub company_signature: Option<String>,
    pub digital_consent_at: Option<DateTime<Utc>>,
}

impl From<&NewRental> for NewRentalRecord {
    fn from(new: &NewRental) -> Self {
        Self {
            vehicle_id: new.vehicle_id.0,
            customer_id: new.customer_id.0,
            start_date: new.start_date,
            end_date: new.end_date,
            total_price: new.total_price,
            status: new.status.as_str(),
            customer_signature: new.customer_signature.as_ref().map(|s| s.0.clone()),
            company_signature: new.company_signature.as_ref().map(|s| s.0.clone()),
            digital_consent_at: new.digital_consent_at,
        }
    }
}

/// Partial rental update; unset fields stay out of the request body so the
/// store leaves the columns untouched.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RentalPatchRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_signature: Option<String>,
}

impl From<&RentalPatch> for RentalPatchRecord {
    fn from(patch: &RentalPatch) -> Self {
        Self {
            status: patch.status.map(|status| status.as_str()),
            customer_signature: patch.customer_signature.as_ref().map(|s| s.0.clone()),
            company_signature: patch.company_signature.as_ref().map(|s| s.0.clone()),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RequestRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_card_number: String,
    pub drivers_license_number: String,
    #[serde(default)]
    pub drivers_license_image_base64: Option<String>,
    pub digital_consent_at: DateTime<Utc>,
    pub status: String,
}

impl RequestRecord {
    pub fn into_domain(self) -> Result<RentalRequest, StoreError> {
        let status = parse_request_status(&self.status)?;
        Ok(RentalRequest {
            id: RequestId(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            id_card_number: self.id_card_number,
            license_number: self.drivers_license_number,
            license_image: self.drivers_license_image_base64,
            digital_consent_at: self.digital_consent_at,
            status,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NewRequestRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_card_number: String,
    pub drivers_license_number: String,
    pub drivers_license_image_base64: Option<String>,
    pub digital_consent_at: DateTime<Utc>,
    pub status: &'static str,
}

impl From<&NewRentalRequest> for NewRequestRecord {
    fn from(new: &NewRentalRequest) -> Self {
        Self {
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            id_card_number: new.id_card_number.clone(),
            drivers_license_number: new.license_number.clone(),
            drivers_license_image_base64: new.license_image.clone(),
            digital_consent_at: new.digital_consent_at,
            status: RequestStatus::Pending.as_str(),
        }
    }
}

fn parse_rental_status(value: &str) -> Result<RentalStatus, StoreError> {
    RentalStatus::parse(value)
        .ok_or_else(|| StoreError::Schema(format!("unknown rental status `{value}`")))
}

fn parse_request_status(value: &str) -> Result<RequestStatus, StoreError> {
    RequestStatus::parse(value)
        .ok_or_else(|| StoreError::Schema(format!("unknown request status `{value}`")))
}
