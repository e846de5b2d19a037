use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;
use crate::domain::vehicle::VehicleId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RentalId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Pending,
    Active,
    Completed,
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Pending => "pending",
            RentalStatus::Active => "active",
            RentalStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RentalStatus::Pending),
            "active" => Some(RentalStatus::Active),
            "completed" => Some(RentalStatus::Completed),
            _ => None,
        }
    }
}

/// Base64-encoded signature image captured from a signing pad or a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub String);

impl Signature {
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    pub id: RentalId,
    pub vehicle_id: VehicleId,
    pub customer_id: CustomerId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: Decimal,
    pub status: RentalStatus,
    pub customer_signature: Option<Signature>,
    pub company_signature: Option<Signature>,
    pub digital_consent_at: Option<DateTime<Utc>>,
}

impl Rental {
    /// Pending and active rentals close out through operational action;
    /// nothing reopens a completed rental.
    pub fn can_transition_to(&self, next: RentalStatus) -> bool {
        matches!(
            (self.status, next),
            (RentalStatus::Pending, RentalStatus::Completed)
                | (RentalStatus::Active, RentalStatus::Completed)
        )
    }

    pub fn transition_to(&mut self, next: RentalStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidRentalTransition { from: self.status, to: next })
    }

    pub fn has_customer_signature(&self) -> bool {
        self.customer_signature.as_ref().is_some_and(|s| !s.is_blank())
    }
}

/// Insert payload assembled at the end of the booking wizard; the store
/// assigns the id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewRental {
    pub vehicle_id: VehicleId,
    pub customer_id: CustomerId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: Decimal,
    pub status: RentalStatus,
    pub customer_signature: Option<Signature>,
    pub company_signature: Option<Signature>,
    pub digital_consent_at: Option<DateTime<Utc>>,
}

impl NewRental {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.start_date >= self.end_date {
            return Err(DomainError::InvalidRentalPeriod {
                start: self.start_date,
                end: self.end_date,
            });
        }

        let signed = self.customer_signature.as_ref().is_some_and(|s| !s.is_blank());
        if self.status == RentalStatus::Active && !signed {
            return Err(DomainError::SignatureRequired);
        }

        Ok(())
    }

    pub fn into_rental(self, id: RentalId) -> Rental {
        Rental {
            id,
            vehicle_id: self.vehicle_id,
            customer_id: self.customer_id,
            start_date: self.start_date,
            end_date: self.end_date,
            total_price: self.total_price,
            status: self.status,
            customer_signature: self.customer_signature,
            company_signature: self.company_signature,
            digital_consent_at: self.digital_consent_at,
        }
    }
}
