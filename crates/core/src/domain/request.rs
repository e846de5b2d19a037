use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

/// A public booking request. Submitter fields are duplicated flat rather
/// than referencing a Customer, since the submitter is not a customer yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalRequest {
    pub id: RequestId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_card_number: String,
    pub license_number: String,
    pub license_image: Option<String>,
    pub digital_consent_at: DateTime<Utc>,
    pub status: RequestStatus,
}

impl RentalRequest {
    pub fn applicant_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Only a pending request accepts a decision; approved and rejected are
    /// both terminal.
    pub fn decide(&mut self, decision: RequestStatus) -> Result<(), DomainError> {
        let decidable = matches!(decision, RequestStatus::Approved | RequestStatus::Rejected);
        if self.status == RequestStatus::Pending && decidable {
            self.status = decision;
            return Ok(());
        }

        Err(DomainError::InvalidRequestTransition { from: self.status, to: decision })
    }
}

/// Submission payload from the public form; inserted with pending status and
/// a store-assigned id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRentalRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_card_number: String,
    pub license_number: String,
    pub license_image: Option<String>,
    pub digital_consent_at: DateTime<Utc>,
}

impl NewRentalRequest {
    pub fn into_request(self, id: RequestId) -> RentalRequest {
        RentalRequest {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            id_card_number: self.id_card_number,
            license_number: self.license_number,
            license_image: self.license_image,
            digital_consent_at: self.digital_consent_at,
            status: RequestStatus::Pending,
        }
    }
}
