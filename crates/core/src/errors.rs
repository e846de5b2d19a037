use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::rental::RentalStatus;
use crate::domain::request::RequestStatus;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("invalid rental transition from {from:?} to {to:?}")]
    InvalidRentalTransition { from: RentalStatus, to: RentalStatus },
    #[error("invalid request transition from {from:?} to {to:?}")]
    InvalidRequestTransition { from: RequestStatus, to: RequestStatus },
    #[error("rental period must start before it ends ({start} >= {end})")]
    InvalidRentalPeriod { start: DateTime<Utc>, end: DateTime<Utc> },
    #[error("an active rental requires a customer signature")]
    SignatureRequired,
}

/// Stable failure classes surfaced in console output and exit codes.
///
/// Validation failures are caught before any store call; store failures
/// cover transport errors and store rejections alike; auth covers rejected
/// sign-ins and acting without a session; configuration failures are fatal
/// at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    Auth,
    Store,
    Validation,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Configuration => "configuration",
            ErrorClass::Auth => "auth",
            ErrorClass::Store => "store",
            ErrorClass::Validation => "validation",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorClass::Configuration => 2,
            ErrorClass::Auth => 4,
            ErrorClass::Store => 5,
            ErrorClass::Validation => 6,
        }
    }
}

impl DomainError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Validation
    }
}
