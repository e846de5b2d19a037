use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::vehicle::VehicleId;

/// Wizard steps in forward order; there is no backward transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStep {
    CustomerCapture,
    VehicleAndDateSelection,
    ContractSignature,
    Confirmation,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::CustomerCapture => 1,
            WizardStep::VehicleAndDateSelection => 2,
            WizardStep::ContractSignature => 3,
            WizardStep::Confirmation => 4,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::CustomerCapture => "customer",
            WizardStep::VehicleAndDateSelection => "vehicle and dates",
            WizardStep::ContractSignature => "contract and signature",
            WizardStep::Confirmation => "confirmation",
        }
    }
}

/// What the vehicle/date step hands forward to the contract step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RentalTerms {
    pub vehicle_id: VehicleId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: Decimal,
}
