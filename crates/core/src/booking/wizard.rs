use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::booking::states::{RentalTerms, WizardStep};
use crate::domain::customer::{Customer, CustomerDraft};
use crate::domain::rental::{NewRental, Rental, RentalStatus, Signature};
use crate::domain::vehicle::Vehicle;
use crate::errors::DomainError;
use crate::pricing;

/// Current wizard position with the results carried between steps.
#[derive(Clone, Debug, PartialEq)]
pub enum WizardState {
    CustomerCapture,
    VehicleAndDateSelection {
        customer: Customer,
    },
    ContractSignature {
        customer: Customer,
        vehicle: Vehicle,
        terms: RentalTerms,
        signature: Option<Signature>,
    },
    Confirmation {
        rental: Rental,
    },
}

impl WizardState {
    pub fn step(&self) -> WizardStep {
        match self {
            WizardState::CustomerCapture => WizardStep::CustomerCapture,
            WizardState::VehicleAndDateSelection { .. } => WizardStep::VehicleAndDateSelection,
            WizardState::ContractSignature { .. } => WizardStep::ContractSignature,
            WizardState::Confirmation { .. } => WizardStep::Confirmation,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum WizardError {
    #[error("missing required fields in step {step:?}: {missing_fields:?}")]
    MissingRequiredFields { step: WizardStep, missing_fields: Vec<String> },
    #[error("no vehicle selected")]
    VehicleRequired,
    #[error("a non-empty signature is required before confirming")]
    SignatureRequired,
    #[error("a submission is already in flight at step {step:?}")]
    SubmitInFlight { step: WizardStep },
    #[error("no submission is in flight")]
    NothingInFlight,
    #[error("expected step {expected:?}, wizard is at {actual:?}")]
    WrongStep { expected: WizardStep, actual: WizardStep },
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Forward-only booking machine. Steps that persist something follow a
/// begin/resolve protocol: `begin_*` validates and raises the in-flight
/// guard, and exactly one of the resolve calls lowers it. While the guard
/// is up every further submit is rejected, so a double submit can create
/// at most one record no matter how the machine is driven.
#[derive(Debug)]
pub struct BookingWizard {
    state: WizardState,
    in_flight: bool,
}

impl Default for BookingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingWizard {
    pub fn new() -> Self {
        Self { state: WizardState::CustomerCapture, in_flight: false }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> WizardStep {
        self.state.step()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), WizardError> {
        let actual = self.step();
        if actual != expected {
            return Err(WizardError::WrongStep { expected, actual });
        }
        Ok(())
    }

    fn raise_guard(&mut self) -> Result<(), WizardError> {
        if self.in_flight {
            return Err(WizardError::SubmitInFlight { step: self.step() });
        }
        self.in_flight = true;
        Ok(())
    }

    /// Step 1 submit. Validation failures block locally; the caller must
    /// not issue the customer insert unless this returns Ok.
    pub fn begin_customer_submit(&mut self, draft: &CustomerDraft) -> Result<(), WizardError> {
        self.expect_step(WizardStep::CustomerCapture)?;
        if self.in_flight {
            return Err(WizardError::SubmitInFlight { step: self.step() });
        }

        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return Err(WizardError::MissingRequiredFields {
                step: WizardStep::CustomerCapture,
                missing_fields: missing.iter().map(|field| field.to_string()).collect(),
            });
        }

        self.raise_guard()
    }

    /// Resolves a successful customer insert and advances to the vehicle
    /// and date selection.
    pub fn customer_created(&mut self, customer: Customer) -> Result<(), WizardError> {
        self.expect_step(WizardStep::CustomerCapture)?;
        if !self.in_flight {
            return Err(WizardError::NothingInFlight);
        }

        self.in_flight = false;
        self.state = WizardState::VehicleAndDateSelection { customer };
        Ok(())
    }

    /// Resolves a failed store call: the wizard stays on the current step
    /// and accepts submissions again.
    pub fn submit_failed(&mut self) -> Result<(), WizardError> {
        if !self.in_flight {
            return Err(WizardError::NothingInFlight);
        }
        self.in_flight = false;
        Ok(())
    }

    /// Step 2 submit. Purely local: validates the selection, prices the
    /// period, and advances carrying the terms. Returns the computed
    /// total, which is zero when the vehicle has no day rate.
    pub fn submit_selection(
        &mut self,
        vehicle: Option<&Vehicle>,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Decimal, WizardError> {
        self.expect_step(WizardStep::VehicleAndDateSelection)?;

        let vehicle = vehicle.ok_or(WizardError::VehicleRequired)?;

        let (start_date, end_date) = match (start_date, end_date) {
            (Some(start), Some(end)) => (start, end),
            (start, end) => {
                let mut missing = Vec::new();
                if start.is_none() {
                    missing.push("start_date".to_string());
                }
                if end.is_none() {
                    missing.push("end_date".to_string());
                }
                return Err(WizardError::MissingRequiredFields {
                    step: WizardStep::VehicleAndDateSelection,
                    missing_fields: missing,
                });
            }
        };

        if start_date >= end_date {
            return Err(DomainError::InvalidRentalPeriod { start: start_date, end: end_date }.into());
        }

        let total_price = pricing::rental_total(&vehicle.rates, Some(start_date), Some(end_date));

        let customer = match &self.state {
            WizardState::VehicleAndDateSelection { customer } => customer.clone(),
            _ => unreachable!("step checked above"),
        };

        self.state = WizardState::ContractSignature {
            customer,
            vehicle: vehicle.clone(),
            terms: RentalTerms { vehicle_id: vehicle.id, start_date, end_date, total_price },
            signature: None,
        };
        Ok(total_price)
    }

    /// Attaches the captured signature image on the contract step. A blank
    /// payload does not count as a signature.
    pub fn attach_signature(&mut self, signature: Signature) -> Result<(), WizardError> {
        self.expect_step(WizardStep::ContractSignature)?;
        if self.in_flight {
            return Err(WizardError::SubmitInFlight { step: self.step() });
        }
        if signature.is_blank() {
            return Err(WizardError::SignatureRequired);
        }

        if let WizardState::ContractSignature { signature: slot, .. } = &mut self.state {
            *slot = Some(signature);
        }
        Ok(())
    }

    /// Whether the confirm action is available: contract step, a signature
    /// attached, nothing in flight.
    pub fn can_confirm(&self) -> bool {
        !self.in_flight
            && matches!(
                &self.state,
                WizardState::ContractSignature { signature: Some(signature), .. }
                    if !signature.is_blank()
            )
    }

    /// Step 3 submit. Raises the guard and hands back the insert payload:
    /// an active rental signed by the customer with consent recorded at
    /// `consent_at`.
    pub fn begin_contract_submit(
        &mut self,
        consent_at: DateTime<Utc>,
    ) -> Result<NewRental, WizardError> {
        self.expect_step(WizardStep::ContractSignature)?;
        if self.in_flight {
            return Err(WizardError::SubmitInFlight { step: self.step() });
        }
        if !self.can_confirm() {
            return Err(WizardError::SignatureRequired);
        }

        let (customer, terms, signature) = match &self.state {
            WizardState::ContractSignature { customer, terms, signature: Some(signature), .. } => {
                (customer.clone(), terms.clone(), signature.clone())
            }
            _ => return Err(WizardError::SignatureRequired),
        };

        let new_rental = NewRental {
            vehicle_id: terms.vehicle_id,
            customer_id: customer.id,
            start_date: terms.start_date,
            end_date: terms.end_date,
            total_price: terms.total_price,
            status: RentalStatus::Active,
            customer_signature: Some(signature),
            company_signature: None,
            digital_consent_at: Some(consent_at),
        };
        new_rental.validate()?;

        self.raise_guard()?;
        Ok(new_rental)
    }

    /// Resolves a successful rental insert and moves to the terminal
    /// confirmation.
    pub fn rental_created(&mut self, rental: Rental) -> Result<(), WizardError> {
        self.expect_step(WizardStep::ContractSignature)?;
        if !self.in_flight {
            return Err(WizardError::NothingInFlight);
        }

        self.in_flight = false;
        self.state = WizardState::Confirmation { rental };
        Ok(())
    }

    pub fn confirmed_rental(&self) -> Option<&Rental> {
        match &self.state {
            WizardState::Confirmation { rental } => Some(rental),
            _ => None,
        }
    }
}
