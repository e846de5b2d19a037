//! Operations on persisted rentals outside the booking wizard: closing a
//! rental out and attaching signatures to the contract.

use thiserror::Error;
use tracing::warn;

use fleetdesk_core::domain::{Rental, RentalId, RentalStatus, Signature};
use fleetdesk_core::errors::ErrorClass;
use fleetdesk_core::gateway::{RentalPatch, StoreError, StoreGateway};
use fleetdesk_core::notify::{Notice, NoticeSink};

use crate::state::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureParty {
    Customer,
    Company,
}

impl SignatureParty {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureParty::Customer => "customer",
            SignatureParty::Company => "company",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum RentalOpHalt {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RentalOpHalt {
    pub fn class(&self) -> ErrorClass {
        match self {
            RentalOpHalt::Validation(_) => ErrorClass::Validation,
            RentalOpHalt::Store(error) => error.class(),
        }
    }
}

/// Closes a rental out. The transition rules live on the domain type;
/// anything they refuse never reaches the store.
pub async fn complete_rental(
    gateway: &dyn StoreGateway,
    state: &mut AppState,
    notices: &dyn NoticeSink,
    id: RentalId,
) -> Result<Rental, RentalOpHalt> {
    let rental = state
        .rental(id)
        .ok_or_else(|| RentalOpHalt::Validation(format!("rental {} not found", id.0)))?;

    let mut closed = rental.clone();
    closed
        .transition_to(RentalStatus::Completed)
        .map_err(|error| RentalOpHalt::Validation(error.to_string()))?;

    let updated =
        apply_patch(gateway, state, notices, id, &RentalPatch::status(RentalStatus::Completed))
            .await?;
    notices.emit(Notice::success(format!("rental {} completed", id.0)));
    Ok(updated)
}

/// Attaches a party's signature to an existing rental.
pub async fn attach_signature(
    gateway: &dyn StoreGateway,
    state: &mut AppState,
    notices: &dyn NoticeSink,
    id: RentalId,
    party: SignatureParty,
    signature: Signature,
) -> Result<Rental, RentalOpHalt> {
    if signature.is_blank() {
        return Err(RentalOpHalt::Validation("signature payload is empty".to_string()));
    }
    if state.rental(id).is_none() {
        return Err(RentalOpHalt::Validation(format!("rental {} not found", id.0)));
    }

    let patch = match party {
        SignatureParty::Customer => RentalPatch::customer_signature(signature),
        SignatureParty::Company => RentalPatch::company_signature(signature),
    };

    let updated = apply_patch(gateway, state, notices, id, &patch).await?;
    notices.emit(Notice::success(format!("rental {} signed by {}", id.0, party.as_str())));
    Ok(updated)
}

async fn apply_patch(
    gateway: &dyn StoreGateway,
    state: &mut AppState,
    notices: &dyn NoticeSink,
    id: RentalId,
    patch: &RentalPatch,
) -> Result<Rental, RentalOpHalt> {
    match gateway.update_rental(id, patch).await {
        Ok(updated) => {
            state.apply_rental(updated.clone());
            Ok(updated)
        }
        Err(error) => {
            warn!(
                event_name = "rental.update_failed",
                rental_id = id.0,
                error = %error,
                "rental update failed"
            );
            notices.emit(Notice::error(format!("could not update rental {}: {error}", id.0)));
            Err(RentalOpHalt::Store(error))
        }
    }
}
