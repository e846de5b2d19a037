//! Drives a request review decision against the store. A failed update
//! keeps the request pending and the detail open; a successful one patches
//! the cache in place.

use thiserror::Error;
use tracing::warn;

use fleetdesk_core::approvals::{RequestReview, ReviewDecision, ReviewError};
use fleetdesk_core::domain::RentalRequest;
use fleetdesk_core::errors::ErrorClass;
use fleetdesk_core::gateway::{StoreError, StoreGateway};
use fleetdesk_core::notify::{Notice, NoticeSink};

use crate::state::AppState;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ReviewHalt {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReviewHalt {
    pub fn class(&self) -> ErrorClass {
        match self {
            ReviewHalt::Validation(_) => ErrorClass::Validation,
            ReviewHalt::Store(error) => error.class(),
        }
    }
}

fn local(error: ReviewError) -> ReviewHalt {
    ReviewHalt::Validation(error.to_string())
}

/// Applies an approve or reject decision on the review's open request.
pub async fn decide_request(
    gateway: &dyn StoreGateway,
    state: &mut AppState,
    notices: &dyn NoticeSink,
    review: &mut RequestReview,
    decision: ReviewDecision,
) -> Result<RentalRequest, ReviewHalt> {
    let (id, status) = review.begin_decision(decision).map_err(local)?;

    let updated = match gateway.update_request_status(id, status).await {
        Ok(updated) => updated,
        Err(error) => {
            warn!(
                event_name = "review.decision_failed",
                request_id = id.0,
                status = status.as_str(),
                error = %error,
                "request decision failed"
            );
            notices.emit(Notice::error(format!("could not update request {}: {error}", id.0)));
            let _ = review.decision_failed();
            return Err(ReviewHalt::Store(error));
        }
    };

    let decided = review.decision_applied(updated.clone()).map_err(local)?;
    state.apply_request(updated);
    notices.emit(Notice::success(format!("request {} {}", id.0, status.as_str())));
    Ok(decided)
}
