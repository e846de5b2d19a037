//! Operator review of public rental requests: a pending work queue and a
//! one-at-a-time detail with approve/reject decisions.

use thiserror::Error;

use crate::domain::request::{RentalRequest, RequestId, RequestStatus};
use crate::errors::DomainError;

/// Pending requests in submission order, the operator's work queue.
pub fn pending_requests(requests: &[RentalRequest]) -> Vec<&RentalRequest> {
    requests.iter().filter(|request| request.is_pending()).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn target_status(&self) -> RequestStatus {
        match self {
            ReviewDecision::Approve => RequestStatus::Approved,
            ReviewDecision::Reject => RequestStatus::Rejected,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ReviewError {
    #[error("request {0:?} is not pending")]
    NotPending(RequestId),
    #[error("a decision is already in flight for request {0:?}")]
    DecisionInFlight(RequestId),
    #[error("no decision is in flight")]
    NothingInFlight,
    #[error("no request is open for review")]
    NothingOpen,
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Detail view over one pending request. Follows the same begin/resolve
/// protocol as the booking wizard: `begin_decision` raises the in-flight
/// guard, and exactly one resolve call lowers it. A failed update leaves
/// the request pending and the detail open for a retry.
#[derive(Debug, Default)]
pub struct RequestReview {
    open: Option<RentalRequest>,
    in_flight: Option<ReviewDecision>,
}

impl RequestReview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a pending request for review, replacing any previously open
    /// detail. Refused while a decision is in flight.
    pub fn open(&mut self, request: RentalRequest) -> Result<(), ReviewError> {
        if let (Some(open), Some(_)) = (&self.open, &self.in_flight) {
            return Err(ReviewError::DecisionInFlight(open.id));
        }
        if !request.is_pending() {
            return Err(ReviewError::NotPending(request.id));
        }

        self.open = Some(request);
        Ok(())
    }

    pub fn current(&self) -> Option<&RentalRequest> {
        self.open.as_ref()
    }

    pub fn is_deciding(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Raises the guard and hands back what the store update needs. The
    /// caller must resolve with `decision_applied` or `decision_failed`.
    pub fn begin_decision(
        &mut self,
        decision: ReviewDecision,
    ) -> Result<(RequestId, RequestStatus), ReviewError> {
        let request = self.open.as_ref().ok_or(ReviewError::NothingOpen)?;
        if self.in_flight.is_some() {
            return Err(ReviewError::DecisionInFlight(request.id));
        }

        self.in_flight = Some(decision);
        Ok((request.id, decision.target_status()))
    }

    /// Resolves a successful update: closes the detail and returns the
    /// decided snapshot, the hook where a conversion to Customer/Rental
    /// would attach.
    pub fn decision_applied(&mut self, updated: RentalRequest) -> Result<RentalRequest, ReviewError> {
        if self.in_flight.take().is_none() {
            return Err(ReviewError::NothingInFlight);
        }

        self.open = None;
        Ok(updated)
    }

    /// Resolves a failed update: the detail stays open, the guard drops.
    pub fn decision_failed(&mut self) -> Result<(), ReviewError> {
        if self.in_flight.take().is_none() {
            return Err(ReviewError::NothingInFlight);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::domain::request::{NewRentalRequest, RentalRequest, RequestId, RequestStatus};

    use super::{pending_requests, RequestReview, ReviewDecision, ReviewError};

    fn request(id: i64, status: RequestStatus) -> RentalRequest {
        let mut request = NewRentalRequest {
            first_name: "Petra".to_string(),
            last_name: "Svobodová".to_string(),
            email: "petra.s@example.com".to_string(),
            phone: "+420 777 888 999".to_string(),
            id_card_number: "998877665".to_string(),
            license_number: "112233445".to_string(),
            license_image: None,
            digital_consent_at: Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap(),
        }
        .into_request(RequestId(id));
        request.status = status;
        request
    }

    #[test]
    fn work_queue_contains_only_pending_requests() {
        let requests = vec![
            request(1, RequestStatus::Pending),
            request(2, RequestStatus::Approved),
            request(3, RequestStatus::Pending),
            request(4, RequestStatus::Rejected),
        ];

        let pending = pending_requests(&requests);
        let ids: Vec<RequestId> = pending.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RequestId(1), RequestId(3)]);
    }

    #[test]
    fn approval_closes_the_detail_and_returns_the_snapshot() {
        let mut review = RequestReview::new();
        review.open(request(1, RequestStatus::Pending)).expect("open");

        let (id, status) = review.begin_decision(ReviewDecision::Approve).expect("begin");
        assert_eq!(id, RequestId(1));
        assert_eq!(status, RequestStatus::Approved);
        assert!(review.is_deciding());

        let approved = review
            .decision_applied(request(1, RequestStatus::Approved))
            .expect("resolve");
        assert_eq!(approved.status, RequestStatus::Approved);
        assert!(review.current().is_none());
        assert!(!review.is_deciding());
    }

    #[test]
    fn rejection_targets_the_rejected_status() {
        let mut review = RequestReview::new();
        review.open(request(5, RequestStatus::Pending)).expect("open");

        let (_, status) = review.begin_decision(ReviewDecision::Reject).expect("begin");
        assert_eq!(status, RequestStatus::Rejected);
    }

    #[test]
    fn failed_update_keeps_the_detail_open() {
        let mut review = RequestReview::new();
        review.open(request(1, RequestStatus::Pending)).expect("open");
        review.begin_decision(ReviewDecision::Approve).expect("begin");

        review.decision_failed().expect("resolve failure");
        assert_eq!(review.current().map(|r| r.id), Some(RequestId(1)));
        assert!(!review.is_deciding());

        // The operator can retry the same decision.
        review.begin_decision(ReviewDecision::Approve).expect("retry");
    }

    #[test]
    fn double_decision_is_rejected_while_in_flight() {
        let mut review = RequestReview::new();
        review.open(request(1, RequestStatus::Pending)).expect("open");
        review.begin_decision(ReviewDecision::Approve).expect("first");

        let error = review.begin_decision(ReviewDecision::Reject).expect_err("second");
        assert_eq!(error, ReviewError::DecisionInFlight(RequestId(1)));
    }

    #[test]
    fn decided_requests_cannot_be_opened() {
        let mut review = RequestReview::new();
        let error = review.open(request(2, RequestStatus::Approved)).expect_err("not pending");
        assert_eq!(error, ReviewError::NotPending(RequestId(2)));
    }

    #[test]
    fn deciding_without_an_open_detail_is_an_error() {
        let mut review = RequestReview::new();
        let error = review.begin_decision(ReviewDecision::Approve).expect_err("nothing open");
        assert_eq!(error, ReviewError::NothingOpen);
    }

    #[test]
    fn switching_requests_is_blocked_mid_decision() {
        let mut review = RequestReview::new();
        review.open(request(1, RequestStatus::Pending)).expect("open");
        review.begin_decision(ReviewDecision::Approve).expect("begin");

        let error = review.open(request(3, RequestStatus::Pending)).expect_err("switch");
        assert_eq!(error, ReviewError::DecisionInFlight(RequestId(1)));
    }
}
