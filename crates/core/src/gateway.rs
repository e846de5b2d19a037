//! Port to the remote store. The console talks to the four collections and
//! the identity endpoint through this trait only; implementations live in
//! the client crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::domain::customer::{Customer, CustomerDraft};
use crate::domain::rental::{NewRental, Rental, RentalId, RentalStatus, Signature};
use crate::domain::request::{NewRentalRequest, RentalRequest, RequestId, RequestStatus};
use crate::domain::vehicle::{NewVehicle, Vehicle};
use crate::errors::ErrorClass;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection {
    Vehicles,
    Customers,
    Rentals,
    RentalRequests,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Vehicles => "vehicles",
            Collection::Customers => "customers",
            Collection::Rentals => "rentals",
            Collection::RentalRequests => "rental_requests",
        }
    }

    pub const ALL: [Collection; 4] = [
        Collection::Vehicles,
        Collection::Customers,
        Collection::Rentals,
        Collection::RentalRequests,
    ];
}

/// Store failures never panic and never cross the application boundary as
/// faults; callers log them and surface a notice.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Transport failure or a rejection by the store, constraint
    /// violations included.
    #[error("store request failed: {0}")]
    Network(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("unexpected record shape: {0}")]
    Schema(String),
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::Network(_) | StoreError::Schema(_) => ErrorClass::Store,
            StoreError::Auth(_) => ErrorClass::Auth,
        }
    }
}

/// Authenticated operator identity as consumers of the gateway see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user_id: String,
    pub email: String,
}

/// Partial rental update; None fields are left untouched by the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RentalPatch {
    pub status: Option<RentalStatus>,
    pub customer_signature: Option<Signature>,
    pub company_signature: Option<Signature>,
}

impl RentalPatch {
    pub fn status(status: RentalStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn customer_signature(signature: Signature) -> Self {
        Self { customer_signature: Some(signature), ..Self::default() }
    }

    pub fn company_signature(signature: Signature) -> Self {
        Self { company_signature: Some(signature), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.customer_signature.is_none()
            && self.company_signature.is_none()
    }
}

/// The single seam between domain logic and the remote store: list, insert
/// and update over the four collections, password identity, and the
/// send-contract function. No delete anywhere.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionInfo, StoreError>;
    async fn sign_out(&self) -> Result<(), StoreError>;
    async fn current_session(&self) -> Option<SessionInfo>;
    /// Observers receive the session after every sign-in and sign-out; a
    /// change triggers a wholesale refresh of the cached collections.
    fn session_events(&self) -> watch::Receiver<Option<SessionInfo>>;

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError>;
    async fn insert_vehicle(&self, new: &NewVehicle) -> Result<Vehicle, StoreError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError>;
    async fn insert_customer(&self, draft: &CustomerDraft) -> Result<Customer, StoreError>;

    async fn list_rentals(&self) -> Result<Vec<Rental>, StoreError>;
    async fn insert_rental(&self, new: &NewRental) -> Result<Rental, StoreError>;
    async fn update_rental(&self, id: RentalId, patch: &RentalPatch)
        -> Result<Rental, StoreError>;

    async fn list_requests(&self) -> Result<Vec<RentalRequest>, StoreError>;
    async fn insert_request(&self, new: &NewRentalRequest) -> Result<RentalRequest, StoreError>;
    async fn update_request_status(
        &self,
        id: RequestId,
        status: RequestStatus,
    ) -> Result<RentalRequest, StoreError>;

    async fn send_contract(&self, rental_id: RentalId) -> Result<(), StoreError>;
}
