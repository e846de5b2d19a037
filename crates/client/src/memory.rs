//! In-memory store for demos and tests. Ids are assigned sequentially, the
//! call log records every gateway operation, and a scripted failure can be
//! queued so drivers can be exercised against store errors.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{watch, RwLock};

use fleetdesk_core::domain::{
    Customer, CustomerDraft, CustomerId, NewRental, NewRentalRequest, NewVehicle, Rental, RentalId,
    RentalRequest, RequestId, RequestStatus, Vehicle, VehicleId,
};
use fleetdesk_core::gateway::{RentalPatch, SessionInfo, StoreError, StoreGateway};

#[derive(Default)]
struct MemoryState {
    vehicles: Vec<Vehicle>,
    customers: Vec<Customer>,
    rentals: Vec<Rental>,
    requests: Vec<RentalRequest>,
    last_id: i64,
    session: Option<SessionInfo>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

pub struct InMemoryGateway {
    state: RwLock<MemoryState>,
    fail_next: Mutex<Option<StoreError>>,
    fail_matching: Mutex<Option<(String, StoreError)>>,
    calls: Mutex<Vec<String>>,
    events: watch::Sender<Option<SessionInfo>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        let (events, _) = watch::channel(None);
        Self {
            state: RwLock::new(MemoryState::default()),
            fail_next: Mutex::new(None),
            fail_matching: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Queues an error for the next gateway operation; one-shot.
    pub fn fail_next_call(&self, error: StoreError) {
        let mut slot = self.fail_next.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(error);
    }

    /// Queues an error for the next operation whose call log entry starts
    /// with `prefix`; one-shot, other operations pass through.
    pub fn fail_call(&self, prefix: impl Into<String>, error: StoreError) {
        let mut slot = self.fail_matching.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some((prefix.into(), error));
    }

    /// Every operation in invocation order, including ones that failed.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    fn begin(&self, call: String) -> Result<(), StoreError> {
        let matches_scripted = {
            let slot = self.fail_matching.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            slot.as_ref().is_some_and(|(prefix, _)| call.starts_with(prefix.as_str()))
        };
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(call);

        let scripted =
            self.fail_next.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
        if let Some(error) = scripted {
            return Err(error);
        }
        if matches_scripted {
            let taken =
                self.fail_matching.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
            if let Some((_, error)) = taken {
                return Err(error);
            }
        }
        Ok(())
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreGateway for InMemoryGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionInfo, StoreError> {
        self.begin(format!("sign_in {email}"))?;
        if email.trim().is_empty() || password.is_empty() {
            return Err(StoreError::Auth("email and password are required".into()));
        }

        let info = SessionInfo { user_id: "demo-operator".into(), email: email.to_string() };
        self.state.write().await.session = Some(info.clone());
        self.events.send_replace(Some(info.clone()));
        Ok(info)
    }

    async fn sign_out(&self) -> Result<(), StoreError> {
        self.begin("sign_out".into())?;
        self.state.write().await.session = None;
        self.events.send_replace(None);
        Ok(())
    }

    async fn current_session(&self) -> Option<SessionInfo> {
        self.state.read().await.session.clone()
    }

    fn session_events(&self) -> watch::Receiver<Option<SessionInfo>> {
        self.events.subscribe()
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        self.begin("list vehicles".into())?;
        Ok(self.state.read().await.vehicles.clone())
    }

    async fn insert_vehicle(&self, new: &NewVehicle) -> Result<Vehicle, StoreError> {
        self.begin("insert vehicles".into())?;
        let mut state = self.state.write().await;
        let vehicle = new.clone().into_vehicle(VehicleId(state.next_id()));
        state.vehicles.push(vehicle.clone());
        Ok(vehicle)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        self.begin("list customers".into())?;
        Ok(self.state.read().await.customers.clone())
    }

    async fn insert_customer(&self, draft: &CustomerDraft) -> Result<Customer, StoreError> {
        self.begin("insert customers".into())?;
        let mut state = self.state.write().await;
        let customer = draft.clone().into_customer(CustomerId(state.next_id()));
        state.customers.push(customer.clone());
        Ok(customer)
    }

    async fn list_rentals(&self) -> Result<Vec<Rental>, StoreError> {
        self.begin("list rentals".into())?;
        Ok(self.state.read().await.rentals.clone())
    }

    async fn insert_rental(&self, new: &NewRental) -> Result<Rental, StoreError> {
        self.begin("insert rentals".into())?;
        new.validate().map_err(|error| StoreError::Network(error.to_string()))?;
        let mut state = self.state.write().await;
        let rental = new.clone().into_rental(RentalId(state.next_id()));
        state.rentals.push(rental.clone());
        Ok(rental)
    }

    async fn update_rental(
        &self,
        id: RentalId,
        patch: &RentalPatch,
    ) -> Result<Rental, StoreError> {
        self.begin(format!("update rentals {}", id.0))?;
        let mut state = self.state.write().await;
        let rental = state
            .rentals
            .iter_mut()
            .find(|rental| rental.id == id)
            .ok_or_else(|| StoreError::Network(format!("rental {} not found", id.0)))?;

        if let Some(status) = patch.status {
            rental.status = status;
        }
        if let Some(signature) = &patch.customer_signature {
            rental.customer_signature = Some(signature.clone());
        }
        if let Some(signature) = &patch.company_signature {
            rental.company_signature = Some(signature.clone());
        }
        Ok(rental.clone())
    }

    async fn list_requests(&self) -> Result<Vec<RentalRequest>, StoreError> {
        self.begin("list rental_requests".into())?;
        Ok(self.state.read().await.requests.clone())
    }

    async fn insert_request(&self, new: &NewRentalRequest) -> Result<RentalRequest, StoreError> {
        self.begin("insert rental_requests".into())?;
        let mut state = self.state.write().await;
        let request = new.clone().into_request(RequestId(state.next_id()));
        state.requests.push(request.clone());
        Ok(request)
    }

    async fn update_request_status(
        &self,
        id: RequestId,
        status: RequestStatus,
    ) -> Result<RentalRequest, StoreError> {
        self.begin(format!("update rental_requests {}", id.0))?;
        let mut state = self.state.write().await;
        let request = state
            .requests
            .iter_mut()
            .find(|request| request.id == id)
            .ok_or_else(|| StoreError::Network(format!("request {} not found", id.0)))?;
        request.status = status;
        Ok(request.clone())
    }

    async fn send_contract(&self, rental_id: RentalId) -> Result<(), StoreError> {
        self.begin(format!("send_contract {}", rental_id.0))?;
        let state = self.state.read().await;
        if !state.rentals.iter().any(|rental| rental.id == rental_id) {
            return Err(StoreError::Network(format!("rental {} not found", rental_id.0)));
        }
        Ok(())
    }
}
