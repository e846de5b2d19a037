//! Cached view of the store collections. The cache refreshes wholesale on
//! sign-in, clears on sign-out, and gets patched in place after each write
//! so commands never refetch what they just changed.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use fleetdesk_core::domain::{
    Customer, CustomerId, Rental, RentalId, RentalRequest, RentalStatus, RequestId, RequestStatus,
    Vehicle, VehicleId,
};
use fleetdesk_core::gateway::{SessionInfo, StoreGateway};
use fleetdesk_core::notify::{Notice, NoticeSink};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub vehicles: Vec<Vehicle>,
    pub customers: Vec<Customer>,
    pub rentals: Vec<Rental>,
    pub requests: Vec<RentalRequest>,
}

/// Headline numbers for the dashboard view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardStats {
    pub active_rentals: usize,
    pub pending_requests: usize,
    pub fleet_size: usize,
    pub completed_revenue: Decimal,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reloads every collection. A failed collection comes back empty with
    /// an error notice; the other collections still load.
    pub async fn refresh(&mut self, gateway: &dyn StoreGateway, notices: &dyn NoticeSink) {
        match gateway.list_vehicles().await {
            Ok(vehicles) => self.vehicles = vehicles,
            Err(error) => {
                warn!(
                    event_name = "state.refresh_failed",
                    collection = "vehicles",
                    error = %error,
                    "collection refresh failed"
                );
                self.vehicles.clear();
                notices.emit(Notice::error(format!("could not load vehicles: {error}")));
            }
        }

        match gateway.list_customers().await {
            Ok(customers) => self.customers = customers,
            Err(error) => {
                warn!(
                    event_name = "state.refresh_failed",
                    collection = "customers",
                    error = %error,
                    "collection refresh failed"
                );
                self.customers.clear();
                notices.emit(Notice::error(format!("could not load customers: {error}")));
            }
        }

        match gateway.list_rentals().await {
            Ok(rentals) => self.rentals = rentals,
            Err(error) => {
                warn!(
                    event_name = "state.refresh_failed",
                    collection = "rentals",
                    error = %error,
                    "collection refresh failed"
                );
                self.rentals.clear();
                notices.emit(Notice::error(format!("could not load rentals: {error}")));
            }
        }

        match gateway.list_requests().await {
            Ok(requests) => self.requests = requests,
            Err(error) => {
                warn!(
                    event_name = "state.refresh_failed",
                    collection = "rental_requests",
                    error = %error,
                    "collection refresh failed"
                );
                self.requests.clear();
                notices.emit(Notice::error(format!("could not load rental requests: {error}")));
            }
        }
    }

    pub fn clear(&mut self) {
        self.vehicles.clear();
        self.customers.clear();
        self.rentals.clear();
        self.requests.clear();
    }

    /// Signed in loads the cache, signed out drops it.
    pub async fn handle_session_change(
        &mut self,
        gateway: &dyn StoreGateway,
        notices: &dyn NoticeSink,
        session: Option<&SessionInfo>,
    ) {
        if session.is_some() {
            self.refresh(gateway, notices).await;
        } else {
            self.clear();
        }
    }

    pub fn record_vehicle(&mut self, vehicle: Vehicle) {
        self.vehicles.push(vehicle);
    }

    pub fn record_customer(&mut self, customer: Customer) {
        self.customers.push(customer);
    }

    pub fn record_rental(&mut self, rental: Rental) {
        self.rentals.push(rental);
    }

    /// Replaces the cached rental with the store's updated row.
    pub fn apply_rental(&mut self, updated: Rental) {
        match self.rentals.iter_mut().find(|rental| rental.id == updated.id) {
            Some(rental) => *rental = updated,
            None => self.rentals.push(updated),
        }
    }

    pub fn apply_request(&mut self, updated: RentalRequest) {
        match self.requests.iter_mut().find(|request| request.id == updated.id) {
            Some(request) => *request = updated,
            None => self.requests.push(updated),
        }
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|vehicle| vehicle.id == id)
    }

    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|customer| customer.id == id)
    }

    pub fn rental(&self, id: RentalId) -> Option<&Rental> {
        self.rentals.iter().find(|rental| rental.id == id)
    }

    pub fn request(&self, id: RequestId) -> Option<&RentalRequest> {
        self.requests.iter().find(|request| request.id == id)
    }

    pub fn dashboard(&self) -> DashboardStats {
        DashboardStats {
            active_rentals: self
                .rentals
                .iter()
                .filter(|rental| rental.status == RentalStatus::Active)
                .count(),
            pending_requests: self
                .requests
                .iter()
                .filter(|request| request.status == RequestStatus::Pending)
                .count(),
            fleet_size: self.vehicles.len(),
            completed_revenue: self
                .rentals
                .iter()
                .filter(|rental| rental.status == RentalStatus::Completed)
                .map(|rental| rental.total_price)
                .sum(),
        }
    }
}
