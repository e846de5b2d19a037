pub mod customer;
pub mod rental;
pub mod request;
pub mod vehicle;

pub use customer::{Customer, CustomerDraft, CustomerId};
pub use rental::{NewRental, Rental, RentalId, RentalStatus, Signature};
pub use request::{NewRentalRequest, RentalRequest, RequestId, RequestStatus};
pub use vehicle::{NewVehicle, RateTable, Vehicle, VehicleId};
