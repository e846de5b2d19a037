pub mod auth;
pub mod booking;
pub mod fixtures;
pub mod memory;
pub mod records;
pub mod rentals;
pub mod rest;
pub mod review;
pub mod state;

pub use auth::{Session, SessionStore};
pub use booking::{run_booking, BookingHalt, BookingInput};
pub use fixtures::{seed, SeedSummary};
pub use memory::InMemoryGateway;
pub use rentals::{attach_signature, complete_rental, RentalOpHalt, SignatureParty};
pub use rest::RestGateway;
pub use review::{decide_request, ReviewHalt};
pub use state::{AppState, DashboardStats};
