pub mod approvals;
pub mod booking;
pub mod config;
pub mod contract;
pub mod domain;
pub mod errors;
pub mod gateway;
pub mod notify;
pub mod pricing;

pub use approvals::{pending_requests, RequestReview, ReviewDecision, ReviewError};
pub use booking::{BookingWizard, RentalTerms, WizardError, WizardState, WizardStep};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use contract::{ContractData, ContractRenderer, RenderError};
pub use domain::{
    Customer, CustomerDraft, CustomerId, NewRental, NewRentalRequest, NewVehicle, RateTable,
    Rental, RentalId, RentalRequest, RentalStatus, RequestId, RequestStatus, Signature, Vehicle,
    VehicleId,
};
pub use errors::{DomainError, ErrorClass};
pub use gateway::{Collection, RentalPatch, SessionInfo, StoreError, StoreGateway};
pub use notify::{InMemoryNoticeSink, Notice, NoticeLevel, NoticeSink};
pub use pricing::{billed_days, quote, rental_total, PriceQuote};
