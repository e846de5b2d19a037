//! Drives the booking wizard end to end for a single invocation, from the
//! customer insert through the contract email. Local validation halts the
//! run before the first store call. A store failure halts it with an error
//! notice; a customer row the store already accepted stays behind for the
//! retry.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use fleetdesk_core::booking::{BookingWizard, WizardError};
use fleetdesk_core::domain::{CustomerDraft, Rental, Signature, VehicleId};
use fleetdesk_core::errors::ErrorClass;
use fleetdesk_core::gateway::{StoreError, StoreGateway};
use fleetdesk_core::notify::{Notice, NoticeSink};

use crate::state::AppState;

/// Everything the one-shot booking run needs up front. An interactive
/// front end would gather these across the wizard steps instead.
#[derive(Clone, Debug)]
pub struct BookingInput {
    pub draft: CustomerDraft,
    pub vehicle_id: VehicleId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub signature: Option<Signature>,
    pub consent_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum BookingHalt {
    #[error("{0}")]
    Validation(String),
    #[error("a customer signature is required to confirm the contract")]
    SignatureMissing,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingHalt {
    pub fn class(&self) -> ErrorClass {
        match self {
            BookingHalt::Validation(_) | BookingHalt::SignatureMissing => ErrorClass::Validation,
            BookingHalt::Store(error) => error.class(),
        }
    }
}

fn local(error: WizardError) -> BookingHalt {
    BookingHalt::Validation(error.to_string())
}

/// Runs the whole wizard against the store. Returns the created rental;
/// the contract email is a follow-up whose failure surfaces as a notice
/// and never unwinds the booking.
pub async fn run_booking(
    gateway: &dyn StoreGateway,
    state: &mut AppState,
    notices: &dyn NoticeSink,
    input: BookingInput,
) -> Result<Rental, BookingHalt> {
    // The wizard rejects a bad vehicle or signature only at its later
    // steps, after the customer insert; a one-shot run checks both first.
    let vehicle = state
        .vehicle(input.vehicle_id)
        .cloned()
        .ok_or_else(|| BookingHalt::Validation(format!("vehicle {} is not in the fleet", input.vehicle_id.0)))?;
    let signature = match input.signature {
        Some(signature) if !signature.is_blank() => signature,
        _ => return Err(BookingHalt::SignatureMissing),
    };

    let mut wizard = BookingWizard::new();
    wizard.begin_customer_submit(&input.draft).map_err(local)?;

    let customer = match gateway.insert_customer(&input.draft).await {
        Ok(customer) => customer,
        Err(error) => {
            warn!(
                event_name = "booking.customer_insert_failed",
                error = %error,
                "customer insert failed"
            );
            notices.emit(Notice::error(format!("could not save customer: {error}")));
            let _ = wizard.submit_failed();
            return Err(BookingHalt::Store(error));
        }
    };
    state.record_customer(customer.clone());
    wizard.customer_created(customer).map_err(local)?;

    wizard
        .submit_selection(Some(&vehicle), Some(input.start_date), Some(input.end_date))
        .map_err(local)?;
    wizard.attach_signature(signature).map_err(local)?;

    let new_rental = wizard.begin_contract_submit(input.consent_at).map_err(local)?;
    let rental = match gateway.insert_rental(&new_rental).await {
        Ok(rental) => rental,
        Err(error) => {
            warn!(
                event_name = "booking.rental_insert_failed",
                error = %error,
                "rental insert failed"
            );
            notices.emit(Notice::error(format!("could not create rental: {error}")));
            let _ = wizard.submit_failed();
            return Err(BookingHalt::Store(error));
        }
    };
    wizard.rental_created(rental.clone()).map_err(local)?;
    state.record_rental(rental.clone());
    notices.emit(Notice::success(format!("rental {} created", rental.id.0)));

    match gateway.send_contract(rental.id).await {
        Ok(()) => notices.emit(Notice::info(format!("contract for rental {} emailed", rental.id.0))),
        Err(error) => {
            warn!(
                event_name = "booking.contract_email_failed",
                rental_id = rental.id.0,
                error = %error,
                "contract email failed"
            );
            notices.emit(Notice::error(format!(
                "rental {} was created but the contract email failed: {error}",
                rental.id.0
            )));
        }
    }

    Ok(rental)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use fleetdesk_core::domain::{
        CustomerDraft, NewVehicle, RateTable, RentalStatus, Signature, VehicleId,
    };
    use fleetdesk_core::errors::ErrorClass;
    use fleetdesk_core::gateway::{StoreError, StoreGateway};
    use fleetdesk_core::notify::{InMemoryNoticeSink, NoticeLevel};

    use crate::memory::InMemoryGateway;
    use crate::state::AppState;

    use super::{run_booking, BookingHalt, BookingInput};

    fn van() -> NewVehicle {
        NewVehicle {
            brand: "Ford Transit".into(),
            license_plate: "1AB 1234".into(),
            vin: "ABC123XYZ".into(),
            year: 2022,
            rates: RateTable::day_only(Decimal::from(1500)),
            inspection_until: NaiveDate::from_ymd_opt(2026, 4, 1).expect("valid date"),
            insurance_note: "ČSOB, č. 123456".into(),
            vignette_until: NaiveDate::from_ymd_opt(2025, 1, 31).expect("valid date"),
        }
    }

    fn draft() -> CustomerDraft {
        CustomerDraft {
            first_name: "Jan".into(),
            last_name: "Novák".into(),
            email: "jan.novak@email.cz".into(),
            phone: "+420 123 456 789".into(),
            id_card_number: "123456789".into(),
            license_number: "987654321".into(),
            license_image: None,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn input() -> BookingInput {
        BookingInput {
            draft: draft(),
            vehicle_id: VehicleId(1),
            start_date: at(10, 9),
            end_date: at(12, 17),
            signature: Some(Signature("data:image/png;base64,iVBORw0KGgo".into())),
            consent_at: at(10, 8),
        }
    }

    async fn ready() -> (InMemoryGateway, AppState, InMemoryNoticeSink) {
        let gateway = InMemoryGateway::new();
        gateway.insert_vehicle(&van()).await.expect("vehicle");
        let notices = InMemoryNoticeSink::default();
        let mut state = AppState::new();
        state.refresh(&gateway, &notices).await;
        (gateway, state, notices)
    }

    #[tokio::test]
    async fn happy_path_creates_customer_rental_and_emails_contract() {
        let (gateway, mut state, notices) = ready().await;

        let rental =
            run_booking(&gateway, &mut state, &notices, input()).await.expect("booking succeeds");

        assert_eq!(rental.status, RentalStatus::Active);
        assert_eq!(rental.total_price, Decimal::from(4500));
        assert!(rental.has_customer_signature());

        assert_eq!(state.customers.len(), 1);
        assert_eq!(state.rentals.len(), 1);
        assert_eq!(state.rentals[0].id, rental.id);

        let calls = gateway.calls();
        assert!(calls.contains(&"insert customers".to_string()));
        assert!(calls.contains(&"insert rentals".to_string()));
        assert!(calls.iter().any(|call| call.starts_with("send_contract")));
        assert!(notices.notices().iter().any(|n| n.level == NoticeLevel::Success));
    }

    #[tokio::test]
    async fn customer_insert_failure_halts_with_a_notice() {
        let (gateway, mut state, notices) = ready().await;
        gateway.fail_next_call(StoreError::Network("store is down".into()));

        let halt = run_booking(&gateway, &mut state, &notices, input())
            .await
            .expect_err("store failure halts");

        assert_eq!(halt, BookingHalt::Store(StoreError::Network("store is down".into())));
        assert_eq!(halt.class(), ErrorClass::Store);
        assert!(state.customers.is_empty());
        assert!(state.rentals.is_empty());
        assert!(!gateway.calls().contains(&"insert rentals".to_string()));
        assert!(notices.errors()[0].message.contains("could not save customer"));
    }

    #[tokio::test]
    async fn rental_insert_failure_keeps_the_customer_row() {
        let (gateway, mut state, notices) = ready().await;
        gateway.fail_call("insert rentals", StoreError::Network("constraint violated".into()));

        let halt = run_booking(&gateway, &mut state, &notices, input())
            .await
            .expect_err("rental insert fails");

        assert!(matches!(halt, BookingHalt::Store(_)));
        // The store accepted the customer before the rental was rejected.
        assert_eq!(state.customers.len(), 1);
        assert!(state.rentals.is_empty());
        assert!(notices.errors()[0].message.contains("could not create rental"));
    }

    #[tokio::test]
    async fn auth_failures_keep_their_class_through_the_halt() {
        let (gateway, mut state, notices) = ready().await;
        gateway.fail_next_call(StoreError::Auth("token expired".into()));

        let halt = run_booking(&gateway, &mut state, &notices, input())
            .await
            .expect_err("auth failure halts");
        assert_eq!(halt.class(), ErrorClass::Auth);
    }

    #[tokio::test]
    async fn missing_signature_halts_before_any_store_call() {
        let (gateway, mut state, notices) = ready().await;
        let calls_before = gateway.calls().len();

        let halt = run_booking(
            &gateway,
            &mut state,
            &notices,
            BookingInput { signature: None, ..input() },
        )
        .await
        .expect_err("unsigned booking halts");

        assert_eq!(halt, BookingHalt::SignatureMissing);
        assert_eq!(halt.class(), ErrorClass::Validation);
        assert_eq!(gateway.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn blank_signature_counts_as_missing() {
        let (gateway, mut state, notices) = ready().await;

        let halt = run_booking(
            &gateway,
            &mut state,
            &notices,
            BookingInput { signature: Some(Signature("   ".into())), ..input() },
        )
        .await
        .expect_err("blank signature halts");
        assert_eq!(halt, BookingHalt::SignatureMissing);
    }

    #[tokio::test]
    async fn unknown_vehicle_halts_before_any_store_call() {
        let (gateway, mut state, notices) = ready().await;
        let calls_before = gateway.calls().len();

        let halt = run_booking(
            &gateway,
            &mut state,
            &notices,
            BookingInput { vehicle_id: VehicleId(99), ..input() },
        )
        .await
        .expect_err("unknown vehicle halts");

        assert!(matches!(halt, BookingHalt::Validation(_)));
        assert_eq!(gateway.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn incomplete_draft_halts_before_any_store_call() {
        let (gateway, mut state, notices) = ready().await;
        let calls_before = gateway.calls().len();

        let halt = run_booking(
            &gateway,
            &mut state,
            &notices,
            BookingInput { draft: CustomerDraft { email: String::new(), ..draft() }, ..input() },
        )
        .await
        .expect_err("incomplete draft halts");

        assert!(matches!(halt, BookingHalt::Validation(message) if message.contains("email")));
        assert_eq!(gateway.calls().len(), calls_before);
        assert!(state.customers.is_empty());
    }

    #[tokio::test]
    async fn contract_email_failure_does_not_unwind_the_booking() {
        let (gateway, mut state, notices) = ready().await;
        gateway.fail_call("send_contract", StoreError::Network("function unavailable".into()));

        let rental =
            run_booking(&gateway, &mut state, &notices, input()).await.expect("booking succeeds");

        assert_eq!(state.rentals.len(), 1);
        assert_eq!(state.rentals[0].id, rental.id);
        let errors = notices.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("contract email failed"));
        assert!(notices.notices().iter().any(|n| n.level == NoticeLevel::Success));
    }
}
