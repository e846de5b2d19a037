use chrono::Utc;

use fleetdesk_client::{
    attach_signature, complete_rental, run_booking, BookingInput, SignatureParty,
};
use fleetdesk_core::contract::{ContractData, ContractRenderer};
use fleetdesk_core::domain::{CustomerDraft, RentalId, VehicleId};
use fleetdesk_core::notify::InMemoryNoticeSink;

use crate::BookingArgs;

use super::{notice_lines, open_console, read_signature, CommandResult};

pub fn new(args: &BookingArgs) -> CommandResult {
    let console = match open_console("rental new") {
        Ok(console) => console,
        Err(result) => return result,
    };

    let signature = match &args.signature_file {
        Some(path) => match read_signature(path) {
            Ok(signature) => Some(signature),
            Err(error) => {
                return CommandResult::failure("rental new", "validation", format!("{error:#}"), 6)
            }
        },
        None => None,
    };

    let input = BookingInput {
        draft: CustomerDraft {
            first_name: args.first_name.clone(),
            last_name: args.last_name.clone(),
            email: args.email.clone(),
            phone: args.phone.clone(),
            id_card_number: args.id_card_number.clone(),
            license_number: args.license_number.clone(),
            license_image: None,
        },
        vehicle_id: VehicleId(args.vehicle),
        start_date: args.start,
        end_date: args.end,
        signature,
        consent_at: Utc::now(),
    };

    let notices = InMemoryNoticeSink::default();
    let mut state = console.load_state(&notices);

    let booked = console
        .runtime
        .block_on(run_booking(&console.gateway, &mut state, &notices, input));

    match booked {
        Ok(rental) => {
            let mut lines = vec![format!(
                "rental {} created: {} -> {}, {} CZK",
                rental.id.0,
                rental.start_date.format("%Y-%m-%d %H:%M"),
                rental.end_date.format("%Y-%m-%d %H:%M"),
                rental.total_price,
            )];
            lines.extend(notice_lines(&notices));
            CommandResult { exit_code: 0, output: lines.join("\n") }
        }
        Err(halt) => CommandResult::halted("rental new", halt.class(), halt.to_string()),
    }
}

/// Renders the rental's contract, the same text the store emails to the
/// customer.
pub fn show(id: i64) -> CommandResult {
    let console = match open_console("rental show") {
        Ok(console) => console,
        Err(result) => return result,
    };

    let notices = InMemoryNoticeSink::default();
    let state = console.load_state(&notices);

    let rental = match state.rental(RentalId(id)) {
        Some(rental) => rental,
        None => {
            return CommandResult::failure(
                "rental show",
                "validation",
                format!("rental {id} not found"),
                6,
            )
        }
    };
    let customer = match state.customer(rental.customer_id) {
        Some(customer) => customer,
        None => {
            return CommandResult::failure(
                "rental show",
                "validation",
                format!("customer {} is missing from the cache", rental.customer_id.0),
                6,
            )
        }
    };
    let vehicle = match state.vehicle(rental.vehicle_id) {
        Some(vehicle) => vehicle,
        None => {
            return CommandResult::failure(
                "rental show",
                "validation",
                format!("vehicle {} is missing from the cache", rental.vehicle_id.0),
                6,
            )
        }
    };

    let renderer = match ContractRenderer::new() {
        Ok(renderer) => renderer,
        Err(error) => {
            return CommandResult::failure("rental show", "render", error.to_string(), 1)
        }
    };
    match renderer.render(&ContractData::for_rental(rental, customer, vehicle)) {
        Ok(contract) => CommandResult { exit_code: 0, output: contract },
        Err(error) => CommandResult::failure("rental show", "render", error.to_string(), 1),
    }
}

pub fn sign(id: i64, party: SignatureParty, signature_file: &std::path::Path) -> CommandResult {
    let console = match open_console("rental sign") {
        Ok(console) => console,
        Err(result) => return result,
    };

    let signature = match read_signature(signature_file) {
        Ok(signature) => signature,
        Err(error) => {
            return CommandResult::failure("rental sign", "validation", format!("{error:#}"), 6)
        }
    };

    let notices = InMemoryNoticeSink::default();
    let mut state = console.load_state(&notices);

    let signed = console.runtime.block_on(attach_signature(
        &console.gateway,
        &mut state,
        &notices,
        RentalId(id),
        party,
        signature,
    ));

    match signed {
        Ok(rental) => CommandResult::success(
            "rental sign",
            format!("rental {} signed by {}", rental.id.0, party.as_str()),
        ),
        Err(halt) => CommandResult::halted("rental sign", halt.class(), halt.to_string()),
    }
}

pub fn complete(id: i64) -> CommandResult {
    let console = match open_console("rental complete") {
        Ok(console) => console,
        Err(result) => return result,
    };

    let notices = InMemoryNoticeSink::default();
    let mut state = console.load_state(&notices);

    let completed = console.runtime.block_on(complete_rental(
        &console.gateway,
        &mut state,
        &notices,
        RentalId(id),
    ));

    match completed {
        Ok(rental) => CommandResult::success(
            "rental complete",
            format!("rental {} completed, {} CZK billed", rental.id.0, rental.total_price),
        ),
        Err(halt) => CommandResult::halted("rental complete", halt.class(), halt.to_string()),
    }
}
