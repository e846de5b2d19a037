use fleetdesk_client::AppState;
use fleetdesk_core::domain::Rental;
use fleetdesk_core::notify::InMemoryNoticeSink;

use super::{notice_lines, open_console, CommandResult};

pub fn list() -> CommandResult {
    let console = match open_console("rentals") {
        Ok(console) => console,
        Err(result) => return result,
    };

    let notices = InMemoryNoticeSink::default();
    let state = console.load_state(&notices);

    let mut lines: Vec<String> =
        state.rentals.iter().map(|rental| render_rental(&state, rental)).collect();
    if lines.is_empty() {
        lines.push("no rentals yet".to_string());
    }
    lines.extend(notice_lines(&notices));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn render_rental(state: &AppState, rental: &Rental) -> String {
    let customer = state
        .customer(rental.customer_id)
        .map(|c| c.full_name())
        .unwrap_or_else(|| format!("customer {}", rental.customer_id.0));
    let vehicle = state
        .vehicle(rental.vehicle_id)
        .map(|v| v.label())
        .unwrap_or_else(|| format!("vehicle {}", rental.vehicle_id.0));

    format!(
        "#{} {customer} | {vehicle} | {} -> {} | {} CZK | {}",
        rental.id.0,
        rental.start_date.format("%Y-%m-%d %H:%M"),
        rental.end_date.format("%Y-%m-%d %H:%M"),
        rental.total_price,
        rental.status.as_str(),
    )
}
