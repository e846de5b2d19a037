use fleetdesk_client::decide_request;
use fleetdesk_core::approvals::{pending_requests, RequestReview, ReviewDecision};
use fleetdesk_core::domain::{RentalRequest, RequestId};
use fleetdesk_core::notify::InMemoryNoticeSink;

use super::{notice_lines, open_console, CommandResult};

pub fn list() -> CommandResult {
    let console = match open_console("requests") {
        Ok(console) => console,
        Err(result) => return result,
    };

    let notices = InMemoryNoticeSink::default();
    let state = console.load_state(&notices);

    let pending = pending_requests(&state.requests);
    let mut lines: Vec<String> = pending.iter().map(|request| render_line(request)).collect();
    lines.push(format!("{} pending of {} total", pending.len(), state.requests.len()));
    lines.extend(notice_lines(&notices));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

pub fn show(id: i64) -> CommandResult {
    let console = match open_console("requests show") {
        Ok(console) => console,
        Err(result) => return result,
    };

    let notices = InMemoryNoticeSink::default();
    let state = console.load_state(&notices);

    match state.request(RequestId(id)) {
        Some(request) => CommandResult { exit_code: 0, output: render_detail(request) },
        None => CommandResult::failure(
            "requests show",
            "validation",
            format!("request {id} not found"),
            6,
        ),
    }
}

pub fn approve(id: i64) -> CommandResult {
    decide("requests approve", id, ReviewDecision::Approve)
}

pub fn reject(id: i64) -> CommandResult {
    decide("requests reject", id, ReviewDecision::Reject)
}

fn decide(command: &str, id: i64, decision: ReviewDecision) -> CommandResult {
    let console = match open_console(command) {
        Ok(console) => console,
        Err(result) => return result,
    };

    let notices = InMemoryNoticeSink::default();
    let mut state = console.load_state(&notices);

    let request = match state.request(RequestId(id)).cloned() {
        Some(request) => request,
        None => {
            return CommandResult::failure(
                command,
                "validation",
                format!("request {id} not found"),
                6,
            )
        }
    };

    let mut review = RequestReview::new();
    if let Err(error) = review.open(request) {
        return CommandResult::failure(command, "validation", error.to_string(), 6);
    }

    let decided = console.runtime.block_on(decide_request(
        &console.gateway,
        &mut state,
        &notices,
        &mut review,
        decision,
    ));

    match decided {
        Ok(request) => CommandResult::success(
            command,
            format!("request {} {}", request.id.0, request.status.as_str()),
        ),
        Err(halt) => CommandResult::halted(command, halt.class(), halt.to_string()),
    }
}

fn render_line(request: &RentalRequest) -> String {
    format!(
        "#{} {} | {} | {} | submitted {}",
        request.id.0,
        request.applicant_name(),
        request.email,
        request.phone,
        request.digital_consent_at.format("%Y-%m-%d"),
    )
}

fn render_detail(request: &RentalRequest) -> String {
    let license_image = if request.license_image.is_some() { "attached" } else { "none" };
    [
        format!("request #{} ({})", request.id.0, request.status.as_str()),
        format!("name: {}", request.applicant_name()),
        format!("email: {}", request.email),
        format!("phone: {}", request.phone),
        format!("id card: {}", request.id_card_number),
        format!("license: {}", request.license_number),
        format!("license image: {license_image}"),
        format!("consent given: {}", request.digital_consent_at.format("%Y-%m-%d %H:%M")),
    ]
    .join("\n")
}
