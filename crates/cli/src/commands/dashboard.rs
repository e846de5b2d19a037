use fleetdesk_core::notify::InMemoryNoticeSink;

use super::{notice_lines, open_console, CommandResult};

pub fn run(json: bool) -> CommandResult {
    let console = match open_console("dashboard") {
        Ok(console) => console,
        Err(result) => return result,
    };

    let notices = InMemoryNoticeSink::default();
    let state = console.load_state(&notices);
    let stats = state.dashboard();

    if json {
        let output = serde_json::to_string_pretty(&stats)
            .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
        return CommandResult { exit_code: 0, output };
    }

    let mut lines = vec![
        format!("fleet size: {}", stats.fleet_size),
        format!("active rentals: {}", stats.active_rentals),
        format!("pending requests: {}", stats.pending_requests),
        format!("completed revenue: {} CZK", stats.completed_revenue),
    ];
    lines.extend(notice_lines(&notices));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}
