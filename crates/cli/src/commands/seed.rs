use super::{open_console, CommandResult};

pub fn run() -> CommandResult {
    let console = match open_console("seed") {
        Ok(console) => console,
        Err(result) => return result,
    };

    match console.runtime.block_on(fleetdesk_client::seed(&console.gateway)) {
        Ok(summary) => CommandResult::success(
            "seed",
            format!(
                "demo dataset loaded: {} vehicles, {} customers, {} rentals, {} requests",
                summary.vehicles, summary.customers, summary.rentals, summary.requests
            ),
        ),
        Err(error) => CommandResult::halted("seed", error.class(), error.to_string()),
    }
}
