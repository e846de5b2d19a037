use fleetdesk_core::gateway::StoreGateway;

use super::{open_console, CommandResult};

pub fn run() -> CommandResult {
    let console = match open_console("logout") {
        Ok(console) => console,
        Err(result) => return result,
    };

    match console.runtime.block_on(console.gateway.sign_out()) {
        Ok(()) => CommandResult::success("logout", "signed out; local session cleared"),
        Err(error) => CommandResult::halted("logout", error.class(), error.to_string()),
    }
}
