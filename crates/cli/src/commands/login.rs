use fleetdesk_core::gateway::StoreGateway;

use super::{open_console, CommandResult};

const PASSWORD_ENV: &str = "FLEETDESK_PASSWORD";

pub fn run(email: &str, password: Option<&str>) -> CommandResult {
    let console = match open_console("login") {
        Ok(console) => console,
        Err(result) => return result,
    };

    let password = match password.map(str::to_string).or_else(read_password_env) {
        Some(password) => password,
        None => {
            return CommandResult::failure(
                "login",
                "validation",
                format!("no password given. Pass --password or set {PASSWORD_ENV}"),
                6,
            )
        }
    };

    match console.runtime.block_on(console.gateway.sign_in(email, &password)) {
        Ok(session) => CommandResult::success(
            "login",
            format!("signed in as {} ({})", session.email, session.user_id),
        ),
        Err(error) => CommandResult::halted("login", error.class(), error.to_string()),
    }
}

fn read_password_env() -> Option<String> {
    std::env::var(PASSWORD_ENV).ok().filter(|value| !value.trim().is_empty())
}
