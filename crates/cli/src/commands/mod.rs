pub mod config;
pub mod dashboard;
pub mod doctor;
pub mod fleet;
pub mod login;
pub mod logout;
pub mod rental;
pub mod rentals;
pub mod requests;
pub mod seed;

use std::path::Path;

use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use fleetdesk_client::{AppState, RestGateway};
use fleetdesk_core::config::{AppConfig, LoadOptions};
use fleetdesk_core::domain::Signature;
use fleetdesk_core::errors::ErrorClass;
use fleetdesk_core::notify::InMemoryNoticeSink;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::envelope(command, "ok", None, message.into(), 0)
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::envelope(command, "error", Some(error_class), message.into(), exit_code)
    }

    pub fn halted(command: &str, class: ErrorClass, message: impl Into<String>) -> Self {
        Self::failure(command, class.as_str(), message, class.exit_code())
    }

    fn envelope(
        command: &str,
        status: &str,
        error_class: Option<&str>,
        message: String,
        exit_code: u8,
    ) -> Self {
        let outcome = CommandOutcome {
            command: command.to_string(),
            status: status.to_string(),
            error_class: error_class.map(str::to_string),
            message,
        };
        let output = serde_json::to_string(&outcome).unwrap_or_else(|error| {
            format!(
                "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        });
        Self { exit_code, output }
    }
}

/// Runtime and gateway shared by every command that talks to the store.
/// Opening fails with the envelope the caller should return as-is.
pub(crate) struct Console {
    pub runtime: tokio::runtime::Runtime,
    pub gateway: RestGateway,
}

pub(crate) fn open_console(command: &str) -> Result<Console, CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::halted(
            command,
            ErrorClass::Configuration,
            format!("configuration issue: {error}"),
        )
    })?;

    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        })?;

    let gateway = RestGateway::new(&config.store, config.session.file)
        .map_err(|error| CommandResult::halted(command, error.class(), error.to_string()))?;

    Ok(Console { runtime, gateway })
}

impl Console {
    /// Loads the cached collections; failed collections surface through
    /// the sink and come back empty.
    pub fn load_state(&self, notices: &InMemoryNoticeSink) -> AppState {
        let mut state = AppState::new();
        self.runtime.block_on(state.refresh(&self.gateway, notices));
        state
    }
}

/// Operator-visible toasts replayed at the end of the command output.
pub(crate) fn notice_lines(notices: &InMemoryNoticeSink) -> Vec<String> {
    notices
        .notices()
        .iter()
        .map(|notice| format!("[{}] {}", notice.level.as_str(), notice.message))
        .collect()
}

/// Reads a signature image and wraps it the way the store expects it,
/// as a base64 data URL.
pub(crate) fn read_signature(path: &Path) -> anyhow::Result<Signature> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("could not read signature file `{}`", path.display()))?;
    Ok(Signature(format!("data:image/png;base64,{}", STANDARD.encode(bytes))))
}
