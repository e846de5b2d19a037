use std::fmt;

use serde::Serialize;

use fleetdesk_client::{RestGateway, SessionStore};
use fleetdesk_core::config::{AppConfig, LoadOptions};
use fleetdesk_core::gateway::StoreGateway;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

impl CheckStatus {
    fn marker(self) -> &'static str {
        match self {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skip(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Skipped, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    /// A skipped check is not a failure: running doctor while signed out
    /// is still a healthy setup.
    fn from_checks(checks: Vec<DoctorCheck>) -> Self {
        let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
        Self {
            overall_status: if failed { CheckStatus::Fail } else { CheckStatus::Pass },
            summary: if failed {
                "doctor: one or more readiness checks failed".to_string()
            } else {
                "doctor: all readiness checks passed".to_string()
            },
            checks,
        }
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        for check in &self.checks {
            write!(f, "\n- [{}] {}: {}", check.status.marker(), check.name, check.details)?;
        }
        Ok(())
    }
}

pub fn run(json_output: bool) -> String {
    let report = build_report();
    if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        })
    } else {
        report.to_string()
    }
}

fn build_report() -> DoctorReport {
    let checks = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => vec![
            DoctorCheck::pass("config_validation", "configuration loaded and validated"),
            session_check(&config),
            store_check(&config),
        ],
        Err(error) => vec![
            DoctorCheck::fail("config_validation", error.to_string()),
            DoctorCheck::skip("session_presence", "skipped because configuration did not load"),
            DoctorCheck::skip("store_reachability", "skipped because configuration did not load"),
        ],
    };
    DoctorReport::from_checks(checks)
}

fn session_check(config: &AppConfig) -> DoctorCheck {
    match SessionStore::new(config.session.file.clone()).load() {
        Some(session) => DoctorCheck::pass(
            "session_presence",
            format!("persisted session for {}", session.email),
        ),
        None => DoctorCheck::skip("session_presence", "no persisted session; run `fleetdesk login`"),
    }
}

/// Lists vehicles through a throwaway gateway. Any store response that
/// maps onto the domain proves the base URL, key, and schema at once.
fn store_check(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck::fail(
                "store_reachability",
                format!("failed to initialize async runtime: {error}"),
            );
        }
    };

    let probe = runtime.block_on(async {
        let gateway = RestGateway::new(&config.store, config.session.file.clone())
            .map_err(|error| error.to_string())?;
        gateway.list_vehicles().await.map(|vehicles| vehicles.len()).map_err(|error| error.to_string())
    });

    match probe {
        Ok(count) => {
            DoctorCheck::pass("store_reachability", format!("store responded with {count} vehicles"))
        }
        Err(error) => DoctorCheck::fail("store_reachability", error),
    }
}
