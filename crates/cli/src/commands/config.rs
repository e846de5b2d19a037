use std::env;
use std::fs;
use std::path::PathBuf;

use fleetdesk_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

/// One reportable setting: its dotted key, the env vars that can set it,
/// and the effective value after loading.
struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let fields = [
        Field {
            key: "store.base_url",
            env_keys: &["FLEETDESK_STORE_URL"],
            value: config.store.base_url.clone(),
        },
        Field {
            key: "store.api_key",
            env_keys: &["FLEETDESK_STORE_API_KEY"],
            value: mask_key(config.store.api_key.expose_secret()),
        },
        Field {
            key: "store.timeout_secs",
            env_keys: &["FLEETDESK_STORE_TIMEOUT_SECS"],
            value: config.store.timeout_secs.to_string(),
        },
        Field {
            key: "session.file",
            env_keys: &["FLEETDESK_SESSION_FILE"],
            value: config.session.file.display().to_string(),
        },
        Field {
            key: "logging.level",
            env_keys: &["FLEETDESK_LOGGING_LEVEL", "FLEETDESK_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key: "logging.format",
            env_keys: &["FLEETDESK_LOGGING_FORMAT", "FLEETDESK_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ];

    let file = config_file();
    let mut report =
        String::from("effective config (source precedence: env > file > default):");
    for field in &fields {
        let source = resolve_source(field, file.as_ref());
        report.push_str(&format!("\n- {} = {} (source: {})", field.key, field.value, source));
    }
    report
}

/// The first config file the loader would have picked up, parsed so the
/// source report can tell file-set keys from defaults.
fn config_file() -> Option<(PathBuf, Value)> {
    ["fleetdesk.toml", "config/fleetdesk.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
        .and_then(|path| {
            let doc = fs::read_to_string(&path).ok()?.parse::<Value>().ok()?;
            Some((path, doc))
        })
}

fn resolve_source(field: &Field, file: Option<&(PathBuf, Value)>) -> String {
    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }
    match file {
        Some((path, doc)) if file_defines(doc, field.key) => {
            format!("file ({})", path.display())
        }
        _ => "default".to_string(),
    }
}

fn file_defines(doc: &Value, key: &str) -> bool {
    key.split('.').try_fold(doc, |node, part| node.get(part)).is_some()
}

/// Keeps enough of the key to recognize it without printing the secret.
fn mask_key(key: &str) -> String {
    match key.trim() {
        "" => "<empty>".to_string(),
        trimmed => match trimmed.split_once('-') {
            Some((prefix, _)) => format!("{prefix}-***"),
            None => "<redacted>".to_string(),
        },
    }
}
