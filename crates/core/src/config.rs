//! Layered configuration: baked-in defaults, then an optional TOML file,
//! then `FLEETDESK_*` environment variables, then caller overrides.
//! Secrets ride in `SecretString` so debug output stays clean.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_PATHS: [&str; 2] = ["fleetdesk.toml", "config/fleetdesk.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Highest-precedence settings, above both the file and the environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub store_base_url: Option<String>,
    pub store_api_key: Option<String>,
    pub session_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` was required but not found")]
    MissingConfigFile(PathBuf),
    #[error("config file references `${{{var}}}` but the variable is not set")]
    MissingEnvInterpolation { var: String },
    #[error("unclosed `${{...}}` reference in config file")]
    UnterminatedInterpolation,
    #[error("`{value}` is not a usable value for {key}")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                base_url: String::new(),
                api_key: String::new().into(),
                timeout_secs: 30,
            },
            session: SessionConfig { file: PathBuf::from(".fleetdesk/session.json") },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match config_file(options.config_path.as_deref()) {
            Some(path) => load_patch(&path)?.apply(&mut config),
            None if options.require_file => {
                let expected =
                    options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_PATHS[0]));
                return Err(ConfigError::MissingConfigFile(expected));
            }
            None => {}
        }

        config.apply_env()?;
        options.overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        merge(&mut self.store.base_url, read_env("FLEETDESK_STORE_URL"));
        if let Some(key) = read_env("FLEETDESK_STORE_API_KEY") {
            self.store.api_key = key.into();
        }
        if let Some(raw) = read_env("FLEETDESK_STORE_TIMEOUT_SECS") {
            self.store.timeout_secs = parse_timeout(&raw)?;
        }

        merge(&mut self.session.file, read_env("FLEETDESK_SESSION_FILE").map(PathBuf::from));

        // Both the long and the short logging keys are honored, long first.
        merge(
            &mut self.logging.level,
            read_env_alias(&["FLEETDESK_LOGGING_LEVEL", "FLEETDESK_LOG_LEVEL"]),
        );
        if let Some(raw) = read_env_alias(&["FLEETDESK_LOGGING_FORMAT", "FLEETDESK_LOG_FORMAT"]) {
            self.logging.format = raw.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.session.validate()?;
        self.logging.validate()
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(invalid(
                "store.base_url is required. Set it in fleetdesk.toml or via FLEETDESK_STORE_URL",
            ));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(invalid("store.base_url must start with http:// or https://"));
        }
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(invalid(
                "store.api_key is required. Set it in fleetdesk.toml or via FLEETDESK_STORE_API_KEY",
            ));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(invalid("store.timeout_secs must be in range 1..=300"));
        }
        Ok(())
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.file.as_os_str().is_empty() {
            return Err(invalid("session.file must not be empty"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(invalid("logging.level must be one of trace|debug|info|warn|error")),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let format = match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Self::Compact,
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            other => {
                return Err(ConfigError::Validation(format!(
                    "unsupported log format `{other}` (expected compact|pretty|json)"
                )))
            }
        };
        Ok(format)
    }
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation(message.to_string())
}

fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => CONFIG_PATHS.iter().map(PathBuf::from).find(|path| path.exists()),
    }
}

fn load_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    let expanded = expand_env_refs(&raw)?;
    toml::from_str(&expanded)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands `${VAR}` references before the TOML parse so secrets can live
/// outside the file.
fn expand_env_refs(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let Some(end) = tail.find('}') else {
            return Err(ConfigError::UnterminatedInterpolation);
        };
        let var = &tail[..end];
        let value =
            env::var(var).map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &tail[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_alias(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| read_env(key))
}

fn parse_timeout(value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: "FLEETDESK_STORE_TIMEOUT_SECS".to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    store: Option<StorePatch>,
    session: Option<SessionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl ConfigPatch {
    fn apply(self, config: &mut AppConfig) {
        if let Some(store) = self.store {
            merge(&mut config.store.base_url, store.base_url);
            if let Some(key) = store.api_key {
                config.store.api_key = key.into();
            }
            merge(&mut config.store.timeout_secs, store.timeout_secs);
        }
        if let Some(session) = self.session {
            merge(&mut config.session.file, session.file.map(PathBuf::from));
        }
        if let Some(logging) = self.logging {
            merge(&mut config.logging.level, logging.level);
            merge(&mut config.logging.format, logging.format);
        }
    }
}

impl ConfigOverrides {
    fn apply(self, config: &mut AppConfig) {
        merge(&mut config.store.base_url, self.store_base_url);
        if let Some(key) = self.store_api_key {
            config.store.api_key = key.into();
        }
        merge(&mut config.session.file, self.session_file);
        merge(&mut config.logging.level, self.log_level);
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    const LOADER_KEYS: &[&str] = &[
        "FLEETDESK_STORE_URL",
        "FLEETDESK_STORE_API_KEY",
        "FLEETDESK_STORE_TIMEOUT_SECS",
        "FLEETDESK_SESSION_FILE",
        "FLEETDESK_LOGGING_LEVEL",
        "FLEETDESK_LOG_LEVEL",
        "FLEETDESK_LOGGING_FORMAT",
        "FLEETDESK_LOG_FORMAT",
    ];

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    /// Serializes access to the process environment, clears every variable
    /// the loader reads, applies the given ones, and restores the original
    /// values on drop.
    struct EnvGuard {
        saved: Vec<(&'static str, Option<String>)>,
        _lock: MutexGuard<'static, ()>,
    }

    impl EnvGuard {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            let lock = ENV_LOCK
                .get_or_init(|| Mutex::new(()))
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            let mut saved: Vec<(&'static str, Option<String>)> =
                LOADER_KEYS.iter().map(|key| (*key, env::var(key).ok())).collect();
            for key in LOADER_KEYS {
                env::remove_var(key);
            }
            for (key, value) in vars.iter().copied() {
                if !LOADER_KEYS.contains(&key) {
                    saved.push((key, env::var(key).ok()));
                }
                env::set_var(key, value);
            }

            Self { saved, _lock: lock }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain(..) {
                match value {
                    Some(value) => env::set_var(key, value),
                    None => env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() {
        let _env = EnvGuard::set(&[("TEST_STORE_API_KEY", "anon-key-from-env")]);
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("fleetdesk.toml");
        fs::write(
            &path,
            r#"[store]
base_url = "https://demo.supabase.co"
api_key = "${TEST_STORE_API_KEY}"
"#,
        )
        .expect("write config");

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .expect("config loads");

        assert_eq!(config.store.api_key.expose_secret(), "anon-key-from-env");
        assert_eq!(config.store.base_url, "https://demo.supabase.co");
    }

    #[test]
    fn unterminated_reference_is_rejected() {
        let _env = EnvGuard::set(&[]);
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("fleetdesk.toml");
        fs::write(&path, "[store]\nbase_url = \"${NEVER_CLOSED\"\n").expect("write config");

        let error =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .expect_err("bad reference is refused");

        assert!(matches!(error, ConfigError::UnterminatedInterpolation));
    }

    #[test]
    fn a_required_config_file_must_exist() {
        let _env = EnvGuard::set(&[]);

        let error = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/fleetdesk.toml")),
            require_file: true,
            ..LoadOptions::default()
        })
        .expect_err("missing file is refused");

        assert!(matches!(error, ConfigError::MissingConfigFile(path) if path.ends_with("fleetdesk.toml")));
    }

    #[test]
    fn logging_env_aliases_are_supported() {
        let _env = EnvGuard::set(&[
            ("FLEETDESK_STORE_URL", "https://demo.supabase.co"),
            ("FLEETDESK_STORE_API_KEY", "anon-key"),
            ("FLEETDESK_LOG_LEVEL", "warn"),
            ("FLEETDESK_LOG_FORMAT", "pretty"),
        ]);

        let config = AppConfig::load(LoadOptions::default()).expect("config loads");

        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn overrides_beat_env_and_env_beats_file() {
        let _env = EnvGuard::set(&[
            ("FLEETDESK_STORE_URL", "https://from-env.supabase.co"),
            ("FLEETDESK_STORE_API_KEY", "anon-key-from-env"),
        ]);
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("fleetdesk.toml");
        fs::write(
            &path,
            r#"[store]
base_url = "https://from-file.supabase.co"
api_key = "anon-key-from-file"

[logging]
level = "warn"
"#,
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            overrides: ConfigOverrides {
                store_base_url: Some("https://from-override.supabase.co".to_string()),
                log_level: Some("debug".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("config loads");

        assert_eq!(config.store.base_url, "https://from-override.supabase.co");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.store.api_key.expose_secret(), "anon-key-from-env");
    }

    #[test]
    fn validation_fails_fast_with_actionable_errors() {
        let _env = EnvGuard::set(&[]);

        let error = AppConfig::load(LoadOptions::default()).expect_err("missing base url");
        assert!(matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("store.base_url")
        ));

        env::set_var("FLEETDESK_STORE_URL", "https://demo.supabase.co");
        let error = AppConfig::load(LoadOptions::default()).expect_err("missing api key");
        assert!(matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("store.api_key")
        ));
    }

    #[test]
    fn invalid_timeout_env_override_is_rejected() {
        let _env = EnvGuard::set(&[
            ("FLEETDESK_STORE_URL", "https://demo.supabase.co"),
            ("FLEETDESK_STORE_API_KEY", "anon-key"),
            ("FLEETDESK_STORE_TIMEOUT_SECS", "soon"),
        ]);

        let error = AppConfig::load(LoadOptions::default()).expect_err("timeout is refused");

        assert!(matches!(
            error,
            ConfigError::InvalidEnvOverride { ref key, .. } if key == "FLEETDESK_STORE_TIMEOUT_SECS"
        ));
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() {
        let _env = EnvGuard::set(&[
            ("FLEETDESK_STORE_URL", "https://demo.supabase.co"),
            ("FLEETDESK_STORE_API_KEY", "anon-secret-value"),
        ]);

        let config = AppConfig::load(LoadOptions::default()).expect("config loads");

        assert!(!format!("{config:?}").contains("anon-secret-value"));
        assert_eq!(config.logging.format, LogFormat::Compact);
    }
}
