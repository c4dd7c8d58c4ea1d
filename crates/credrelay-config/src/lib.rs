//! Configuration for the credential relay.
//!
//! A TOML file in the platform config directory, layered under
//! `CREDRELAY_*` environment variables, translated into
//! `credrelay_core::AuthenticatorConfig`. The core never reads files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use credrelay_core::{
    AuthenticatorConfig, ClientIdentity, StatsWindow, TlsMode, TransportConfig, UserFieldExposure,
};

/// Environment variable prefix. Nested keys use `__`:
/// `CREDRELAY_CLIENT__TIMEOUT=5`.
pub const ENV_PREFIX: &str = "CREDRELAY_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// JSON state file holding the site list and counters.
    /// Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,

    #[serde(default)]
    pub client: ClientSection,

    #[serde(default)]
    pub counters: CountersSection,

    #[serde(default)]
    pub forwarding: ForwardingSection,

    #[serde(default)]
    pub rest: RestSection,
}

/// How outbound probes identify themselves and how long they wait.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientSection {
    /// Loop-prevention header name.
    #[serde(default = "default_client_name")]
    pub name: String,

    /// Header value. Defaults to the running version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Probe timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Extra CA certificate (PEM) to trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            name: default_client_name(),
            version: None,
            timeout: default_timeout(),
            ca_cert: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CountersSection {
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    #[serde(default = "default_min_days")]
    pub min_days: u32,

    #[serde(default = "default_max_lookback_days")]
    pub max_lookback_days: u32,
}

impl Default for CountersSection {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            min_days: default_min_days(),
            max_lookback_days: default_max_lookback_days(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ForwardingSection {
    /// Relay HTTP Basic credentials on inbound requests.
    #[serde(default)]
    pub basic_auth: bool,
}

/// Fields added to this host's own user resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RestSection {
    #[serde(default = "default_true")]
    pub add_email_to_user_rest: bool,

    #[serde(default = "default_true")]
    pub add_username_to_user_rest: bool,
}

impl Default for RestSection {
    fn default() -> Self {
        Self {
            add_email_to_user_rest: true,
            add_username_to_user_rest: true,
        }
    }
}

fn default_client_name() -> String {
    ClientIdentity::current().name().to_owned()
}
fn default_timeout() -> u64 {
    3
}
fn default_retention_days() -> u32 {
    7
}
fn default_min_days() -> u32 {
    StatsWindow::default().min_days
}
fn default_max_lookback_days() -> u32 {
    StatsWindow::default().max_lookback_days
}
fn default_true() -> bool {
    true
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "credrelay", "credrelay")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("credrelay");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the JSON state file.
pub fn default_state_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("state.json"),
        |dirs| dirs.data_dir().join("state.json"),
    )
}

impl Config {
    /// The configured state file, or the platform default.
    pub fn state_path(&self) -> PathBuf {
        self.state_path.clone().unwrap_or_else(default_state_path)
    }
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
///
/// `path` overrides the platform config location. A missing file is not
/// an error; the defaults and environment still apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default(path: Option<&Path>) -> Config {
    load_config(path).unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it. Returns the path written.
pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(path)
}

// ── Translation ─────────────────────────────────────────────────────

/// Build an `AuthenticatorConfig` from the file settings.
pub fn to_authenticator_config(cfg: &Config) -> Result<AuthenticatorConfig, ConfigError> {
    let defaults = ClientIdentity::current();
    let version = cfg
        .client
        .version
        .clone()
        .unwrap_or_else(|| defaults.version().to_owned());
    let identity =
        ClientIdentity::new(cfg.client.name.clone(), version).map_err(|e| {
            ConfigError::Validation {
                field: "client.name".into(),
                reason: e.to_string(),
            }
        })?;

    if cfg.client.timeout == 0 {
        return Err(ConfigError::Validation {
            field: "client.timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }
    if cfg.counters.retention_days == 0 {
        return Err(ConfigError::Validation {
            field: "counters.retention_days".into(),
            reason: "must be at least 1 day".into(),
        });
    }
    if cfg.counters.min_days > cfg.counters.max_lookback_days {
        return Err(ConfigError::Validation {
            field: "counters.min_days".into(),
            reason: format!(
                "{} exceeds max_lookback_days ({})",
                cfg.counters.min_days, cfg.counters.max_lookback_days
            ),
        });
    }

    let tls = cfg
        .client
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);

    Ok(AuthenticatorConfig {
        identity,
        transport: TransportConfig {
            tls,
            timeout: Duration::from_secs(cfg.client.timeout),
        },
        counter_retention: chrono::Duration::days(cfg.counters.retention_days.into()),
        stats: StatsWindow {
            min_days: cfg.counters.min_days,
            max_lookback_days: cfg.counters.max_lookback_days,
        },
        basic_auth_forwarding: cfg.forwarding.basic_auth,
        rest_fields: UserFieldExposure {
            email: cfg.rest.add_email_to_user_rest,
            username: cfg.rest.add_username_to_user_rest,
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(cfg.client, ClientSection::default());
        assert_eq!(cfg.counters.retention_days, 7);
        assert_eq!(cfg.counters.min_days, 7);
        assert!(!cfg.forwarding.basic_auth);
        assert!(cfg.rest.add_email_to_user_rest);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
state_path = "/var/lib/credrelay/state.json"

[client]
name = "my-relay"
timeout = 5

[forwarding]
basic_auth = true

[rest]
add_username_to_user_rest = false
"#,
        )
        .unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.client.name, "my-relay");
        assert_eq!(cfg.client.timeout, 5);
        assert!(cfg.forwarding.basic_auth);
        assert!(cfg.rest.add_email_to_user_rest);
        assert!(!cfg.rest.add_username_to_user_rest);
        assert_eq!(
            cfg.state_path(),
            PathBuf::from("/var/lib/credrelay/state.json")
        );

        let auth = to_authenticator_config(&cfg).unwrap();
        assert_eq!(auth.identity.name(), "my-relay");
        assert_eq!(auth.transport.timeout, Duration::from_secs(5));
        assert!(auth.basic_auth_forwarding);
        assert!(!auth.rest_fields.username);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.counters.retention_days = 14;
        cfg.client.ca_cert = Some(PathBuf::from("/etc/ssl/relay-ca.pem"));

        let written = save_config(&cfg, Some(&path)).unwrap();
        assert_eq!(written, path);
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.counters.retention_days, 14);
        assert_eq!(loaded.client.ca_cert, cfg.client.ca_cert);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut cfg = Config::default();
        cfg.client.name = "not a header".into();
        assert!(matches!(
            to_authenticator_config(&cfg),
            Err(ConfigError::Validation { ref field, .. }) if field == "client.name"
        ));

        let mut cfg = Config::default();
        cfg.counters.min_days = 30;
        cfg.counters.max_lookback_days = 10;
        assert!(to_authenticator_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.client.timeout = 0;
        assert!(to_authenticator_config(&cfg).is_err());
    }

    #[test]
    fn ca_cert_selects_custom_roots() {
        let mut cfg = Config::default();
        assert_eq!(to_authenticator_config(&cfg).unwrap().transport.tls, TlsMode::System);
        cfg.client.ca_cert = Some(PathBuf::from("/tmp/ca.pem"));
        assert_eq!(
            to_authenticator_config(&cfg).unwrap().transport.tls,
            TlsMode::CustomCa(PathBuf::from("/tmp/ca.pem"))
        );
    }
}
