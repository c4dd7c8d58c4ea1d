//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use credrelay_config::ConfigError;
use credrelay_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const STORAGE: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Remote sites ─────────────────────────────────────────────────

    #[error("Could not reach remote site {site}")]
    #[diagnostic(
        code(credrelay::connection_failed),
        help(
            "Check that the site is online and serves HTTPS.\n\
             Probe URL: https://{site}/wp-json/wp/v2/users/me"
        )
    )]
    ConnectionFailed {
        site: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Remote site {site} did not answer within {seconds}s")]
    #[diagnostic(
        code(credrelay::timeout),
        help("Raise [client] timeout in the config file if the site is slow.")
    )]
    Timeout { site: String, seconds: u64 },

    #[error("Remote site {site} rejected the credentials")]
    #[diagnostic(code(credrelay::auth_rejected))]
    AuthRejected { site: String },

    #[error("Remote site {site} answered HTTP {status}")]
    #[diagnostic(
        code(credrelay::unexpected_status),
        help("Only 200 and 401 are expected from the user-info endpoint.")
    )]
    UnexpectedStatus { site: String, status: u16 },

    #[error("Invalid remote site '{input}': {reason}")]
    #[diagnostic(
        code(credrelay::invalid_site),
        help("Give a host name such as example.com or a URL such as https://example.com")
    )]
    InvalidSite { input: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(credrelay::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(credrelay::config),
        help("Check the config file (credrelay config path) and CREDRELAY_* variables.")
    )]
    Config(Box<figment::Error>),

    #[error("Failed to write configuration: {0}")]
    #[diagnostic(code(credrelay::config_write))]
    ConfigWrite(String),

    // ── Storage ──────────────────────────────────────────────────────

    #[error("State storage failed: {message}")]
    #[diagnostic(
        code(credrelay::storage),
        help("State file: {path}")
    )]
    Storage { path: String, message: String },

    #[error("{message}")]
    #[diagnostic(code(credrelay::internal))]
    Internal { message: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(credrelay::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthRejected { .. } => exit_code::AUTH,
            Self::InvalidSite { .. }
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Storage { .. } => exit_code::STORAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Serialization(e) => CliError::ConfigWrite(e.to_string()),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidSite { input, reason } => CliError::InvalidSite { input, reason },

            CoreError::RemoteUnavailable { site, reason } => CliError::ConnectionFailed {
                site,
                source: reason.into(),
            },

            CoreError::Store(e) => CliError::Storage {
                path: String::new(),
                message: e.to_string(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            other @ (CoreError::InsufficientProfileData { .. }
            | CoreError::ProvisioningFailed { .. }
            | CoreError::Directory(_)) => CliError::Internal {
                message: other.to_string(),
            },
        }
    }
}
