//! CLI configuration: thin wrapper around `credrelay_config`.
//!
//! Resolves the config file (honoring `--config`), the translated
//! `AuthenticatorConfig` and the state file every command works on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use credrelay_core::{
    AuthenticatorConfig, CoreError, FileStore, SiteRegistry, SystemClock, UsageCounters,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use credrelay_config::{Config, config_path, load_config, save_config, to_authenticator_config};

// ── Command context ─────────────────────────────────────────────────

pub struct Context {
    pub config: Config,
    pub auth: AuthenticatorConfig,
    pub config_path: PathBuf,
    store: Arc<FileStore>,
}

impl Context {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let config_path = active_config_path(global);
        let config = load_config(Some(&config_path))?;
        let auth = to_authenticator_config(&config)?;
        let store = Arc::new(FileStore::new(config.state_path()));
        tracing::debug!(
            config = %config_path.display(),
            state = %store.path().display(),
            "configuration resolved"
        );
        Ok(Self {
            config,
            auth,
            config_path,
            store,
        })
    }

    pub fn state_path(&self) -> &Path {
        self.store.path()
    }

    pub fn registry(&self) -> Result<SiteRegistry, CliError> {
        SiteRegistry::load(self.store.clone()).map_err(|e| self.core_error(e))
    }

    pub fn counters(&self) -> UsageCounters {
        UsageCounters::new(self.store.clone(), Arc::new(SystemClock))
            .with_retention(self.auth.counter_retention)
    }

    /// Like `CliError::from`, with the state file filled in.
    pub fn core_error(&self, err: CoreError) -> CliError {
        match CliError::from(err) {
            CliError::Storage { message, .. } => CliError::Storage {
                path: self.state_path().display().to_string(),
                message,
            },
            other => other,
        }
    }
}

/// `--config` / `CREDRELAY_CONFIG`, else the platform location.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}
