// ── Runtime authenticator configuration ──
//
// Describes how the relay behaves: who it says it is, how long it waits,
// how long counters live. Never touches disk; credrelay-config (or the
// embedding host) builds one and hands it in.

use chrono::Duration;
use credrelay_api::{ClientIdentity, TransportConfig};

use crate::counters::DEFAULT_RETENTION_DAYS;
use crate::rest_fields::UserFieldExposure;

/// Bounds for the backward walk over daily counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    /// Days always checked, even when they have no records.
    pub min_days: u32,
    /// Hard stop, regardless of data.
    pub max_lookback_days: u32,
}

impl Default for StatsWindow {
    fn default() -> Self {
        Self {
            min_days: 7,
            max_lookback_days: 366,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthenticatorConfig {
    /// Name and version sent in the loop-prevention header.
    pub identity: ClientIdentity,
    /// Probe timeout and TLS roots.
    pub transport: TransportConfig,
    /// How long a day's counters survive their last write.
    pub counter_retention: Duration,
    pub stats: StatsWindow,
    /// Relay inbound HTTP Basic credentials as well as login forms.
    pub basic_auth_forwarding: bool,
    pub rest_fields: UserFieldExposure,
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self {
            identity: ClientIdentity::current(),
            transport: TransportConfig::default(),
            counter_retention: Duration::days(DEFAULT_RETENTION_DAYS.into()),
            stats: StatsWindow::default(),
            basic_auth_forwarding: false,
            rest_fields: UserFieldExposure::default(),
        }
    }
}
