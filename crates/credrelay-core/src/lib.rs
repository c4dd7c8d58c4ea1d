//! Remote credential relay between a host's login pipeline and
//! `credrelay-api`.
//!
//! When local authentication fails, the relay replays the submitted
//! credentials against trusted remote sites and, on the first success,
//! maps the remote user onto a local account:
//!
//! - **[`Authenticator`]**: Entry point. [`authenticate()`](Authenticator::authenticate)
//!   handles login form submissions,
//!   [`resolve_current_user()`](Authenticator::resolve_current_user) handles
//!   forwarded HTTP Basic credentials.
//!
//! - **[`SiteRegistry`]**: Ordered, persisted list of [`RemoteSite`]s.
//!
//! - **[`UsageCounters`]**: Day-keyed attempt and success counts with a
//!   sliding expiry.
//!
//! - **[`Reconciler`]**: Syncs a matched local account or provisions a new
//!   one, resolving login name collisions.
//!
//! - **Host seams** ([`host`], [`store`]): [`AccountDirectory`],
//!   [`HostPipeline`], [`SettingsStore`] and [`CounterStore`] are
//!   implemented by the embedding application. In-memory and JSON-file
//!   implementations ship with the crate.

pub mod authenticator;
pub mod clock;
pub mod config;
pub mod counters;
pub mod error;
pub mod host;
pub mod model;
pub mod probe;
pub mod reconciler;
pub mod registry;
pub mod request;
pub mod rest_fields;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use authenticator::{Authenticator, Host};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AuthenticatorConfig, StatsWindow};
pub use counters::{COUNTER_KEY_PREFIX, StatsRange, TOTAL, UsageCounters, counter_key};
pub use error::{CoreError, DirectoryError};
pub use host::{AccountDirectory, HostPipeline, MemoryDirectory, NoopPipeline};
pub use probe::CredentialProbe;
pub use reconciler::{AccountPlan, Reconciler, plan_new_account};
pub use registry::{SITES_SETTING_KEY, SiteRegistry};
pub use request::RequestContext;
pub use rest_fields::UserFieldExposure;
pub use store::{
    CounterRecord, CounterStore, DailyCounts, FileStore, MemoryStore, SettingsStore, StoreError,
};

pub use model::{
    AccountId, AuthError, AuthResult, IdentifierKind, LocalAccount, LoginAttempt, NewAccount,
    RemoteSite,
};

// ── Transport re-exports ────────────────────────────────────────────
pub use credrelay_api::{
    ClientIdentity, ProbeClient, ProbeOutcome, TlsMode, TransportConfig, USER_INFO_PATH,
    UserProfile,
};
