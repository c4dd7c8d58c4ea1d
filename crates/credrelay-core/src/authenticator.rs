// ── Authenticator ──
//
// Entry point the host calls late in its login pipeline, after local
// password checks have had their chance. Walks the remote sites in order
// and stops at the first one that accepts the credentials.

use std::sync::Arc;

use credrelay_api::{ProbeClient, ProbeOutcome};
use secrecy::SecretString;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::AuthenticatorConfig;
use crate::counters::UsageCounters;
use crate::error::CoreError;
use crate::host::{AccountDirectory, HostPipeline};
use crate::model::{AccountId, AuthResult, LocalAccount, LoginAttempt};
use crate::probe::CredentialProbe;
use crate::reconciler::Reconciler;
use crate::registry::SiteRegistry;
use crate::request::RequestContext;
use crate::store::{CounterStore, SettingsStore};

// ── Host ────────────────────────────────────────────────────────────

/// Everything the relay borrows from its host.
#[derive(Clone)]
pub struct Host {
    pub directory: Arc<dyn AccountDirectory>,
    pub pipeline: Arc<dyn HostPipeline>,
    pub settings: Arc<dyn SettingsStore>,
    pub counters: Arc<dyn CounterStore>,
    pub clock: Arc<dyn Clock>,
}

impl Host {
    /// A host whose settings and counters share one store, on the
    /// system clock.
    pub fn new<S>(
        directory: Arc<dyn AccountDirectory>,
        pipeline: Arc<dyn HostPipeline>,
        store: Arc<S>,
    ) -> Self
    where
        S: SettingsStore + CounterStore + 'static,
    {
        Self {
            directory,
            pipeline,
            settings: store.clone(),
            counters: store,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

// ── Authenticator ───────────────────────────────────────────────────

pub struct Authenticator {
    config: AuthenticatorConfig,
    registry: SiteRegistry,
    counters: UsageCounters,
    reconciler: Reconciler,
    probe: Arc<dyn CredentialProbe>,
}

impl Authenticator {
    /// Build an authenticator that probes over HTTPS.
    pub fn new(config: AuthenticatorConfig, host: Host) -> Result<Self, CoreError> {
        let client = ProbeClient::new(config.identity.clone(), &config.transport)?;
        Self::with_probe(config, host, Arc::new(client))
    }

    /// Build an authenticator around an existing probe.
    pub fn with_probe(
        config: AuthenticatorConfig,
        host: Host,
        probe: Arc<dyn CredentialProbe>,
    ) -> Result<Self, CoreError> {
        let registry = SiteRegistry::load(host.settings)?;
        let counters = UsageCounters::new(host.counters, host.clock)
            .with_retention(config.counter_retention);
        Ok(Self {
            config,
            registry,
            counters,
            reconciler: Reconciler::new(host.directory, host.pipeline),
            probe,
        })
    }

    pub fn config(&self) -> &AuthenticatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    pub fn counters(&self) -> &UsageCounters {
        &self.counters
    }

    /// Try to authenticate a login form submission against the remote
    /// sites.
    ///
    /// `current` is whatever earlier authenticators produced. It comes
    /// back unchanged unless a remote site accepts the credentials (an
    /// account) or accepts them but cannot tell us who the user is (a
    /// user-facing error).
    pub async fn authenticate(
        &self,
        current: AuthResult,
        identifier: &str,
        password: &SecretString,
    ) -> AuthResult {
        match &current {
            AuthResult::Authenticated(account) => {
                debug!(account_id = %account.id, "already authenticated");
                return current;
            }
            AuthResult::Other(value) => {
                warn!(value = %value, "unexpected authentication result, continuing");
            }
            AuthResult::Unauthenticated | AuthResult::Failed(_) => {}
        }

        let attempt = LoginAttempt::new(identifier, password.clone());
        if attempt.is_incomplete() {
            return current;
        }

        match self.relay(&attempt).await {
            Ok(Some(account)) => AuthResult::Authenticated(account),
            Ok(None) => current,
            Err(e) => match e.user_facing() {
                Some(shown) => {
                    warn!(error = %e, "remote login refused");
                    AuthResult::Failed(shown)
                }
                None => {
                    error!(error = %e, "remote authentication aborted");
                    current
                }
            },
        }
    }

    /// Resolve the user for a request carrying HTTP Basic credentials.
    ///
    /// Only active with `basic_auth_forwarding`. Leaves `current` alone
    /// when a user is already resolved, when there are no credentials, or
    /// when the request came from another instance of this system.
    pub async fn resolve_current_user(
        &self,
        current: Option<AccountId>,
        request: &RequestContext,
    ) -> Option<AccountId> {
        if !self.config.basic_auth_forwarding || current.is_some() {
            return current;
        }
        let (user, password) = request.basic_credentials()?;

        if request.identity_header(&self.config.identity).is_some() {
            debug!(
                user_agent = request.header("user-agent").unwrap_or_default(),
                "request came from a relay, not forwarding"
            );
            return current;
        }

        self.authenticate(AuthResult::Unauthenticated, user, password)
            .await
            .account()
            .map(|account| account.id)
    }

    async fn relay(&self, attempt: &LoginAttempt) -> Result<Option<LocalAccount>, CoreError> {
        let local = self.reconciler.find_local(attempt).await?;
        // Remote sites know the user by email.
        let probe_identifier = local
            .as_ref()
            .map_or(attempt.identifier(), |account| account.email.as_str())
            .to_owned();

        let sites = self.registry.list();
        if sites.is_empty() {
            return Ok(None);
        }

        let today = self.counters.clock().today();
        if let Err(e) = self.counters.record_attempt(today) {
            error!(error = %e, "could not record relay attempt");
        }

        let mut local = local;
        for site in &sites {
            let profile = match self
                .probe
                .probe(site, &probe_identifier, attempt.password())
                .await
            {
                ProbeOutcome::Success(profile) => profile,
                ProbeOutcome::AuthRejected => {
                    debug!(site = %site, "remote site rejected credentials");
                    continue;
                }
                ProbeOutcome::UnexpectedStatus { code } => {
                    warn!(site = %site, status = code, "unexpected response from remote site");
                    continue;
                }
                ProbeOutcome::Transport(e) => {
                    error!(site = %site, error = %e, "remote site probe failed");
                    continue;
                }
            };

            info!(site = %site, remote_id = ?profile.id, "remote site accepted credentials");
            if let Err(e) = self.counters.record_success(today, site.as_str()) {
                error!(site = %site, error = %e, "could not record remote success");
            }

            if let Some(account) = local.take() {
                let account = self
                    .reconciler
                    .update_existing(account, site, &profile, attempt.password())
                    .await?;
                return Ok(Some(account));
            }

            match self.reconciler.provision(attempt, site, &profile).await {
                Ok(account) => return Ok(Some(account)),
                Err(e @ CoreError::InsufficientProfileData { .. }) => return Err(e),
                Err(e) => {
                    error!(site = %site, error = %e, "could not provision local account");
                }
            }
        }

        debug!(sites = sites.len(), "no remote site accepted credentials");
        Ok(None)
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("registry", &self.registry)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}
