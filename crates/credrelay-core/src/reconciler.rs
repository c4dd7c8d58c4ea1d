// ── Account reconciliation ──
//
// Turns a successful remote probe into a local account: either the account
// the login form already pointed at (password synced, remote id linked) or
// a freshly provisioned one built from the remote profile.

use std::sync::Arc;

use credrelay_api::UserProfile;
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::host::{AccountDirectory, HostPipeline};
use crate::model::{
    AccountId, IdentifierKind, LocalAccount, LoginAttempt, NewAccount, RemoteSite,
    login_from_email,
};

/// Login name and email for an account about to be provisioned. The login
/// is a base name; collisions are resolved separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPlan {
    pub login: String,
    pub email: String,
}

/// Work out who to provision from the login identifier and the remote
/// profile.
///
/// A username login needs the remote site to reveal an email; an email
/// login takes the remote username, or falls back to the email's local
/// part.
pub fn plan_new_account(
    identifier: &str,
    site: &RemoteSite,
    profile: &UserProfile,
) -> Result<AccountPlan, CoreError> {
    match IdentifierKind::of(identifier) {
        IdentifierKind::Login => {
            let email = profile
                .email()
                .ok_or_else(|| CoreError::InsufficientProfileData {
                    site: site.to_string(),
                })?;
            Ok(AccountPlan {
                login: identifier.to_owned(),
                email: email.to_owned(),
            })
        }
        IdentifierKind::Email => {
            let login = profile
                .username()
                .map_or_else(|| login_from_email(identifier), str::to_owned);
            Ok(AccountPlan {
                login,
                email: identifier.to_owned(),
            })
        }
    }
}

pub struct Reconciler {
    directory: Arc<dyn AccountDirectory>,
    pipeline: Arc<dyn HostPipeline>,
}

impl Reconciler {
    pub fn new(directory: Arc<dyn AccountDirectory>, pipeline: Arc<dyn HostPipeline>) -> Self {
        Self {
            directory,
            pipeline,
        }
    }

    /// The local account the login form refers to, by email or login name.
    pub async fn find_local(
        &self,
        attempt: &LoginAttempt,
    ) -> Result<Option<LocalAccount>, CoreError> {
        let found = match attempt.kind() {
            IdentifierKind::Email => self.directory.find_by_email(attempt.identifier()).await?,
            IdentifierKind::Login => self.directory.find_by_login(attempt.identifier()).await?,
        };
        Ok(found)
    }

    /// First free login among `base`, `base2`, `base3`, …
    pub async fn resolve_unique_login(&self, base: &str) -> Result<String, CoreError> {
        if self.directory.find_by_login(base).await?.is_none() {
            return Ok(base.to_owned());
        }
        let mut suffix: u64 = 2;
        loop {
            let candidate = format!("{base}{suffix}");
            if self.directory.find_by_login(&candidate).await?.is_none() {
                debug!(base, login = %candidate, "login name taken, using suffix");
                return Ok(candidate);
            }
            suffix += 1;
        }
    }

    /// Sync a matched local account with the remote one.
    pub async fn update_existing(
        &self,
        account: LocalAccount,
        site: &RemoteSite,
        profile: &UserProfile,
        password: &SecretString,
    ) -> Result<LocalAccount, CoreError> {
        let id = account.id;
        self.directory.set_password(id, password).await?;
        self.directory.clear_force_password_change(id).await?;
        match profile.id {
            Some(remote_id) => {
                self.directory
                    .link_remote(id, site.as_str(), remote_id)
                    .await?;
            }
            None => warn!(site = %site, account_id = %id, "remote profile has no user id"),
        }
        self.pipeline.suppress_remaining_authenticators();

        info!(site = %site, account_id = %id, "local password synced from remote site");
        self.refetch(id, account).await
    }

    /// Create a local account for a user only the remote site knows.
    pub async fn provision(
        &self,
        attempt: &LoginAttempt,
        site: &RemoteSite,
        profile: &UserProfile,
    ) -> Result<LocalAccount, CoreError> {
        let plan = plan_new_account(attempt.identifier(), site, profile)?;
        let login = self.resolve_unique_login(&plan.login).await?;

        self.pipeline.before_register_new_user();
        let request = NewAccount::silent(&login, &plan.email);
        let id = self.directory.create(&request).await.map_err(|e| {
            CoreError::ProvisioningFailed {
                login: login.clone(),
                reason: e.to_string(),
            }
        })?;

        self.directory.set_password(id, attempt.password()).await?;
        self.directory.clear_force_password_change(id).await?;
        self.pipeline.suppress_remaining_authenticators();

        info!(site = %site, account_id = %id, login = %login, "provisioned local account");
        let fallback = LocalAccount {
            id,
            login,
            email: plan.email,
            force_password_change: false,
            linked_remote_ids: Default::default(),
        };
        self.refetch(id, fallback).await
    }

    async fn refetch(
        &self,
        id: AccountId,
        fallback: LocalAccount,
    ) -> Result<LocalAccount, CoreError> {
        Ok(self.directory.find_by_id(id).await?.unwrap_or(fallback))
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}
