// ── Host integration seams ──
//
// The relay never owns accounts or the authentication pipeline. The host
// hands in an `AccountDirectory` (account lookup and mutation) and a
// `HostPipeline` (side effects on the rest of its login chain).

pub mod memory;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::DirectoryError;
use crate::model::{AccountId, LocalAccount, NewAccount};

pub use memory::MemoryDirectory;

/// The host's local account storage.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<LocalAccount>, DirectoryError>;

    async fn find_by_login(&self, login: &str) -> Result<Option<LocalAccount>, DirectoryError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<LocalAccount>, DirectoryError>;

    /// Create an account. The password is set separately.
    async fn create(&self, account: &NewAccount) -> Result<AccountId, DirectoryError>;

    async fn set_password(&self, id: AccountId, password: &SecretString)
    -> Result<(), DirectoryError>;

    /// Stop nagging the user to replace an auto-generated password.
    async fn clear_force_password_change(&self, id: AccountId) -> Result<(), DirectoryError>;

    /// Record which remote user `id` corresponds to on `site`.
    async fn link_remote(
        &self,
        id: AccountId,
        site: &str,
        remote_id: u64,
    ) -> Result<(), DirectoryError>;
}

/// Side effects on the host's authentication pipeline.
pub trait HostPipeline: Send + Sync {
    /// Stop any authenticator queued after this one from overriding the
    /// result (local password checks would reject the relayed password).
    fn suppress_remaining_authenticators(&self);

    /// Called right before a new account is provisioned, so the host can
    /// switch off registration checks (captcha and the like).
    fn before_register_new_user(&self) {}
}

/// A pipeline with nothing to suppress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPipeline;

impl HostPipeline for NoopPipeline {
    fn suppress_remaining_authenticators(&self) {}
}
