// ── In-memory account directory ──
//
// Directory for tests and for embedders without a real user store. Email
// lookups are case-insensitive and logins are unique.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};

use super::AccountDirectory;
use crate::error::DirectoryError;
use crate::model::{AccountId, LocalAccount, NewAccount};

#[derive(Debug)]
pub struct MemoryDirectory {
    accounts: DashMap<AccountId, LocalAccount>,
    passwords: DashMap<AccountId, SecretString>,
    notified: DashMap<AccountId, bool>,
    next_id: AtomicU64,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self {
            accounts: DashMap::new(),
            passwords: DashMap::new(),
            notified: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an existing account with a password. Returns its id.
    pub fn seed(&self, login: &str, email: &str, password: &str) -> AccountId {
        let id = AccountId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.accounts.insert(
            id,
            LocalAccount {
                id,
                login: login.to_owned(),
                email: email.to_owned(),
                force_password_change: false,
                linked_remote_ids: Default::default(),
            },
        );
        self.passwords.insert(id, SecretString::from(password));
        id
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, id: AccountId) -> Option<LocalAccount> {
        self.accounts.get(&id).map(|a| a.value().clone())
    }

    pub fn password_matches(&self, id: AccountId, candidate: &str) -> bool {
        self.passwords
            .get(&id)
            .is_some_and(|p| p.expose_secret() == candidate)
    }

    /// Whether the host would have sent a welcome notification for `id`.
    pub fn was_notified(&self, id: AccountId) -> bool {
        self.notified.get(&id).is_some_and(|n| *n)
    }

    fn find(&self, pred: impl Fn(&LocalAccount) -> bool) -> Option<LocalAccount> {
        self.accounts
            .iter()
            .find(|entry| pred(entry.value()))
            .map(|entry| entry.value().clone())
    }

    fn update(
        &self,
        id: AccountId,
        f: impl FnOnce(&mut LocalAccount),
    ) -> Result<(), DirectoryError> {
        let mut account = self
            .accounts
            .get_mut(&id)
            .ok_or(DirectoryError::UnknownAccount(id.0))?;
        f(account.value_mut());
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for MemoryDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<LocalAccount>, DirectoryError> {
        Ok(self.find(|a| a.email.eq_ignore_ascii_case(email)))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<LocalAccount>, DirectoryError> {
        Ok(self.find(|a| a.login == login))
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<LocalAccount>, DirectoryError> {
        Ok(self.get(id))
    }

    async fn create(&self, account: &NewAccount) -> Result<AccountId, DirectoryError> {
        if account.login.trim().is_empty() {
            return Err(DirectoryError::Rejected("empty login name".into()));
        }
        if self.find(|a| a.login == account.login).is_some() {
            return Err(DirectoryError::Rejected(format!(
                "login '{}' is taken",
                account.login
            )));
        }
        if self
            .find(|a| a.email.eq_ignore_ascii_case(&account.email))
            .is_some()
        {
            return Err(DirectoryError::Rejected(format!(
                "email '{}' is already registered",
                account.email
            )));
        }

        let id = AccountId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.accounts.insert(
            id,
            LocalAccount {
                id,
                login: account.login.clone(),
                email: account.email.clone(),
                force_password_change: true,
                linked_remote_ids: Default::default(),
            },
        );
        self.notified.insert(id, account.send_notification);
        Ok(id)
    }

    async fn set_password(
        &self,
        id: AccountId,
        password: &SecretString,
    ) -> Result<(), DirectoryError> {
        if !self.accounts.contains_key(&id) {
            return Err(DirectoryError::UnknownAccount(id.0));
        }
        self.passwords.insert(id, password.clone());
        Ok(())
    }

    async fn clear_force_password_change(&self, id: AccountId) -> Result<(), DirectoryError> {
        self.update(id, |a| a.force_password_change = false)
    }

    async fn link_remote(
        &self,
        id: AccountId,
        site: &str,
        remote_id: u64,
    ) -> Result<(), DirectoryError> {
        self.update(id, |a| {
            a.linked_remote_ids.insert(site.to_owned(), remote_id);
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn email_lookup_ignores_case() {
        let dir = MemoryDirectory::new();
        let id = dir.seed("bob", "Bob@Example.com", "pw");
        let found = dir.find_by_email("bob@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(dir.find_by_login("Bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_taken_login_and_empty_login() {
        let dir = MemoryDirectory::new();
        dir.seed("bob", "bob@example.com", "pw");

        let err = dir
            .create(&NewAccount::silent("bob", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Rejected(_)));

        let err = dir
            .create(&NewAccount::silent("  ", "x@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Rejected(_)));
        assert_eq!(dir.len(), 1);
    }

    #[tokio::test]
    async fn mutations_on_unknown_account_fail() {
        let dir = MemoryDirectory::new();
        let err = dir
            .set_password(AccountId(42), &SecretString::from("pw"))
            .await
            .unwrap_err();
        assert_eq!(err, DirectoryError::UnknownAccount(42));
        assert_eq!(
            dir.link_remote(AccountId(42), "example.com", 1).await,
            Err(DirectoryError::UnknownAccount(42))
        );
    }
}
