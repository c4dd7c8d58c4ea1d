// ── Local account types ──
//
// The host owns account storage; these are the views the relay reads and
// the requests it issues. Passwords never appear here.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── AccountId ───────────────────────────────────────────────────────

/// Opaque identifier of a local account, as assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<u64> for AccountId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ── LocalAccount ────────────────────────────────────────────────────

/// A local account as seen by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalAccount {
    pub id: AccountId,
    /// Login name (unique per host).
    pub login: String,
    pub email: String,
    /// Host nags the user to change an auto-generated password while set.
    #[serde(default)]
    pub force_password_change: bool,
    /// Remote user id per remote site name, recorded after a successful
    /// relay through that site.
    #[serde(default)]
    pub linked_remote_ids: BTreeMap<String, u64>,
}

impl LocalAccount {
    pub fn remote_id_for(&self, site: &str) -> Option<u64> {
        self.linked_remote_ids.get(site).copied()
    }
}

// ── NewAccount ──────────────────────────────────────────────────────

/// Provisioning request handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub login: String,
    pub email: String,
    /// Whether the host should send its usual "welcome / set password"
    /// mail. The relay always provisions silently.
    pub send_notification: bool,
}

impl NewAccount {
    pub fn silent(login: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            email: email.into(),
            send_notification: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn account_id_display_and_parse() {
        let id: AccountId = "456".parse().unwrap();
        assert_eq!(id, AccountId(456));
        assert_eq!(id.to_string(), "456");
        assert!("abc".parse::<AccountId>().is_err());
    }

    #[test]
    fn remote_id_lookup() {
        let mut account = LocalAccount {
            id: AccountId(1),
            login: "bob".into(),
            email: "bob@example.com".into(),
            force_password_change: false,
            linked_remote_ids: BTreeMap::new(),
        };
        assert_eq!(account.remote_id_for("example.com"), None);
        account.linked_remote_ids.insert("example.com".into(), 123);
        assert_eq!(account.remote_id_for("example.com"), Some(123));
    }

    #[test]
    fn new_account_is_silent() {
        let new = NewAccount::silent("bob", "bob@example.com");
        assert!(!new.send_notification);
    }
}
