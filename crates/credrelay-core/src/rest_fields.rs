// ── User resource field exposure ──
//
// Remote sites only return `email` and `username` from `/users/me` when
// they add those fields to their user resource. This is the policy a host
// applies when it serves that resource for its own accounts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::LocalAccount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFieldExposure {
    #[serde(rename = "add_email_to_user_rest")]
    pub email: bool,
    #[serde(rename = "add_username_to_user_rest")]
    pub username: bool,
}

impl Default for UserFieldExposure {
    fn default() -> Self {
        Self {
            email: true,
            username: true,
        }
    }
}

impl UserFieldExposure {
    /// Extra fields to merge into the user resource for `account`.
    pub fn fields_for(&self, account: &LocalAccount) -> Map<String, Value> {
        let mut fields = Map::new();
        if self.email {
            fields.insert("email".into(), Value::String(account.email.clone()));
        }
        if self.username {
            fields.insert("username".into(), Value::String(account.login.clone()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::AccountId;

    fn account() -> LocalAccount {
        LocalAccount {
            id: AccountId(3),
            login: "bob".into(),
            email: "bob@example.com".into(),
            force_password_change: false,
            linked_remote_ids: Default::default(),
        }
    }

    #[test]
    fn both_fields_by_default() {
        let fields = UserFieldExposure::default().fields_for(&account());
        assert_eq!(
            Value::Object(fields),
            json!({"email": "bob@example.com", "username": "bob"})
        );
    }

    #[test]
    fn fields_toggle_independently() {
        let policy = UserFieldExposure {
            email: false,
            username: true,
        };
        assert_eq!(
            Value::Object(policy.fields_for(&account())),
            json!({"username": "bob"})
        );
        let none = UserFieldExposure {
            email: false,
            username: false,
        };
        assert!(none.fields_for(&account()).is_empty());
    }
}
