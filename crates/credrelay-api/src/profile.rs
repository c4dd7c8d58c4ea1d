// ── Remote profile ──
//
// The subset of the `/users/me` representation the relay cares about.
// `email` and `username` are only present when the remote site exposes
// them (see the field exposure policy in credrelay-core).

use serde::{Deserialize, Serialize};

/// Profile returned by a remote site that accepted the credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Numeric user id on the remote site.
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl UserProfile {
    /// Email, ignoring empty strings.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }

    /// Username, ignoring empty strings.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.trim().is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_body() {
        let p: UserProfile = serde_json::from_str(r#"{"id": 123}"#).unwrap();
        assert_eq!(p.id, Some(123));
        assert_eq!(p.email(), None);
        assert_eq!(p.username(), None);
    }

    #[test]
    fn ignores_unknown_fields_and_blank_values() {
        let p: UserProfile = serde_json::from_str(
            r#"{"id": 7, "name": "Bob", "email": "", "username": "bob", "link": "https://x"}"#,
        )
        .unwrap();
        assert_eq!(p.email(), None);
        assert_eq!(p.username(), Some("bob"));
    }
}
