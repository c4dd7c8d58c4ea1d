// ── Core error types ──
//
// Only `InsufficientProfileData` ever reaches an end user, and then only
// as an `AuthError`. Everything else is for logs and administrative
// tooling. The `From<credrelay_api::Error>` impl translates transport
// errors into domain variants.

use thiserror::Error;

use crate::model::AuthError;
use crate::store::StoreError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    /// The remote site accepted the credentials but we have no email to
    /// create a local account with.
    #[error("remote site {site} authenticated the user but returned no email address")]
    InsufficientProfileData { site: String },

    // ── Accounts ─────────────────────────────────────────────────────
    #[error("could not provision local account '{login}': {reason}")]
    ProvisioningFailed { login: String, reason: String },

    #[error("account directory error: {0}")]
    Directory(#[from] DirectoryError),

    // ── Remote sites ─────────────────────────────────────────────────
    #[error("invalid remote site '{input}': {reason}")]
    InvalidSite { input: String, reason: String },

    #[error("cannot reach remote site {site}: {reason}")]
    RemoteUnavailable { site: String, reason: String },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    // ── Configuration ────────────────────────────────────────────────
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// The user-safe form of this error, if it should be shown at all.
    pub fn user_facing(&self) -> Option<AuthError> {
        match self {
            Self::InsufficientProfileData { .. } => Some(AuthError::use_email_address()),
            _ => None,
        }
    }
}

/// Errors reported by the host's account directory.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// The host refused the operation (invalid login name, duplicate email…).
    #[error("rejected by host: {0}")]
    Rejected(String),

    #[error("account {0} does not exist")]
    UnknownAccount(u64),

    /// The directory could not be reached.
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<credrelay_api::Error> for CoreError {
    fn from(err: credrelay_api::Error) -> Self {
        match err {
            credrelay_api::Error::Transport(ref e) => CoreError::RemoteUnavailable {
                site: e
                    .url()
                    .and_then(|u| u.host_str().map(String::from))
                    .unwrap_or_else(|| "<unknown>".into()),
                reason: e.to_string(),
            },
            credrelay_api::Error::InvalidUrl(e) => CoreError::InvalidSite {
                input: String::new(),
                reason: e.to_string(),
            },
            credrelay_api::Error::SiteEscapesPath { site, url } => CoreError::InvalidSite {
                input: site,
                reason: format!("resolves to {url}"),
            },
            credrelay_api::Error::Tls(message) | credrelay_api::Error::InvalidHeader(message) => {
                CoreError::Config { message }
            }
            credrelay_api::Error::Deserialization { message, body: _ } => {
                CoreError::RemoteUnavailable {
                    site: "<unknown>".into(),
                    reason: format!("unreadable user-info response: {message}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_email_is_user_facing() {
        let err = CoreError::InsufficientProfileData {
            site: "example.com".into(),
        };
        let shown = err.user_facing();
        assert_eq!(shown, Some(AuthError::use_email_address()));
        // The site name is internal detail.
        assert!(!shown.map(|e| e.message).unwrap_or_default().contains("example.com"));

        let err = CoreError::ProvisioningFailed {
            login: "bob".into(),
            reason: "duplicate email".into(),
        };
        assert_eq!(err.user_facing(), None);
    }
}
