// ── Login attempt and authentication result ──

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::account::LocalAccount;
use super::identifier::IdentifierKind;

/// Credentials submitted on the login form (or via Basic auth).
///
/// `Debug` redacts the password.
#[derive(Clone)]
pub struct LoginAttempt {
    identifier: String,
    password: SecretString,
}

impl LoginAttempt {
    pub fn new(identifier: impl Into<String>, password: SecretString) -> Self {
        Self {
            identifier: identifier.into(),
            password,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn kind(&self) -> IdentifierKind {
        IdentifierKind::of(&self.identifier)
    }

    /// The login form has not been submitted yet (or was submitted empty).
    pub fn is_incomplete(&self) -> bool {
        self.identifier.is_empty() || self.password.expose_secret().is_empty()
    }
}

impl fmt::Debug for LoginAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginAttempt")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A user-safe authentication error. Carries a machine code and the text
/// shown on the login form; never internal diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthError {
    pub code: String,
    pub message: String,
}

impl AuthError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Authenticated remotely, but no email to provision a local account.
    pub fn use_email_address() -> Self {
        Self::new("potential_remote_user", "Please login using your email address.")
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// What the host's authentication pipeline currently holds for a request.
///
/// Flows in from earlier authenticators and back out to later ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    /// Nothing has authenticated the request yet.
    Unauthenticated,
    /// An authenticator rejected the attempt.
    Failed(AuthError),
    /// The request is authenticated as this account.
    Authenticated(LocalAccount),
    /// A value the pipeline did not expect; carried through untouched.
    Other(String),
}

impl AuthResult {
    pub fn account(&self) -> Option<&LocalAccount> {
        match self {
            Self::Authenticated(account) => Some(account),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
