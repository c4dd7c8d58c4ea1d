// ── Client identity ──
//
// Every outbound probe carries `{name}: {version}`. A remote instance of
// this same system recognizes the header and refuses to forward the
// credentials again, which is what breaks A → B → A loops.

use std::fmt;

use reqwest::header::{HeaderName, HeaderValue};

use crate::error::Error;

/// Name used when no other identity is configured.
pub const DEFAULT_CLIENT_NAME: &str = "credrelay";

/// Name and version this system announces on outbound probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    name: String,
    version: String,
    header_name: HeaderName,
}

impl ClientIdentity {
    /// Build an identity, validating that `name` is a usable header name.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        let version = version.into();
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidHeader(format!("name '{name}': {e}")))?;
        if version.is_empty() {
            return Err(Error::InvalidHeader("version must not be empty".into()));
        }
        HeaderValue::from_str(&version)
            .map_err(|e| Error::InvalidHeader(format!("version '{version}': {e}")))?;
        Ok(Self {
            name,
            version,
            header_name,
        })
    }

    /// The identity of this build: `credrelay` at the crate version.
    pub fn current() -> Self {
        Self {
            name: DEFAULT_CLIENT_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            header_name: HeaderName::from_static(DEFAULT_CLIENT_NAME),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Header name sent on outbound probes (lowercased by `http`).
    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    /// CGI-style variable name a server exposes the header under:
    /// uppercased, hyphens to underscores (`my-relay` → `MY_RELAY`).
    pub fn env_key(&self) -> String {
        normalize_header_key(&self.name)
    }

    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// Whether an inbound header (HTTP or CGI spelling, with or without
    /// the `HTTP_` prefix) is this system's identity header.
    pub fn matches_header(&self, header: &str) -> bool {
        let key = normalize_header_key(header);
        let key = key.strip_prefix("HTTP_").unwrap_or(&key);
        key == self.env_key()
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

fn normalize_header_key(key: &str) -> String {
    key.trim().to_ascii_uppercase().replace('-', "_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn env_key_uppercases_and_replaces_hyphens() {
        let id = ClientIdentity::new("ea-wp-remote-rest-user-authentication", "1.0.0").unwrap();
        assert_eq!(id.env_key(), "EA_WP_REMOTE_REST_USER_AUTHENTICATION");
    }

    #[test]
    fn matches_header_in_http_and_cgi_spelling() {
        let id = ClientIdentity::new("my-relay", "2.1.0").unwrap();
        assert!(id.matches_header("my-relay"));
        assert!(id.matches_header("My-Relay"));
        assert!(id.matches_header("HTTP_MY_RELAY"));
        assert!(id.matches_header("MY_RELAY"));
        assert!(!id.matches_header("my-relay-proxy"));
        assert!(!id.matches_header("authorization"));
    }

    #[test]
    fn rejects_names_that_are_not_header_tokens() {
        assert!(matches!(
            ClientIdentity::new("has space", "1.0.0"),
            Err(Error::InvalidHeader(_))
        ));
        assert!(matches!(
            ClientIdentity::new("relay", ""),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn current_uses_crate_version() {
        let id = ClientIdentity::current();
        assert_eq!(id.name(), DEFAULT_CLIENT_NAME);
        assert_eq!(id.version(), env!("CARGO_PKG_VERSION"));
        assert_eq!(id.header_name().as_str(), "credrelay");
    }
}
