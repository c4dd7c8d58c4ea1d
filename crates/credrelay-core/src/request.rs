// ── Inbound request context ──
//
// What the forwarding entry point needs to know about the current HTTP
// request: its headers and any Basic credentials the server already
// decoded (or that arrived in an `Authorization` header).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use credrelay_api::ClientIdentity;
use secrecy::SecretString;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    headers: Vec<(String, String)>,
    basic: Option<(String, SecretString)>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header. A `Authorization: Basic …` header also sets the Basic
    /// credentials, unless they were already set explicitly.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if self.basic.is_none() && is_authorization(&name) {
            self.basic = decode_basic(&value);
        }
        self.headers.push((name, value));
        self
    }

    /// Credentials the server decoded itself (`PHP_AUTH_USER`-style).
    #[must_use]
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: SecretString) -> Self {
        self.basic = Some((user.into(), password));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn basic_credentials(&self) -> Option<(&str, &SecretString)> {
        self.basic.as_ref().map(|(user, pw)| (user.as_str(), pw))
    }

    /// Value of `identity`'s loop-prevention header, in either spelling.
    pub fn identity_header(&self, identity: &ClientIdentity) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| identity.matches_header(k))
            .map(|(_, v)| v.as_str())
    }
}

fn is_authorization(name: &str) -> bool {
    name.eq_ignore_ascii_case("authorization") || name.eq_ignore_ascii_case("HTTP_AUTHORIZATION")
}

fn decode_basic(value: &str) -> Option<(String, SecretString)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_owned(), SecretString::from(password)))
}
