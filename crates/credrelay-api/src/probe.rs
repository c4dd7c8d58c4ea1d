// Remote user-info probe
//
// Sends the submitted credentials to a remote site's `/users/me` endpoint
// and classifies the response. Every failure is an outcome, not an error:
// the caller simply moves on to the next site.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::identity::ClientIdentity;
use crate::profile::UserProfile;
use crate::transport::TransportConfig;

/// Fixed user-info path appended to every remote site.
pub const USER_INFO_PATH: &str = "/wp-json/wp/v2/users/me";

/// Result of probing one remote site.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// HTTP 200 with a readable profile: the credentials are valid remotely.
    Success(UserProfile),
    /// HTTP 401: the remote site does not know these credentials.
    AuthRejected,
    /// Any other HTTP status.
    UnexpectedStatus { code: u16 },
    /// The site could not be reached, or answered 200 with an unreadable body.
    Transport(Error),
}

/// HTTP client for credential probes.
///
/// Cheap to share: wraps a single `reqwest::Client` (connection pool) and
/// the identity stamped onto every request.
pub struct ProbeClient {
    http: reqwest::Client,
    identity: ClientIdentity,
    scheme: &'static str,
}

impl ProbeClient {
    /// Build a probe client from a `TransportConfig`.
    pub fn new(identity: ClientIdentity, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client(&identity)?;
        Ok(Self {
            http,
            identity,
            scheme: "https",
        })
    }

    /// Create a probe client with a pre-built `reqwest::Client`.
    ///
    /// The identity header is added per request, so `http` does not need
    /// default headers of its own.
    pub fn with_client(http: reqwest::Client, identity: ClientIdentity) -> Self {
        Self {
            http,
            identity,
            scheme: "https",
        }
    }

    /// Probe over plain HTTP. Local test fixtures only.
    #[cfg(any(test, feature = "plaintext-http"))]
    pub fn with_plaintext_http(mut self) -> Self {
        self.scheme = "http";
        self
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// `https://{site}/wp-json/wp/v2/users/me`
    ///
    /// Fails if `site` carries credentials or would push the user-info path
    /// into a query or fragment.
    pub fn user_info_url(&self, site: &str) -> Result<Url, Error> {
        let site = site.trim_end_matches('/');
        let url = Url::parse(&format!("{}://{site}{USER_INFO_PATH}", self.scheme))?;
        if !url.username().is_empty()
            || url.password().is_some()
            || url.query().is_some()
            || url.fragment().is_some()
            || !url.path().ends_with(USER_INFO_PATH)
        {
            return Err(Error::SiteEscapesPath {
                site: site.into(),
                url: url.into(),
            });
        }
        Ok(url)
    }

    /// Probe `site` with the given credentials. Never retries.
    pub async fn probe(
        &self,
        site: &str,
        identifier: &str,
        password: &SecretString,
    ) -> ProbeOutcome {
        let url = match self.user_info_url(site) {
            Ok(url) => url,
            Err(e) => return ProbeOutcome::Transport(e),
        };

        debug!(%url, "probing remote user-info endpoint");

        let resp = match self
            .http
            .get(url)
            .basic_auth(identifier, Some(password.expose_secret()))
            .header(self.identity.header_name(), self.identity.version())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return ProbeOutcome::Transport(Error::Transport(e)),
        };

        let status = resp.status();
        trace!(site, status = status.as_u16(), "probe response");

        if status == StatusCode::UNAUTHORIZED {
            return ProbeOutcome::AuthRejected;
        }
        if status != StatusCode::OK {
            return ProbeOutcome::UnexpectedStatus {
                code: status.as_u16(),
            };
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => return ProbeOutcome::Transport(Error::Transport(e)),
        };

        match serde_json::from_str::<UserProfile>(&body) {
            Ok(profile) => ProbeOutcome::Success(profile),
            Err(e) => ProbeOutcome::Transport(Error::Deserialization {
                message: e.to_string(),
                body,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    // ── Helpers ─────────────────────────────────────────────────────

    async fn setup() -> (MockServer, ProbeClient, String) {
        let server = MockServer::start().await;
        let site = server.address().to_string();
        let identity = ClientIdentity::new("credrelay-tests", "1.0.0").unwrap();
        let client =
            ProbeClient::with_client(reqwest::Client::new(), identity).with_plaintext_http();
        (server, client, site)
    }

    fn secret(pw: &str) -> SecretString {
        SecretString::from(pw.to_owned())
    }

    // ── URL construction ────────────────────────────────────────────

    #[test]
    fn user_info_url_is_https_with_fixed_path() {
        let client = ProbeClient::with_client(reqwest::Client::new(), ClientIdentity::current());
        let url = client.user_info_url("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/wp-json/wp/v2/users/me");

        let url = client.user_info_url("example.com/blog/").unwrap();
        assert_eq!(url.as_str(), "https://example.com/blog/wp-json/wp/v2/users/me");
    }

    #[test]
    fn user_info_url_refuses_sites_that_move_the_path() {
        let client = ProbeClient::with_client(reqwest::Client::new(), ClientIdentity::current());
        for site in ["example.com#x", "example.com?a=1", "evil@example.com", "u:p@example.com"] {
            let result = client.user_info_url(site);
            assert!(
                matches!(result, Err(Error::SiteEscapesPath { .. })),
                "{site}: {result:?}"
            );
        }
    }

    // ── Outcomes ────────────────────────────────────────────────────

    #[tokio::test]
    async fn success_parses_profile_and_sends_credentials() {
        let (server, client, site) = setup().await;

        // base64("alice@example.com:hunter2")
        Mock::given(method("GET"))
            .and(path(USER_INFO_PATH))
            .and(header(
                "authorization",
                "Basic YWxpY2VAZXhhbXBsZS5jb206aHVudGVyMg==",
            ))
            .and(header("credrelay-tests", "1.0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 123,
                "email": "alice@example.com",
                "username": "alice",
                "name": "Alice"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client
            .probe(&site, "alice@example.com", &secret("hunter2"))
            .await;

        match outcome {
            ProbeOutcome::Success(profile) => assert_eq!(
                profile,
                UserProfile {
                    id: Some(123),
                    email: Some("alice@example.com".into()),
                    username: Some("alice".into()),
                }
            ),
            other => panic!("expected Success, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_is_auth_rejected() {
        let (server, client, site) = setup().await;

        Mock::given(method("GET"))
            .and(path(USER_INFO_PATH))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "invalid_username",
                "data": { "status": 401 }
            })))
            .mount(&server)
            .await;

        let outcome = client.probe(&site, "bob", &secret("nope")).await;
        assert!(matches!(outcome, ProbeOutcome::AuthRejected), "got: {outcome:?}");
    }

    #[tokio::test]
    async fn other_status_is_unexpected() {
        let (server, client, site) = setup().await;

        Mock::given(method("GET"))
            .and(path(USER_INFO_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = client.probe(&site, "bob", &secret("pw")).await;
        assert!(
            matches!(outcome, ProbeOutcome::UnexpectedStatus { code: 404 }),
            "got: {outcome:?}"
        );
    }

    #[tokio::test]
    async fn unreadable_body_is_transport_error() {
        let (server, client, site) = setup().await;

        Mock::given(method("GET"))
            .and(path(USER_INFO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let outcome = client.probe(&site, "bob", &secret("pw")).await;
        match outcome {
            ProbeOutcome::Transport(Error::Deserialization { body, .. }) => {
                assert!(body.contains("maintenance"));
            }
            other => panic!("expected Deserialization, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_site_times_out() {
        let (server, _, site) = setup().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let transport = TransportConfig::default().with_timeout(Duration::from_millis(100));
        let client = ProbeClient::new(ClientIdentity::current(), &transport)
            .unwrap()
            .with_plaintext_http();

        let outcome = client.probe(&site, "bob", &secret("pw")).await;
        match outcome {
            ProbeOutcome::Transport(e) => assert!(e.is_timeout(), "expected timeout, got: {e}"),
            other => panic!("expected Transport, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_site_is_transport_error() {
        let client = ProbeClient::with_client(reqwest::Client::new(), ClientIdentity::current())
            .with_plaintext_http();

        // Port 9 (discard) on localhost is closed in test environments.
        let outcome = client.probe("127.0.0.1:9", "bob", &secret("pw")).await;
        assert!(matches!(outcome, ProbeOutcome::Transport(_)), "got: {outcome:?}");
    }
}
