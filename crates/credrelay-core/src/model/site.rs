// ── Remote site ──

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;

/// Characters that would move the user-info path into a query, fragment or
/// credentials section once the site is spliced into a URL.
const FORBIDDEN: [char; 4] = ['?', '#', '@', '\\'];

/// A trusted remote deployment, stored as a bare host (plus optional
/// sub-directory path): no scheme, nothing from `/wp-json` onward, no
/// trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteSite(String);

impl RemoteSite {
    /// Normalize raw admin input into a site.
    ///
    /// `https://example.com/wp-json/wp/v2/` → `example.com`
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let site = normalize(raw);
        if site.is_empty() {
            return Err(CoreError::InvalidSite {
                input: raw.into(),
                reason: "no host name left after normalization".into(),
            });
        }
        if site.contains("://") || site.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidSite {
                input: raw.into(),
                reason: "expected a host name such as 'example.com'".into(),
            });
        }
        if let Some(c) = site.chars().find(|c| FORBIDDEN.contains(c)) {
            return Err(CoreError::InvalidSite {
                input: raw.into(),
                reason: format!("'{c}' is not allowed in a site"),
            });
        }
        check_authority_and_path(raw, &site)?;
        Ok(Self(site))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `https://{site}` must parse back to exactly the stored host and path.
fn check_authority_and_path(raw: &str, site: &str) -> Result<(), CoreError> {
    let invalid = |reason: String| CoreError::InvalidSite {
        input: raw.into(),
        reason,
    };

    let url = Url::parse(&format!("https://{site}")).map_err(|e| invalid(e.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| invalid("no host name".into()))?;

    let path = url.path().trim_end_matches('/');
    let rebuilt = match url.port() {
        Some(port) => format!("{host}:{port}{path}"),
        None => format!("{host}{path}"),
    };
    // The url crate drops an explicit default port.
    let with_default_port = format!("{host}:443{path}");

    if rebuilt.eq_ignore_ascii_case(site) || with_default_port.eq_ignore_ascii_case(site) {
        Ok(())
    } else {
        Err(invalid(format!("resolves to '{rebuilt}'")))
    }
}

/// Strip `http://` / `https://`, cut at `/wp-json`, drop trailing slashes.
pub(crate) fn normalize(raw: &str) -> String {
    let s = raw.trim();
    let s = s.strip_prefix("http://").unwrap_or(s);
    let s = s.strip_prefix("https://").unwrap_or(s);
    let s = s.find("/wp-json").map_or(s, |idx| &s[..idx]);
    s.trim_end_matches(['/', '\\']).to_owned()
}

impl fmt::Display for RemoteSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RemoteSite {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RemoteSite {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RemoteSite> for String {
    fn from(site: RemoteSite) -> Self {
        site.0
    }
}

impl AsRef<str> for RemoteSite {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_and_rest_path() {
        for raw in [
            "example.com",
            "https://example.com",
            "http://example.com/",
            "https://example.com/wp-json",
            "https://example.com/wp-json/wp/v2/users/me",
            "  example.com//  ",
        ] {
            assert_eq!(RemoteSite::parse(raw).unwrap().as_str(), "example.com", "{raw}");
        }
    }

    #[test]
    fn keeps_subdirectory_installs() {
        let site = RemoteSite::parse("https://example.com/blog/wp-json/").unwrap();
        assert_eq!(site.as_str(), "example.com/blog");
    }

    #[test]
    fn rejects_empty_and_foreign_schemes() {
        assert!(RemoteSite::parse("").is_err());
        assert!(RemoteSite::parse("https://").is_err());
        assert!(RemoteSite::parse("https:///wp-json").is_err());
        assert!(RemoteSite::parse("ftp://example.com").is_err());
        assert!(RemoteSite::parse("exa mple.com").is_err());
    }

    #[test]
    fn rejects_sites_that_escape_the_user_info_path() {
        for raw in [
            "example.com#x",
            "example.com?a=1",
            "evil@example.com",
            "user:pw@example.com",
            "example.com\\evil.net",
            "example.com/a/../../b",
            "example.com:notaport",
        ] {
            assert!(
                matches!(RemoteSite::parse(raw), Err(CoreError::InvalidSite { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_ports_and_mixed_case_hosts() {
        assert_eq!(RemoteSite::parse("127.0.0.1:8080").unwrap().as_str(), "127.0.0.1:8080");
        assert_eq!(RemoteSite::parse("example.com:443").unwrap().as_str(), "example.com:443");
        assert_eq!(RemoteSite::parse("Example.COM/Blog").unwrap().as_str(), "Example.COM/Blog");
    }

    #[test]
    fn serde_round_trip_normalizes() {
        let site: RemoteSite = serde_json::from_str(r#""https://example.com/""#).unwrap();
        assert_eq!(site.as_str(), "example.com");
        assert_eq!(serde_json::to_string(&site).unwrap(), r#""example.com""#);
    }
}
