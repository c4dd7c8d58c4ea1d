use thiserror::Error;

/// Top-level error type for the `credrelay-api` crate.
///
/// Covers every way a probe can fail before a meaningful HTTP status is
/// available. `credrelay-core` maps these into its own `CoreError`.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error (usually a malformed site name).
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The site would move the user-info path or add credentials to the URL.
    #[error("Site {site:?} does not resolve to {url}")]
    SiteEscapesPath { site: String, url: String },

    /// TLS configuration or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Identity ────────────────────────────────────────────────────
    /// The client name or version cannot be used as an HTTP header.
    #[error("Invalid identity header: {0}")]
    InvalidHeader(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}
