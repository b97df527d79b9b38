//! Transport API error types.
//!
//! These never reach callers of the resolvers: every variant is logged and
//! turned into "this strategy failed" or a mock/empty result. They exist so
//! the adapter can tell a quota failure apart from everything else.

/// Errors from a single upstream request.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Body was not valid JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Upstream returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Credentials rejected
    #[error("unauthorized: check TRANSPORTAPI_APP_ID and TRANSPORTAPI_APP_KEY")]
    Unauthorized,

    /// Rate limited by the upstream
    #[error("rate limited by transport API")]
    RateLimited,

    /// Daily usage quota for the credentials is used up
    #[error("transport API quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// Base URL or request path could not be turned into a URL
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// Whether this error should trip the quota flag.
    pub fn is_quota(&self) -> bool {
        matches!(self, TransportError::QuotaExceeded { .. })
    }
}
