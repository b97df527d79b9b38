//! Transport API HTTP client.
//!
//! Executes [`UpstreamRequest`]s against the TransportAPI REST endpoints,
//! attaching `app_id`/`app_key` credentials and classifying failures.

use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use super::error::TransportError;
use super::request::{Upstream, UpstreamRequest};

/// Default base URL for the transport API.
pub const DEFAULT_BASE_URL: &str = "https://transportapi.com/v3/uk";

/// Default listing query.
pub const DEFAULT_LISTING_QUERY: &str = "bus";

/// Body fragments that mark a 403 as a used-up quota rather than bad credentials.
const QUOTA_MARKERS: &[&str] = &["quota", "usage limit", "limit exceeded"];

/// Configuration for the transport API client.
#[derive(Debug, Clone)]
pub struct TransportApiConfig {
    /// Application id, sent as `app_id`
    pub app_id: Option<String>,
    /// Application key, sent as `app_key`
    pub app_key: Option<String>,
    /// Base URL for the API
    pub base_url: String,
    /// Free-text query for the listing endpoint
    pub listing_query: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Serve mock data when the upstream fails or no credentials are set
    pub mock_fallback: bool,
}

impl TransportApiConfig {
    /// Create a config with no credentials (mock data only).
    pub fn new() -> Self {
        Self {
            app_id: None,
            app_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            listing_query: DEFAULT_LISTING_QUERY.to_string(),
            timeout_secs: 30,
            mock_fallback: true,
        }
    }

    /// Set credentials.
    pub fn with_credentials(mut self, app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self.app_key = Some(app_key.into());
        self
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the listing query.
    pub fn with_listing_query(mut self, query: impl Into<String>) -> Self {
        self.listing_query = query.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Enable or disable the mock fallback.
    pub fn with_mock_fallback(mut self, enabled: bool) -> Self {
        self.mock_fallback = enabled;
        self
    }

    /// Both halves of the credential pair are set and non-empty.
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.app_id) && present(&self.app_key)
    }
}

impl Default for TransportApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// reqwest-backed [`Upstream`].
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<(String, String)>,
}

impl HttpUpstream {
    /// Create a new client with the given configuration.
    pub fn new(config: &TransportApiConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let credentials = match (&config.app_id, &config.app_key) {
            (Some(id), Some(key)) if config.has_credentials() => Some((id.clone(), key.clone())),
            _ => None,
        };

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Build the full URL for a request, credentials included.
    fn url_for(&self, request: &UpstreamRequest) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TransportError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(&request.segments);
        }
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &request.query {
                query.append_pair(key, value);
            }
            if let Some((id, key)) = &self.credentials {
                query.append_pair("app_id", id);
                query.append_pair("app_key", key);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    async fn execute(&self, request: &UpstreamRequest) -> Result<Value, TransportError> {
        let url = self.url_for(request)?;
        debug!(request = %request, "transport API request");

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            if is_quota_message(&body) {
                return Err(TransportError::QuotaExceeded { message: body });
            }
            return Err(TransportError::Unauthorized);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TransportError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| TransportError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}

impl Upstream for HttpUpstream {
    async fn get(&self, request: &UpstreamRequest) -> Result<Value, TransportError> {
        self.execute(request).await
    }
}

/// Whether an error body reports a used-up quota.
pub fn is_quota_message(body: &str) -> bool {
    let lower = body.to_lowercase();
    QUOTA_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = TransportApiConfig::new()
            .with_credentials("id", "key")
            .with_base_url("http://localhost:8080")
            .with_listing_query("train")
            .with_timeout(5)
            .with_mock_fallback(false);

        assert_eq!(config.app_id.as_deref(), Some("id"));
        assert_eq!(config.app_key.as_deref(), Some("key"));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.listing_query, "train");
        assert_eq!(config.timeout_secs, 5);
        assert!(!config.mock_fallback);
        assert!(config.has_credentials());
    }

    #[test]
    fn config_defaults() {
        let config = TransportApiConfig::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.listing_query, DEFAULT_LISTING_QUERY);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.mock_fallback);
        assert!(!config.has_credentials());
    }

    #[test]
    fn blank_credentials_do_not_count() {
        let config = TransportApiConfig::new().with_credentials("id", "  ");
        assert!(!config.has_credentials());
    }

    #[test]
    fn url_includes_segments_query_and_credentials() {
        let config = TransportApiConfig::new()
            .with_credentials("my-id", "my-key")
            .with_base_url("https://transportapi.com/v3/uk/");
        let client = HttpUpstream::new(&config).unwrap();

        let request = UpstreamRequest::path(["places.json"]).with_query("query", "bus stop");
        let url = client.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://transportapi.com/v3/uk/places.json?query=bus+stop&app_id=my-id&app_key=my-key"
        );
    }

    #[test]
    fn url_escapes_path_segments() {
        let client = HttpUpstream::new(&TransportApiConfig::new()).unwrap();
        let request = UpstreamRequest::path(["places", "a/b c.json"]);
        let url = client.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://transportapi.com/v3/uk/places/a%2Fb%20c.json"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = TransportApiConfig::new().with_base_url("not a url");
        assert!(matches!(
            HttpUpstream::new(&config),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[test]
    fn quota_markers_are_case_insensitive() {
        assert!(is_quota_message(
            r#"{"error":"You have exceeded your Usage Limits"}"#
        ));
        assert!(is_quota_message("Daily QUOTA used"));
        assert!(!is_quota_message(r#"{"error":"invalid app_key"}"#));
    }
}
