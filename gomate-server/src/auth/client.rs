//! Client for the demo auth API.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::error::AuthError;

/// Default base URL for the auth API.
pub const DEFAULT_AUTH_BASE_URL: &str = "https://dummyjson.com";

/// Configuration for the auth client.
#[derive(Debug, Clone)]
pub struct AuthClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AuthClientConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for AuthClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// A user as the auth API reports it.
///
/// Login responses carry a token (`accessToken` on current API versions,
/// `token` on older ones); registration responses do not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProfile {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "accessToken")]
    pub token: Option<String>,
}

/// reqwest client for `/auth/login` and `/users/add`.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AuthClient {
    pub fn new(config: &AuthClientConfig) -> Result<Self, AuthError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AuthError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(AuthError::InvalidUrl(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Log in with a username and password.
    pub async fn login(&self, username: &str, password: &str) -> Result<RemoteProfile, AuthError> {
        self.post(&["auth", "login"], &LoginRequest { username, password }, "Login failed")
            .await
    }

    /// Register a new user.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RemoteProfile, AuthError> {
        self.post(&["users", "add"], request, "Registration failed").await
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url, AuthError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AuthError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
        fallback_message: &str,
    ) -> Result<T, AuthError> {
        let url = self.url_for(segments)?;
        debug!(%url, "auth API request");

        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| body.get("message")?.as_str().map(str::to_string))
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| fallback_message.to_string());
            debug!(status = status.as_u16(), %message, "auth API rejected request");
            return Err(AuthError::InvalidCredentials(message));
        }

        serde_json::from_str(&text).map_err(|e| AuthError::Api {
            message: e.to_string(),
        })
    }
}
