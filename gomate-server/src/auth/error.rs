//! Authentication error types.

use crate::storage::StorageError;

/// Errors from logging in or registering.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The auth API rejected the request; carries its message
    #[error("{0}")]
    InvalidCredentials(String),

    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The auth API accepted the request but the body was unusable
    #[error("auth API error: {message}")]
    Api { message: String },

    /// Local user records could not be read or written
    #[error("user storage error: {0}")]
    Storage(#[from] StorageError),

    /// Password hashing or hash parsing failed
    #[error("password hash error: {0}")]
    Hash(String),

    /// Base URL could not be parsed
    #[error("invalid auth URL: {0}")]
    InvalidUrl(String),
}

impl AuthError {
    /// Whether the failure is the caller's fault rather than ours.
    pub fn is_rejection(&self) -> bool {
        matches!(self, AuthError::InvalidCredentials(_))
    }
}
