//! Data transfer objects for the JSON API.
//!
//! Transport items, details, bookings and sessions are serialized as they
//! are; these are the request bodies and the few responses that have no
//! domain type of their own.

use serde::{Deserialize, Serialize};

use crate::booking::BookingUser;

/// Response for `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Transport API credentials are configured
    pub credentials: bool,
    pub mock_fallback: bool,
    /// Mock data is being served because the daily quota ran out
    pub quota_exceeded: bool,
    pub cached_details: u64,
}

/// Body for `POST /api/bookings`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub item_id: String,
    #[serde(default)]
    pub user: Option<BookingUser>,
}

/// Body for `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
