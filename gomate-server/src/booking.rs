//! Booking stub.
//!
//! There is no booking endpoint upstream: bookings are synthesized locally
//! after a simulated network delay and stored newest-first.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::storage::Bookings;

/// Default simulated booking latency.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(600);

/// Characters used in confirmation codes.
const CODE_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Who a booking is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUser {
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl BookingUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            first_name: None,
            last_name: None,
        }
    }

    /// The user recorded when none is given.
    pub fn guest() -> Self {
        Self::new("guest")
    }
}

/// Options for a booking request.
#[derive(Debug, Clone, Default)]
pub struct BookingOptions {
    pub user: Option<BookingUser>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
}

/// A confirmed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// `bk_` followed by the creation time in epoch milliseconds.
    pub id: String,
    pub item_id: String,
    pub user: BookingUser,
    pub booked_at: DateTime<Utc>,
    /// 6-7 uppercase alphanumeric characters.
    pub confirmation_code: String,
    pub status: BookingStatus,
}

/// Booking failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    /// The item id is empty
    #[error("cannot book an item without an id")]
    InvalidItem,
}

/// Configuration for the booking stub.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Simulated network latency before a booking is confirmed.
    pub latency: Duration,
}

impl BookingConfig {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY)
    }
}

/// Generate a 6 or 7 character confirmation code.
fn confirmation_code<R: Rng>(rng: &mut R) -> String {
    let len = rng.gen_range(6..=7);
    (0..len)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// Create a booking for `item_id` after the configured latency.
pub async fn create_booking(
    item_id: &str,
    options: BookingOptions,
    config: &BookingConfig,
) -> Result<Booking, BookingError> {
    let item_id = item_id.trim();
    if item_id.is_empty() {
        return Err(BookingError::InvalidItem);
    }

    if !config.latency.is_zero() {
        tokio::time::sleep(config.latency).await;
    }

    let now = Utc::now();
    Ok(Booking {
        id: format!("bk_{}", now.timestamp_millis()),
        item_id: item_id.to_string(),
        user: options.user.unwrap_or_else(BookingUser::guest),
        booked_at: now,
        confirmation_code: confirmation_code(&mut rand::thread_rng()),
        status: BookingStatus::Confirmed,
    })
}

/// Creates bookings and records them locally.
pub struct BookingService {
    config: BookingConfig,
    bookings: Arc<Bookings>,
}

impl BookingService {
    pub fn new(config: BookingConfig, bookings: Arc<Bookings>) -> Self {
        Self { config, bookings }
    }

    /// Book an item and prepend the booking to the stored list.
    ///
    /// A failure to store the booking is logged; the booking still stands.
    pub async fn book(&self, item_id: &str, options: BookingOptions) -> Result<Booking, BookingError> {
        let booking = create_booking(item_id, options, &self.config).await?;
        info!(
            booking = %booking.id,
            item = %booking.item_id,
            code = %booking.confirmation_code,
            "booking confirmed"
        );

        if let Err(e) = self.bookings.prepend(booking.clone()).await {
            warn!(booking = %booking.id, error = %e, "failed to store booking");
        }

        Ok(booking)
    }

    /// Stored bookings, newest first.
    pub fn list(&self) -> Vec<Booking> {
        self.bookings.load()
    }
}
