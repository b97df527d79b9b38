//! Transport service: the fallback policy around the resolvers.
//!
//! Public operations never fail. Upstream errors are logged and replaced by
//! mock data (when the fallback is enabled), an empty list, or `None`. A
//! quota error trips the [`QuotaState`] and everything is served from mock
//! data until it resets.

use std::sync::Mutex;

use chrono::Duration;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::client::{HttpUpstream, TransportApiConfig};
use super::error::TransportError;
use super::fields::normalize_list;
use super::mock;
use super::quota::{Clock, QUOTA_RESET_HOURS, QuotaState, SystemClock};
use super::request::{Upstream, UpstreamRequest};
use super::resolve::Resolution;
use super::types::{ItemDetail, ScheduleEntry, TransportItem};
use super::{detail, schedule};

/// Maximum number of items kept from one listing response.
pub const LIST_LIMIT: usize = 20;

/// Where a call's data should come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Network,
    Mock,
    Nothing,
}

/// Where returned data actually came from.
///
/// Only [`Origin::Network`] data reflects the upstream; anything else is
/// a placeholder that must not outlive the condition that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Network,
    Fallback,
}

/// Transport data with mock fallback and quota tracking.
pub struct TransportService<U, C = SystemClock> {
    upstream: U,
    clock: C,
    quota: Mutex<QuotaState>,
    credentials: bool,
    mock_fallback: bool,
    listing_query: String,
}

impl TransportService<HttpUpstream, SystemClock> {
    /// Create a service backed by the HTTP client.
    pub fn from_config(config: &TransportApiConfig) -> Result<Self, TransportError> {
        let upstream = HttpUpstream::new(config)?;
        Ok(Self::new(upstream, SystemClock, config))
    }
}

impl<U: Upstream, C: Clock> TransportService<U, C> {
    /// Create a service around an arbitrary upstream and clock.
    pub fn new(upstream: U, clock: C, config: &TransportApiConfig) -> Self {
        Self {
            upstream,
            clock,
            quota: Mutex::new(QuotaState::default()),
            credentials: config.has_credentials(),
            mock_fallback: config.mock_fallback,
            listing_query: config.listing_query.clone(),
        }
    }

    /// Whether credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.credentials
    }

    /// Whether mock data replaces failed upstream calls.
    pub fn mock_fallback(&self) -> bool {
        self.mock_fallback
    }

    /// Whether the quota flag is currently set.
    pub fn quota_exceeded(&self) -> bool {
        self.quota_state().exceeded
    }

    /// The quota state as of now, with an expired flag already cleared.
    pub fn quota_state(&self) -> QuotaState {
        let now = self.clock.now();
        let mut quota = self.quota.lock().unwrap_or_else(|e| e.into_inner());
        *quota = quota.at(now);
        *quota
    }

    fn trip_quota(&self) {
        let now = self.clock.now();
        let mut quota = self.quota.lock().unwrap_or_else(|e| e.into_inner());
        quota.trip(now);
        let until = now + Duration::hours(QUOTA_RESET_HOURS);
        info!(%until, "serving mock data until quota resets");
    }

    fn source(&self) -> Source {
        if self.quota_exceeded() {
            Source::Mock
        } else if self.credentials {
            Source::Network
        } else {
            self.fallback()
        }
    }

    fn fallback(&self) -> Source {
        if self.mock_fallback {
            Source::Mock
        } else {
            Source::Nothing
        }
    }

    /// Fetch the transport listing.
    pub async fn fetch_list(&self) -> Vec<TransportItem> {
        match self.source() {
            Source::Mock => return mock::items(),
            Source::Nothing => return Vec::new(),
            Source::Network => {}
        }

        let request =
            UpstreamRequest::path(["places.json"]).with_query("query", self.listing_query.as_str());

        match self.upstream.get(&request).await {
            Ok(body) => {
                let items = normalize_list(&body, LIST_LIMIT);
                debug!(count = items.len(), "fetched transport listing");
                items
            }
            Err(e) => {
                warn!(error = %e, "transport listing failed");
                if e.is_quota() {
                    self.trip_quota();
                    return mock::items();
                }
                match self.fallback() {
                    Source::Mock => mock::items(),
                    _ => Vec::new(),
                }
            }
        }
    }

    /// Resolve the detail for an item id, timetable and stops included.
    ///
    /// `None` means no strategy found the item.
    pub async fn fetch_detail(&self, id: &str) -> Option<ItemDetail> {
        self.resolve_detail(id).await.map(|(detail, _)| detail)
    }

    /// Like [`fetch_detail`](Self::fetch_detail), also reporting whether the
    /// record and its timetable both came from the upstream.
    pub async fn resolve_detail(&self, id: &str) -> Option<(ItemDetail, Origin)> {
        match self.source() {
            Source::Mock => return Some((mock::detail(id), Origin::Fallback)),
            Source::Nothing => return None,
            Source::Network => {}
        }

        let record = match detail::resolve(&self.upstream, id).await {
            Resolution::Found { value, .. } => value,
            Resolution::Exhausted => {
                debug!(id, "no detail strategy succeeded");
                return None;
            }
            Resolution::QuotaExceeded => {
                self.trip_quota();
                return Some((mock::detail(id), Origin::Fallback));
            }
        };

        let (schedule, origin) = self.resolve_schedule(&record).await;
        Some((detail::build(id, &record, schedule), origin))
    }

    /// Resolve the timetable for a raw place record.
    pub async fn fetch_schedule(&self, raw: &Value) -> Vec<ScheduleEntry> {
        self.resolve_schedule(raw).await.0
    }

    async fn resolve_schedule(&self, raw: &Value) -> (Vec<ScheduleEntry>, Origin) {
        match self.source() {
            Source::Mock => return (mock::schedule(), Origin::Fallback),
            Source::Nothing => return (Vec::new(), Origin::Fallback),
            Source::Network => {}
        }

        match schedule::resolve(&self.upstream, raw).await {
            Resolution::Found { value, .. } => (value, Origin::Network),
            Resolution::Exhausted => (Vec::new(), Origin::Network),
            Resolution::QuotaExceeded => {
                self.trip_quota();
                (mock::schedule(), Origin::Fallback)
            }
        }
    }
}
