//! TransportAPI client and normalization layer.
//!
//! This module fetches transport listings, place details and timetables
//! from the TransportAPI REST service and normalizes its many response
//! shapes into the canonical types in [`types`].
//!
//! Key characteristics:
//! - Responses nest their records under different keys depending on the
//!   endpoint, and name the same field differently across record kinds
//! - An item id does not say which kind of identifier it is, so detail
//!   lookups try each kind in a fixed order
//! - Demo credentials run out of quota quickly; once they do, mock data is
//!   served for 24 hours

mod client;
mod detail;
mod error;
mod fields;
mod mock;
mod quota;
mod request;
mod resolve;
mod schedule;
mod service;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use client::{DEFAULT_BASE_URL, HttpUpstream, TransportApiConfig, is_quota_message};
pub use error::TransportError;
pub use fields::{FieldChain, extract_list, normalize_item, normalize_list};
pub use quota::{Clock, ManualClock, QUOTA_RESET_HOURS, QuotaState, SystemClock};
pub use request::{Upstream, UpstreamRequest};
pub use resolve::{Resolution, first_success};
pub use schedule::SCHEDULE_CAP;
pub use service::{LIST_LIMIT, Origin, TransportService};
pub use types::{ItemDetail, ScheduleEntry, Stop, TransportItem};

/// The fixed mock listing served when the upstream is unavailable.
pub fn mock_items() -> Vec<TransportItem> {
    mock::items()
}
