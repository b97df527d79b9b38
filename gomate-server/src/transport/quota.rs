//! Quota tracking for the transport API.
//!
//! Once the upstream reports that the credentials' daily quota is used up,
//! every call is served from mock data for the next 24 hours. The reset is
//! a pure function of the current time, which comes from a [`Clock`] so
//! tests can move it.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// How long a tripped quota flag stays set, in hours.
pub const QUOTA_RESET_HOURS: i64 = 24;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: Clock> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Whether the quota is currently exceeded, and since when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotaState {
    pub exceeded: bool,
    pub checked_at: Option<DateTime<Utc>>,
}

impl QuotaState {
    /// Record a quota failure observed at `now`.
    pub fn trip(&mut self, now: DateTime<Utc>) {
        self.exceeded = true;
        self.checked_at = Some(now);
    }

    /// The state as it stands at `now`: a flag set [`QUOTA_RESET_HOURS`]
    /// or more ago is cleared.
    pub fn at(self, now: DateTime<Utc>) -> Self {
        match self.checked_at {
            Some(checked_at)
                if self.exceeded && now - checked_at < Duration::hours(QUOTA_RESET_HOURS) =>
            {
                self
            }
            _ => Self::default(),
        }
    }

    /// Whether calls at `now` should skip the network.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.at(now).exceeded
    }
}
