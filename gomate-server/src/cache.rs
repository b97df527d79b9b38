//! Caching layer for transport details.
//!
//! Details resolved from the upstream are cached by item id for the life of
//! the process; only an explicit [`CachedTransportService::clear`] drops
//! them. Mock details served during a quota trip are never cached. The latest
//! listing is kept as a snapshot, replaced wholesale on every fetch, so a
//! listed item's raw record is available for timetable lookups.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tokio::sync::RwLock;

use crate::transport::{
    Clock, ItemDetail, Origin, ScheduleEntry, SystemClock, TransportItem, TransportService,
    Upstream,
};

/// Cached detail entry.
type DetailEntry = Arc<ItemDetail>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached details.
    pub max_capacity: u64,

    /// Optional TTL for cached details. `None` keeps them until cleared.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1000,
            ttl: None,
        }
    }
}

/// Transport service with a detail cache and listing snapshot.
pub struct CachedTransportService<U, C = SystemClock> {
    service: TransportService<U, C>,
    details: MokaCache<String, DetailEntry>,
    listing: RwLock<Arc<Vec<TransportItem>>>,
}

impl<U: Upstream, C: Clock> CachedTransportService<U, C> {
    /// Create a new cached service.
    pub fn new(service: TransportService<U, C>, config: &CacheConfig) -> Self {
        let mut builder = MokaCache::builder().max_capacity(config.max_capacity);
        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            service,
            details: builder.build(),
            listing: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Fetch the listing and replace the snapshot.
    pub async fn fetch_list(&self) -> Arc<Vec<TransportItem>> {
        let items = Arc::new(self.service.fetch_list().await);
        *self.listing.write().await = items.clone();
        items
    }

    /// The listing from the most recent fetch.
    pub async fn listing(&self) -> Arc<Vec<TransportItem>> {
        self.listing.read().await.clone()
    }

    /// Get a detail, using the cache if available.
    ///
    /// Misses and fallback details are not cached, so the next call tries
    /// the upstream again.
    pub async fn get_detail(&self, id: &str) -> Option<DetailEntry> {
        if let Some(cached) = self.details.get(id).await {
            return Some(cached);
        }

        let (detail, origin) = self.service.resolve_detail(id).await?;
        let detail = Arc::new(detail);
        if origin == Origin::Network {
            self.details.insert(id.to_string(), detail.clone()).await;
        }
        Some(detail)
    }

    /// Timetable for an item in the current listing snapshot.
    ///
    /// `None` if the id is not in the snapshot.
    pub async fn schedule_for(&self, id: &str) -> Option<Vec<ScheduleEntry>> {
        let listing = self.listing().await;
        let item = listing.iter().find(|item| item.id == id)?;
        Some(self.service.fetch_schedule(&item.raw).await)
    }

    /// Access the underlying service.
    pub fn service(&self) -> &TransportService<U, C> {
        &self.service
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.details.entry_count()
    }

    /// Invalidate all cached details.
    pub async fn clear(&self) {
        self.details.invalidate_all();
        self.details.run_pending_tasks().await;
    }
}
