//! Store details cache.
//!
//! Details (developer, publisher, release date, header image) change
//! rarely, so lookups are kept for a day. Only successful lookups are
//! inserted; a failed lookup is retried on the next request.

use std::time::Duration;

use moka::future::Cache;

use crate::telemetry;
use crate::types::AppDetails;

/// Configuration for [`DetailsCache`].
///
/// ```rust
/// # use timesink::DetailsCacheConfig;
/// # use std::time::Duration;
/// let config = DetailsCacheConfig::new()
///     .max_entries(500)
///     .ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct DetailsCacheConfig {
    /// Maximum number of cached subjects. Default: 1,000.
    pub max_entries: u64,
    /// Time-to-live per entry. Default: 24 hours.
    pub ttl: Duration,
}

impl Default for DetailsCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl DetailsCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// In-memory TTL cache of [`AppDetails`] keyed by subject id.
pub struct DetailsCache {
    cache: Cache<String, AppDetails>,
}

impl DetailsCache {
    pub fn new(config: &DetailsCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { cache }
    }

    /// Look up cached details. Emits cache hit/miss metrics.
    pub async fn get(&self, subject_id: &str) -> Option<AppDetails> {
        let found = self.cache.get(subject_id).await;
        if found.is_some() {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "cache" => "details").increment(1);
        } else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => "details").increment(1);
        }
        found
    }

    pub async fn insert(&self, subject_id: &str, details: AppDetails) {
        self.cache.insert(subject_id.to_string(), details).await;
    }
}

impl Default for DetailsCache {
    fn default() -> Self {
        Self::new(&DetailsCacheConfig::default())
    }
}
