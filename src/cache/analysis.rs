//! Incremental analysis cache.
//!
//! # Structure
//!
//! ```text
//! keys: Mutex<HashMap<CacheKey, Arc<EntryHandle>>>
//!          "570:recent:english"        ─┐
//!          "570_1000_recent_english"   ─┼─▶ EntryHandle { update lock, snapshot }
//!          "570_22_recent_english"     ─┘
//! ```
//!
//! Every key of one logical entry points at the same handle, so a commit made
//! through any key is visible through all of them. The key map lock is held
//! only for map operations and never across an await.
//!
//! # Expiry and eviction
//!
//! An entry whose last committed `created_at` is older than the TTL reads as
//! absent. [`AnalysisCache::purge`] drops such entries; when the number of
//! distinct entries exceeds `max_entries`, the oldest by committed
//! `created_at` are evicted. Both skip entries whose update lock is held.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use super::entry::{CacheEntry, EntryHandle};
use super::key::{CacheKey, EntryAddress};
use super::{Clock, SystemClock};
use crate::telemetry;
use crate::types::DEFAULT_REVIEW_COUNT;
use crate::{Result, TimesinkError};

/// Default time an entry stays valid after its last commit.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Default maximum number of distinct entries.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Configuration for [`AnalysisCache`].
#[derive(Debug, Clone)]
pub struct AnalysisCacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for AnalysisCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl AnalysisCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the entry bound (at least 1).
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n.max(1);
        self
    }
}

/// Shared store of collection progress.
pub struct AnalysisCache {
    config: AnalysisCacheConfig,
    clock: Arc<dyn Clock>,
    keys: Mutex<HashMap<CacheKey, Arc<EntryHandle>>>,
}

impl AnalysisCache {
    pub fn new(config: AnalysisCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AnalysisCacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            keys: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AnalysisCacheConfig {
        &self.config
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    fn keys(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<EntryHandle>>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve the entry for `address`, creating an empty one if no live entry
    /// exists under any of its keys. Returns the handle and whether it existed.
    ///
    /// A freshly created entry is registered under the primary key (and the
    /// legacy key for `count_hint`) at once, so concurrent callers share it.
    pub fn get_or_create(
        &self,
        address: &EntryAddress,
        count_hint: Option<u32>,
    ) -> (Arc<EntryHandle>, bool) {
        let now = self.now();
        let lookup_keys = address.lookup_keys(count_hint);
        let mut keys = self.keys();

        let found = lookup_keys.iter().find_map(|key| keys.get(key).cloned());
        if let Some(handle) = found {
            let expired = handle.snapshot().is_expired(now, self.config.ttl);
            if !expired || handle.is_updating() {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "cache" => "analysis").increment(1);
                debug!(entry = %address, "analysis cache entry resolved");
                return (handle, true);
            }
            Self::remove_handle(&mut keys, handle.id());
            debug!(entry = %address, "analysis cache entry expired, replacing");
        }

        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => "analysis").increment(1);
        let requested = count_hint.unwrap_or(DEFAULT_REVIEW_COUNT);
        let handle = Arc::new(EntryHandle::new(
            address.clone(),
            CacheEntry::new(now, requested),
        ));
        for key in lookup_keys {
            keys.insert(key, Arc::clone(&handle));
        }
        self.evict_over_capacity(&mut keys, handle.id());
        debug!(entry = %address, "analysis cache entry created");
        (handle, false)
    }

    /// Read-only lookup for pagination and export.
    ///
    /// Fails with [`TimesinkError::CacheMiss`] when no key resolves and
    /// [`TimesinkError::CacheExpired`] when the entry outlived its TTL.
    pub fn lookup(
        &self,
        address: &EntryAddress,
        count_hint: Option<u32>,
    ) -> Result<Arc<EntryHandle>> {
        let now = self.now();
        let mut keys = self.keys();
        let handle = address
            .lookup_keys(count_hint)
            .iter()
            .find_map(|key| keys.get(key).cloned());

        let Some(handle) = handle else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => "analysis").increment(1);
            return Err(TimesinkError::CacheMiss);
        };
        if handle.snapshot().is_expired(now, self.config.ttl) {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => "analysis").increment(1);
            if let Some(_held) = handle.try_hold() {
                Self::remove_handle(&mut keys, handle.id());
                Self::count_eviction("expired", 1);
            }
            return Err(TimesinkError::CacheExpired);
        }
        metrics::counter!(telemetry::CACHE_HITS_TOTAL, "cache" => "analysis").increment(1);
        Ok(handle)
    }

    /// Register `handle` under every key in `keys`, then enforce the size bound.
    pub fn store(&self, handle: &Arc<EntryHandle>, keys: &[CacheKey]) {
        let mut map = self.keys();
        for key in keys {
            map.insert(key.clone(), Arc::clone(handle));
        }
        self.evict_over_capacity(&mut map, handle.id());
    }

    /// Drop expired entries that are not being updated. Returns how many
    /// distinct entries were removed.
    pub fn purge(&self) -> usize {
        let now = self.now();
        let mut keys = self.keys();

        let mut expired = Vec::new();
        for handle in Self::distinct(&keys) {
            let Some(_held) = handle.try_hold() else {
                continue;
            };
            if handle.snapshot().is_expired(now, self.config.ttl) {
                expired.push(handle.id());
            }
        }
        for &id in &expired {
            Self::remove_handle(&mut keys, id);
        }
        if !expired.is_empty() {
            Self::count_eviction("expired", expired.len());
            debug!(removed = expired.len(), "purged expired analysis entries");
        }
        expired.len()
    }

    /// Number of distinct entries (not keys).
    pub fn len(&self) -> usize {
        Self::distinct(&self.keys()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Number of keys, counting every alias.
    pub fn key_count(&self) -> usize {
        self.keys().len()
    }

    pub fn clear(&self) {
        self.keys().clear();
    }

    fn distinct(keys: &HashMap<CacheKey, Arc<EntryHandle>>) -> Vec<Arc<EntryHandle>> {
        let mut by_id: HashMap<u64, Arc<EntryHandle>> = HashMap::new();
        for handle in keys.values() {
            by_id
                .entry(handle.id())
                .or_insert_with(|| Arc::clone(handle));
        }
        by_id.into_values().collect()
    }

    fn remove_handle(keys: &mut HashMap<CacheKey, Arc<EntryHandle>>, id: u64) {
        keys.retain(|_, handle| handle.id() != id);
    }

    /// Drop the oldest entries beyond `max_entries`, never touching `keep` or
    /// an entry that is mid-update.
    fn evict_over_capacity(&self, keys: &mut HashMap<CacheKey, Arc<EntryHandle>>, keep: u64) {
        let mut candidates: Vec<(Instant, Arc<EntryHandle>)> = Self::distinct(keys)
            .into_iter()
            .map(|handle| (handle.snapshot().created_at, handle))
            .collect();
        if candidates.len() <= self.config.max_entries {
            return;
        }
        let mut excess = candidates.len() - self.config.max_entries;
        candidates.sort_by_key(|(created_at, _)| *created_at);

        let mut evicted = 0;
        for (_, handle) in candidates {
            if excess == 0 {
                break;
            }
            if handle.id() == keep {
                continue;
            }
            let Some(_held) = handle.try_hold() else {
                continue;
            };
            debug!(entry = %handle.address(), "evicting oldest analysis entry");
            Self::remove_handle(keys, handle.id());
            excess -= 1;
            evicted += 1;
        }
        if evicted > 0 {
            Self::count_eviction("capacity", evicted);
        }
    }

    fn count_eviction(reason: &'static str, n: usize) {
        metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "reason" => reason)
            .increment(n as u64);
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(AnalysisCacheConfig::default())
    }
}
