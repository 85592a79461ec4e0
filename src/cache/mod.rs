//! Caching subsystem.
//!
//! Two independent caches:
//!
//! - [`AnalysisCache`]: incremental collection progress per
//!   (subject, filter, language). Entries are shared handles reachable
//!   through a primary key and any number of legacy count-bearing keys,
//!   bounded by TTL and entry count. See [`analysis`] for the locking model.
//!
//! - [`DetailsCache`]: moka-backed TTL cache of store details per subject.
//!
//! Time is read through a [`Clock`] so TTL and eviction can be tested
//! without waiting.

pub mod analysis;
pub mod details;
pub mod entry;
pub mod key;

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

pub use analysis::{AnalysisCache, AnalysisCacheConfig};
pub use details::{DetailsCache, DetailsCacheConfig};
pub use entry::{CacheEntry, EntryHandle, EntryUpdate};
pub use key::{CacheKey, EntryAddress};

/// Source of the current time for cache bookkeeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
