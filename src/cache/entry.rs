//! Cache entries and their shared handles.
//!
//! A [`CacheEntry`] is an immutable snapshot of collection progress. The
//! [`EntryHandle`] that every key points at holds the current snapshot and a
//! per-entry update lock. Writers take the lock with
//! [`EntryHandle::begin_update`], build a new snapshot and publish it with
//! [`EntryUpdate::commit`]; readers only ever see whole snapshots.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, MutexGuard};

use super::key::EntryAddress;
use crate::collector::{CollectionOutcome, Increment};
use crate::types::{ReviewRecord, clamp_review_count};
use crate::upstream::START_CURSOR;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Collection progress for one (subject, filter, language).
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Last successful commit; drives TTL and eviction order.
    pub created_at: Instant,
    /// Resume position; `None` once the source is exhausted.
    pub cursor: Option<String>,
    /// Reviews in fetch order. Only ever grows.
    pub items: Vec<ReviewRecord>,
    pub known_source_total: Option<u64>,
    /// Count of the request that last extended this entry.
    pub requested_count: u32,
    pub effective_target: u32,
}

impl CacheEntry {
    /// An empty entry positioned at the start of the listing.
    pub fn new(now: Instant, requested_count: u32) -> Self {
        let requested_count = clamp_review_count(i64::from(requested_count));
        Self {
            created_at: now,
            cursor: Some(START_CURSOR.to_string()),
            items: Vec::new(),
            known_source_total: None,
            requested_count,
            effective_target: requested_count,
        }
    }

    /// `min(requested, total)` once the total is known, else `requested`;
    /// never above the hard cap.
    pub fn effective_target_for(requested: u32, known_source_total: Option<u64>) -> u32 {
        let requested = clamp_review_count(i64::from(requested));
        match known_source_total {
            Some(total) => total.min(u64::from(requested)) as u32,
            None => requested,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_none()
    }

    /// Whether a request for `requested` reviews should fetch more.
    pub fn needs_top_up(&self, requested: u32) -> bool {
        !self.is_exhausted()
            && self.items.len() < Self::effective_target_for(requested, self.known_source_total) as usize
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) > ttl
    }

    /// The snapshot that results from appending `increment`.
    ///
    /// `created_at` moves to `now` unless the attempt failed without
    /// gathering anything.
    pub fn extended(&self, increment: Increment, requested: u32, now: Instant) -> Self {
        let progressed = !increment.new_items.is_empty()
            || increment.outcome != CollectionOutcome::Interrupted;
        let known_source_total = increment.source_total.or(self.known_source_total);
        let requested_count = clamp_review_count(i64::from(requested));

        let mut items = Vec::with_capacity(self.items.len() + increment.new_items.len());
        items.extend_from_slice(&self.items);
        items.extend(increment.new_items);

        Self {
            created_at: if progressed { now } else { self.created_at },
            cursor: increment.cursor_out,
            items,
            known_source_total,
            requested_count,
            effective_target: Self::effective_target_for(requested_count, known_source_total),
        }
    }
}

/// Shared, lockable home of one logical entry.
#[derive(Debug)]
pub struct EntryHandle {
    id: u64,
    address: EntryAddress,
    update: Mutex<()>,
    state: RwLock<Arc<CacheEntry>>,
}

impl EntryHandle {
    pub fn new(address: EntryAddress, entry: CacheEntry) -> Self {
        Self {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            address,
            update: Mutex::new(()),
            state: RwLock::new(Arc::new(entry)),
        }
    }

    /// Identity shared by every key pointing at this handle.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn address(&self) -> &EntryAddress {
        &self.address
    }

    /// The last committed snapshot.
    pub fn snapshot(&self) -> Arc<CacheEntry> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Wait for exclusive update rights on this entry.
    pub async fn begin_update(&self) -> EntryUpdate<'_> {
        let guard = self.update.lock().await;
        EntryUpdate {
            handle: self,
            _guard: guard,
        }
    }

    /// Whether an update currently holds the lock.
    pub fn is_updating(&self) -> bool {
        self.update.try_lock().is_err()
    }

    /// Hold the update lock without waiting, if it is free.
    pub(crate) fn try_hold(&self) -> Option<MutexGuard<'_, ()>> {
        self.update.try_lock().ok()
    }
}

/// Exclusive write access to one entry.
pub struct EntryUpdate<'a> {
    handle: &'a EntryHandle,
    _guard: MutexGuard<'a, ()>,
}

impl EntryUpdate<'_> {
    /// The snapshot as of now. Stable for as long as this update is held.
    pub fn current(&self) -> Arc<CacheEntry> {
        self.handle.snapshot()
    }

    /// Publish a new snapshot in one step.
    pub fn commit(&self, entry: CacheEntry) -> Arc<CacheEntry> {
        let entry = Arc::new(entry);
        let mut state = self
            .handle
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *state = Arc::clone(&entry);
        entry
    }

    pub fn handle(&self) -> &EntryHandle {
        self.handle
    }
}
