//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use timesink::telemetry;
use timesink::{
    AnalysisCache, AnalysisCacheConfig, AnalysisRequest, CollectorConfig, EntryAddress,
    ManualClock, PageQuery, Result, RetryConfig, ReviewAnalyzer, ReviewCollector, ReviewFilter,
    ReviewSource, SourcePage, SourceReview, Timesink, TimesinkError,
};

// ============================================================================
// Mock source
// ============================================================================

/// Five reviews on one page, after `throttle` rate-limited attempts.
struct OnePageSource {
    throttle: u32,
    calls: AtomicU32,
}

impl OnePageSource {
    fn new(throttle: u32) -> Self {
        Self {
            throttle,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ReviewSource for OnePageSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_page(&self, _query: &PageQuery<'_>) -> Result<SourcePage> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.throttle {
            return Err(TimesinkError::RateLimited { retry_after: None });
        }
        Ok(SourcePage {
            reviews: (0..5)
                .map(|i| SourceReview {
                    text: format!("review {i}"),
                    playtime_minutes: 60,
                })
                .collect(),
            cursor: None,
            total: Some(5),
        })
    }
}

fn collector(throttle: u32) -> ReviewCollector {
    ReviewCollector::new(
        Arc::new(OnePageSource::new(throttle)),
        ReviewAnalyzer::default(),
        CollectorConfig::new().page_delay(Duration::ZERO).retry(
            RetryConfig::new()
                .max_attempts(3)
                .initial_delay(Duration::from_millis(1)),
        ),
    )
}

fn service(throttle: u32) -> timesink::AnalysisService {
    Timesink::builder()
        .review_source(Arc::new(OnePageSource::new(throttle)))
        .collector(CollectorConfig::new().page_delay(Duration::ZERO))
        .retry(
            RetryConfig::new()
                .max_attempts(3)
                .initial_delay(Duration::from_millis(1)),
        )
        .build()
        .unwrap()
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    counter_where(snapshot, name, |_| true)
}

/// Sum counter values for `name` whose labels include `label=value`.
fn counter_labeled(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    counter_where(snapshot, name, |key| {
        key.labels().any(|l| l.key() == label && l.value() == value)
    })
}

fn counter_where(
    snapshot: &SnapshotVec,
    name: &str,
    pred: impl Fn(&metrics::Key) -> bool,
) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter && key.key().name() == name && pred(key.key())
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
/// Collection is driven directly rather than through the service, whose
/// top-up runs on a separate task the local recorder does not see.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn collection_records_upstream_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let increment = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                collector(0)
                    .collect_increment("1", ReviewFilter::Recent, "english", None, &[], 5)
                    .await
            })
        })
    });
    assert_eq!(increment.new_items.len(), 5);

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_labeled(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "status", "ok"),
        1
    );
    assert_eq!(
        counter_labeled(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "operation", "reviews"),
        1
    );
    assert_eq!(counter_total(&snapshot, telemetry::REVIEWS_FETCHED_TOTAL), 5);
    assert_eq!(counter_total(&snapshot, telemetry::RETRIES_TOTAL), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn throttled_attempts_record_retries() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                collector(2)
                    .collect_increment("1", ReviewFilter::Recent, "english", None, &[], 5)
                    .await
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_labeled(&snapshot, telemetry::RETRIES_TOTAL, "operation", "reviews"),
        2
    );
    assert_eq!(
        counter_labeled(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "status", "error"),
        2
    );
    assert_eq!(
        counter_labeled(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "status", "ok"),
        1
    );
}

#[test]
fn cache_lookups_record_hits_and_misses() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let cache = AnalysisCache::default();
        let addr = EntryAddress::new("1", ReviewFilter::Recent, "english");
        cache.get_or_create(&addr, Some(5));
        cache.get_or_create(&addr, Some(5));
        let _ = cache.lookup(&addr, None);
        let _ = cache.lookup(&EntryAddress::new("2", ReviewFilter::Recent, "english"), None);
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_labeled(&snapshot, telemetry::CACHE_HITS_TOTAL, "cache", "analysis"),
        2
    );
    assert_eq!(
        counter_labeled(&snapshot, telemetry::CACHE_MISSES_TOTAL, "cache", "analysis"),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn evictions_are_counted_by_reason() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let clock = Arc::new(ManualClock::new());
        let cache =
            AnalysisCache::with_clock(AnalysisCacheConfig::new().max_entries(1), clock.clone());
        let addr = |s: &str| EntryAddress::new(s, ReviewFilter::Recent, "english");

        cache.get_or_create(&addr("a"), None);
        clock.advance(Duration::from_secs(1));
        cache.get_or_create(&addr("b"), None);
        clock.advance(Duration::from_secs(31 * 60));
        cache.purge();
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_labeled(&snapshot, telemetry::CACHE_EVICTIONS_TOTAL, "reason", "capacity"),
        1
    );
    assert_eq!(
        counter_labeled(&snapshot, telemetry::CACHE_EVICTIONS_TOTAL, "reason", "expired"),
        1
    );
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let response = service(0)
        .analyze(&AnalysisRequest::new("1").review_count(5))
        .await
        .unwrap();
    assert_eq!(response.total_reviews_analyzed, 5);
}
