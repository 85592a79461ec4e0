//! Telemetry metric name constants.
//!
//! Centralised metric names for timesink operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `timesink_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `source`: upstream name (e.g. "steam")
//! - `operation`: upstream call ("reviews", "details", "search")
//! - `status`: outcome: "ok" or "error"
//! - `cache`: which cache: "analysis" or "details"

/// Total upstream requests, counting each retry attempt once.
///
/// Labels: `source`, `operation`, `status` ("ok" | "error").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "timesink_upstream_requests_total";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `source`, `operation`.
pub const RETRIES_TOTAL: &str = "timesink_retries_total";

/// Total cache hits.
///
/// Labels: `cache`.
pub const CACHE_HITS_TOTAL: &str = "timesink_cache_hits_total";

/// Total cache misses, including expired entries.
///
/// Labels: `cache`.
pub const CACHE_MISSES_TOTAL: &str = "timesink_cache_misses_total";

/// Entries removed by TTL purge or size-bounded eviction.
///
/// Labels: `reason` ("expired" | "capacity").
pub const CACHE_EVICTIONS_TOTAL: &str = "timesink_cache_evictions_total";

/// Reviews fetched from upstream and appended to a cache entry.
///
/// Labels: `source`.
pub const REVIEWS_FETCHED_TOTAL: &str = "timesink_reviews_fetched_total";
