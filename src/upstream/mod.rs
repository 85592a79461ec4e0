//! Upstream storefront access.
//!
//! [`traits`] defines what the collector and service need from a store;
//! [`steam`] implements it over HTTP; [`retry`] is the one retry policy
//! every upstream call goes through.

pub mod retry;
pub mod steam;
pub mod traits;

pub use retry::{RetryConfig, with_retry};
pub use steam::SteamClient;
pub use traits::{
    PageQuery, ReviewSource, START_CURSOR, SearchHit, SourcePage, SourceReview, StoreDirectory,
};

use crate::telemetry;

/// Count one upstream call by outcome.
pub(crate) fn record_request(source: &str, operation: &'static str, ok: bool) {
    metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
        "source" => source.to_owned(),
        "operation" => operation,
        "status" => if ok { "ok" } else { "error" },
    )
    .increment(1);
}
