//! Upstream storefront capability traits.
//!
//! - [`ReviewSource`]: cursor-paginated review listing (required)
//! - [`StoreDirectory`]: details lookup and free-text search (optional)
//!
//! Implementations only translate the wire format. Retry, pacing and
//! termination rules live in the callers.

use async_trait::async_trait;

use crate::Result;
use crate::types::{AppDetails, ReviewFilter};

/// Cursor value that starts a listing from the beginning.
pub const START_CURSOR: &str = "*";

/// Parameters for one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery<'a> {
    pub subject_id: &'a str,
    pub filter: ReviewFilter,
    pub language: &'a str,
    pub cursor: &'a str,
    pub page_size: u32,
}

/// One review as delivered by the source, before tagging and scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReview {
    pub text: String,
    pub playtime_minutes: u64,
}

/// One page of reviews.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePage {
    pub reviews: Vec<SourceReview>,
    /// Continuation token; `None` (or empty) when the source has no more data.
    pub cursor: Option<String>,
    /// Total reviews the source reports for this filter/language, when it says.
    pub total: Option<u64>,
}

/// A raw search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub header_image: Option<String>,
    pub tiny_image: Option<String>,
}

/// Paginated review listing.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Name for logging and metrics (e.g. `"steam"`).
    fn name(&self) -> &str;

    /// Fetch one page starting at `query.cursor`.
    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<SourcePage>;
}

/// Subject metadata and search.
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    fn name(&self) -> &str;

    /// Details for a subject; `Ok(None)` when the store has no record of it.
    async fn app_details(&self, subject_id: &str) -> Result<Option<AppDetails>>;

    /// Free-text search over subject names.
    async fn search(&self, term: &str) -> Result<Vec<SearchHit>>;
}
