//! Incremental review collection.
//!
//! [`ReviewCollector::collect_increment`] pages a [`ReviewSource`] from a
//! resume cursor until the caller's target is covered, the source runs dry,
//! or an upstream failure interrupts it. It never touches the cache and never
//! returns an error: whatever was gathered comes back together with the cursor
//! to resume from.
//!
//! Pages are kept whole. Stopping between pages keeps the resume cursor
//! pointing exactly past the last stored review, so a later top-up neither
//! skips nor repeats anything.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::Result;
use crate::analysis::ReviewAnalyzer;
use crate::telemetry;
use crate::types::{ReviewFilter, ReviewRecord, clamp_review_count, normalize_language};
use crate::upstream::{
    PageQuery, RetryConfig, ReviewSource, START_CURSOR, SourcePage, record_request, with_retry,
};

/// Reviews requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Pause between consecutive page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

/// Configuration for [`ReviewCollector`].
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub page_size: u32,
    pub page_delay: Duration,
    pub retry: RetryConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
            retry: RetryConfig::default(),
        }
    }
}

impl CollectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size (at least 1).
    pub fn page_size(mut self, n: u32) -> Self {
        self.page_size = n.max(1);
        self
    }

    /// Set the pause between page requests.
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Set the retry policy applied to each page request.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Why an increment stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// `already_have + new_items` reached the target.
    TargetReached,
    /// The source has nothing more; `cursor_out` is `None`.
    Exhausted,
    /// An upstream failure ended the attempt; `cursor_out` resumes it.
    Interrupted,
}

/// Result of one collection attempt.
#[derive(Debug, Clone)]
pub struct Increment {
    pub new_items: Vec<ReviewRecord>,
    /// Cursor to resume from, or `None` once the source is exhausted.
    pub cursor_out: Option<String>,
    /// Source-reported total from the first page of this increment.
    pub source_total: Option<u64>,
    pub outcome: CollectionOutcome,
}

/// Pages a review source and turns each review into a [`ReviewRecord`].
#[derive(Clone)]
pub struct ReviewCollector {
    source: Arc<dyn ReviewSource>,
    analyzer: ReviewAnalyzer,
    config: CollectorConfig,
}

impl ReviewCollector {
    pub fn new(
        source: Arc<dyn ReviewSource>,
        analyzer: ReviewAnalyzer,
        config: CollectorConfig,
    ) -> Self {
        Self {
            source,
            analyzer,
            config,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &ReviewAnalyzer {
        &self.analyzer
    }

    /// Fetch reviews from `cursor_in` until `already_have.len() + new_items.len()`
    /// covers `target_count`, or the source is exhausted or fails.
    ///
    /// `cursor_in = None` starts from the beginning of the listing.
    pub async fn collect_increment(
        &self,
        subject_id: &str,
        filter: ReviewFilter,
        language: &str,
        cursor_in: Option<&str>,
        already_have: &[ReviewRecord],
        target_count: u32,
    ) -> Increment {
        let mut target = clamp_review_count(i64::from(target_count)) as usize;
        let language = normalize_language(language);
        let source_name = self.source.name();

        let mut cursor = cursor_in
            .filter(|c| !c.is_empty())
            .unwrap_or(START_CURSOR)
            .to_string();
        let mut new_items: Vec<ReviewRecord> = Vec::new();
        let mut source_total = None;
        let mut pages = 0u32;

        let outcome = loop {
            if already_have.len() + new_items.len() >= target {
                break CollectionOutcome::TargetReached;
            }
            if pages > 0 && !self.config.page_delay.is_zero() {
                tokio::time::sleep(self.config.page_delay).await;
            }

            let query = PageQuery {
                subject_id,
                filter,
                language: &language,
                cursor: &cursor,
                page_size: self.config.page_size,
            };
            let result = with_retry(&self.config.retry, source_name, "reviews", || {
                self.fetch_page(&query)
            })
            .await;
            pages += 1;

            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        source = source_name,
                        subject_id,
                        cursor = %cursor,
                        collected = new_items.len(),
                        error = %e,
                        "review collection interrupted, keeping partial results"
                    );
                    break CollectionOutcome::Interrupted;
                }
            };

            if pages == 1 {
                source_total = page.total;
                if let Some(total) = page.total {
                    target = target.min(usize::try_from(total).unwrap_or(usize::MAX));
                }
            }

            let next = page
                .cursor
                .filter(|next| !next.is_empty() && *next != cursor);
            let empty = page.reviews.is_empty();

            metrics::counter!(telemetry::REVIEWS_FETCHED_TOTAL,
                "source" => source_name.to_owned(),
            )
            .increment(page.reviews.len() as u64);
            new_items.extend(
                page.reviews
                    .into_iter()
                    .map(|r| self.analyzer.record(r.text, r.playtime_minutes)),
            );

            match next {
                Some(next) if !empty => cursor = next,
                _ => {
                    debug!(subject_id, pages, "review source exhausted");
                    break CollectionOutcome::Exhausted;
                }
            }
        };

        info!(
            source = source_name,
            subject_id,
            filter = %filter,
            language = %language,
            pages,
            fetched = new_items.len(),
            already_had = already_have.len(),
            target,
            outcome = ?outcome,
            "review increment collected"
        );

        Increment {
            new_items,
            cursor_out: match outcome {
                CollectionOutcome::Exhausted => None,
                _ => Some(cursor),
            },
            source_total,
            outcome,
        }
    }

    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<SourcePage> {
        let result = self.source.fetch_page(query).await;
        record_request(self.source.name(), "reviews", result.is_ok());
        result
    }
}
