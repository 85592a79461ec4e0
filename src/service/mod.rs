//! Analysis orchestration.
//!
//! [`AnalysisService`] ties the pieces together:
//!
//! 1. purge expired cache entries
//! 2. resolve (or create) the entry for the request's subject/filter/language
//! 3. under that entry's update lock, top it up through the collector when it
//!    holds fewer reviews than the effective target; the top-up runs in its
//!    own task and finishes even if the caller stops waiting
//! 4. commit, register the entry under all of its keys, and summarise the
//!    used slice
//!
//! Pagination and export read committed snapshots only and never fetch.

mod builder;
pub mod export;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

pub use builder::{AnalysisServiceBuilder, DEFAULT_SEARCH_DELAY, DEFAULT_SEARCH_LIMIT, Timesink};
pub use export::{CsvExport, export_file_name, render_csv};

use crate::analysis::{playtime_distribution, thematic_scores};
use crate::cache::{AnalysisCache, CacheEntry, DetailsCache, EntryAddress};
use crate::collector::{CollectionOutcome, ReviewCollector};
use crate::types::{
    AnalysisRequest, AnalysisResponse, AppDetails, CacheInfo, PageRequest, ReviewPage,
    ReviewRecord, SearchResult, Selection, SelectionMode, clamp_review_count,
};
use crate::upstream::{RetryConfig, SearchHit, StoreDirectory, record_request, with_retry};
use crate::{Result, TimesinkError};

/// Orchestrates collection, caching and aggregation.
pub struct AnalysisService {
    collector: ReviewCollector,
    cache: Arc<AnalysisCache>,
    details: DetailsCache,
    directory: Option<Arc<dyn StoreDirectory>>,
    retry: RetryConfig,
    search_delay: Duration,
    search_limit: usize,
}

impl AnalysisService {
    pub fn builder() -> AnalysisServiceBuilder {
        AnalysisServiceBuilder::new()
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Analyse up to `request.review_count` reviews, fetching only what the
    /// cache does not already hold.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        request.validate()?;
        self.cache.purge();

        let address = EntryAddress::new(&request.subject_id, request.filter, &request.language);
        // Struct literals bypass the clamping setters.
        let requested = clamp_review_count(i64::from(request.review_count));

        // Detached so that a caller giving up does not abort collection midway.
        let worker = tokio::spawn(top_up(
            Arc::clone(&self.cache),
            self.collector.clone(),
            address.clone(),
            requested,
        ));
        let (joined, appdetails) = tokio::join!(worker, self.details(&address.subject_id));
        let (entry, fetched) =
            joined.map_err(|e| TimesinkError::Internal(format!("top-up task failed: {e}")))?;

        let now = self.cache.now();
        let used = &entry.items[..entry.items.len().min(requested as usize)];
        let review_count_used = CacheEntry::effective_target_for(requested, entry.known_source_total);
        let total_themed_reviews = used.iter().filter(|r| r.is_themed()).count();

        Ok(AnalysisResponse {
            status: "success".to_string(),
            app_id: address.subject_id.clone(),
            review_count_requested: requested,
            review_count_used,
            review_filter: address.filter,
            language: address.language.clone(),
            source_total_reviews: entry.known_source_total,
            total_reviews_collected: entry.items.len(),
            total_reviews_analyzed: used.len(),
            total_themed_reviews,
            appdetails: appdetails.unwrap_or_default(),
            thematic_scores: thematic_scores(used),
            playtime_distribution: playtime_distribution(used),
            note: analysis_note(&entry, requested, used.len(), total_themed_reviews),
            sentiment_method: self.collector.analyzer().scorer().method(),
            cache: CacheInfo {
                hit: !fetched,
                age_seconds: entry.age(now).as_secs(),
            },
        })
    }

    /// One page of cached reviews.
    pub fn page(&self, request: &PageRequest) -> Result<ReviewPage> {
        let entry = self.resolve(request)?;
        let (selected, mode) = select(pool(&entry, request.total_count), request.selection);
        let reviews = selected
            .iter()
            .skip(request.offset)
            .take(request.limit)
            .map(|r| (*r).clone())
            .collect();
        Ok(ReviewPage {
            reviews,
            total_available: selected.len(),
            offset: request.offset,
            limit: request.limit,
            mode,
        })
    }

    /// Every selected cached review as CSV.
    pub fn export(&self, request: &PageRequest) -> Result<CsvExport> {
        let entry = self.resolve(request)?;
        let (selected, mode) = select(pool(&entry, request.total_count), request.selection);
        let content = render_csv(selected.iter().copied())?;
        let count = request.total_count.unwrap_or(entry.requested_count);
        Ok(CsvExport {
            file_name: export_file_name(
                &request.subject_id,
                count,
                request.filter,
                &request.language,
                mode,
            ),
            content,
            rows: selected.len(),
            mode,
        })
    }

    fn resolve(&self, request: &PageRequest) -> Result<Arc<CacheEntry>> {
        if request.subject_id.trim().is_empty() {
            return Err(TimesinkError::Validation(
                "missing 'app_id' parameter".to_string(),
            ));
        }
        let address = EntryAddress::new(&request.subject_id, request.filter, &request.language);
        let handle = self.cache.lookup(&address, request.total_count)?;
        Ok(handle.snapshot())
    }

    /// Store details for a subject, served from the details cache when
    /// possible. Failures are logged and yield `None`.
    pub async fn details(&self, subject_id: &str) -> Option<AppDetails> {
        if let Some(details) = self.details.get(subject_id).await {
            return Some(details);
        }
        let directory = self.directory.as_deref()?;
        let result = with_retry(&self.retry, directory.name(), "details", || {
            self.fetch_details(directory, subject_id)
        })
        .await;
        match result {
            Ok(Some(details)) => {
                self.details.insert(subject_id, details.clone()).await;
                Some(details)
            }
            Ok(None) => {
                debug!(subject_id, "store has no details for subject");
                None
            }
            Err(e) => {
                warn!(subject_id, error = %e, "details lookup failed");
                None
            }
        }
    }

    async fn fetch_details(
        &self,
        directory: &dyn StoreDirectory,
        subject_id: &str,
    ) -> Result<Option<AppDetails>> {
        let result = directory.app_details(subject_id).await;
        record_request(directory.name(), "details", result.is_ok());
        result
    }

    /// Search the store by name and enrich hits with cached details.
    ///
    /// A blank term returns no results without calling upstream.
    pub async fn search(&self, term: &str) -> Result<Vec<SearchResult>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let directory = self.directory.as_deref().ok_or_else(|| {
            TimesinkError::Configuration("no store directory configured".to_string())
        })?;

        let hits = with_retry(&self.retry, directory.name(), "search", || {
            self.fetch_search(directory, term)
        })
        .await?;

        let mut results = Vec::new();
        let mut looked_up = false;
        for hit in hits.into_iter().take(self.search_limit) {
            let cached = self.details.get(&hit.id).await;
            let details = match cached {
                Some(details) => Some(details),
                None => {
                    if looked_up && !self.search_delay.is_zero() {
                        tokio::time::sleep(self.search_delay).await;
                    }
                    looked_up = true;
                    self.details(&hit.id).await
                }
            };
            results.push(search_result(hit, details));
        }
        Ok(results)
    }

    async fn fetch_search(&self, directory: &dyn StoreDirectory, term: &str) -> Result<Vec<SearchHit>> {
        let result = directory.search(term).await;
        record_request(directory.name(), "search", result.is_ok());
        result
    }
}

/// Bring the entry for `address` up to the effective target for `requested`.
/// Returns the committed snapshot and whether anything was fetched.
async fn top_up(
    cache: Arc<AnalysisCache>,
    collector: ReviewCollector,
    address: EntryAddress,
    requested: u32,
) -> (Arc<CacheEntry>, bool) {
    let (handle, existed) = cache.get_or_create(&address, Some(requested));
    let update = handle.begin_update().await;
    let current = update.current();

    if !current.needs_top_up(requested) {
        debug!(entry = %address, cached = current.items.len(), "serving analysis from cache");
        let keys = address.store_keys(&[requested, current.effective_target]);
        cache.store(&handle, &keys);
        return (current, false);
    }

    let target = CacheEntry::effective_target_for(requested, current.known_source_total);
    let increment = collector
        .collect_increment(
            &address.subject_id,
            address.filter,
            &address.language,
            current.cursor.as_deref(),
            &current.items,
            target,
        )
        .await;
    if increment.outcome == CollectionOutcome::Interrupted {
        warn!(
            entry = %address,
            new = increment.new_items.len(),
            "top-up interrupted, partial results kept"
        );
    }

    let next = current.extended(increment, requested, cache.now());
    let keys = address.store_keys(&[requested, next.effective_target]);
    let committed = update.commit(next);
    cache.store(&handle, &keys);
    drop(update);

    info!(
        entry = %address,
        existed,
        items = committed.items.len(),
        effective_target = committed.effective_target,
        exhausted = committed.is_exhausted(),
        "analysis entry topped up"
    );
    (committed, true)
}

/// Reviews a page or export draws from: the first `count` collected, where
/// `count` is the caller's hint or the count the entry was last extended for.
fn pool(entry: &CacheEntry, total_count: Option<u32>) -> &[ReviewRecord] {
    let count = total_count.unwrap_or(entry.requested_count) as usize;
    &entry.items[..entry.items.len().min(count)]
}

/// Apply the selection flags, reporting which mode was actually used.
pub fn select(items: &[ReviewRecord], selection: Selection) -> (Vec<&ReviewRecord>, SelectionMode) {
    if !selection.themed_only {
        return (items.iter().collect(), SelectionMode::All);
    }
    let themed: Vec<&ReviewRecord> = items.iter().filter(|r| r.is_themed()).collect();
    if themed.is_empty() && selection.fallback_to_all {
        return (items.iter().collect(), SelectionMode::ThemedWithFallback);
    }
    (themed, SelectionMode::Themed)
}

fn search_result(hit: SearchHit, details: Option<AppDetails>) -> SearchResult {
    let fallback_image = hit
        .header_image
        .or(hit.tiny_image)
        .unwrap_or_else(|| {
            format!(
                "https://shared.cloudflare.steamstatic.com/store_item_assets/steam/apps/{}/header.jpg",
                hit.id
            )
        });
    let details = details.unwrap_or_default();
    SearchResult {
        header_image_url: if details.header_image_url.is_empty() {
            fallback_image
        } else {
            details.header_image_url
        },
        appid: hit.id,
        name: hit.name,
        release_date: details.release_date,
        developer: details.developer,
        publisher: details.publisher,
    }
}

/// Human-readable note for shortfalls and theme-less results.
fn analysis_note(
    entry: &CacheEntry,
    requested: u32,
    used: usize,
    themed: usize,
) -> Option<String> {
    let mut parts = Vec::new();
    if used < requested as usize {
        let shortfall = match entry.known_source_total {
            Some(total) if total < u64::from(requested) => format!(
                "Only {total} reviews are available for this filter and language; \
                 analysed {used} of the {requested} requested."
            ),
            _ if entry.is_exhausted() => format!(
                "The store returned only {used} reviews for this filter and language \
                 ({requested} requested)."
            ),
            _ => format!(
                "Collected {used} of {requested} requested reviews before the store stopped \
                 responding; repeat the request to continue."
            ),
        };
        parts.push(shortfall);
    }
    if used > 0 && themed == 0 {
        parts.push("No reviews matched any time-related theme keywords.".to_string());
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}
