//! Builder for configuring service instances

use std::sync::Arc;
use std::time::Duration;

use super::AnalysisService;
use crate::{Result, TimesinkError};
use crate::analysis::ReviewAnalyzer;
use crate::cache::{
    AnalysisCache, AnalysisCacheConfig, Clock, DetailsCache, DetailsCacheConfig, SystemClock,
};
use crate::collector::{CollectorConfig, ReviewCollector};
use crate::upstream::steam::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::upstream::{RetryConfig, ReviewSource, SteamClient, StoreDirectory};

/// Pause between uncached details lookups while enriching search results.
pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(50);

/// Maximum number of search results returned.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Main entry point for creating service instances.
pub struct Timesink;

impl Timesink {
    /// Create a new builder for configuring the service.
    pub fn builder() -> AnalysisServiceBuilder {
        AnalysisServiceBuilder::new()
    }
}

/// Builder for [`AnalysisService`].
///
/// Without an explicit source, the service talks to the Steam store. An
/// injected [`ReviewSource`] replaces Steam for review listing only; details
/// and search then need a [`StoreDirectory`] (or `.steam(..)`) as well.
pub struct AnalysisServiceBuilder {
    source: Option<Arc<dyn ReviewSource>>,
    directory: Option<Arc<dyn StoreDirectory>>,
    steam_base_url: Option<String>,
    timeout: Duration,
    analyzer: Option<ReviewAnalyzer>,
    collector: CollectorConfig,
    retry: Option<RetryConfig>,
    cache: AnalysisCacheConfig,
    details: DetailsCacheConfig,
    clock: Option<Arc<dyn Clock>>,
    search_delay: Duration,
    search_limit: usize,
}

impl AnalysisServiceBuilder {
    pub fn new() -> Self {
        Self {
            source: None,
            directory: None,
            steam_base_url: None,
            timeout: DEFAULT_TIMEOUT,
            analyzer: None,
            collector: CollectorConfig::default(),
            retry: None,
            cache: AnalysisCacheConfig::default(),
            details: DetailsCacheConfig::default(),
            clock: None,
            search_delay: DEFAULT_SEARCH_DELAY,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Use the Steam store at `base_url` for anything not injected explicitly.
    pub fn steam(mut self, base_url: impl Into<String>) -> Self {
        self.steam_base_url = Some(base_url.into());
        self
    }

    /// Upstream request timeout for the Steam client.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn review_source(mut self, source: Arc<dyn ReviewSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn store_directory(mut self, directory: Arc<dyn StoreDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Replace the default keyword tagger and polarity model.
    pub fn analyzer(mut self, analyzer: ReviewAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn collector(mut self, config: CollectorConfig) -> Self {
        self.collector = config;
        self
    }

    /// Retry policy for every upstream call (overrides the collector's).
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    pub fn analysis_cache(mut self, config: AnalysisCacheConfig) -> Self {
        self.cache = config;
        self
    }

    pub fn details_cache(mut self, config: DetailsCacheConfig) -> Self {
        self.details = config;
        self
    }

    /// Clock used for analysis cache TTL and eviction.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = delay;
        self
    }

    pub fn search_limit(mut self, n: usize) -> Self {
        self.search_limit = n;
        self
    }

    /// Build the service.
    pub fn build(self) -> Result<AnalysisService> {
        let steam = if self.source.is_none() || self.steam_base_url.is_some() {
            let base_url = self
                .steam_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
            Some(Arc::new(SteamClient::with_timeout(base_url, self.timeout)?))
        } else {
            None
        };
        let source: Arc<dyn ReviewSource> = match (self.source, &steam) {
            (Some(source), _) => source,
            (None, Some(steam)) => Arc::clone(steam) as Arc<dyn ReviewSource>,
            (None, None) => {
                return Err(TimesinkError::Configuration(
                    "no review source configured".to_string(),
                ));
            }
        };
        let directory = self
            .directory
            .or_else(|| steam.map(|steam| steam as Arc<dyn StoreDirectory>));

        let mut collector_config = self.collector;
        if let Some(retry) = self.retry {
            collector_config.retry = retry;
        }
        let retry = collector_config.retry.clone();

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let collector = ReviewCollector::new(
            source,
            self.analyzer.unwrap_or_default(),
            collector_config,
        );

        Ok(AnalysisService {
            collector,
            cache: Arc::new(AnalysisCache::with_clock(self.cache, clock)),
            details: DetailsCache::new(&self.details),
            directory,
            retry,
            search_delay: self.search_delay,
            search_limit: self.search_limit,
        })
    }
}

impl Default for AnalysisServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
