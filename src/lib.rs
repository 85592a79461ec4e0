//! Timesink - incremental review collection and time-theme sentiment analysis
//!
//! This crate pages a storefront's cursor-based review listing, tags each
//! review against time-related themes (length, grind, value), scores its
//! sentiment in that context, and aggregates the results. Collection progress
//! is cached per (subject, filter, language) so that asking for more reviews
//! later only fetches the missing increment.
//!
//! # Example
//!
//! ```rust,no_run
//! use timesink::{AnalysisRequest, ReviewFilter, Timesink};
//!
//! #[tokio::main]
//! async fn main() -> timesink::Result<()> {
//!     let service = Timesink::builder().build()?;
//!
//!     let request = AnalysisRequest::new("413150")
//!         .review_count(500)
//!         .filter(ReviewFilter::Recent)
//!         .language("english");
//!     let response = service.analyze(&request).await?;
//!
//!     println!(
//!         "length: {}% positive over {} reviews",
//!         response.thematic_scores.length.positive_percent,
//!         response.thematic_scores.length.found,
//!     );
//!     Ok(())
//! }
//! ```
//!
//! # Embedding with a custom source
//!
//! Anything implementing [`ReviewSource`] can replace the Steam client:
//!
//! ```rust,ignore
//! let service = Timesink::builder()
//!     .review_source(Arc::new(MySource::new()))
//!     .build()?;
//! ```

pub mod analysis;
pub mod cache;
pub mod collector;
pub mod error;
#[cfg(feature = "server")]
pub mod server;
pub mod service;
pub mod telemetry;
pub mod types;
pub mod upstream;

/// Crate version, as reported by the daemon.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types at crate root
pub use analysis::{KeywordTagger, PolarityModel, ReviewAnalyzer, SentimentScorer, VaderPolarity};
pub use cache::{
    AnalysisCache, AnalysisCacheConfig, CacheEntry, CacheKey, Clock, DetailsCache,
    DetailsCacheConfig, EntryAddress, EntryHandle, ManualClock, SystemClock,
};
pub use collector::{CollectionOutcome, CollectorConfig, Increment, ReviewCollector};
pub use error::{Result, TimesinkError};
pub use service::{AnalysisService, AnalysisServiceBuilder, CsvExport, Timesink};
pub use upstream::{
    PageQuery, RetryConfig, ReviewSource, SearchHit, SourcePage, SourceReview, SteamClient,
    StoreDirectory,
};

// Re-export all types
pub use types::{
    AnalysisRequest, AnalysisResponse, AppDetails, CacheInfo, PageRequest, PlaytimeDistribution,
    ReviewFilter, ReviewPage, ReviewRecord, SearchResult, Selection, SelectionMode,
    SentimentLabel, SentimentMethod, Theme, ThemeScore, ThemeSet, ThemeSummary, ThematicScores,
};
