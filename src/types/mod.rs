//! Public types for the Timesink API.

mod request;
mod response;
mod review;
mod store;

pub use request::{
    AnalysisRequest, DEFAULT_PAGE_LIMIT, DEFAULT_REVIEW_COUNT, MAX_PAGE_LIMIT, MAX_REVIEW_COUNT,
    MIN_REVIEW_COUNT, PageRequest, ReviewFilter, Selection, clamp_review_count,
    normalize_language,
};
pub use response::{
    AnalysisResponse, CacheInfo, PlaytimeDistribution, ReviewPage, SelectionMode, SentimentMethod,
    SentimentThresholds, ThemeScore, ThemeSummary, ThematicScores,
};
pub use review::{ReviewRecord, SentimentLabel, Theme, ThemeSet};
pub(crate) use review::minutes_to_hours;
pub use store::{AppDetails, SearchResult};
