//! Response payloads returned by the analysis service

use serde::{Deserialize, Serialize};

use super::request::ReviewFilter;
use super::review::ReviewRecord;
use super::store::AppDetails;

/// Per-theme sentiment counts and percentages.
///
/// Percentages are computed over positive + negative only; neutral reviews
/// are counted in `total_found` but excluded from the split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeSummary {
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub total_found: usize,
    pub positive_percent: f64,
    pub negative_percent: f64,
}

/// Theme block as presented in the analysis payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeScore {
    pub found: usize,
    pub positive_percent: f64,
    pub negative_percent: f64,
    pub neutral_count: usize,
}

impl From<&ThemeSummary> for ThemeScore {
    fn from(summary: &ThemeSummary) -> Self {
        Self {
            found: summary.total_found,
            positive_percent: summary.positive_percent,
            negative_percent: summary.negative_percent,
            neutral_count: summary.neutral_count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThematicScores {
    pub length: ThemeScore,
    pub grind: ThemeScore,
    pub value: ThemeScore,
}

/// Playtime summary over reviews with recorded playtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaytimeDistribution {
    pub median_hours: f64,
    pub percentile_25th: f64,
    pub percentile_75th: f64,
    pub interpretation: String,
    pub histogram_buckets: [u64; 7],
    pub histogram_bins_hours: [String; 7],
}

/// Classification thresholds echoed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentThresholds {
    pub positive_compound_gte: f64,
    pub negative_compound_lte: f64,
}

/// Transparency block describing how sentiment was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentMethod {
    pub model: String,
    pub scope: String,
    pub thresholds: SentimentThresholds,
    pub known_limitations: Vec<String>,
}

/// Whether the response was served from an already-complete cache entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheInfo {
    pub hit: bool,
    pub age_seconds: u64,
}

/// Result of an analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: String,
    pub app_id: String,
    pub review_count_requested: u32,
    /// Effective target: the requested count shrunk to what the source can provide.
    pub review_count_used: u32,
    pub review_filter: ReviewFilter,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_total_reviews: Option<u64>,
    pub total_reviews_collected: usize,
    pub total_reviews_analyzed: usize,
    pub total_themed_reviews: usize,
    pub appdetails: AppDetails,
    pub thematic_scores: ThematicScores,
    pub playtime_distribution: PlaytimeDistribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub sentiment_method: SentimentMethod,
    pub cache: CacheInfo,
}

/// Which subset a page or export was actually drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Only reviews with at least one theme tag.
    Themed,
    /// Every cached review.
    All,
    /// Themed-only was requested but nothing was tagged, so all reviews were used.
    ThemedWithFallback,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Themed => "themed",
            SelectionMode::All => "all",
            SelectionMode::ThemedWithFallback => "themed_with_fallback",
        }
    }
}

/// One page of cached reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPage {
    pub reviews: Vec<ReviewRecord>,
    pub total_available: usize,
    pub offset: usize,
    pub limit: usize,
    pub mode: SelectionMode,
}
