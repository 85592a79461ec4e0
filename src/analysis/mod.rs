//! Pure analysis collaborators: keyword tagging, sentiment scoring, statistics.
//!
//! Everything here is deterministic and side-effect free, so the collector
//! can tag and score each review the moment it is fetched.

pub mod keywords;
pub mod sentiment;
pub mod stats;

use std::sync::Arc;

pub use keywords::KeywordTagger;
pub use sentiment::{
    NEGATIVE_THRESHOLD, POSITIVE_THRESHOLD, PolarityModel, SentimentScorer, VaderPolarity,
};
pub use stats::{playtime_distribution, summarize_theme, thematic_scores};

use crate::types::{ReviewRecord, minutes_to_hours};

/// Turns raw review text into [`ReviewRecord`]s.
#[derive(Clone)]
pub struct ReviewAnalyzer {
    tagger: Arc<KeywordTagger>,
    scorer: SentimentScorer,
}

impl ReviewAnalyzer {
    pub fn new(tagger: Arc<KeywordTagger>, model: Arc<dyn PolarityModel>) -> Self {
        let scorer = SentimentScorer::new(Arc::clone(&tagger), model);
        Self { tagger, scorer }
    }

    /// Tag, score and convert one upstream review.
    pub fn record(&self, text: String, playtime_minutes: u64) -> ReviewRecord {
        let (sentiment_label, compound) = self.scorer.score(&text);
        let theme_tags = self.tagger.tag(&text);
        ReviewRecord {
            text,
            playtime_hours: minutes_to_hours(playtime_minutes),
            sentiment_label,
            sentiment_score: (compound * 10_000.0).round() / 10_000.0,
            theme_tags,
        }
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }
}

impl Default for ReviewAnalyzer {
    /// Built-in keyword lists with the VADER polarity model.
    fn default() -> Self {
        Self::new(
            Arc::new(KeywordTagger::default()),
            Arc::new(VaderPolarity::new()),
        )
    }
}
