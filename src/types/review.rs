//! Review records and their derived labels

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A thematic category of time-related player sentiment.
///
/// Declaration order is the canonical tag order (`length`, `grind`, `value`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Length,
    Grind,
    Value,
}

impl Theme {
    /// All themes in canonical order.
    pub const ALL: [Theme; 3] = [Theme::Length, Theme::Grind, Theme::Value];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Length => "length",
            Theme::Grind => "grind",
            Theme::Value => "value",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of themes a review was tagged with, iterated in canonical order.
pub type ThemeSet = BTreeSet<Theme>;

/// Three-way sentiment classification of a compound score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One upstream review, tagged and scored at fetch time.
///
/// Never mutated after creation. Field names on the wire follow the
/// historical payload (`review_text`, `sentiment_compound`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(rename = "review_text")]
    pub text: String,
    pub playtime_hours: f64,
    pub sentiment_label: SentimentLabel,
    #[serde(rename = "sentiment_compound")]
    pub sentiment_score: f64,
    pub theme_tags: ThemeSet,
}

impl ReviewRecord {
    /// Whether the review carries at least one theme tag.
    pub fn is_themed(&self) -> bool {
        !self.theme_tags.is_empty()
    }

    pub fn has_theme(&self, theme: Theme) -> bool {
        self.theme_tags.contains(&theme)
    }

    /// Tags joined with `|` in canonical order (CSV export format).
    pub fn joined_tags(&self) -> String {
        self.theme_tags
            .iter()
            .map(Theme::as_str)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Convert upstream playtime minutes into hours rounded to one decimal.
pub(crate) fn minutes_to_hours(minutes: u64) -> f64 {
    (minutes as f64 / 60.0 * 10.0).round() / 10.0
}
