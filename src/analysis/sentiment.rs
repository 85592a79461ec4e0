//! Time-context sentiment scoring.
//!
//! Reviews are narrowed to the sentences that mention a theme keyword before
//! scoring, so a glowing review of the art direction does not drown out a
//! single complaint about padding. When no sentence mentions a theme the whole
//! review is scored.
//!
//! The polarity model is pluggable through [`PolarityModel`]. The default
//! [`VaderPolarity`] runs the VADER lexicon and rules and reports its
//! compound score.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use vader_sentiment::SentimentIntensityAnalyzer;

use super::keywords::KeywordTagger;
use crate::types::{SentimentLabel, SentimentMethod, SentimentThresholds};

/// Compound score at or above which a review is Positive.
pub const POSITIVE_THRESHOLD: f64 = 0.2;
/// Compound score at or below which a review is Negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.2;

/// A text → compound polarity function.
pub trait PolarityModel: Send + Sync {
    /// Short model name for transparency metadata.
    fn name(&self) -> &str;

    /// Compound polarity of `text` in `[-1, 1]`. Empty text scores 0.
    fn compound(&self, text: &str) -> f64;
}

/// Map a compound score onto a label using the fixed thresholds.
pub fn classify(compound: f64) -> SentimentLabel {
    if compound >= POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if compound <= NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.!?]+["')\]]*\s+"#).expect("sentence boundary pattern is valid")
});

/// Words that take a period without ending a sentence.
#[rustfmt::skip]
const ABBREVIATIONS: &[&str] = &[
    "approx", "appx", "approximately", "eg", "ie", "vs", "cf", "ca", "est",
    "mr", "mrs", "ms", "dr", "st", "jr", "sr", "lvl", "vol", "ep", "ch", "pt",
];

/// Dotted abbreviations such as `e.g` or `u.s`.
static DOTTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z](\.[a-z])+$").expect("dotted abbreviation pattern is valid")
});

/// Whether the last word of `before` is an abbreviation rather than a sentence end.
fn ends_with_abbreviation(before: &str) -> bool {
    let word = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(['(', '[', '"', '\''])
        .to_ascii_lowercase();
    ABBREVIATIONS.contains(&word.as_str()) || DOTTED.is_match(&word)
}

/// Split text into sentences on terminal punctuation followed by whitespace.
///
/// A single period after a known abbreviation (`approx.`, `e.g.`) is not a
/// boundary.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_END.find_iter(text) {
        let punctuation = boundary.as_str();
        let single_period = punctuation.starts_with('.')
            && !punctuation[1..].starts_with(['.', '!', '?']);
        if single_period && ends_with_abbreviation(&text[start..boundary.start()]) {
            continue;
        }
        let sentence = text[start..boundary.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = boundary.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Scores reviews in their time-related context.
#[derive(Clone)]
pub struct SentimentScorer {
    tagger: Arc<KeywordTagger>,
    model: Arc<dyn PolarityModel>,
}

impl SentimentScorer {
    pub fn new(tagger: Arc<KeywordTagger>, model: Arc<dyn PolarityModel>) -> Self {
        Self { tagger, model }
    }

    /// Narrow `text` to theme-matching sentences, or return it unchanged.
    ///
    /// Blank input yields an empty string.
    pub fn narrow<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        if text.trim().is_empty() {
            return "".into();
        }
        let matched: Vec<&str> = split_sentences(text)
            .into_iter()
            .filter(|s| self.tagger.matches_any(s))
            .collect();
        if matched.is_empty() {
            text.into()
        } else {
            matched.join(" ").trim().to_string().into()
        }
    }

    /// Label and compound score for one review.
    pub fn score(&self, text: &str) -> (SentimentLabel, f64) {
        let narrowed = self.narrow(text);
        let compound = self.model.compound(&narrowed).clamp(-1.0, 1.0);
        (classify(compound), compound)
    }

    /// Transparency block for analysis responses.
    pub fn method(&self) -> SentimentMethod {
        SentimentMethod {
            model: self.model.name().to_string(),
            scope: "Sentiment is computed on time-relevant sentences when possible; \
                    otherwise the full review is used."
                .to_string(),
            thresholds: SentimentThresholds {
                positive_compound_gte: POSITIVE_THRESHOLD,
                negative_compound_lte: NEGATIVE_THRESHOLD,
            },
            known_limitations: vec![
                "May misread sarcasm, memes, or mixed opinions.".to_string(),
                "May not detect domain-specific meanings (e.g., grind as positive for some genres)."
                    .to_string(),
                "Sentence extraction is keyword-based, so context can be missed.".to_string(),
            ],
        }
    }
}

// ============================================================================
// VaderPolarity
// ============================================================================

/// VADER (Valence Aware Dictionary and sEntiment Reasoner) polarity model.
pub struct VaderPolarity {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderPolarity {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderPolarity {
    fn default() -> Self {
        Self::new()
    }
}

impl PolarityModel for VaderPolarity {
    fn name(&self) -> &str {
        "VADER"
    }

    fn compound(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let compound = self
            .analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or_default();
        if compound.is_finite() { compound } else { 0.0 }
    }
}
