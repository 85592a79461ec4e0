//! Tests for tagging, scoring and aggregation through the public API.

use std::sync::Arc;

use timesink::analysis::{playtime_distribution, summarize_theme, thematic_scores};
use timesink::{KeywordTagger, PolarityModel, ReviewAnalyzer, SentimentLabel, Theme};

/// Scores every text at a fixed compound value.
struct FixedPolarity(f64);

impl PolarityModel for FixedPolarity {
    fn name(&self) -> &str {
        "fixed"
    }

    fn compound(&self, _text: &str) -> f64 {
        self.0
    }
}

fn analyzer_with(compound: f64) -> ReviewAnalyzer {
    ReviewAnalyzer::new(
        Arc::new(KeywordTagger::default()),
        Arc::new(FixedPolarity(compound)),
    )
}

#[test]
fn tagging_examples() {
    let tagger = KeywordTagger::default();
    let tags = tagger.tag("only 3 hours long, total waste of time");
    assert!(tags.contains(&Theme::Length));
    assert!(tags.contains(&Theme::Grind));
    assert!(tagger.tag("great graphics").is_empty());
}

#[test]
fn record_rounds_playtime_and_compound() {
    let record = analyzer_with(0.123_456).record("felt short".into(), 95);
    assert_eq!(record.playtime_hours, 1.6);
    assert_eq!(record.sentiment_score, 0.1235);
    assert_eq!(record.sentiment_label, SentimentLabel::Neutral);
    assert_eq!(record.joined_tags(), "length");
}

#[test]
fn custom_model_is_reported_in_method() {
    let analyzer = analyzer_with(0.5);
    let method = analyzer.scorer().method();
    assert_eq!(method.model, "fixed");
    assert_eq!(method.thresholds.positive_compound_gte, 0.2);
    assert_eq!(method.thresholds.negative_compound_lte, -0.2);
    assert!(!method.known_limitations.is_empty());
}

#[test]
fn six_positive_four_negative() {
    let positive = analyzer_with(0.9);
    let negative = analyzer_with(-0.9);
    let mut records: Vec<_> = (0..6)
        .map(|_| positive.record("too short".into(), 60))
        .collect();
    records.extend((0..4).map(|_| negative.record("too short".into(), 60)));

    let summary = summarize_theme(&records);
    assert_eq!(summary.positive_percent, 60.0);
    assert_eq!(summary.negative_percent, 40.0);
    assert_eq!(summary.total_found, 10);

    let scores = thematic_scores(&records);
    assert_eq!(scores.length.found, 10);
    assert_eq!(scores.length.positive_percent, 60.0);
    assert_eq!(scores.grind.found, 0);
    assert_eq!(scores.grind.positive_percent, 0.0);
}

#[test]
fn playtime_with_one_outlier() {
    let analyzer = analyzer_with(0.0);
    let records: Vec<_> = [60, 60, 60, 60, 6000]
        .into_iter()
        .map(|minutes| analyzer.record("anything".into(), minutes))
        .collect();

    let dist = playtime_distribution(&records);
    assert_eq!(dist.median_hours, 1.0);
    assert_eq!(dist.histogram_buckets[0], 0);
    assert_eq!(dist.histogram_buckets[1], 4);
    assert_eq!(dist.histogram_buckets[6], 1);
    assert_eq!(dist.histogram_bins_hours[1], "1–5");
}
