//! Aggregate statistics over review records.

use crate::types::{
    PlaytimeDistribution, ReviewRecord, SentimentLabel, Theme, ThemeScore, ThemeSummary,
    ThematicScores,
};

/// Histogram labels, one per bucket.
pub const HISTOGRAM_LABELS: [&str; 7] = ["<1", "1–5", "5–10", "10–20", "20–50", "50–100", "100+"];

/// Lower edges of buckets 1..=6 (bucket 0 starts at 0). The last bucket is
/// open-ended, i.e. it extends to the largest observed playtime.
const BUCKET_EDGES: [f64; 6] = [1.0, 5.0, 10.0, 20.0, 50.0, 100.0];

const NOT_ENOUGH_DATA: &str = "Not enough data with recorded playtime to analyse distribution.";
const HIGH_DEDICATION: &str =
    "Players show high dedication, with the middle 50% spending over 10 hours.";
const HIGHLY_VARIABLE: &str = "Highly variable experience; many play briefly, \
                               but a significant core invests substantial time.";
const MODERATE: &str = "The majority of players spend moderate time in the game.";

/// Count labels and compute the positive/negative split.
///
/// Neutral reviews count towards `total_found` but not the percentage
/// denominator; with no polar reviews both percentages are `0.0`.
pub fn summarize_theme<'a, I>(records: I) -> ThemeSummary
where
    I: IntoIterator<Item = &'a ReviewRecord>,
{
    let mut summary = ThemeSummary::default();
    for record in records {
        match record.sentiment_label {
            SentimentLabel::Positive => summary.positive_count += 1,
            SentimentLabel::Negative => summary.negative_count += 1,
            SentimentLabel::Neutral => summary.neutral_count += 1,
        }
    }
    summary.total_found = summary.positive_count + summary.negative_count + summary.neutral_count;

    let polar = summary.positive_count + summary.negative_count;
    if polar > 0 {
        summary.positive_percent = round2(summary.positive_count as f64 / polar as f64 * 100.0);
        summary.negative_percent = round2(summary.negative_count as f64 / polar as f64 * 100.0);
    }
    summary
}

/// Per-theme scores over `records`.
pub fn thematic_scores(records: &[ReviewRecord]) -> ThematicScores {
    let score = |theme: Theme| {
        ThemeScore::from(&summarize_theme(
            records.iter().filter(|r| r.has_theme(theme)),
        ))
    };
    ThematicScores {
        length: score(Theme::Length),
        grind: score(Theme::Grind),
        value: score(Theme::Value),
    }
}

/// Median, quartiles, histogram and a qualitative reading of playtime.
///
/// Only records with `playtime_hours > 0` participate.
pub fn playtime_distribution(records: &[ReviewRecord]) -> PlaytimeDistribution {
    let mut hours: Vec<f64> = records
        .iter()
        .map(|r| r.playtime_hours)
        .filter(|h| *h > 0.0)
        .collect();

    if hours.is_empty() {
        return PlaytimeDistribution {
            median_hours: 0.0,
            percentile_25th: 0.0,
            percentile_75th: 0.0,
            interpretation: NOT_ENOUGH_DATA.to_string(),
            histogram_buckets: [0; 7],
            histogram_bins_hours: histogram_labels(),
        };
    }

    hours.sort_by(f64::total_cmp);
    let median = percentile(&hours, 50.0);
    let p25 = percentile(&hours, 25.0);
    let p75 = percentile(&hours, 75.0);

    let mut buckets = [0u64; 7];
    for h in &hours {
        buckets[bucket_index(*h)] += 1;
    }

    let interpretation = if p75 > 50.0 && median > 10.0 {
        HIGH_DEDICATION
    } else if p75 > 10.0 && median < 5.0 {
        HIGHLY_VARIABLE
    } else {
        MODERATE
    };

    PlaytimeDistribution {
        median_hours: round2(median),
        percentile_25th: round2(p25),
        percentile_75th: round2(p75),
        interpretation: interpretation.to_string(),
        histogram_buckets: buckets,
        histogram_bins_hours: histogram_labels(),
    }
}

/// Linear-interpolation percentile of already-sorted, non-empty data.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (sorted.len() - 1) as f64 * p / 100.0;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

fn bucket_index(hours: f64) -> usize {
    BUCKET_EDGES
        .iter()
        .position(|edge| hours < *edge)
        .unwrap_or(BUCKET_EDGES.len())
}

fn histogram_labels() -> [String; 7] {
    HISTOGRAM_LABELS.map(String::from)
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
