//! Theme keyword lists and the tagger compiled from them.
//!
//! A keyword containing a space or hyphen is matched as a literal phrase
//! anywhere in the text; a single word only matches on word boundaries, so
//! `long` does not fire inside `belong`.
//! All matching is case-insensitive.

use regex::Regex;

use crate::types::{Theme, ThemeSet};
use crate::{Result, TimesinkError};

#[rustfmt::skip]
pub const LENGTH_KEYWORDS: &[&str] = &[
    "hour", "hours", "length", "lengths", "lengthy", "short", "long",
    "time sink", "time investment", "time commitment",
    "seconds", "minute", "minutes", "hourly",
    "per day", "days", "weekly", "month", "months",
    "quarterly", "year", "years", "yearly", "annual",
    "session", "sessions", "playtime", "play time", "player time",
    "limited time",
    "runtime", "run time",
    "playthrough", "play-through",
    "game length", "story length",
    "beat in", "beaten in", "finished in", "finish in",
    "hours in",
];

#[rustfmt::skip]
pub const GRIND_KEYWORDS: &[&str] = &[
    "grind", "grindy", "farming", "repetitive", "repetition",
    "burnout", "dailies", "daily", "chore", "time waste",
    "waste of time", "time waster", "time-waster",
    "time wasting", "time-wasting",
    "time-consuming", "time consuming",
    "busywork", "padding", "filler",
    "tedious", "tedium", "tedius",
    "grindfest", "grind fest", "mindless grind",
    "time gate", "time gated", "time-gated",
    "timegate", "timegated",
];

#[rustfmt::skip]
pub const VALUE_KEYWORDS: &[&str] = &[
    // time-relational value
    "replayable", "replayability", "content updates",
    "longevity", "shelf life",
    "lifespan", "life span", "roadmap", "road map", "season", "seasons", "seasonal",
    // explicit time/price conjunctions
    "too short for the price",
    "worth the time", "not worth the time",
    "time well spent",
    "good use of time",
    "waste of time and money",
    "hours of content", "hours of gameplay",
    "per hour", "per-hour",
    // respect for player time
    "respect my time", "respects my time", "respect your time", "respects your time",
    "respect the player's time", "respect the players' time", "respects the player's time",
    "respecting my time", "respecting your time",
    "waste my time", "wastes my time", "waste your time", "wastes your time",
    "waste of time", "total waste of time", "complete waste of time",
];

/// Compiled per-theme matchers.
#[derive(Debug, Clone)]
pub struct KeywordTagger {
    patterns: Vec<(Theme, Option<Regex>)>,
}

impl KeywordTagger {
    /// Compile a tagger from explicit keyword lists.
    ///
    /// A theme whose list is empty (after trimming) never matches.
    pub fn new(lists: &[(Theme, &[&str])]) -> Result<Self> {
        let patterns = lists
            .iter()
            .map(|(theme, keywords)| Ok((*theme, compile_keyword_pattern(keywords)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Themes whose keyword list matches `text`.
    pub fn tag(&self, text: &str) -> ThemeSet {
        self.patterns
            .iter()
            .filter(|(_, pattern)| pattern.as_ref().is_some_and(|p| p.is_match(text)))
            .map(|(theme, _)| *theme)
            .collect()
    }

    /// Whether any theme matches `text`.
    pub fn matches_any(&self, text: &str) -> bool {
        self.patterns
            .iter()
            .any(|(_, pattern)| pattern.as_ref().is_some_and(|p| p.is_match(text)))
    }
}

impl Default for KeywordTagger {
    /// The built-in `length`/`grind`/`value` lists.
    fn default() -> Self {
        Self::new(&[
            (Theme::Length, LENGTH_KEYWORDS),
            (Theme::Grind, GRIND_KEYWORDS),
            (Theme::Value, VALUE_KEYWORDS),
        ])
        .expect("built-in keyword lists are escaped literals")
    }
}

fn compile_keyword_pattern(keywords: &[&str]) -> Result<Option<Regex>> {
    let parts: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| {
            if k.contains(' ') || k.contains('-') {
                regex::escape(k)
            } else {
                format!(r"\b{}\b", regex::escape(k))
            }
        })
        .collect();

    if parts.is_empty() {
        return Ok(None);
    }

    Regex::new(&format!("(?i){}", parts.join("|")))
        .map(Some)
        .map_err(|e| TimesinkError::Configuration(format!("invalid keyword pattern: {e}")))
}
