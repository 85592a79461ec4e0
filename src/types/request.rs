//! Inbound request types and their normalisation rules.
//!
//! Callers are lenient: malformed optional fields fall back to defaults and
//! out-of-range numbers are clamped. Only a missing subject id is rejected.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, TimesinkError};

/// Smallest review count an analysis may ask for.
pub const MIN_REVIEW_COUNT: u32 = 1;
/// Global hard cap on reviews per analysis.
pub const MAX_REVIEW_COUNT: u32 = 5000;
/// Review count used when the caller omits one (or sends garbage).
pub const DEFAULT_REVIEW_COUNT: u32 = 1000;
/// Page size used by pagination when the caller omits `limit`.
pub const DEFAULT_PAGE_LIMIT: usize = 20;
/// Largest page a pagination request may ask for.
pub const MAX_PAGE_LIMIT: usize = 200;

const DEFAULT_LANGUAGE: &str = "english";

/// Upstream review ordering mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewFilter {
    #[default]
    Recent,
    Updated,
    All,
}

impl ReviewFilter {
    /// Parse a filter, falling back to [`ReviewFilter::Recent`] on anything unrecognised.
    pub fn parse(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewFilter::Recent => "recent",
            ReviewFilter::Updated => "updated",
            ReviewFilter::All => "all",
        }
    }
}

impl FromStr for ReviewFilter {
    type Err = TimesinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(ReviewFilter::Recent),
            "updated" => Ok(ReviewFilter::Updated),
            "all" => Ok(ReviewFilter::All),
            other => Err(TimesinkError::Validation(format!(
                "unknown review filter '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ReviewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trim and lowercase a language name; blank becomes `english`.
pub fn normalize_language(raw: &str) -> String {
    let language = raw.trim().to_lowercase();
    if language.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        language
    }
}

/// Clamp a requested count into `[MIN_REVIEW_COUNT, MAX_REVIEW_COUNT]`.
pub fn clamp_review_count(n: i64) -> u32 {
    n.clamp(MIN_REVIEW_COUNT as i64, MAX_REVIEW_COUNT as i64) as u32
}

/// A request to analyse (and cache) reviews for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub subject_id: String,
    pub review_count: u32,
    pub filter: ReviewFilter,
    pub language: String,
}

impl AnalysisRequest {
    /// Create a request with default count, filter and language.
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into().trim().to_string(),
            review_count: DEFAULT_REVIEW_COUNT,
            filter: ReviewFilter::default(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Set the review count (clamped).
    pub fn review_count(mut self, n: i64) -> Self {
        self.review_count = clamp_review_count(n);
        self
    }

    pub fn filter(mut self, filter: ReviewFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the language (normalised).
    pub fn language(mut self, language: &str) -> Self {
        self.language = normalize_language(language);
        self
    }

    /// Build from a loosely-typed JSON body (`app_id`, `review_count`, `filter`, `language`).
    pub fn from_json(body: &Value) -> Result<Self> {
        let subject_id = body.get("app_id").map(value_to_string).unwrap_or_default();
        let request = Self::new(subject_id)
            .review_count(
                body.get("review_count")
                    .and_then(value_to_i64)
                    .unwrap_or(DEFAULT_REVIEW_COUNT as i64),
            )
            .filter(
                body.get("filter")
                    .and_then(Value::as_str)
                    .map(ReviewFilter::parse)
                    .unwrap_or_default(),
            )
            .language(body.get("language").and_then(Value::as_str).unwrap_or(""));
        request.validate()?;
        Ok(request)
    }

    /// Reject requests without a subject id.
    pub fn validate(&self) -> Result<()> {
        if self.subject_id.is_empty() {
            return Err(TimesinkError::Validation(
                "missing 'app_id' in request body".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which subset of cached reviews a page or export draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Only return reviews carrying at least one theme tag.
    pub themed_only: bool,
    /// When `themed_only` finds nothing, return the full set instead.
    pub fallback_to_all: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            themed_only: true,
            fallback_to_all: true,
        }
    }
}

/// A pagination or export request over a previously analysed subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub subject_id: String,
    pub filter: ReviewFilter,
    pub language: String,
    /// Count the original analysis was requested with (legacy key addressing).
    pub total_count: Option<u32>,
    pub offset: usize,
    pub limit: usize,
    pub selection: Selection,
}

impl PageRequest {
    /// Create a page request with default paging and selection.
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into().trim().to_string(),
            filter: ReviewFilter::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            total_count: None,
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
            selection: Selection::default(),
        }
    }

    pub fn filter(mut self, filter: ReviewFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.language = normalize_language(language);
        self
    }

    /// Set the legacy count hint (clamped like an analysis count).
    pub fn total_count(mut self, n: i64) -> Self {
        self.total_count = Some(clamp_review_count(n));
        self
    }

    /// Set offset (negative becomes 0) and limit (clamped to `[1, MAX_PAGE_LIMIT]`).
    pub fn window(mut self, offset: i64, limit: i64) -> Self {
        self.offset = offset.max(0) as usize;
        self.limit = limit.clamp(1, MAX_PAGE_LIMIT as i64) as usize;
        self
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Build from query-string parameters.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let get = |name: &str| params.get(name).map(String::as_str);
        let int = |name: &str| get(name).and_then(|v| v.trim().parse::<i64>().ok());
        let flag = |name: &str, default: bool| get(name).and_then(parse_flag).unwrap_or(default);

        let mut request = Self::new(get("app_id").unwrap_or(""))
            .filter(get("filter").map(ReviewFilter::parse).unwrap_or_default())
            .language(get("language").unwrap_or(""))
            .window(
                int("offset").unwrap_or(0),
                int("limit").unwrap_or(DEFAULT_PAGE_LIMIT as i64),
            )
            .selection(Selection {
                themed_only: flag("themed_only", true),
                fallback_to_all: flag("fallback_to_all", true),
            });
        if let Some(n) = int("total_count") {
            request = request.total_count(n);
        }

        if request.subject_id.is_empty() {
            return Err(TimesinkError::Validation(
                "missing 'app_id' parameter".to_string(),
            ));
        }
        Ok(request)
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_falls_back_to_recent() {
        assert_eq!(ReviewFilter::parse("ALL"), ReviewFilter::All);
        assert_eq!(ReviewFilter::parse(" updated "), ReviewFilter::Updated);
        assert_eq!(ReviewFilter::parse("funny"), ReviewFilter::Recent);
        assert_eq!(ReviewFilter::parse(""), ReviewFilter::Recent);
    }

    #[test]
    fn language_defaults_to_english() {
        assert_eq!(normalize_language("   "), "english");
        assert_eq!(normalize_language(" German "), "german");
    }

    #[test]
    fn analysis_request_from_json_applies_defaults() {
        let req = AnalysisRequest::from_json(&json!({ "app_id": 570 })).unwrap();
        assert_eq!(req.subject_id, "570");
        assert_eq!(req.review_count, DEFAULT_REVIEW_COUNT);
        assert_eq!(req.filter, ReviewFilter::Recent);
        assert_eq!(req.language, "english");
    }

    #[test]
    fn analysis_request_clamps_count() {
        let req =
            AnalysisRequest::from_json(&json!({ "app_id": "10", "review_count": 99999 })).unwrap();
        assert_eq!(req.review_count, MAX_REVIEW_COUNT);

        let req = AnalysisRequest::from_json(&json!({ "app_id": "10", "review_count": "-3" }))
            .unwrap();
        assert_eq!(req.review_count, MIN_REVIEW_COUNT);

        let req = AnalysisRequest::from_json(&json!({ "app_id": "10", "review_count": "lots" }))
            .unwrap();
        assert_eq!(req.review_count, DEFAULT_REVIEW_COUNT);
    }

    #[test]
    fn analysis_request_requires_subject() {
        let err = AnalysisRequest::from_json(&json!({ "app_id": "  " })).unwrap_err();
        assert!(matches!(err, TimesinkError::Validation(_)));
        assert!(AnalysisRequest::from_json(&json!({})).is_err());
    }

    #[test]
    fn page_request_clamps_window() {
        let params: HashMap<String, String> = [
            ("app_id", "42"),
            ("offset", "-5"),
            ("limit", "1000"),
            ("themed_only", "false"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let req = PageRequest::from_params(&params).unwrap();
        assert_eq!(req.offset, 0);
        assert_eq!(req.limit, MAX_PAGE_LIMIT);
        assert!(!req.selection.themed_only);
        assert!(req.selection.fallback_to_all);
        assert_eq!(req.total_count, None);
    }

    #[test]
    fn page_request_requires_subject() {
        let err = PageRequest::from_params(&HashMap::new()).unwrap_err();
        assert!(matches!(err, TimesinkError::Validation(_)));
    }
}
