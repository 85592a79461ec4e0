//! Timesink error types

use std::time::Duration;

/// Timesink error types
#[derive(Debug, thiserror::Error)]
pub enum TimesinkError {
    // Request errors
    #[error("invalid request: {0}")]
    Validation(String),

    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("upstream error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Upstream answered 2xx but the body did not have the documented shape.
    #[error("data error: {0}")]
    DataError(String),

    // Cache errors
    #[error("analysis data not found; run /analyze first")]
    CacheMiss,

    #[error("analysis cache expired; run /analyze again")]
    CacheExpired,

    // Output errors
    #[error("export error: {0}")]
    Export(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TimesinkError {
    /// HTTP status this error corresponds to (for both upstream and rate-limit variants).
    pub fn status(&self) -> Option<u16> {
        match self {
            TimesinkError::Api { status, .. } => Some(*status),
            TimesinkError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Upstream-provided wait hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TimesinkError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Whether this error came from talking to the upstream source.
    ///
    /// These are recovered inside the collector; they never fail an analysis.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            TimesinkError::Http(_)
                | TimesinkError::Api { .. }
                | TimesinkError::RateLimited { .. }
                | TimesinkError::DataError(_)
        )
    }
}

impl From<reqwest::Error> for TimesinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TimesinkError::DataError(err.to_string())
        } else {
            TimesinkError::Http(err.to_string())
        }
    }
}

/// Result type alias for Timesink operations
pub type Result<T> = std::result::Result<T, TimesinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_reports_429() {
        let err = TimesinkError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
        assert!(err.is_upstream());
    }

    #[test]
    fn cache_errors_are_not_upstream() {
        assert!(!TimesinkError::CacheMiss.is_upstream());
        assert!(!TimesinkError::CacheExpired.is_upstream());
        assert_eq!(TimesinkError::CacheMiss.status(), None);
    }

    #[test]
    fn malformed_upstream_body_is_upstream() {
        assert!(TimesinkError::DataError("expected value".into()).is_upstream());
        assert!(!TimesinkError::Validation("bad body".into()).is_upstream());
    }
}
