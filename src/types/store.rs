//! Storefront metadata types

use serde::{Deserialize, Serialize};

const NOT_AVAILABLE: &str = "N/A";

/// Developer/publisher/release metadata for a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDetails {
    pub developer: String,
    pub publisher: String,
    pub header_image_url: String,
    pub release_date: String,
}

impl AppDetails {
    /// Placeholder used when the details lookup fails.
    pub fn unavailable() -> Self {
        Self {
            developer: NOT_AVAILABLE.to_string(),
            publisher: NOT_AVAILABLE.to_string(),
            header_image_url: String::new(),
            release_date: String::new(),
        }
    }
}

impl Default for AppDetails {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// One storefront search hit, enriched with details when available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub appid: String,
    pub name: String,
    pub header_image_url: String,
    pub release_date: String,
    pub developer: String,
    pub publisher: String,
}
