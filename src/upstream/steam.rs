//! Steam storefront client.
//!
//! Wraps three public store endpoints:
//! - `GET /appreviews/{appid}?json=1`: cursor-paginated reviews
//! - `GET /api/appdetails?appids={appid}`: developer/publisher/release metadata
//! - `GET /api/storesearch/?term={term}`: name search
//!
//! None of them require authentication. HTTP 429 is surfaced as
//! [`TimesinkError::RateLimited`] so the retry policy can back off.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::traits::{PageQuery, ReviewSource, SearchHit, SourcePage, SourceReview, StoreDirectory};
use crate::types::AppDetails;
use crate::{Result, TimesinkError};

/// Default base URL for the Steam store.
pub const DEFAULT_BASE_URL: &str = "https://store.steampowered.com";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Steam store review, details and search endpoints.
#[derive(Clone)]
pub struct SteamClient {
    http: Client,
    base_url: String,
}

impl SteamClient {
    /// Create a client against the public store.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL and request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TimesinkError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Map non-success statuses onto error variants.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(TimesinkError::RateLimited { retry_after });
        }
        let message = response.text().await.unwrap_or_default();
        Err(TimesinkError::Api {
            status: status.as_u16(),
            message: message.chars().take(200).collect(),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.http.get(url).query(params).send().await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| TimesinkError::DataError(e.to_string()))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Deserialize)]
struct ReviewsResponse {
    #[serde(default)]
    success: i64,
    #[serde(default)]
    query_summary: Option<QuerySummary>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    reviews: Vec<RawReview>,
}

#[derive(Deserialize)]
struct QuerySummary {
    #[serde(default)]
    total_reviews: Option<u64>,
}

#[derive(Deserialize)]
struct RawReview {
    #[serde(default)]
    review: Option<String>,
    #[serde(default)]
    author: Option<RawAuthor>,
}

#[derive(Deserialize)]
struct RawAuthor {
    #[serde(default)]
    playtime_at_review: Option<u64>,
    #[serde(default)]
    playtime_forever: Option<u64>,
}

#[derive(Deserialize)]
struct DetailsNode {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<DetailsData>,
}

#[derive(Deserialize)]
struct DetailsData {
    #[serde(default)]
    developers: Vec<String>,
    #[serde(default)]
    publishers: Vec<String>,
    #[serde(default)]
    header_image: Option<String>,
    #[serde(default)]
    release_date: Option<Value>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<RawSearchItem>,
}

#[derive(Deserialize)]
struct RawSearchItem {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    appid: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    header_image: Option<String>,
    #[serde(default)]
    tiny_image: Option<String>,
}

impl From<ReviewsResponse> for SourcePage {
    fn from(raw: ReviewsResponse) -> Self {
        let reviews = raw
            .reviews
            .into_iter()
            .map(|r| SourceReview {
                text: r.review.unwrap_or_default(),
                playtime_minutes: r
                    .author
                    .and_then(|a| a.playtime_at_review.or(a.playtime_forever))
                    .unwrap_or(0),
            })
            .collect();
        SourcePage {
            reviews,
            cursor: raw.cursor.filter(|c| !c.is_empty()),
            total: raw.query_summary.and_then(|q| q.total_reviews),
        }
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl From<DetailsData> for AppDetails {
    fn from(data: DetailsData) -> Self {
        let release_date = match data.release_date {
            Some(Value::Object(node)) => node
                .get("date")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let unavailable = AppDetails::unavailable();
        AppDetails {
            developer: data
                .developers
                .into_iter()
                .next()
                .unwrap_or(unavailable.developer),
            publisher: data
                .publishers
                .into_iter()
                .next()
                .unwrap_or(unavailable.publisher),
            header_image_url: data.header_image.unwrap_or_default(),
            release_date,
        }
    }
}

// ============================================================================
// Trait impls
// ============================================================================

#[async_trait]
impl ReviewSource for SteamClient {
    fn name(&self) -> &str {
        "steam"
    }

    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<SourcePage> {
        let url = format!("{}/appreviews/{}", self.base_url, query.subject_id);
        let page_size = query.page_size.to_string();
        let raw: ReviewsResponse = self
            .get_json(
                &url,
                &[
                    ("json", "1"),
                    ("language", query.language),
                    ("filter", query.filter.as_str()),
                    ("purchase_type", "all"),
                    ("num_per_page", &page_size),
                    ("cursor", query.cursor),
                ],
            )
            .await?;

        if raw.success != 1 {
            return Err(TimesinkError::DataError(format!(
                "review listing reported success={}",
                raw.success
            )));
        }
        Ok(raw.into())
    }
}

#[async_trait]
impl StoreDirectory for SteamClient {
    fn name(&self) -> &str {
        "steam"
    }

    async fn app_details(&self, subject_id: &str) -> Result<Option<AppDetails>> {
        let url = format!("{}/api/appdetails", self.base_url);
        let mut payload: HashMap<String, DetailsNode> = self
            .get_json(&url, &[("appids", subject_id), ("l", "en"), ("cc", "US")])
            .await?;

        Ok(payload
            .remove(subject_id)
            .filter(|node| node.success)
            .and_then(|node| node.data)
            .map(AppDetails::from))
    }

    async fn search(&self, term: &str) -> Result<Vec<SearchHit>> {
        let url = format!("{}/api/storesearch/", self.base_url);
        let raw: SearchResponse = self
            .get_json(
                &url,
                &[("term", term), ("l", "en"), ("cc", "US"), ("page", "1")],
            )
            .await?;

        Ok(raw
            .items
            .into_iter()
            .filter_map(|item| {
                let id = item
                    .id
                    .as_ref()
                    .and_then(id_to_string)
                    .or_else(|| item.appid.as_ref().and_then(id_to_string))?;
                let name = non_blank(item.name)?;
                Some(SearchHit {
                    id,
                    name,
                    header_image: non_blank(item.header_image),
                    tiny_image: non_blank(item.tiny_image),
                })
            })
            .collect())
    }
}
