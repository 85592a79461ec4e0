//! HTTP surface tests driven through the router with `tower::ServiceExt`.

#![cfg(feature = "server")]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use timesink::server::router;
use timesink::{
    AppDetails, CollectorConfig, PageQuery, Result, ReviewSource, SearchHit, SourcePage,
    SourceReview, StoreDirectory, Timesink,
};

struct TwoReviews;

#[async_trait]
impl ReviewSource for TwoReviews {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch_page(&self, _query: &PageQuery<'_>) -> Result<SourcePage> {
        Ok(SourcePage {
            reviews: vec![
                SourceReview {
                    text: "Way too short.\nStill fun".into(),
                    playtime_minutes: 180,
                },
                SourceReview {
                    text: "great graphics".into(),
                    playtime_minutes: 0,
                },
            ],
            cursor: None,
            total: Some(2),
        })
    }
}

struct OneHit;

#[async_trait]
impl StoreDirectory for OneHit {
    fn name(&self) -> &str {
        "stub"
    }

    async fn app_details(&self, _subject_id: &str) -> Result<Option<AppDetails>> {
        Ok(None)
    }

    async fn search(&self, _term: &str) -> Result<Vec<SearchHit>> {
        Ok(vec![SearchHit {
            id: "10".into(),
            name: "Counter-Strike".into(),
            header_image: None,
            tiny_image: None,
        }])
    }
}

fn app() -> axum::Router {
    let service = Timesink::builder()
        .review_source(Arc::new(TwoReviews))
        .store_directory(Arc::new(OneHit))
        .collector(CollectorConfig::new().page_delay(Duration::ZERO))
        .search_delay(Duration::ZERO)
        .build()
        .unwrap();
    router(Arc::new(service))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn analyze_without_app_id_is_bad_request() {
    let response = app()
        .oneshot(post("/analyze", json!({ "review_count": 10 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("app_id"));
}

#[tokio::test]
async fn analyze_returns_payload() {
    let response = app()
        .oneshot(post(
            "/analyze",
            json!({ "app_id": 10, "review_count": "50", "filter": "bogus" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["app_id"], "10");
    assert_eq!(body["review_filter"], "recent");
    assert_eq!(body["review_count_requested"], 50);
    assert_eq!(body["review_count_used"], 2);
    assert_eq!(body["total_reviews_analyzed"], 2);
    assert_eq!(body["thematic_scores"]["length"]["found"], 1);
    assert_eq!(body["appdetails"]["developer"], "N/A");
    assert!(body["note"].as_str().unwrap().contains("Only 2 reviews"));
    assert_eq!(body["cache"]["hit"], false);
    assert_eq!(body["sentiment_method"]["model"], "VADER");
}

#[tokio::test]
async fn reviews_before_analyze_is_not_found() {
    let response = app().oneshot(get("/reviews?app_id=10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reviews_and_export_after_analyze() {
    let app = app();
    let response = app
        .clone()
        .oneshot(post("/analyze", json!({ "app_id": "10" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/reviews?app_id=10&themed_only=false&limit=1&offset=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["total_available"], 2);
    assert_eq!(page["mode"], "all");
    assert_eq!(page["reviews"][0]["review_text"], "great graphics");

    let response = app
        .oneshot(get("/export?app_id=10&total_count=1000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"steam_reviews_10_1000_recent_english_themed.csv\""
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[1].ends_with("Way too short. Still fun"), "{}", rows[1]);
}

#[tokio::test]
async fn export_file_name_is_header_safe() {
    let app = app();
    let response = app
        .clone()
        .oneshot(post(
            "/analyze",
            json!({ "app_id": "1\"0", "language": "en\"glish" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/export?app_id=1%220&language=en%22glish"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"steam_reviews_10_1000_recent_english_themed.csv\""
    );
}

#[tokio::test]
async fn search_returns_results_and_tolerates_blank_body() {
    let response = app()
        .oneshot(post("/search", json!({ "name": "counter" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["results"][0]["appid"], "10");
    assert!(
        body["results"][0]["header_image_url"]
            .as_str()
            .unwrap()
            .ends_with("/apps/10/header.jpg")
    );

    let blank = Request::post("/search").body(Body::empty()).unwrap();
    let response = app().oneshot(blank).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "results": [] }));
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let request = Request::post("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
