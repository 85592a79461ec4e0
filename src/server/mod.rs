//! HTTP surface for the analysis service.
//!
//! Routes:
//! - `GET /health`: liveness probe
//! - `POST /analyze`: JSON `{app_id, review_count?, filter?, language?}`
//! - `GET /reviews`: one page of cached reviews
//! - `GET /export`: cached reviews as a CSV download
//! - `POST /search`: JSON `{name}`
//!
//! Handlers are thin: they parse loosely-typed input into request types and
//! delegate to [`AnalysisService`]. Errors render as `{"error": "..."}`.

pub mod config;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

use crate::service::AnalysisService;
use crate::types::{AnalysisRequest, PageRequest};
use crate::{Result, TimesinkError};

type SharedService = Arc<AnalysisService>;

/// Build the router over a shared service.
pub fn router(service: SharedService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/reviews", get(reviews))
        .route("/export", get(export))
        .route("/search", post(search))
        .layer(cors)
        .with_state(service)
}

impl TimesinkError {
    /// HTTP status this error is reported with.
    pub fn http_status(&self) -> StatusCode {
        match self {
            TimesinkError::Validation(_) => StatusCode::BAD_REQUEST,
            TimesinkError::CacheMiss | TimesinkError::CacheExpired => StatusCode::NOT_FOUND,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TimesinkError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn parse_body(body: &Bytes) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body)
        .map_err(|e| TimesinkError::Validation(format!("error parsing JSON body: {e}")))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn analyze(State(service): State<SharedService>, body: Bytes) -> Result<Response> {
    let request = AnalysisRequest::from_json(&parse_body(&body)?)?;
    let response = service.analyze(&request).await?;
    Ok(Json(response).into_response())
}

async fn reviews(
    State(service): State<SharedService>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response> {
    let request = PageRequest::from_params(&params)?;
    let page = service.page(&request)?;
    Ok(Json(page).into_response())
}

async fn export(
    State(service): State<SharedService>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response> {
    let request = PageRequest::from_params(&params)?;
    let csv = service.export(&request)?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", csv.file_name))
        .map_err(|e| TimesinkError::Export(format!("invalid file name: {e}")))?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_static("Content-Disposition"),
            ),
        ],
        csv.content,
    )
        .into_response())
}

async fn search(State(service): State<SharedService>, body: Bytes) -> Result<Response> {
    let body = parse_body(&body)?;
    let term = body.get("name").and_then(Value::as_str).unwrap_or_default();
    match service.search(term).await {
        Ok(results) => Ok(Json(json!({ "results": results })).into_response()),
        Err(e) => {
            warn!(term, error = %e, "store search failed");
            Err(e)
        }
    }
}
