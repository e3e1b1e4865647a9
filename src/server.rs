//! HTTP API for the video finder.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/search` | Retrieve candidates for a query and pick the best one |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Response Contract
//!
//! `POST /api/search` always answers with the same envelope:
//!
//! ```json
//! { "best_video": { "title": "...", "score": 105 }, "videos": [ ... ], "status": "success" }
//! ```
//!
//! | Situation | HTTP | `status` |
//! |-----------|------|----------|
//! | Best video found | 200 | `success` |
//! | No videos for the query | 200 | `warning` |
//! | Missing query / malformed body | 400 | `error` |
//! | Upstream rate limit | 429 | `error` |
//! | Missing API key | 500 | `error` |
//! | Other upstream failures | 502 | `error` |
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser frontend on
//! another port can call the API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::models::CandidateVideo;
use crate::selector::{create_selector, Selector};
use crate::youtube::{RetrievalError, VideoSource, YouTubeSource};

/// Shared application state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn VideoSource>,
    pub selector: Arc<dyn Selector>,
}

/// Starts the server with the YouTube adapter and configured selector.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let source: Arc<dyn VideoSource> = Arc::new(YouTubeSource::new(&config.youtube)?);
    let selector = create_selector(config)?;
    run_server_with(config, AppState { source, selector }).await
}

/// Starts the server with caller-supplied collaborators.
///
/// Used by tests and by binaries that bring their own [`VideoSource`].
pub async fn run_server_with(config: &Config, state: AppState) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(state.clone());

    tracing::info!(
        source = state.source.name(),
        selector = state.selector.name(),
        "listening on http://{}",
        bind_addr
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with CORS applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", post(handle_search))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Response envelope ============

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub best_video: Option<CandidateVideo>,
    pub videos: Vec<CandidateVideo>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// Error that renders as the search envelope with `status: "error"`.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = SearchResponse {
            best_video: None,
            videos: Vec::new(),
            status: "error".to_string(),
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

/// Map a retrieval failure to the HTTP status that best describes it.
fn classify_retrieval_error(err: RetrievalError) -> AppError {
    let status = match &err {
        RetrievalError::EmptyQuery => StatusCode::BAD_REQUEST,
        RetrievalError::MissingApiKey(_) => StatusCode::INTERNAL_SERVER_ERROR,
        RetrievalError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        RetrievalError::Unauthorized { .. }
        | RetrievalError::Upstream { .. }
        | RetrievalError::Api(_)
        | RetrievalError::Network(_)
        | RetrievalError::Decode(_) => StatusCode::BAD_GATEWAY,
    };
    AppError {
        status,
        message: err.to_string(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/search ============

/// Handler for `POST /api/search`.
///
/// Validates the body, retrieves candidates, and runs the selector. The
/// selector is skipped entirely when retrieval fails or returns nothing.
async fn handle_search(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(request) = body.map_err(|e| {
        tracing::warn!(error = %e, "rejected search body");
        bad_request(format!("Invalid request: {}", e.body_text()))
    })?;

    let query = request
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| bad_request("Query is required"))?;

    tracing::info!(%query, "search request");

    let videos = state.source.search(&query).await.map_err(|e| {
        tracing::error!(error = %e, %query, "retrieval failed");
        classify_retrieval_error(e)
    })?;

    if videos.is_empty() {
        tracing::warn!(%query, "no videos found");
        return Ok(Json(SearchResponse {
            best_video: None,
            videos,
            status: "warning".to_string(),
            error: Some("No videos found for the given query".to_string()),
        }));
    }

    let best_video = state.selector.select(&query, &videos).await;
    if let Some(best) = &best_video {
        tracing::info!(
            %query,
            candidates = videos.len(),
            title = %best.title,
            score = ?best.score,
            "selected best video"
        );
    }

    Ok(Json(SearchResponse {
        best_video,
        videos,
        status: "success".to_string(),
        error: None,
    }))
}
