//! YouTube Data API v3 retrieval adapter.
//!
//! Turns a query into a list of [`CandidateVideo`]s in two calls:
//!
//! 1. `GET /search?part=snippet&type=video` for up to `max_results` ids
//! 2. `GET /videos?part=snippet,contentDetails,statistics` for metadata
//!
//! Each video gets a retrieval `priority` in `[0, 3]` from its duration and
//! age, and videos with too little metadata are filtered out (see
//! [`shape_results`]).
//!
//! # Retry Strategy
//!
//! - HTTP 429 and 5xx → retry with exponential backoff (1s, 2s, 4s, … capped at 2^5)
//! - Other 4xx → fail immediately
//! - Network errors → retry

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::YouTubeConfig;
use crate::models::CandidateVideo;
use crate::parse;

/// Highest priority the retrieval stage hands to the ranking engine.
pub const MAX_PRIORITY: u32 = 3;

/// Source of candidate videos for a query.
#[async_trait]
pub trait VideoSource: Send + Sync {
    fn name(&self) -> &str;

    /// Return candidates for `query`. An empty list is a valid answer.
    async fn search(&self, query: &str) -> Result<Vec<CandidateVideo>, RetrievalError>;
}

/// Failures from the retrieval stage, distinguishable by cause.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Search query cannot be empty")]
    EmptyQuery,
    #[error("{0} not found in environment variables")]
    MissingApiKey(String),
    #[error("YouTube API rejected the credentials ({status}): {message}")]
    Unauthorized { status: u16, message: String },
    #[error("YouTube API rate limit or quota exceeded: {0}")]
    RateLimited(String),
    #[error("YouTube API request failed with status code {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("YouTube API Error: {0}")]
    Api(String),
    #[error("Error making YouTube API request: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Error parsing YouTube API response: {0}")]
    Decode(String),
}

pub struct YouTubeSource {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    max_results: usize,
    max_retries: u32,
}

impl YouTubeSource {
    /// Build the adapter, reading the API key from the configured
    /// environment variable.
    pub fn new(config: &YouTubeConfig) -> Result<Self, RetrievalError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RetrievalError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(
        config: &YouTubeConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, RetrievalError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
            max_retries: config.max_retries,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, RetrievalError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::debug!(endpoint, attempt, ?delay, "retrying YouTube request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .http
                .get(&url)
                .query(params)
                .query(&[("key", self.api_key.as_str())])
                .send()
                .await;

            let response = match resp {
                Ok(r) => r,
                Err(e) => {
                    last_err = Some(RetrievalError::Network(e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let body = response.text().await?;
                return decode(&body);
            }

            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status.as_u16(), api_error_message(&body).unwrap_or(body));

            if status.as_u16() == 429 || status.is_server_error() {
                last_err = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(last_err.unwrap_or_else(|| RetrievalError::Decode("no response".to_string())))
    }
}

#[async_trait]
impl VideoSource for YouTubeSource {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn search(&self, query: &str) -> Result<Vec<CandidateVideo>, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }

        let search: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet".to_string()),
                    ("q", query.to_string()),
                    ("type", "video".to_string()),
                    ("maxResults", self.max_results.to_string()),
                ],
            )
            .await?;

        let ids: Vec<String> = search
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();
        if ids.is_empty() {
            tracing::info!(query, "search returned no video ids");
            return Ok(Vec::new());
        }

        let details: VideosResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,contentDetails,statistics".to_string()),
                    ("id", ids.join(",")),
                ],
            )
            .await?;

        let videos = shape_results(details.items, Utc::now(), self.max_results);
        tracing::info!(query, ids = ids.len(), kept = videos.len(), "retrieved candidates");
        Ok(videos)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, RetrievalError> {
    if let Some(message) = api_error_message(body) {
        return Err(RetrievalError::Api(message));
    }
    serde_json::from_str(body).map_err(|e| RetrievalError::Decode(e.to_string()))
}

/// The `error.message` field of a Google API error body, if present.
fn api_error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;
    Some(
        error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error from YouTube Data API")
            .to_string(),
    )
}

fn classify_status(status: u16, message: String) -> RetrievalError {
    match status {
        401 | 403 if message.to_lowercase().contains("quota") => {
            RetrievalError::RateLimited(message)
        }
        401 | 403 => RetrievalError::Unauthorized { status, message },
        429 => RetrievalError::RateLimited(message),
        _ => RetrievalError::Upstream { status, message },
    }
}

// ============ Response shapes ============

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: SearchItemId,
}

#[derive(Debug, Default, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: VideoSnippet,
    #[serde(rename = "contentDetails", default)]
    content_details: ContentDetails,
}

#[derive(Debug, Default, Deserialize)]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

// ============ Shaping ============

fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

/// Retrieval-stage pre-score from duration and age, before clamping.
///
/// Duration: 4–25 min +3, 2–4 min +2, 25–30 min +1.
/// Age: ≤7 days +2, ≤30 days +1.
pub fn retrieval_priority(
    duration: Option<u64>,
    published: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u32 {
    let mut priority = match duration {
        Some(240..=1500) => 3,
        Some(120..=239) => 2,
        Some(1501..=1800) => 1,
        _ => 0,
    };
    if let Some(published) = published {
        match (now - published).num_days() {
            d if d <= 7 => priority += 2,
            d if d <= 30 => priority += 1,
            _ => {}
        }
    }
    priority
}

/// Convert raw video items into ranked candidates.
///
/// Keep rules: a parsable publish date always keeps the video; an
/// unparsable one keeps it only with a non-zero priority; no date at all
/// needs priority above 1. Survivors are sorted by priority (stable). If
/// nothing survives, every item is returned bare (title and URL, priority
/// 0), longest title first. The result is truncated to `limit`.
pub(crate) fn shape_results(
    items: Vec<VideoItem>,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<CandidateVideo> {
    let mut kept = Vec::new();
    let mut bare = Vec::new();

    for item in items {
        let duration = item
            .content_details
            .duration
            .as_deref()
            .and_then(parse::iso8601_duration);
        let published = item
            .snippet
            .published_at
            .as_deref()
            .and_then(parse::published_at);
        let raw_priority = retrieval_priority(duration, published, now);

        let keep = match (&item.snippet.published_at, published) {
            (Some(_), Some(_)) => true,
            (Some(_), None) => raw_priority > 0,
            (None, _) => raw_priority > 1,
        };

        let url = watch_url(&item.id);
        bare.push(CandidateVideo {
            title: item.snippet.title.clone(),
            url: url.clone(),
            ..Default::default()
        });

        if keep {
            kept.push(CandidateVideo {
                title: item.snippet.title,
                url,
                description: item.snippet.description,
                thumbnail: item
                    .snippet
                    .thumbnails
                    .default
                    .map(|t| t.url)
                    .unwrap_or_default(),
                channel_title: item.snippet.channel_title,
                duration_seconds: duration.and_then(|d| i64::try_from(d).ok()),
                published_at: item.snippet.published_at,
                priority: raw_priority.min(MAX_PRIORITY),
                score: None,
            });
        }
    }

    let mut videos = if kept.is_empty() {
        bare.sort_by(|a, b| b.title.chars().count().cmp(&a.title.chars().count()));
        bare
    } else {
        kept.sort_by(|a, b| b.priority.cmp(&a.priority));
        kept
    };
    videos.truncate(limit);
    videos
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn item(id: &str, title: &str, duration: Option<&str>, published: Option<&str>) -> VideoItem {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "snippet": {
                "title": title,
                "description": format!("about {}", title),
                "channelTitle": "chan",
                "publishedAt": published,
                "thumbnails": { "default": { "url": format!("https://i.ytimg.com/vi/{}/default.jpg", id) } }
            },
            "contentDetails": { "duration": duration }
        }))
        .unwrap()
    }

    #[test]
    fn test_priority_bands() {
        let fresh = Some(now() - chrono::Duration::days(2));
        let month = Some(now() - chrono::Duration::days(20));
        assert_eq!(retrieval_priority(Some(600), fresh, now()), 5);
        assert_eq!(retrieval_priority(Some(600), month, now()), 4);
        assert_eq!(retrieval_priority(Some(200), None, now()), 2);
        assert_eq!(retrieval_priority(Some(1600), None, now()), 1);
        assert_eq!(retrieval_priority(Some(60), None, now()), 0);
        assert_eq!(retrieval_priority(None, fresh, now()), 2);
    }

    #[test]
    fn test_shape_clamps_and_sorts_by_priority() {
        let items = vec![
            item("old", "Old long", Some("PT40M"), Some("2020-01-01T00:00:00Z")),
            item("new", "New tutorial", Some("PT10M"), Some("2024-05-30T00:00:00Z")),
        ];
        let videos = shape_results(items, now(), 20);
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=new");
        assert_eq!(videos[0].priority, MAX_PRIORITY);
        assert_eq!(videos[0].duration_seconds, Some(600));
        assert_eq!(videos[0].channel_title, "chan");
        assert!(videos[0].thumbnail_present());
        assert_eq!(videos[1].priority, 0);
    }

    #[test]
    fn test_shape_keep_rules() {
        let items = vec![
            // no date, priority 1 → dropped
            item("a", "A", Some("PT26M"), None),
            // no date, priority 3 → kept
            item("b", "B", Some("PT5M"), None),
            // bad date, priority 0 → dropped
            item("c", "C", Some("PT30S"), Some("garbage")),
            // bad date, priority 1 → kept
            item("d", "D", Some("PT26M"), Some("garbage")),
        ];
        let titles: Vec<String> = shape_results(items, now(), 20)
            .into_iter()
            .map(|v| v.title)
            .collect();
        assert_eq!(titles, vec!["B", "D"]);
    }

    #[test]
    fn test_shape_falls_back_to_bare_items() {
        let items = vec![
            item("a", "Short", Some("PT30S"), None),
            item("b", "A much longer title", None, None),
        ];
        let videos = shape_results(items, now(), 20);
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].title, "A much longer title");
        assert_eq!(videos[0].priority, 0);
        assert!(videos[0].description.is_empty());
        assert!(!videos[0].thumbnail_present());
    }

    #[test]
    fn test_shape_truncates() {
        let items: Vec<VideoItem> = (0..5)
            .map(|i| item(&format!("v{}", i), "t", Some("PT5M"), Some("2024-05-31T00:00:00Z")))
            .collect();
        assert_eq!(shape_results(items, now(), 3).len(), 3);
    }

    #[test]
    fn test_decode_surfaces_api_error() {
        let body = r#"{"error":{"code":400,"message":"API key not valid"}}"#;
        let err = decode::<SearchResponse>(body).unwrap_err();
        assert!(matches!(err, RetrievalError::Api(ref m) if m == "API key not valid"));
    }

    #[test]
    fn test_decode_search_ids() {
        let body = r#"{"items":[{"id":{"videoId":"x1"}},{"id":{"kind":"youtube#channel"}}]}"#;
        let resp: SearchResponse = decode(body).unwrap();
        let ids: Vec<_> = resp.items.into_iter().filter_map(|i| i.id.video_id).collect();
        assert_eq!(ids, vec!["x1"]);
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(403, "The request cannot be completed because you have exceeded your quota.".into()),
            RetrievalError::RateLimited(_)
        ));
        assert!(matches!(
            classify_status(403, "forbidden".into()),
            RetrievalError::Unauthorized { status: 403, .. }
        ));
        assert!(matches!(classify_status(429, "slow down".into()), RetrievalError::RateLimited(_)));
        assert!(matches!(
            classify_status(500, "boom".into()),
            RetrievalError::Upstream { status: 500, .. }
        ));
    }

    // ============ Against a local API stand-in ============

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn source_at(base_url: String, max_retries: u32) -> YouTubeSource {
        let config = YouTubeConfig {
            base_url,
            max_retries,
            ..Default::default()
        };
        YouTubeSource::with_api_key(&config, "test-key").unwrap()
    }

    fn counted(
        hits: &Arc<AtomicUsize>,
        reply: impl Fn(usize) -> (StatusCode, Json<Value>) + Clone + Send + Sync + 'static,
    ) -> axum::routing::MethodRouter {
        let hits = hits.clone();
        get(move || {
            let hits = hits.clone();
            let reply = reply.clone();
            async move { reply(hits.fetch_add(1, Ordering::SeqCst)) }
        })
    }

    #[tokio::test]
    async fn test_search_then_videos_flow() {
        let search_params: Arc<Mutex<HashMap<String, String>>> = Arc::default();
        let requested_ids: Arc<Mutex<Option<String>>> = Arc::default();
        let fresh = (Utc::now() - chrono::Duration::days(2)).to_rfc3339();

        let app = Router::new()
            .route(
                "/search",
                get({
                    let search_params = search_params.clone();
                    move |Query(params): Query<HashMap<String, String>>| {
                        let search_params = search_params.clone();
                        async move {
                            *search_params.lock().unwrap() = params;
                            Json(json!({ "items": [
                                { "id": { "videoId": "a" } },
                                { "id": { "kind": "youtube#channel" } },
                                { "id": { "videoId": "b" } }
                            ]}))
                        }
                    }
                }),
            )
            .route(
                "/videos",
                get({
                    let requested_ids = requested_ids.clone();
                    move |Query(params): Query<HashMap<String, String>>| {
                        let requested_ids = requested_ids.clone();
                        let fresh = fresh.clone();
                        async move {
                            *requested_ids.lock().unwrap() = params.get("id").cloned();
                            Json(json!({ "items": [
                                {
                                    "id": "b",
                                    "snippet": { "title": "Long one", "publishedAt": fresh },
                                    "contentDetails": { "duration": "PT40M" }
                                },
                                {
                                    "id": "a",
                                    "snippet": {
                                        "title": "Rust tutorial",
                                        "channelTitle": "chan",
                                        "publishedAt": fresh,
                                        "thumbnails": { "default": { "url": "https://i.ytimg.com/a.jpg" } }
                                    },
                                    "contentDetails": { "duration": "PT10M" }
                                }
                            ]}))
                        }
                    }
                }),
            );

        let source = source_at(serve(app).await, 0);
        let videos = source.search("rust tutorial").await.unwrap();

        let params = search_params.lock().unwrap().clone();
        assert_eq!(params.get("q").map(String::as_str), Some("rust tutorial"));
        assert_eq!(params.get("type").map(String::as_str), Some("video"));
        assert_eq!(params.get("key").map(String::as_str), Some("test-key"));
        assert_eq!(requested_ids.lock().unwrap().as_deref(), Some("a,b"));

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=a");
        assert_eq!(videos[0].priority, MAX_PRIORITY);
        assert_eq!(videos[0].duration_seconds, Some(600));
        assert_eq!(videos[0].channel_title, "chan");
        assert!(videos[0].thumbnail_present());
        assert_eq!(videos[1].url, "https://www.youtube.com/watch?v=b");
        assert_eq!(videos[1].priority, 2);
    }

    #[tokio::test]
    async fn test_no_video_ids_skips_details_call() {
        let search_hits = Arc::new(AtomicUsize::new(0));
        let video_hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/search",
                counted(&search_hits, |_| {
                    (
                        StatusCode::OK,
                        Json(json!({ "items": [{ "id": { "kind": "youtube#playlist" } }] })),
                    )
                }),
            )
            .route(
                "/videos",
                counted(&video_hits, |_| (StatusCode::OK, Json(json!({ "items": [] })))),
            );

        let videos = source_at(serve(app).await, 0).search("anything").await.unwrap();
        assert!(videos.is_empty());
        assert_eq!(search_hits.load(Ordering::SeqCst), 1);
        assert_eq!(video_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new().route(
            "/search",
            counted(&hits, |_| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": { "code": 400, "message": "Invalid value for q" } })),
                )
            }),
        );

        let err = source_at(serve(app).await, 2).search("x").await.unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Upstream { status: 400, ref message } if message == "Invalid value for q"
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new().route(
            "/search",
            counted(&hits, |n| {
                if n == 0 {
                    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})))
                } else {
                    (StatusCode::OK, Json(json!({ "items": [] })))
                }
            }),
        );

        let videos = source_at(serve(app).await, 1).search("x").await.unwrap();
        assert!(videos.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_body_on_success_status() {
        let app = Router::new().route(
            "/search",
            get(|| async { Json(json!({ "error": { "message": "Daily Limit Exceeded" } })) }),
        );

        let err = source_at(serve(app).await, 0).search("x").await.unwrap_err();
        assert!(matches!(err, RetrievalError::Api(ref m) if m == "Daily Limit Exceeded"));
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let source = YouTubeSource::with_api_key(&YouTubeConfig::default(), "k").unwrap();
        let err = source.search("   ").await.unwrap_err();
        assert!(matches!(err, RetrievalError::EmptyQuery));
    }
}
