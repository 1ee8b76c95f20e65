use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::{Config, YOUTUBE_TIMEOUT_SECS};
use crate::error::{Result, YouTubeError};
use crate::scorer::metrics::safe_count;
use crate::types::ChannelInfo;
use crate::youtube::categories::merge_category_response;
use crate::youtube::VideoStatsProvider;

/// Thin YouTube Data API v3 client. Every call is retried on rate limiting and
/// transient failures with a linear backoff (`retry_delay * attempt`).
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
    latency: Arc<LatencyStats>,
    health: Arc<HealthState>,
}

impl YouTubeClient {
    pub fn new(cfg: &Config, latency: Arc<LatencyStats>, health: Arc<HealthState>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(YOUTUBE_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.youtube_api_url.trim_end_matches('/').to_string(),
            max_retries: cfg.max_retries.max(1),
            retry_delay: Duration::from_millis(cfg.retry_delay_ms),
            latency,
            health,
        })
    }

    async fn get_json(&self, resource: &str, params: &[(&str, String)]) -> std::result::Result<Value, YouTubeError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.get_once(resource, params).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.retry_delay * attempt;
                    warn!(
                        resource,
                        attempt,
                        max_retries = self.max_retries,
                        "YouTube request failed, retrying in {}ms: {e}",
                        delay.as_millis(),
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    self.health.inc_youtube_errors();
                    error!(resource, attempt, "YouTube request failed: {e}");
                    return Err(e);
                }
            }
        }
    }

    async fn get_once(&self, resource: &str, params: &[(&str, String)]) -> std::result::Result<Value, YouTubeError> {
        let url = format!("{}/{}", self.base_url, resource);
        self.health.inc_youtube_requests();

        let started = Instant::now();
        let sent = self.http.get(&url).query(params).send().await;
        self.latency.record(started.elapsed());

        let resp = sent.map_err(|e| YouTubeError::Transient(e.without_url().to_string()))?;
        let status = resp.status();
        debug!(resource, status = status.as_u16(), "YouTube response");

        match resp.json::<Value>().await {
            Ok(body) if status.is_success() => Ok(body),
            Ok(body) => Err(classify_error(status.as_u16(), &body)),
            Err(e) if status.is_success() => Err(YouTubeError::Decode(e.without_url().to_string())),
            Err(_) => Err(classify_error(status.as_u16(), &Value::Null)),
        }
    }
}

impl VideoStatsProvider for YouTubeClient {
    async fn trending_videos(
        &self,
        api_key: &str,
        region: &str,
        max_results: u32,
    ) -> std::result::Result<Vec<Value>, YouTubeError> {
        let body = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,contentDetails,statistics".to_string()),
                    ("chart", "mostPopular".to_string()),
                    ("regionCode", region.to_string()),
                    ("maxResults", max_results.to_string()),
                    ("key", api_key.to_string()),
                ],
            )
            .await?;
        let items = items_of(&body);
        if items.is_empty() {
            warn!(region, "No items in trending videos response");
        }
        Ok(items)
    }

    async fn search_videos(
        &self,
        api_key: &str,
        query: &str,
        region: &str,
        max_results: u32,
    ) -> std::result::Result<Vec<Value>, YouTubeError> {
        let search = self
            .get_json(
                "search",
                &[
                    ("part", "id".to_string()),
                    ("q", query.to_string()),
                    ("type", "video".to_string()),
                    ("videoEmbeddable", "true".to_string()),
                    ("regionCode", region.to_string()),
                    ("relevanceLanguage", "en".to_string()),
                    ("maxResults", max_results.to_string()),
                    ("key", api_key.to_string()),
                ],
            )
            .await?;

        let ids = search_video_ids(&search);
        if ids.is_empty() {
            warn!(query, "No video ids found for search query");
            return Ok(Vec::new());
        }

        let details = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,contentDetails,statistics".to_string()),
                    ("id", ids.join(",")),
                    ("key", api_key.to_string()),
                ],
            )
            .await?;
        Ok(items_of(&details))
    }

    async fn video_categories(
        &self,
        api_key: &str,
        region: &str,
    ) -> std::result::Result<HashMap<String, String>, YouTubeError> {
        let body = self
            .get_json(
                "videoCategories",
                &[
                    ("part", "snippet".to_string()),
                    ("regionCode", region.to_string()),
                    ("key", api_key.to_string()),
                ],
            )
            .await?;
        Ok(merge_category_response(&body))
    }

    async fn channel_info(
        &self,
        api_key: &str,
        channel_id: &str,
    ) -> std::result::Result<Option<ChannelInfo>, YouTubeError> {
        let body = self
            .get_json(
                "channels",
                &[
                    ("part", "snippet,statistics".to_string()),
                    ("id", channel_id.to_string()),
                    ("key", api_key.to_string()),
                ],
            )
            .await?;
        let channel = items_of(&body).first().map(parse_channel);
        if channel.is_none() {
            warn!(channel_id, "No channel found");
        }
        Ok(channel)
    }
}

/// Map a non-2xx YouTube response onto a typed error using the structured
/// `error.errors[].reason`, `error.details[].reason` and `error.status` fields.
pub fn classify_error(status: u16, body: &Value) -> YouTubeError {
    let err = body.get("error");
    let message = err
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("")
        .to_string();
    let message = if message.is_empty() {
        format!("HTTP {status}")
    } else {
        message
    };

    let mut reasons: Vec<&str> = Vec::new();
    for list in ["errors", "details"] {
        let entries = err.and_then(|e| e.get(list)).and_then(|l| l.as_array());
        for entry in entries.into_iter().flatten() {
            if let Some(r) = entry.get("reason").and_then(|r| r.as_str()) {
                reasons.push(r);
            }
        }
    }
    if let Some(s) = err.and_then(|e| e.get("status")).and_then(|s| s.as_str()) {
        reasons.push(s);
    }
    let has = |wanted: &[&str]| reasons.iter().any(|r| wanted.contains(r));

    if has(&["quotaExceeded", "dailyLimitExceeded"]) {
        YouTubeError::QuotaExceeded
    } else if has(&["keyInvalid", "API_KEY_INVALID", "keyExpired"]) || status == 401 {
        YouTubeError::AuthInvalid
    } else if has(&["accessNotConfigured", "SERVICE_DISABLED"]) {
        YouTubeError::ApiDisabled
    } else if has(&["rateLimitExceeded", "userRateLimitExceeded", "RESOURCE_EXHAUSTED"]) || status == 429 {
        YouTubeError::RateLimited(message)
    } else if status == 404 || has(&["notFound", "videoNotFound", "channelNotFound"]) {
        YouTubeError::NotFound(message)
    } else if status >= 500 || status == 408 {
        YouTubeError::Transient(message)
    } else {
        YouTubeError::Rejected(message)
    }
}

fn items_of(body: &Value) -> Vec<Value> {
    body.get("items")
        .and_then(|i| i.as_array())
        .cloned()
        .unwrap_or_default()
}

fn search_video_ids(body: &Value) -> Vec<String> {
    body.get("items")
        .and_then(|i| i.as_array())
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("id")?.get("videoId")?.as_str())
        .map(|s| s.to_string())
        .collect()
}

fn parse_channel(item: &Value) -> ChannelInfo {
    let snippet = item.get("snippet");
    let statistics = item.get("statistics");
    let text = |key: &str, default: &str| {
        snippet
            .and_then(|s| s.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    };
    ChannelInfo {
        id: item.get("id").and_then(|i| i.as_str()).unwrap_or("").to_string(),
        title: text("title", "Unknown"),
        description: text("description", ""),
        custom_url: text("customUrl", ""),
        published_at: text("publishedAt", ""),
        thumbnail: snippet
            .and_then(|s| s.get("thumbnails"))
            .and_then(|t| t.get("medium"))
            .and_then(|m| m.get("url"))
            .and_then(|u| u.as_str())
            .unwrap_or("")
            .to_string(),
        subscriber_count: statistics.and_then(|s| safe_count(s.get("subscriberCount"))),
        video_count: statistics.and_then(|s| safe_count(s.get("videoCount"))),
        view_count: statistics.and_then(|s| safe_count(s.get("viewCount"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    fn google_error(code: u16, reason: &str) -> Value {
        json!({"error": {"code": code, "message": "boom", "errors": [{"reason": reason}]}})
    }

    #[test]
    fn classifies_structured_reasons() {
        assert_eq!(classify_error(403, &google_error(403, "quotaExceeded")), YouTubeError::QuotaExceeded);
        assert_eq!(classify_error(400, &google_error(400, "keyInvalid")), YouTubeError::AuthInvalid);
        assert_eq!(classify_error(403, &google_error(403, "accessNotConfigured")), YouTubeError::ApiDisabled);
        assert_eq!(
            classify_error(403, &google_error(403, "rateLimitExceeded")),
            YouTubeError::RateLimited("boom".to_string())
        );
        assert_eq!(
            classify_error(400, &google_error(400, "invalidRegionCode")),
            YouTubeError::Rejected("boom".to_string())
        );
    }

    #[test]
    fn classifies_details_reasons_and_status() {
        let body = json!({"error": {
            "code": 400,
            "message": "API key not valid",
            "status": "INVALID_ARGUMENT",
            "details": [{"reason": "API_KEY_INVALID"}]
        }});
        assert_eq!(classify_error(400, &body), YouTubeError::AuthInvalid);

        let body = json!({"error": {"code": 403, "status": "PERMISSION_DENIED", "details": [{"reason": "SERVICE_DISABLED"}]}});
        assert_eq!(classify_error(403, &body), YouTubeError::ApiDisabled);
    }

    #[test]
    fn falls_back_to_http_status() {
        assert!(matches!(classify_error(503, &Value::Null), YouTubeError::Transient(m) if m == "HTTP 503"));
        assert!(matches!(classify_error(429, &Value::Null), YouTubeError::RateLimited(_)));
        assert!(matches!(classify_error(404, &Value::Null), YouTubeError::NotFound(_)));
        assert_eq!(classify_error(401, &Value::Null), YouTubeError::AuthInvalid);
    }

    #[test]
    fn extracts_search_ids() {
        let body = json!({"items": [
            {"id": {"kind": "youtube#video", "videoId": "a"}},
            {"id": {"kind": "youtube#channel", "channelId": "c"}},
            {"id": {"videoId": "b"}}
        ]});
        assert_eq!(search_video_ids(&body), vec!["a".to_string(), "b".to_string()]);
        assert!(search_video_ids(&json!({})).is_empty());
    }

    #[test]
    fn parses_channel_with_hidden_subscribers() {
        let item = json!({
            "id": "UC1",
            "snippet": {"title": "Chan", "customUrl": "@chan"},
            "statistics": {"viewCount": "1000", "videoCount": "12", "hiddenSubscriberCount": true}
        });
        let c = parse_channel(&item);
        assert_eq!(c.id, "UC1");
        assert_eq!(c.title, "Chan");
        assert_eq!(c.custom_url, "@chan");
        assert_eq!(c.subscriber_count, None);
        assert_eq!(c.video_count, Some(12));
        assert_eq!(c.view_count, Some(1000));
    }

    /// Local stand-in for the Data API that replays `replies` in order and
    /// repeats the last one once they run out.
    #[derive(Clone)]
    struct ScriptedApi {
        hits: Arc<AtomicUsize>,
        replies: Arc<Vec<(u16, Value)>>,
    }

    async fn scripted_reply(State(api): State<ScriptedApi>) -> (StatusCode, Json<Value>) {
        let n = api.hits.fetch_add(1, Ordering::SeqCst);
        let (code, body) = api
            .replies
            .get(n)
            .or(api.replies.last())
            .cloned()
            .unwrap_or((500, Value::Null));
        (StatusCode::from_u16(code).unwrap(), Json(body))
    }

    async fn scripted_client(replies: Vec<(u16, Value)>) -> (YouTubeClient, Arc<AtomicUsize>, Arc<HealthState>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let api = ScriptedApi {
            hits: Arc::clone(&hits),
            replies: Arc::new(replies),
        };
        let app = Router::new().route("/videos", get(scripted_reply)).with_state(api);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let cfg = Config {
            youtube_api_key: Some("key".to_string()),
            youtube_api_url: format!("http://{addr}"),
            log_level: "info".to_string(),
            db_path: ":memory:".to_string(),
            api_port: 0,
            default_region: "US".to_string(),
            refresh_regions: vec!["US".to_string()],
            refresh_max_results: 50,
            max_retries: 3,
            retry_delay_ms: 0,
        };
        let health = Arc::new(HealthState::new());
        let client = YouTubeClient::new(&cfg, Arc::new(LatencyStats::new()), Arc::clone(&health)).unwrap();
        (client, hits, health)
    }

    #[tokio::test]
    async fn retries_transient_failure_then_succeeds() {
        let (client, hits, health) = scripted_client(vec![
            (503, json!({"error": {"code": 503, "message": "backend error"}})),
            (200, json!({"items": [{"id": "a"}, {"id": "b"}]})),
        ])
        .await;

        let items = client.trending_videos("key", "US", 10).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(health.youtube_requests(), 2);
        assert_eq!(health.youtube_errors(), 0);
    }

    #[tokio::test]
    async fn quota_exhaustion_is_not_retried() {
        let (client, hits, health) = scripted_client(vec![(403, google_error(403, "quotaExceeded"))]).await;

        let err = client.trending_videos("key", "US", 10).await.unwrap_err();
        assert_eq!(err, YouTubeError::QuotaExceeded);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(health.youtube_requests(), 1);
        assert_eq!(health.youtube_errors(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let (client, hits, health) = scripted_client(vec![(429, google_error(429, "rateLimitExceeded"))]).await;

        let err = client.trending_videos("key", "US", 10).await.unwrap_err();
        assert!(matches!(err, YouTubeError::RateLimited(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(health.youtube_requests(), 3);
        assert_eq!(health.youtube_errors(), 1);
    }
}
