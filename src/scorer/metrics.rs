use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Flat per-video metrics extracted from one raw YouTube `videos` item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetrics {
    pub id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub category_id: String,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    /// `(likes + comments) / views * 100`, only when all three are known and views > 0.
    pub engagement_rate: Option<f64>,
    pub published_at: Option<String>,
    pub thumbnail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed video record: {0}")]
pub struct MalformedRecord(pub String);

impl VideoMetrics {
    /// Parse one API-shaped item (`snippet` / `statistics` / `contentDetails`).
    ///
    /// Missing sections and fields are tolerated and come through as `None` or
    /// defaults. The record is rejected only when it is not an object or one of
    /// its sections has the wrong shape.
    pub fn from_api_item(item: &Value) -> std::result::Result<Self, MalformedRecord> {
        let obj = item
            .as_object()
            .ok_or_else(|| MalformedRecord(format!("expected object, got {}", kind(item))))?;

        let snippet = section(obj, "snippet")?;
        let statistics = section(obj, "statistics")?;
        section(obj, "contentDetails")?;

        let views = statistics.and_then(|s| safe_count(s.get("viewCount")));
        let likes = statistics.and_then(|s| safe_count(s.get("likeCount")));
        let comments = statistics.and_then(|s| safe_count(s.get("commentCount")));

        let snippet_str = |key: &str| {
            snippet
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        let thumbnail = snippet
            .and_then(|s| s.get("thumbnails"))
            .and_then(|t| t.get("medium"))
            .and_then(|m| m.get("url"))
            .and_then(|u| u.as_str())
            .unwrap_or("")
            .to_string();

        Ok(Self {
            id: id_string(obj.get("id")),
            title: snippet_str("title").unwrap_or_else(|| "Unknown".to_string()),
            channel_id: snippet_str("channelId").unwrap_or_default(),
            channel_title: snippet_str("channelTitle").unwrap_or_else(|| "Unknown".to_string()),
            category_id: snippet_str("categoryId").unwrap_or_else(|| "0".to_string()),
            views,
            likes,
            comments,
            engagement_rate: engagement_rate(views, likes, comments),
            published_at: snippet_str("publishedAt").filter(|s| !s.is_empty()),
            thumbnail,
        })
    }
}

/// Extract metrics from a batch, skipping malformed records with a warning.
pub fn extract_metrics(items: &[Value]) -> Vec<VideoMetrics> {
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match VideoMetrics::from_api_item(item) {
            Ok(m) => out.push(m),
            Err(e) => warn!(index = idx, "Skipping video record: {e}"),
        }
    }
    out
}

pub fn engagement_rate(views: Option<u64>, likes: Option<u64>, comments: Option<u64>) -> Option<f64> {
    match (views, likes, comments) {
        (Some(v), Some(l), Some(c)) if v > 0 => Some((l as f64 + c as f64) / v as f64 * 100.0),
        _ => None,
    }
}

/// Coerce a count that YouTube usually sends as a decimal string.
/// Anything unparsable or negative is `None`, never 0.
pub fn safe_count(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && *f < u64::MAX as f64)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn section<'a>(
    obj: &'a serde_json::Map<String, Value>,
    key: &str,
) -> std::result::Result<Option<&'a serde_json::Map<String, Value>>, MalformedRecord> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(m)) => Ok(Some(m)),
        Some(other) => Err(MalformedRecord(format!("`{key}` is {}", kind(other)))),
    }
}

/// `videos` items carry a string id; `search` items carry `{videoId}`.
fn id_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(m)) => m
            .get("videoId")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        _ => String::new(),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_string_counts_and_engagement() {
        let item = json!({
            "id": "abc",
            "snippet": {"title": "Hi", "categoryId": "27", "channelId": "c1", "publishedAt": "2024-01-01T00:00:00Z"},
            "statistics": {"viewCount": "1000", "likeCount": "40", "commentCount": "10"},
            "contentDetails": {"duration": "PT1M"}
        });
        let m = VideoMetrics::from_api_item(&item).unwrap();
        assert_eq!(m.id, "abc");
        assert_eq!(m.category_id, "27");
        assert_eq!(m.views, Some(1000));
        assert_eq!(m.likes, Some(40));
        assert_eq!(m.comments, Some(10));
        assert!((m.engagement_rate.unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(m.published_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn unparsable_counts_are_none_not_zero() {
        let item = json!({
            "snippet": {"categoryId": "10"},
            "statistics": {"viewCount": "lots", "likeCount": -3, "commentCount": true}
        });
        let m = VideoMetrics::from_api_item(&item).unwrap();
        assert_eq!(m.views, None);
        assert_eq!(m.likes, None);
        assert_eq!(m.comments, None);
        assert_eq!(m.engagement_rate, None);
    }

    #[test]
    fn engagement_requires_positive_views_and_both_counts() {
        assert_eq!(engagement_rate(Some(0), Some(1), Some(1)), None);
        assert_eq!(engagement_rate(Some(100), None, Some(1)), None);
        assert_eq!(engagement_rate(Some(100), Some(1), None), None);
        assert_eq!(engagement_rate(None, Some(1), Some(1)), None);
        assert_eq!(engagement_rate(Some(200), Some(0), Some(0)), Some(0.0));
    }

    #[test]
    fn huge_counts_do_not_abort_the_batch() {
        let items = vec![
            json!({"id": "big", "statistics": {"viewCount": "10", "likeCount": "18446744073709551615", "commentCount": "1"}}),
            json!({"id": "next", "statistics": {"viewCount": "10"}}),
        ];
        let out = extract_metrics(&items);
        assert_eq!(out.len(), 2);
        let rate = out[0].engagement_rate.unwrap();
        assert!(rate.is_finite() && rate > 1e18);
        assert_eq!(out[1].id, "next");
        assert_eq!(out[1].engagement_rate, None);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let m = VideoMetrics::from_api_item(&json!({})).unwrap();
        assert_eq!(m.category_id, "0");
        assert_eq!(m.title, "Unknown");
        assert_eq!(m.views, None);
        assert_eq!(m.published_at, None);
    }

    #[test]
    fn wrong_shapes_are_malformed() {
        assert!(VideoMetrics::from_api_item(&json!("video")).is_err());
        assert!(VideoMetrics::from_api_item(&json!({"statistics": [1, 2]})).is_err());
        assert!(VideoMetrics::from_api_item(&json!({"snippet": "x"})).is_err());
    }

    #[test]
    fn batch_extraction_skips_malformed_records() {
        let items = vec![
            json!({"snippet": {"categoryId": "1"}, "statistics": {"viewCount": "5"}}),
            json!(42),
            json!({"snippet": {"categoryId": "2"}}),
        ];
        let out = extract_metrics(&items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].category_id, "1");
        assert_eq!(out[1].category_id, "2");
    }

    #[test]
    fn numeric_counts_are_accepted() {
        assert_eq!(safe_count(Some(&json!(12))), Some(12));
        assert_eq!(safe_count(Some(&json!(12.9))), Some(12));
        assert_eq!(safe_count(Some(&json!(" 7 "))), Some(7));
        assert_eq!(safe_count(Some(&json!(null))), None);
        assert_eq!(safe_count(None), None);
    }
}
