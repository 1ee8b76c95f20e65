use serde::{Deserialize, Serialize};

use crate::config::{HIGH_QUALITY_MIN, MEDIUM_QUALITY_MIN};

// ---------------------------------------------------------------------------
// Niche scores
// ---------------------------------------------------------------------------

/// One ranked niche. Every optional metric is `None` when the data it needs was
/// missing upstream; `None` is never a stand-in for zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheScore {
    pub category_id: String,
    pub name: String,
    pub avg_views: Option<f64>,
    /// Mean engagement rate in percent.
    pub engagement: Option<f64>,
    /// 0–100, higher = more saturated.
    pub competition: Option<f64>,
    /// 0–100, higher = bigger audience.
    pub traffic_potential: Option<f64>,
    /// Opportunity score; ranking key.
    pub score: Option<f64>,
    pub video_count: usize,
    /// Gini coefficient of the per-video view counts.
    pub view_concentration: Option<f64>,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Low,
    Medium,
    High,
}

impl DataQuality {
    /// Confidence tier derived solely from sample size.
    pub fn from_video_count(video_count: usize) -> Self {
        if video_count >= HIGH_QUALITY_MIN {
            DataQuality::High
        } else if video_count >= MEDIUM_QUALITY_MIN {
            DataQuality::Medium
        } else {
            DataQuality::Low
        }
    }
}

impl std::fmt::Display for DataQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataQuality::Low => "low",
            DataQuality::Medium => "medium",
            DataQuality::High => "high",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DataQuality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "low" => Ok(DataQuality::Low),
            "medium" => Ok(DataQuality::Medium),
            "high" => Ok(DataQuality::High),
            other => Err(format!("unknown data quality: {other}")),
        }
    }
}

/// How average views become a 0–100 traffic score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrafficNormalization {
    /// Relative to the best category in the same batch. Scores are only
    /// comparable within one run.
    BatchMax,
    /// Relative to a fixed view count that maps to 100.
    Absolute(f64),
}

// ---------------------------------------------------------------------------
// Collaborator payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub custom_url: String,
    pub published_at: String,
    pub thumbnail: String,
    pub subscriber_count: Option<u64>,
    pub video_count: Option<u64>,
    pub view_count: Option<u64>,
}

/// Hand-picked niche that suits faceless, AI-produced content.
#[derive(Debug, Clone, Serialize)]
pub struct AiNiche {
    pub name: &'static str,
    pub description: &'static str,
    pub ai_advantage: &'static str,
    pub example_topics: &'static [&'static str],
}

/// Where a set of scored niches came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchSource {
    Trending,
    Search,
}

impl std::fmt::Display for ResearchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResearchSource::Trending => write!(f, "trending"),
            ResearchSource::Search => write!(f, "search"),
        }
    }
}

/// Sent from the refresher and API handlers to the snapshot writer.
#[derive(Debug, Clone)]
pub struct ResearchSnapshot {
    pub region: String,
    pub source: ResearchSource,
    pub analyzed_videos: usize,
    pub niches: Vec<NicheScore>,
    /// Nanosecond UTC epoch.
    pub created_at_ns: u64,
}

/// Nanoseconds since the Unix epoch.
pub fn now_ns() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// `1234567` → `1.2M`, `4321` → `4.3K`, missing → `N/A`.
pub fn format_views(views: Option<f64>) -> String {
    match views {
        None => "N/A".to_string(),
        Some(v) if v >= 1_000_000.0 => format!("{:.1}M", v / 1_000_000.0),
        Some(v) if v >= 1_000.0 => format!("{:.1}K", v / 1_000.0),
        Some(v) => format!("{}", v.trunc() as u64),
    }
}
