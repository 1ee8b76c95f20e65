use std::cmp::Ordering;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// API response types (mirror routes.rs shapes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct LatestResponse {
    pub run_id: i64,
    pub region: String,
    pub source: String,
    pub created_at: i64,
    pub analyzed_videos: i64,
    pub total_niches: usize,
    pub niches: Vec<NicheRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct NicheRow {
    pub category_id: String,
    pub name: String,
    pub avg_views: Option<f64>,
    pub avg_views_formatted: String,
    pub engagement: Option<f64>,
    pub competition: Option<f64>,
    pub traffic_potential: Option<f64>,
    pub score: Option<f64>,
    pub video_count: i64,
    pub view_concentration: Option<f64>,
    pub data_quality: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[allow(dead_code)]
pub struct HealthResponse {
    pub refresh_enabled: Option<bool>,
    pub last_refresh_at_ns: Option<i64>,
    pub youtube_requests: Option<i64>,
    pub youtube_errors: Option<i64>,
    pub snapshots_written: Option<i64>,
    pub write_queue_pending: Option<i64>,
    pub cached_regions: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[allow(dead_code)]
pub struct LatencyResponse {
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub sample_count: Option<i64>,
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Highest opportunity score first.
    Score,
    /// Least competitive first.
    Competition,
}

impl SortMode {
    pub fn toggle(self) -> Self {
        match self {
            SortMode::Score => SortMode::Competition,
            SortMode::Competition => SortMode::Score,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Score => "score",
            SortMode::Competition => "competition",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ConnectionStatus,
    pub latest: Option<LatestResponse>,
    pub health: HealthResponse,
    pub latency: LatencyResponse,
    pub sort: SortMode,
    pub last_refresh: std::time::Instant,
    pub base_url: String,
    pub region: String,
}

impl AppState {
    pub fn new(base_url: String, region: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            latest: None,
            health: HealthResponse::default(),
            latency: LatencyResponse::default(),
            sort: SortMode::Score,
            last_refresh: std::time::Instant::now(),
            base_url,
            region,
        }
    }

    pub fn toggle_sort(&mut self) {
        self.sort = self.sort.toggle();
    }

    /// Niches of the latest snapshot in the current sort order. Missing
    /// values always sort last.
    pub fn sorted_niches(&self) -> Vec<&NicheRow> {
        let Some(latest) = &self.latest else {
            return Vec::new();
        };
        let mut rows: Vec<&NicheRow> = latest.niches.iter().collect();
        match self.sort {
            SortMode::Score => {
                rows.sort_by(|a, b| missing_last(a.score, b.score, |x, y| y.total_cmp(&x)))
            }
            SortMode::Competition => {
                rows.sort_by(|a, b| missing_last(a.competition, b.competition, |x, y| x.total_cmp(&y)))
            }
        }
        rows
    }

    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let latest_url = format!("{}/niches/latest?region={}", self.base_url, self.region);
        let health_url = format!("{}/health", self.base_url);
        let latency_url = format!("{}/stats/latency", self.base_url);

        let (latest_res, health_res, latency_res) = tokio::join!(
            client.get(&latest_url).send(),
            client.get(&health_url).send(),
            client.get(&latency_url).send(),
        );

        let latest_resp = match latest_res {
            Ok(r) => r,
            Err(e) => {
                self.status = ConnectionStatus::Error(format!("{e}"));
                return;
            }
        };

        if latest_resp.status() == reqwest::StatusCode::NOT_FOUND {
            // Server is up but has not persisted a run for this region yet.
            self.latest = None;
        } else {
            match latest_resp.json::<LatestResponse>().await {
                Ok(latest) => self.latest = Some(latest),
                Err(e) => {
                    self.status = ConnectionStatus::Error(format!("parse error: {e}"));
                    return;
                }
            }
        }

        self.status = ConnectionStatus::Connected;
        self.last_refresh = std::time::Instant::now();

        if let Ok(h) = health_res {
            if let Ok(health) = h.json::<HealthResponse>().await {
                self.health = health;
            }
        }
        if let Ok(l) = latency_res {
            if let Ok(latency) = l.json::<LatencyResponse>().await {
                self.latency = latency;
            }
        }
    }
}

fn missing_last(a: Option<f64>, b: Option<f64>, cmp: impl Fn(f64, f64) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn format_metric(v: Option<f64>) -> String {
    v.map_or("—".to_string(), |v| format!("{v:.1}"))
}

pub fn format_percent(v: Option<f64>) -> String {
    v.map_or("—".to_string(), |v| format!("{v:.2}%"))
}

/// Convert nanosecond epoch timestamp to HH:MM:SS string.
pub fn format_time_ns(ns: i64) -> String {
    let secs = (ns / 1_000_000_000) as u64;
    let h = (secs / 3600) % 24;
    let m = (secs / 60) % 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
