use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::{
    self, Config, EXAMPLES_PER_NICHE, MAX_SEARCH_RESULTS, MAX_TRENDING_RESULTS, REGIONS,
};
use crate::db::models::ResearchRunRow;
use crate::db::writer::{latest_snapshot, queue_snapshot, run_history};
use crate::error::{AppError, YouTubeError};
use crate::research::catalog::ai_friendly_niches;
use crate::research::{low_competition, search_report, trending_report, NicheReport};
use crate::scorer::VideoMetrics;
use crate::state::CategoryCache;
use crate::types::{
    format_views, now_ns, AiNiche, ChannelInfo, NicheScore, ResearchSnapshot, ResearchSource,
};
use crate::youtube::VideoStatsProvider;

const DEFAULT_TRENDING_RESULTS: u32 = 50;
const DEFAULT_SEARCH_RESULTS: u32 = 30;
const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 500;

pub struct ApiState<P> {
    pub cfg: Arc<Config>,
    pub youtube: Arc<P>,
    pub cache: Arc<CategoryCache>,
    pub pool: sqlx::SqlitePool,
    pub snapshot_tx: mpsc::Sender<ResearchSnapshot>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

// Manual impl: `P` itself need not be `Clone`.
impl<P> Clone for ApiState<P> {
    fn clone(&self) -> Self {
        Self {
            cfg: Arc::clone(&self.cfg),
            youtube: Arc::clone(&self.youtube),
            cache: Arc::clone(&self.cache),
            pool: self.pool.clone(),
            snapshot_tx: self.snapshot_tx.clone(),
            health: Arc::clone(&self.health),
            latency: Arc::clone(&self.latency),
        }
    }
}

pub fn router<P: VideoStatsProvider + 'static>(state: ApiState<P>) -> Router {
    Router::new()
        .route("/api/youtube/trending-niches", get(get_trending_niches::<P>))
        .route("/api/youtube/low-competition-niches", get(get_low_competition_niches::<P>))
        .route("/api/youtube/ai-friendly-niches", get(get_ai_friendly_niches))
        .route("/api/youtube/search-niche", get(get_search_niche::<P>))
        .route("/api/youtube/channel/:channel_id", get(get_channel::<P>))
        .route("/api/youtube/regions", get(get_regions::<P>))
        .route("/niches/latest", get(get_latest_niches::<P>))
        .route("/niches/history", get(get_niche_history::<P>))
        .route("/health", get(get_health::<P>))
        .route("/stats/latency", get(get_stats_latency::<P>))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
pub struct NicheQuery {
    pub api_key: Option<String>,
    pub region_code: Option<String>,
    pub max_results: Option<u32>,
}

#[derive(Deserialize, Default)]
pub struct SearchQuery {
    pub api_key: Option<String>,
    pub query: Option<String>,
    pub region_code: Option<String>,
    pub max_results: Option<u32>,
}

#[derive(Deserialize, Default)]
pub struct KeyQuery {
    pub api_key: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct LatestQuery {
    pub region: Option<String>,
    pub source: Option<ResearchSource>,
}

#[derive(Deserialize, Default)]
pub struct HistoryQuery {
    pub region: Option<String>,
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct NicheEntry {
    #[serde(flatten)]
    pub niche: NicheScore,
    pub avg_views_formatted: String,
    pub examples: Vec<VideoMetrics>,
}

impl NicheEntry {
    fn new(niche: NicheScore, examples: Vec<VideoMetrics>) -> Self {
        Self {
            avg_views_formatted: format_views(niche.avg_views),
            niche,
            examples,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NicheListResponse {
    pub success: bool,
    pub niches: Vec<NicheEntry>,
    pub total_niches: usize,
    pub analyzed_videos: usize,
}

impl NicheListResponse {
    fn from_report(report: &NicheReport) -> Self {
        let niches: Vec<NicheEntry> = report
            .niches
            .iter()
            .map(|n| {
                let examples = report
                    .examples_for(&n.category_id, EXAMPLES_PER_NICHE)
                    .into_iter()
                    .cloned()
                    .collect();
                NicheEntry::new(n.clone(), examples)
            })
            .collect();
        Self {
            success: true,
            total_niches: niches.len(),
            niches,
            analyzed_videos: report.analyzed_videos,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AiNichesResponse {
    pub success: bool,
    pub niches: &'static [AiNiche],
    pub total_niches: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchNicheResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub niche: Option<NicheEntry>,
    pub videos: Vec<VideoMetrics>,
    pub analyzed_videos: usize,
}

#[derive(Debug, Serialize)]
pub struct ChannelEntry {
    #[serde(flatten)]
    pub channel: ChannelInfo,
    pub subscriber_count_formatted: String,
}

#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub success: bool,
    pub channel: ChannelEntry,
}

#[derive(Debug, Serialize)]
pub struct RegionEntry {
    pub name: &'static str,
    pub code: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RegionsResponse {
    pub success: bool,
    pub default_region: String,
    pub regions: Vec<RegionEntry>,
}

#[derive(Debug, Serialize)]
pub struct LatestNichesResponse {
    pub success: bool,
    pub run_id: i64,
    pub region: String,
    pub source: String,
    pub created_at: i64,
    pub analyzed_videos: i64,
    pub total_niches: usize,
    pub niches: Vec<NicheEntry>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub region: String,
    pub runs: Vec<ResearchRunRow>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub refresh_enabled: bool,
    pub last_refresh_at_ns: Option<u64>,
    pub youtube_requests: u64,
    pub youtube_errors: u64,
    pub snapshots_written: u64,
    pub write_queue_pending: u64,
    pub cached_regions: usize,
}

#[derive(Debug, Serialize)]
pub struct LatencyResponse {
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub sample_count: u64,
}

// ---------------------------------------------------------------------------
// Parameter resolution
// ---------------------------------------------------------------------------

/// Request key first, then the configured default.
fn resolve_api_key(param: Option<String>, cfg: &Config) -> Result<String, AppError> {
    param
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| cfg.youtube_api_key.clone())
        .ok_or_else(|| AppError::BadRequest("api_key is required".to_string()))
}

/// Accepts a region display name or any two-letter code; empty means default.
fn resolve_region(param: Option<&str>, default: &str) -> Result<String, AppError> {
    let raw = param.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(default.to_string());
    }
    config::parse_region(raw).ok_or_else(|| AppError::BadRequest(format!("unknown region: {raw}")))
}

fn resolve_max_results(param: Option<u32>, default: u32, max: u32) -> Result<u32, AppError> {
    match param.unwrap_or(default) {
        n if (1..=max).contains(&n) => Ok(n),
        n => Err(AppError::BadRequest(format!(
            "max_results must be between 1 and {max}, got {n}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn research_trending<P: VideoStatsProvider>(
    state: &ApiState<P>,
    params: NicheQuery,
) -> Result<NicheReport, AppError> {
    let api_key = resolve_api_key(params.api_key, &state.cfg)?;
    let region = resolve_region(params.region_code.as_deref(), &state.cfg.default_region)?;
    let max_results = resolve_max_results(
        params.max_results,
        DEFAULT_TRENDING_RESULTS,
        MAX_TRENDING_RESULTS,
    )?;

    let report = trending_report(
        state.youtube.as_ref(),
        &state.cache,
        &api_key,
        &region,
        max_results,
    )
    .await?;

    queue_snapshot(
        &state.snapshot_tx,
        &state.health,
        ResearchSnapshot {
            region,
            source: ResearchSource::Trending,
            analyzed_videos: report.analyzed_videos,
            niches: report.niches.clone(),
            created_at_ns: now_ns(),
        },
    );
    Ok(report)
}

async fn get_trending_niches<P: VideoStatsProvider>(
    State(state): State<ApiState<P>>,
    Query(params): Query<NicheQuery>,
) -> Result<Json<NicheListResponse>, AppError> {
    let report = research_trending(&state, params).await?;
    Ok(Json(NicheListResponse::from_report(&report)))
}

async fn get_low_competition_niches<P: VideoStatsProvider>(
    State(state): State<ApiState<P>>,
    Query(params): Query<NicheQuery>,
) -> Result<Json<NicheListResponse>, AppError> {
    let report = low_competition(research_trending(&state, params).await?);
    Ok(Json(NicheListResponse::from_report(&report)))
}

async fn get_ai_friendly_niches() -> Json<AiNichesResponse> {
    let niches = ai_friendly_niches();
    Json(AiNichesResponse {
        success: true,
        niches,
        total_niches: niches.len(),
    })
}

async fn get_search_niche<P: VideoStatsProvider>(
    State(state): State<ApiState<P>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchNicheResponse>, AppError> {
    let api_key = resolve_api_key(params.api_key, &state.cfg)?;
    let query = params
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("query is required".to_string()))?;
    let region = resolve_region(params.region_code.as_deref(), &state.cfg.default_region)?;
    let max_results =
        resolve_max_results(params.max_results, DEFAULT_SEARCH_RESULTS, MAX_SEARCH_RESULTS)?;

    let report = search_report(state.youtube.as_ref(), &api_key, &query, &region, max_results).await?;

    let Some(niche) = report.niche else {
        return Ok(Json(SearchNicheResponse {
            success: true,
            message: Some("No videos found for this query.".to_string()),
            niche: None,
            videos: Vec::new(),
            analyzed_videos: 0,
        }));
    };

    queue_snapshot(
        &state.snapshot_tx,
        &state.health,
        ResearchSnapshot {
            region,
            source: ResearchSource::Search,
            analyzed_videos: report.analyzed_videos,
            niches: vec![niche.clone()],
            created_at_ns: now_ns(),
        },
    );

    Ok(Json(SearchNicheResponse {
        success: true,
        message: None,
        niche: Some(NicheEntry::new(niche, Vec::new())),
        analyzed_videos: report.analyzed_videos,
        videos: report.videos,
    }))
}

async fn get_channel<P: VideoStatsProvider>(
    State(state): State<ApiState<P>>,
    Path(channel_id): Path<String>,
    Query(params): Query<KeyQuery>,
) -> Result<Json<ChannelResponse>, AppError> {
    let api_key = resolve_api_key(params.api_key, &state.cfg)?;
    let channel = state
        .youtube
        .channel_info(&api_key, &channel_id)
        .await?
        .ok_or_else(|| YouTubeError::NotFound(format!("channel {channel_id}")))?;

    info!(channel_id = %channel.id, title = %channel.title, "Channel lookup");
    Ok(Json(ChannelResponse {
        success: true,
        channel: ChannelEntry {
            subscriber_count_formatted: format_views(channel.subscriber_count.map(|c| c as f64)),
            channel,
        },
    }))
}

async fn get_regions<P: VideoStatsProvider>(State(state): State<ApiState<P>>) -> Json<RegionsResponse> {
    Json(RegionsResponse {
        success: true,
        default_region: state.cfg.default_region.clone(),
        regions: REGIONS
            .iter()
            .map(|&(name, code)| RegionEntry { name, code })
            .collect(),
    })
}

async fn get_latest_niches<P: VideoStatsProvider>(
    State(state): State<ApiState<P>>,
    Query(params): Query<LatestQuery>,
) -> Result<Json<LatestNichesResponse>, AppError> {
    let region = resolve_region(params.region.as_deref(), &state.cfg.default_region)?;
    let source = params.source.unwrap_or(ResearchSource::Trending);

    let snapshot = latest_snapshot(&state.pool, &region, source)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no {source} snapshot for region {region}")))?;

    let niches: Vec<NicheEntry> = snapshot
        .niches
        .into_iter()
        .map(|n| NicheEntry::new(n, Vec::new()))
        .collect();
    Ok(Json(LatestNichesResponse {
        success: true,
        run_id: snapshot.run.id,
        region: snapshot.run.region,
        source: snapshot.run.source,
        created_at: snapshot.run.created_at,
        analyzed_videos: snapshot.run.analyzed_videos,
        total_niches: niches.len(),
        niches,
    }))
}

async fn get_niche_history<P: VideoStatsProvider>(
    State(state): State<ApiState<P>>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let region = resolve_region(params.region.as_deref(), &state.cfg.default_region)?;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
    let runs = run_history(&state.pool, &region, limit).await?;
    Ok(Json(HistoryResponse {
        success: true,
        region,
        runs,
    }))
}

async fn get_health<P: VideoStatsProvider>(State(state): State<ApiState<P>>) -> Json<HealthResponse> {
    let h = &state.health;
    let last = h.last_refresh_at_ns();
    Json(HealthResponse {
        status: "ok",
        refresh_enabled: state.cfg.youtube_api_key.is_some(),
        last_refresh_at_ns: (last > 0).then_some(last),
        youtube_requests: h.youtube_requests(),
        youtube_errors: h.youtube_errors(),
        snapshots_written: h.snapshots_written(),
        write_queue_pending: h.write_queue_pending(),
        cached_regions: state.cache.len(),
    })
}

async fn get_stats_latency<P: VideoStatsProvider>(
    State(state): State<ApiState<P>>,
) -> Json<LatencyResponse> {
    let (p50, p95, p99) = state.latency.percentiles();
    let to_ms = |us: Option<u64>| us.map(|v| v as f64 / 1000.0);
    Json(LatencyResponse {
        p50_ms: to_ms(p50),
        p95_ms: to_ms(p95),
        p99_ms: to_ms(p99),
        sample_count: state.latency.len(),
    })
}
