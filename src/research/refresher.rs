use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::api::health::HealthState;
use crate::config::{Config, REFRESH_INTERVAL_SECS};
use crate::db::writer::queue_snapshot;
use crate::research::pipeline::trending_report;
use crate::state::CategoryCache;
use crate::types::{format_views, now_ns, ResearchSnapshot, ResearchSource};
use crate::youtube::VideoStatsProvider;

/// Periodically researches trending niches for every configured region and
/// forwards the results to the snapshot writer.
pub struct NicheRefresher<P> {
    provider: P,
    cache: Arc<CategoryCache>,
    api_key: String,
    regions: Vec<String>,
    max_results: u32,
    snapshot_tx: mpsc::Sender<ResearchSnapshot>,
    health: Arc<HealthState>,
}

impl<P: VideoStatsProvider> NicheRefresher<P> {
    /// `None` when no default API key is configured.
    pub fn new(
        cfg: &Config,
        provider: P,
        cache: Arc<CategoryCache>,
        snapshot_tx: mpsc::Sender<ResearchSnapshot>,
        health: Arc<HealthState>,
    ) -> Option<Self> {
        let Some(api_key) = cfg.youtube_api_key.clone() else {
            warn!("YOUTUBE_API_KEY not set, background niche refresh disabled");
            return None;
        };
        Some(Self {
            provider,
            cache,
            api_key,
            regions: cfg.refresh_regions.clone(),
            max_results: cfg.refresh_max_results,
            snapshot_tx,
            health,
        })
    }

    pub async fn run(self) {
        info!(regions = ?self.regions, every_secs = REFRESH_INTERVAL_SECS, "Niche refresher started");
        let mut ticker = interval(Duration::from_secs(REFRESH_INTERVAL_SECS));

        // First tick fires immediately, giving the startup run.
        loop {
            ticker.tick().await;
            self.refresh().await;
        }
    }

    /// One research pass over all regions. Returns how many regions succeeded.
    pub async fn refresh(&self) -> usize {
        let reports = join_all(self.regions.iter().map(|region| async move {
            let report = trending_report(
                &self.provider,
                &self.cache,
                &self.api_key,
                region,
                self.max_results,
            )
            .await;
            (region, report)
        }))
        .await;

        let mut succeeded = 0;
        for (region, report) in reports {
            let report = match report {
                Ok(r) => r,
                Err(e) => {
                    error!(region = %region, "Niche refresh failed: {e}");
                    continue;
                }
            };
            succeeded += 1;

            match report.niches.first() {
                Some(top) => info!(
                    region = %region,
                    niches = report.niches.len(),
                    top = %top.name,
                    score = ?top.score,
                    avg_views = %format_views(top.avg_views),
                    "Top niche"
                ),
                None => info!(region = %region, analyzed = report.analyzed_videos, "No qualifying niches"),
            }

            queue_snapshot(
                &self.snapshot_tx,
                &self.health,
                ResearchSnapshot {
                    region: region.clone(),
                    source: ResearchSource::Trending,
                    analyzed_videos: report.analyzed_videos,
                    niches: report.niches,
                    created_at_ns: now_ns(),
                },
            );
        }

        if succeeded > 0 {
            self.health.set_last_refresh_at_ns(now_ns());
        }
        succeeded
    }
}
