use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::debug;

use crate::config::{
    competition_weights, opportunity_weights, ABSOLUTE_TRAFFIC_CEILING, MIN_CATEGORY_VIDEOS,
};
use crate::scorer::aggregate::{aggregate_by_category, CategoryAggregate};
use crate::scorer::metrics::{extract_metrics, VideoMetrics};
use crate::types::{DataQuality, NicheScore, TrafficNormalization};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorerConfig {
    pub normalization: TrafficNormalization,
    /// Categories with fewer videos are excluded from rankings.
    pub min_videos: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            normalization: TrafficNormalization::BatchMax,
            min_videos: MIN_CATEGORY_VIDEOS,
        }
    }
}

impl ScorerConfig {
    /// Settings for scoring a single ad-hoc niche (e.g. one search query):
    /// no batch to normalize against and no minimum sample.
    pub fn single_niche() -> Self {
        Self {
            normalization: TrafficNormalization::Absolute(ABSOLUTE_TRAFFIC_CEILING),
            min_videos: 1,
        }
    }
}

/// Turns per-category aggregates into ranked niche opportunities.
/// Pure: no I/O, nothing retained between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NicheScorer {
    cfg: ScorerConfig,
}

impl NicheScorer {
    pub fn new(cfg: ScorerConfig) -> Self {
        Self { cfg }
    }

    /// Full pipeline from raw API items.
    pub fn score_items(&self, items: &[Value], names: &HashMap<String, String>) -> Vec<NicheScore> {
        self.score_videos(&extract_metrics(items), names)
    }

    pub fn score_videos(&self, videos: &[VideoMetrics], names: &HashMap<String, String>) -> Vec<NicheScore> {
        self.score_categories(&aggregate_by_category(videos), names)
    }

    /// Score every category with enough videos, sorted by opportunity (best first).
    pub fn score_categories(
        &self,
        categories: &BTreeMap<String, CategoryAggregate>,
        names: &HashMap<String, String>,
    ) -> Vec<NicheScore> {
        let qualifying: Vec<&CategoryAggregate> = categories
            .values()
            .filter(|c| c.video_count >= self.cfg.min_videos)
            .collect();

        let skipped = categories.len() - qualifying.len();
        if skipped > 0 {
            debug!(skipped, min_videos = self.cfg.min_videos, "Categories below minimum sample");
        }

        let max_views = qualifying
            .iter()
            .filter_map(|c| c.avg_views())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

        let mut niches: Vec<NicheScore> = qualifying
            .into_iter()
            .map(|agg| {
                let name = names
                    .get(&agg.category_id)
                    .cloned()
                    .unwrap_or_else(|| format!("Category {}", agg.category_id));
                self.build(agg, name, max_views)
            })
            .collect();

        rank_by_score(&mut niches);
        niches
    }

    /// Score one aggregate on its own, ignoring `min_videos`.
    pub fn score_single(&self, agg: &CategoryAggregate, name: impl Into<String>) -> NicheScore {
        let max_views = agg.avg_views();
        self.build(agg, name.into(), max_views)
    }

    fn build(&self, agg: &CategoryAggregate, name: String, batch_max_views: Option<f64>) -> NicheScore {
        let avg_views = agg.avg_views();
        let traffic = avg_views.map(|v| traffic_score(v, self.ceiling(batch_max_views)));
        let competition = competition_score(agg);
        let score = opportunity_score(traffic, competition);

        NicheScore {
            category_id: agg.category_id.clone(),
            name,
            avg_views,
            engagement: agg.avg_engagement(),
            competition,
            traffic_potential: traffic,
            score,
            video_count: agg.video_count,
            view_concentration: (!agg.views_by_video.is_empty()).then(|| agg.gini_coefficient()),
            data_quality: DataQuality::from_video_count(agg.video_count),
        }
    }

    fn ceiling(&self, batch_max_views: Option<f64>) -> f64 {
        let raw = match self.cfg.normalization {
            TrafficNormalization::BatchMax => batch_max_views.unwrap_or(1.0),
            TrafficNormalization::Absolute(ceiling) => ceiling,
        };
        // An all-zero batch would otherwise divide by zero.
        if raw > 0.0 && raw.is_finite() {
            raw
        } else {
            1.0
        }
    }
}

/// `min(avg_views / ceiling * 100, 100)`.
pub fn traffic_score(avg_views: f64, ceiling: f64) -> f64 {
    (avg_views / ceiling * 100.0).min(100.0)
}

/// Weighted blend of sample size, view concentration (Gini) and view dispersion
/// (coefficient of variation). `None` when the category has no view data.
pub fn competition_score(agg: &CategoryAggregate) -> Option<f64> {
    let variance = agg.view_variance()?;

    let video_count_factor = (agg.video_count as f64 * 2.0).min(100.0);
    let gini_factor = agg.gini_coefficient() * 100.0;
    let variance_factor = match agg.avg_views() {
        Some(avg) if avg > 0.0 => (variance.sqrt() / avg * 25.0).min(100.0),
        _ => 0.0,
    };

    Some(
        video_count_factor * competition_weights::VIDEO_COUNT
            + gini_factor * competition_weights::GINI
            + variance_factor * competition_weights::VARIANCE,
    )
}

/// High traffic and low competition both push the score up.
pub fn opportunity_score(traffic: Option<f64>, competition: Option<f64>) -> Option<f64> {
    Some(traffic? * opportunity_weights::TRAFFIC + (100.0 - competition?) * opportunity_weights::OPENNESS)
}

/// Stable sort by score, best first. Missing scores order as 0.
pub fn rank_by_score(niches: &mut [NicheScore]) {
    niches.sort_by(|a, b| score_key(b).total_cmp(&score_key(a)));
}

/// Caller-side re-sort: drop niches without a competition figure, least
/// competitive first.
pub fn rank_by_competition(niches: &[NicheScore]) -> Vec<NicheScore> {
    let mut out: Vec<NicheScore> = niches
        .iter()
        .filter(|n| n.competition.is_some())
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        let a = a.competition.unwrap_or(100.0);
        let b = b.competition.unwrap_or(100.0);
        a.total_cmp(&b)
    });
    out
}

fn score_key(n: &NicheScore) -> f64 {
    n.score.unwrap_or(0.0)
}
