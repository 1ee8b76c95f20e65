use serde::Serialize;
use tracing::info;

use crate::error::YouTubeError;
use crate::scorer::aggregate::CategoryAggregate;
use crate::scorer::metrics::{extract_metrics, VideoMetrics};
use crate::scorer::niche_scorer::rank_by_competition;
use crate::scorer::{NicheScorer, ScorerConfig};
use crate::state::CategoryCache;
use crate::types::NicheScore;
use crate::youtube::VideoStatsProvider;

/// Ranked niches for one batch of videos, plus the videos themselves so
/// callers can attach examples.
#[derive(Debug, Clone, Serialize)]
pub struct NicheReport {
    pub niches: Vec<NicheScore>,
    pub analyzed_videos: usize,
    pub videos: Vec<VideoMetrics>,
}

impl NicheReport {
    /// First `limit` videos of a category, in API order.
    pub fn examples_for(&self, category_id: &str, limit: usize) -> Vec<&VideoMetrics> {
        self.videos
            .iter()
            .filter(|v| v.category_id == category_id)
            .take(limit)
            .collect()
    }
}

/// Same report, niches re-ranked least competitive first. Niches without a
/// competition figure are dropped.
pub fn low_competition(mut report: NicheReport) -> NicheReport {
    report.niches = rank_by_competition(&report.niches);
    report
}

/// One search query treated as a single niche.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    /// `None` when the search returned no usable videos.
    pub niche: Option<NicheScore>,
    pub videos: Vec<VideoMetrics>,
    pub analyzed_videos: usize,
}

/// Trending videos for a region → per-category niche ranking.
pub async fn trending_report<P: VideoStatsProvider>(
    provider: &P,
    cache: &CategoryCache,
    api_key: &str,
    region: &str,
    max_results: u32,
) -> Result<NicheReport, YouTubeError> {
    let items = provider.trending_videos(api_key, region, max_results).await?;
    let names = cache.names_for(provider, api_key, region).await;

    let videos = extract_metrics(&items);
    let niches = NicheScorer::default().score_videos(&videos, &names);

    info!(
        region,
        fetched = items.len(),
        analyzed = videos.len(),
        niches = niches.len(),
        "Trending niche research complete"
    );

    Ok(NicheReport {
        analyzed_videos: videos.len(),
        niches,
        videos,
    })
}

/// Search results for `query` scored as one niche against the absolute traffic
/// ceiling. No minimum sample applies.
pub async fn search_report<P: VideoStatsProvider>(
    provider: &P,
    api_key: &str,
    query: &str,
    region: &str,
    max_results: u32,
) -> Result<SearchReport, YouTubeError> {
    let items = provider.search_videos(api_key, query, region, max_results).await?;
    let videos = extract_metrics(&items);

    let niche = if videos.is_empty() {
        None
    } else {
        let mut agg = CategoryAggregate::new(query);
        for video in &videos {
            agg.push(video);
        }
        Some(NicheScorer::new(ScorerConfig::single_niche()).score_single(&agg, query))
    };

    info!(
        query,
        region,
        analyzed = videos.len(),
        score = ?niche.as_ref().and_then(|n| n.score),
        "Search niche analysis complete"
    );

    Ok(SearchReport {
        query: query.to_string(),
        niche,
        analyzed_videos: videos.len(),
        videos,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use crate::types::{ChannelInfo, DataQuality};

    /// In-memory `VideoStatsProvider` for pipeline, cache and API tests.
    #[derive(Default)]
    pub(crate) struct FakeProvider {
        pub trending: Vec<Value>,
        pub search: Vec<Value>,
        pub categories: HashMap<String, String>,
        pub categories_fail: bool,
        pub trending_error: Option<YouTubeError>,
        pub channel: Option<ChannelInfo>,
        pub category_calls: AtomicUsize,
        pub last_region: Mutex<Option<String>>,
    }

    impl FakeProvider {
        pub fn with_category(mut self, id: &str, name: &str) -> Self {
            self.categories.insert(id.to_string(), name.to_string());
            self
        }

        pub fn failing_categories(mut self) -> Self {
            self.categories_fail = true;
            self
        }

        pub fn category_calls(&self) -> usize {
            self.category_calls.load(Ordering::SeqCst)
        }
    }

    impl VideoStatsProvider for FakeProvider {
        async fn trending_videos(
            &self,
            _api_key: &str,
            region: &str,
            max_results: u32,
        ) -> Result<Vec<Value>, YouTubeError> {
            if let Ok(mut r) = self.last_region.lock() {
                *r = Some(region.to_string());
            }
            if let Some(e) = &self.trending_error {
                return Err(e.clone());
            }
            Ok(self.trending.iter().take(max_results as usize).cloned().collect())
        }

        async fn search_videos(
            &self,
            _api_key: &str,
            _query: &str,
            _region: &str,
            max_results: u32,
        ) -> Result<Vec<Value>, YouTubeError> {
            Ok(self.search.iter().take(max_results as usize).cloned().collect())
        }

        async fn video_categories(
            &self,
            _api_key: &str,
            _region: &str,
        ) -> Result<HashMap<String, String>, YouTubeError> {
            self.category_calls.fetch_add(1, Ordering::SeqCst);
            if self.categories_fail {
                return Err(YouTubeError::Transient("categories down".to_string()));
            }
            Ok(self.categories.clone())
        }

        async fn channel_info(
            &self,
            _api_key: &str,
            channel_id: &str,
        ) -> Result<Option<ChannelInfo>, YouTubeError> {
            Ok(self.channel.clone().filter(|c| c.id == channel_id))
        }
    }

    pub(crate) fn video(id: &str, category: &str, views: Option<u64>) -> Value {
        let mut stats = serde_json::Map::new();
        if let Some(v) = views {
            stats.insert("viewCount".to_string(), json!(v.to_string()));
            stats.insert("likeCount".to_string(), json!((v / 10).to_string()));
            stats.insert("commentCount".to_string(), json!("0"));
        }
        json!({
            "id": id,
            "snippet": {"title": format!("video {id}"), "categoryId": category, "channelId": "UC1"},
            "statistics": Value::Object(stats),
            "contentDetails": {"duration": "PT45S"}
        })
    }

    pub(crate) fn trending_fixture() -> Vec<Value> {
        vec![
            video("a1", "27", Some(100)),
            video("a2", "27", Some(100)),
            video("a3", "27", Some(5000)),
            video("a4", "27", Some(100)),
            video("b1", "10", Some(90_000)),
            video("b2", "10", Some(110_000)),
            video("c1", "20", Some(2_000)),
            video("c2", "20", Some(2_500)),
            video("c3", "20", Some(1_500)),
            json!("not a video"),
        ]
    }

    #[tokio::test]
    async fn trending_report_ranks_categories() {
        let provider = FakeProvider {
            trending: trending_fixture(),
            ..Default::default()
        }
        .with_category("27", "Education");
        let cache = CategoryCache::new();

        let report = trending_report(&provider, &cache, "key", "US", 50).await.unwrap();

        assert_eq!(report.analyzed_videos, 9);
        let ids: Vec<&str> = report.niches.iter().map(|n| n.category_id.as_str()).collect();
        assert_eq!(ids.len(), 2, "music has only two videos");
        assert!(!ids.contains(&"10"));

        let edu = report.niches.iter().find(|n| n.category_id == "27").unwrap();
        assert_eq!(edu.name, "Education");
        assert_eq!(edu.avg_views, Some(1325.0));
        assert_eq!(edu.data_quality, DataQuality::Low);

        let gaming = report.niches.iter().find(|n| n.category_id == "20").unwrap();
        assert_eq!(gaming.name, "Category 20");

        assert_eq!(report.examples_for("27", 3).len(), 3);
        assert_eq!(provider.last_region.lock().unwrap().as_deref(), Some("US"));
    }

    #[tokio::test]
    async fn trending_report_propagates_typed_errors() {
        let provider = FakeProvider {
            trending_error: Some(YouTubeError::QuotaExceeded),
            ..Default::default()
        };
        let cache = CategoryCache::new();
        let err = trending_report(&provider, &cache, "key", "US", 50).await.unwrap_err();
        assert_eq!(err, YouTubeError::QuotaExceeded);
        // No categories lookup once the video fetch failed.
        assert_eq!(provider.category_calls(), 0);
    }

    #[tokio::test]
    async fn low_competition_view_drops_unmeasured() {
        let mut trending = trending_fixture();
        trending.extend([
            video("d1", "24", None),
            video("d2", "24", None),
            video("d3", "24", None),
        ]);
        let provider = FakeProvider {
            trending,
            ..Default::default()
        };
        let cache = CategoryCache::new();
        let report = trending_report(&provider, &cache, "key", "US", 50).await.unwrap();
        assert_eq!(report.niches.len(), 3);
        assert_eq!(report.niches.last().unwrap().category_id, "24");

        let low = low_competition(report);
        assert_eq!(low.niches.len(), 2);
        assert!(low.niches[0].competition <= low.niches[1].competition);
    }

    #[tokio::test]
    async fn search_report_scores_whole_result_set() {
        let provider = FakeProvider {
            search: vec![
                video("s1", "27", Some(1_000_000)),
                video("s2", "22", Some(1_500_000)),
            ],
            ..Default::default()
        };
        let report = search_report(&provider, "key", "lofi beats", "US", 30).await.unwrap();
        let niche = report.niche.expect("niche present");
        assert_eq!(niche.name, "lofi beats");
        assert_eq!(niche.video_count, 2);
        assert_eq!(niche.avg_views, Some(1_250_000.0));
        assert!((niche.traffic_potential.unwrap() - 25.0).abs() < 1e-9);
        assert!(niche.score.is_some());
        assert_eq!(report.analyzed_videos, 2);
    }

    #[tokio::test]
    async fn empty_search_has_no_niche() {
        let provider = FakeProvider::default();
        let report = search_report(&provider, "key", "nothing", "US", 30).await.unwrap();
        assert!(report.niche.is_none());
        assert!(report.videos.is_empty());
    }
}
