use std::collections::BTreeMap;

use crate::scorer::metrics::VideoMetrics;

/// Per-category fold over one batch of videos. Lives for a single scoring call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryAggregate {
    pub category_id: String,
    pub video_count: usize,
    pub total_views: u64,
    /// Videos that reported a view count.
    pub view_contributors: usize,
    /// View counts of the contributing videos, in input order.
    pub views_by_video: Vec<u64>,
    pub total_engagement: f64,
    pub engagement_contributors: usize,
}

impl CategoryAggregate {
    pub fn new(category_id: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, video: &VideoMetrics) {
        self.video_count += 1;
        if let Some(views) = video.views {
            self.total_views = self.total_views.saturating_add(views);
            self.view_contributors += 1;
            self.views_by_video.push(views);
        }
        if let Some(rate) = video.engagement_rate {
            self.total_engagement += rate;
            self.engagement_contributors += 1;
        }
    }

    /// Total views over *all* videos in the category, `None` if no video reported views.
    pub fn avg_views(&self) -> Option<f64> {
        if self.view_contributors == 0 || self.video_count == 0 {
            return None;
        }
        Some(self.total_views as f64 / self.video_count as f64)
    }

    pub fn avg_engagement(&self) -> Option<f64> {
        if self.engagement_contributors == 0 || self.video_count == 0 {
            return None;
        }
        Some(self.total_engagement / self.video_count as f64)
    }

    pub fn view_variance(&self) -> Option<f64> {
        population_variance(&self.views_by_video)
    }

    pub fn gini_coefficient(&self) -> f64 {
        gini_coefficient(&self.views_by_video)
    }
}

/// Group videos by `category_id`. Keyed by a `BTreeMap` so iteration order, and
/// with it tie ordering downstream, is the same on every call.
pub fn aggregate_by_category(videos: &[VideoMetrics]) -> BTreeMap<String, CategoryAggregate> {
    let mut categories: BTreeMap<String, CategoryAggregate> = BTreeMap::new();
    for video in videos {
        categories
            .entry(video.category_id.clone())
            .or_insert_with(|| CategoryAggregate::new(video.category_id.clone()))
            .push(video);
    }
    categories
}

/// Descriptive (divide-by-n) variance. `None` for an empty slice.
pub fn population_variance(values: &[u64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let sum_sq = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>();
    Some(sum_sq / n)
}

/// Gini coefficient from the discrete Lorenz curve of the sorted views:
/// `1 + 1/n - 2 * sum(cumulative) / (n * total)`.
///
/// 0 when every video has the same views, `(n-1)/n` when one video has all of
/// them. Defined as 0 for `n <= 1` or zero total views. Evaluated in integer
/// arithmetic so the equal-views case is exactly 0.
pub fn gini_coefficient(values: &[u64]) -> f64 {
    let n = values.len();
    if n <= 1 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mut cumulative: u128 = 0;
    let mut area: u128 = 0;
    for &v in &sorted {
        cumulative += u128::from(v);
        area += cumulative;
    }
    if cumulative == 0 {
        return 0.0;
    }

    let n128 = n as u128;
    let numerator = (n128 + 1) * cumulative;
    let numerator = numerator.saturating_sub(2 * area);
    let gini = numerator as f64 / (n128 * cumulative) as f64;
    gini.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(category: &str, views: Option<u64>, engagement: Option<f64>) -> VideoMetrics {
        VideoMetrics {
            id: String::new(),
            title: String::new(),
            channel_id: String::new(),
            channel_title: String::new(),
            category_id: category.to_string(),
            views,
            likes: None,
            comments: None,
            engagement_rate: engagement,
            published_at: None,
            thumbnail: String::new(),
        }
    }

    #[test]
    fn groups_by_category() {
        let videos = vec![
            video("27", Some(100), Some(2.0)),
            video("10", Some(50), None),
            video("27", None, None),
        ];
        let cats = aggregate_by_category(&videos);
        assert_eq!(cats.len(), 2);
        let edu = &cats["27"];
        assert_eq!(edu.video_count, 2);
        assert_eq!(edu.total_views, 100);
        assert_eq!(edu.views_by_video, vec![100]);
        assert_eq!(edu.view_contributors, 1);
        // Divides by every video in the category, not just contributors.
        assert_eq!(edu.avg_views(), Some(50.0));
        assert_eq!(edu.avg_engagement(), Some(1.0));
    }

    #[test]
    fn averages_are_none_without_contributors() {
        let cats = aggregate_by_category(&[video("1", None, None), video("1", None, None)]);
        let agg = &cats["1"];
        assert_eq!(agg.avg_views(), None);
        assert_eq!(agg.avg_engagement(), None);
        assert_eq!(agg.view_variance(), None);
        assert_eq!(agg.gini_coefficient(), 0.0);
    }

    #[test]
    fn zero_view_videos_still_count_as_known() {
        let cats = aggregate_by_category(&[video("1", Some(0), None), video("1", Some(0), None)]);
        assert_eq!(cats["1"].avg_views(), Some(0.0));
        assert_eq!(cats["1"].gini_coefficient(), 0.0);
    }

    #[test]
    fn variance_divides_by_n() {
        let var = population_variance(&[2, 4, 4, 4, 5, 5, 7, 9]).unwrap();
        assert!((var - 4.0).abs() < 1e-12);
        assert_eq!(population_variance(&[]), None);
        assert_eq!(population_variance(&[42]), Some(0.0));
    }

    #[test]
    fn gini_is_zero_for_equal_views() {
        assert_eq!(gini_coefficient(&[500, 500, 500, 500]), 0.0);
        assert_eq!(gini_coefficient(&[7; 13]), 0.0);
    }

    #[test]
    fn gini_peaks_when_one_video_has_everything() {
        for n in 2..=12usize {
            let mut views = vec![0u64; n];
            views[n / 2] = 1_000_000;
            let expected = (n as f64 - 1.0) / n as f64;
            assert!((gini_coefficient(&views) - expected).abs() < 1e-12, "n={n}");
        }
    }

    #[test]
    fn gini_degenerate_inputs() {
        assert_eq!(gini_coefficient(&[]), 0.0);
        assert_eq!(gini_coefficient(&[1234]), 0.0);
        assert_eq!(gini_coefficient(&[0, 0, 0]), 0.0);
    }

    #[test]
    fn gini_ignores_input_order() {
        let a = gini_coefficient(&[100, 100, 5000, 100]);
        let b = gini_coefficient(&[5000, 100, 100, 100]);
        assert_eq!(a, b);
        // sorted [100,100,100,5000]: cumulative 100,200,300,5300 → area 5900
        // (5 * 5300 - 2 * 5900) / (4 * 5300)
        let expected = (5.0 * 5300.0 - 2.0 * 5900.0) / (4.0 * 5300.0);
        assert!((a - expected).abs() < 1e-12);
    }
}
