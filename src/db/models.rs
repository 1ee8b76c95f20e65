//! Database row types matching `migrations/*_init.sql`.
use serde::Serialize;

use crate::types::{DataQuality, NicheScore};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ResearchRunRow {
    pub id: i64,
    pub region: String,
    pub source: String,
    pub analyzed_videos: i64,
    pub niche_count: i64,
    /// Nanosecond UTC epoch.
    pub created_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NicheSnapshotRow {
    pub category_id: String,
    pub name: String,
    pub avg_views: Option<f64>,
    pub engagement: Option<f64>,
    pub competition: Option<f64>,
    pub traffic_potential: Option<f64>,
    pub score: Option<f64>,
    pub video_count: i64,
    pub view_concentration: Option<f64>,
    pub data_quality: String,
}

impl NicheSnapshotRow {
    /// Unknown quality text reads back as `Low`.
    pub fn into_niche(self) -> NicheScore {
        NicheScore {
            category_id: self.category_id,
            name: self.name,
            avg_views: self.avg_views,
            engagement: self.engagement,
            competition: self.competition,
            traffic_potential: self.traffic_potential,
            score: self.score,
            video_count: self.video_count.max(0) as usize,
            view_concentration: self.view_concentration,
            data_quality: self.data_quality.parse().unwrap_or(DataQuality::Low),
        }
    }
}
