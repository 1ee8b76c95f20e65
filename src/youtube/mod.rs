pub mod categories;
pub mod client;

use std::collections::HashMap;
use std::future::Future;

use serde_json::Value;

use crate::error::YouTubeError;
use crate::types::ChannelInfo;

pub use client::YouTubeClient;

/// Source of raw, API-shaped video items (`snippet` / `statistics` /
/// `contentDetails`) for the research pipeline.
pub trait VideoStatsProvider: Send + Sync {
    /// Most popular videos in a region.
    fn trending_videos(
        &self,
        api_key: &str,
        region: &str,
        max_results: u32,
    ) -> impl Future<Output = Result<Vec<Value>, YouTubeError>> + Send;

    /// Full video items matching a search query. Empty when nothing matched.
    fn search_videos(
        &self,
        api_key: &str,
        query: &str,
        region: &str,
        max_results: u32,
    ) -> impl Future<Output = Result<Vec<Value>, YouTubeError>> + Send;

    /// Category id → display name for a region, merged over the built-in table.
    fn video_categories(
        &self,
        api_key: &str,
        region: &str,
    ) -> impl Future<Output = Result<HashMap<String, String>, YouTubeError>> + Send;

    /// `Ok(None)` when the channel does not exist.
    fn channel_info(
        &self,
        api_key: &str,
        channel_id: &str,
    ) -> impl Future<Output = Result<Option<ChannelInfo>, YouTubeError>> + Send;
}
