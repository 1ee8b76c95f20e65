use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::youtube::categories::default_category_names;
use crate::youtube::VideoStatsProvider;

/// Per-region category name tables. A region is fetched once per process; a
/// failed fetch falls back to the built-in table without caching it, so the
/// next request tries again.
pub struct CategoryCache {
    /// region code → category id → display name
    regions: DashMap<String, Arc<HashMap<String, String>>>,
}

impl CategoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(&self, region: &str) -> Option<Arc<HashMap<String, String>>> {
        self.regions.get(region).map(|e| Arc::clone(e.value()))
    }

    pub fn insert(&self, region: &str, names: HashMap<String, String>) -> Arc<HashMap<String, String>> {
        let names = Arc::new(names);
        self.regions.insert(region.to_string(), Arc::clone(&names));
        names
    }

    pub async fn names_for<P: VideoStatsProvider>(
        &self,
        provider: &P,
        api_key: &str,
        region: &str,
    ) -> Arc<HashMap<String, String>> {
        if let Some(names) = self.get(region) {
            return names;
        }
        match provider.video_categories(api_key, region).await {
            Ok(names) => {
                debug!(region, categories = names.len(), "Cached category names");
                self.insert(region, names)
            }
            Err(e) => {
                warn!(region, "Error fetching video categories, using defaults: {e}");
                Arc::new(default_category_names())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }
}

impl Default for CategoryCache {
    fn default() -> Self {
        Self {
            regions: DashMap::new(),
        }
    }
}
