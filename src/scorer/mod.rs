pub mod aggregate;
pub mod metrics;
pub mod niche_scorer;

pub use metrics::VideoMetrics;
pub use niche_scorer::{NicheScorer, ScorerConfig};
