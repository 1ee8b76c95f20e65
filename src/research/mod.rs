pub mod catalog;
pub mod pipeline;
pub mod refresher;

pub use pipeline::{low_competition, search_report, trending_report, NicheReport};
pub use refresher::NicheRefresher;
