use crate::error::{AppError, Result};

pub const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_REGION: &str = "US";

/// Categories with fewer videos than this are dropped from the ranking.
pub const MIN_CATEGORY_VIDEOS: usize = 3;

/// `video_count >= MEDIUM_QUALITY_MIN` → medium, `>= HIGH_QUALITY_MIN` → high.
pub const MEDIUM_QUALITY_MIN: usize = 5;
pub const HIGH_QUALITY_MIN: usize = 10;

/// Average views that map to a traffic score of 100 under absolute normalization.
pub const ABSOLUTE_TRAFFIC_CEILING: f64 = 5_000_000.0;

/// Upper bounds accepted by the YouTube `maxResults` parameter for each query kind.
pub const MAX_TRENDING_RESULTS: u32 = 100;
pub const MAX_SEARCH_RESULTS: u32 = 50;

/// Example videos attached to each niche in API responses.
pub const EXAMPLES_PER_NICHE: usize = 3;

/// Channel capacity for snapshot messages.
pub const CHANNEL_CAPACITY: usize = 256;

/// Background trending research interval (seconds).
pub const REFRESH_INTERVAL_SECS: u64 = 3600;

/// HTTP timeout for every YouTube request (seconds).
pub const YOUTUBE_TIMEOUT_SECS: u64 = 30;

/// Competition blend weights. Must sum to 1.0.
pub mod competition_weights {
    pub const VIDEO_COUNT: f64 = 0.4;
    pub const GINI: f64 = 0.4;
    pub const VARIANCE: f64 = 0.2;
}

/// Opportunity blend weights: traffic vs. inverse competition.
pub mod opportunity_weights {
    pub const TRAFFIC: f64 = 0.6;
    pub const OPENNESS: f64 = 0.4;
}

/// Display name → ISO 3166-1 alpha-2 code.
pub const REGIONS: &[(&str, &str)] = &[
    ("United States", "US"),
    ("United Kingdom", "GB"),
    ("Canada", "CA"),
    ("Australia", "AU"),
    ("India", "IN"),
    ("Brazil", "BR"),
    ("France", "FR"),
    ("Germany", "DE"),
    ("Japan", "JP"),
    ("South Korea", "KR"),
    ("Mexico", "MX"),
    ("Spain", "ES"),
    ("Italy", "IT"),
    ("Russia", "RU"),
    ("Netherlands", "NL"),
];

#[derive(Debug, Clone)]
pub struct Config {
    /// Default API key (YOUTUBE_API_KEY). Requests may pass their own `api_key`.
    pub youtube_api_key: Option<String>,
    pub youtube_api_url: String,
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Region used when a request does not name one (DEFAULT_REGION)
    pub default_region: String,
    /// Regions researched by the background refresher (REFRESH_REGIONS, comma-separated)
    pub refresh_regions: Vec<String>,
    /// Trending videos pulled per background research call (REFRESH_MAX_RESULTS)
    pub refresh_max_results: u32,
    /// Attempts per YouTube request, including the first (YOUTUBE_MAX_RETRIES)
    pub max_retries: u32,
    /// Linear backoff step in milliseconds (YOUTUBE_RETRY_DELAY_MS)
    pub retry_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_region = match std::env::var("DEFAULT_REGION") {
            Ok(raw) if !raw.trim().is_empty() => parse_region(&raw)
                .ok_or_else(|| AppError::Config(format!("DEFAULT_REGION is not a known region: {raw}")))?,
            _ => DEFAULT_REGION.to_string(),
        };
        let refresh_regions = parse_region_list(
            &std::env::var("REFRESH_REGIONS").unwrap_or_default(),
            &default_region,
        )?;

        Ok(Self {
            youtube_api_key: std::env::var("YOUTUBE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            youtube_api_url: std::env::var("YOUTUBE_API_URL")
                .unwrap_or_else(|_| YOUTUBE_API_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "niches.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            default_region,
            refresh_regions,
            refresh_max_results: std::env::var("REFRESH_MAX_RESULTS")
                .unwrap_or_else(|_| "50".to_string())
                .parse::<u32>()
                .unwrap_or(50)
                .clamp(1, MAX_TRENDING_RESULTS),
            max_retries: std::env::var("YOUTUBE_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse::<u32>()
                .unwrap_or(3)
                .max(1),
            retry_delay_ms: std::env::var("YOUTUBE_RETRY_DELAY_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse::<u64>()
                .unwrap_or(1000),
        })
    }
}

/// Look up a region code by display name, or accept a code as-is.
pub fn region_code(name_or_code: &str) -> Option<&'static str> {
    let needle = name_or_code.trim();
    REGIONS
        .iter()
        .find(|(name, code)| name.eq_ignore_ascii_case(needle) || code.eq_ignore_ascii_case(needle))
        .map(|(_, code)| *code)
}

/// Region code for a display name or any two-letter code, uppercased.
pub fn parse_region(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Some(code) = region_code(raw) {
        return Some(code.to_string());
    }
    if raw.len() == 2 && raw.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(raw.to_ascii_uppercase());
    }
    None
}

/// Comma-separated REFRESH_REGIONS. Empty means just the default region.
fn parse_region_list(raw: &str, default_region: &str) -> Result<Vec<String>> {
    let mut regions = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let code = parse_region(entry)
            .ok_or_else(|| AppError::Config(format!("REFRESH_REGIONS has an unknown region: {entry}")))?;
        regions.push(code);
    }
    if regions.is_empty() {
        regions.push(default_region.to_string());
    }
    Ok(regions)
}
