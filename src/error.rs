use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

/// Failures surfaced by the YouTube Data API client, classified from the HTTP
/// status and the structured `error.errors[].reason` field of the response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YouTubeError {
    #[error("YouTube API quota exceeded; try again tomorrow or use a different API key")]
    QuotaExceeded,

    #[error("YouTube API rate limited: {0}")]
    RateLimited(String),

    #[error("invalid YouTube API key")]
    AuthInvalid,

    #[error("the YouTube Data API v3 is not enabled for this API key")]
    ApiDisabled,

    #[error("YouTube resource not found: {0}")]
    NotFound(String),

    #[error("YouTube API rejected the request: {0}")]
    Rejected(String),

    #[error("transient YouTube API failure: {0}")]
    Transient(String),

    #[error("unexpected YouTube API response: {0}")]
    Decode(String),
}

impl YouTubeError {
    /// Only rate limiting and transient failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, YouTubeError::RateLimited(_) | YouTubeError::Transient(_))
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("YouTube error: {0}")]
    YouTube(#[from] YouTubeError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::YouTube(e) => match e {
                YouTubeError::QuotaExceeded | YouTubeError::RateLimited(_) => {
                    StatusCode::TOO_MANY_REQUESTS
                }
                YouTubeError::AuthInvalid => StatusCode::UNAUTHORIZED,
                YouTubeError::ApiDisabled => StatusCode::FORBIDDEN,
                YouTubeError::NotFound(_) => StatusCode::NOT_FOUND,
                YouTubeError::Rejected(_) => StatusCode::BAD_REQUEST,
                YouTubeError::Transient(_) | YouTubeError::Decode(_) => StatusCode::BAD_GATEWAY,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_retry() {
        assert!(YouTubeError::RateLimited("slow down".into()).is_retryable());
        assert!(YouTubeError::Transient("503".into()).is_retryable());
        assert!(!YouTubeError::QuotaExceeded.is_retryable());
        assert!(!YouTubeError::AuthInvalid.is_retryable());
        assert!(!YouTubeError::ApiDisabled.is_retryable());
    }

    #[test]
    fn youtube_errors_map_to_distinct_statuses() {
        assert_eq!(AppError::from(YouTubeError::QuotaExceeded).status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::from(YouTubeError::AuthInvalid).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::from(YouTubeError::ApiDisabled).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::from(YouTubeError::NotFound("channel".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(YouTubeError::Transient("503".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(AppError::Config("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
