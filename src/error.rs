use thiserror::Error;

use crate::models::Platform;

pub type AppResult<T> = Result<T, AppError>;

/// Сообщение для 429: по пути запроса нельзя надёжно понять, какая квота исчерпана,
/// поэтому упоминаем обе.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded, please try again later. \
Blotato allows 30 requests/minute for post creation and 10 requests/minute for media uploads";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: check the Blotato API key")]
    AuthenticationFailed,

    #[error("Payload too large: the request or media file exceeds the backend limit")]
    PayloadTooLarge,

    #[error("Remote error (HTTP {status}): {body}")]
    RemoteError { status: u16, body: String },

    #[error("No binary data property \"{0}\" found in input")]
    MissingBinaryData(String),

    #[error("No {key} provided for {platform} in parameters or credentials")]
    MissingAccountIdentifier { platform: Platform, key: &'static str },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Ошибки, которые пришли от бэкенда в виде HTTP статуса
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            AppError::RateLimited
                | AppError::InvalidRequest(_)
                | AppError::AuthenticationFailed
                | AppError::PayloadTooLarge
                | AppError::RemoteError { .. }
        )
    }
}
