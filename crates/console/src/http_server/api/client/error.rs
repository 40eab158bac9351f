use reqwest::StatusCode;

use crate::http_server::api::error::ErrorPayload;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("invalid session token")]
    InvalidToken,
    #[error("{} (HTTP {})", .1.message, .0)]
    Api(StatusCode, ErrorPayload),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
}
