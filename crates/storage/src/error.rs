//! Error types for storage-server calls.

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use http::StatusCode;

/// Errors that can occur when calling the storage server.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Transport error on the admin API
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// S3 call failed before the server answered (dispatch, timeout, response parsing)
    #[error("{0}")]
    Sdk(String),

    /// Endpoint or request URL could not be built
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The server answered with an error document
    #[error("{message}")]
    Remote {
        status: StatusCode,
        code: String,
        message: String,
    },

    /// The response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A policy document could not be (de)serialized
    #[error("invalid policy document: {0}")]
    Policy(#[from] serde_json::Error),

    /// An admin request could not be signed
    #[error("failed to sign request: {0}")]
    Signing(String),

    /// The call did not finish before its deadline
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    /// The server-side error code, if the server returned one.
    pub fn code(&self) -> Option<&str> {
        match self {
            StorageError::Remote { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl<E> From<SdkError<E>> for StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    fn from(err: SdkError<E>) -> Self {
        let status = err
            .raw_response()
            .and_then(|response| StatusCode::from_u16(response.status().as_u16()).ok());

        match (err.code(), status) {
            (Some(code), Some(status)) => StorageError::Remote {
                status,
                code: code.to_string(),
                message: err.message().unwrap_or(code).to_string(),
            },
            _ => StorageError::Sdk(DisplayErrorContext(&err).to_string()),
        }
    }
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
