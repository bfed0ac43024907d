//! Error types for the cloud document store client.

use fueltrack_core::errors::{Error, SyncError};
use thiserror::Error;

/// Result type alias for cloud store operations.
pub type Result<T> = std::result::Result<T, CloudSyncError>;

/// Errors that can occur while talking to the cloud document store.
#[derive(Debug, Error)]
pub enum CloudSyncError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the cloud service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or malformed access token
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl CloudSyncError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }
}

impl From<CloudSyncError> for Error {
    fn from(err: CloudSyncError) -> Self {
        Error::Sync(SyncError::remote(err.to_string()))
    }
}
