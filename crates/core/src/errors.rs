//! Error types shared across the fuel tracker crates.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result alias used by every fallible core operation.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Vehicle with id {0} not found")]
    VehicleNotFound(String),

    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Pool creation failed: {0}")]
    PoolCreationFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Failures raised by the cloud mirror.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Pull was requested without a signed-in account.
    #[error("No account is signed in")]
    NotSignedIn,

    /// The remote document store rejected or failed an operation.
    #[error("Remote store error: {0}")]
    Remote(String),

    /// A remote document could not be turned into a local record.
    #[error("Invalid remote document {collection}/{id}: {reason}")]
    InvalidDocument {
        collection: String,
        id: String,
        reason: String,
    },
}

impl SyncError {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }
}

impl Error {
    /// True when the error came from the remote side of a sync operation.
    pub fn is_sync_failure(&self) -> bool {
        matches!(self, Self::Sync(_))
    }
}
