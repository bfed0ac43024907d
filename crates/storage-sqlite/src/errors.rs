//! Storage-level errors and their mapping onto the core error type.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use fueltrack_core::errors::{DatabaseError, Error};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Query(#[from] DieselError),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Connection setup failed: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid stored value: {0}")]
    InvalidData(String),

    #[error("Writer is not running")]
    WriterClosed,

    /// A domain error raised inside a write transaction.
    #[error(transparent)]
    Core(Error),
}

impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::Core(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Core(inner) => inner,
            StorageError::Query(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::Query(DieselError::DatabaseError(kind, info)) => {
                let message = info.message().to_string();
                Error::Database(match kind {
                    DatabaseErrorKind::UniqueViolation => DatabaseError::UniqueViolation(message),
                    DatabaseErrorKind::ForeignKeyViolation => {
                        DatabaseError::ForeignKeyViolation(message)
                    }
                    _ => DatabaseError::QueryFailed(message),
                })
            }
            StorageError::Query(other) => {
                Error::Database(DatabaseError::QueryFailed(other.to_string()))
            }
            StorageError::Pool(e) => Error::Database(DatabaseError::PoolCreationFailed(e.to_string())),
            StorageError::Connection(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::Migration(message) => {
                Error::Database(DatabaseError::MigrationFailed(message))
            }
            StorageError::InvalidData(message) => Error::Database(DatabaseError::Internal(message)),
            StorageError::WriterClosed => {
                Error::Database(DatabaseError::Internal("Writer is not running".to_string()))
            }
        }
    }
}
