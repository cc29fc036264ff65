//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored timestamp could not be parsed back.
    #[error("corrupt timestamp in store: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),

    /// A stored provider name is not recognized.
    #[error(transparent)]
    UnknownProvider(#[from] studyflow_core::UnknownProvider),

    /// Filesystem failure while opening the database.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
