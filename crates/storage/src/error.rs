//! Errors surfaced by the backing store abstraction.

use bucketdb_core::CoreError;
use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors a [`crate::store::Store`] implementation can raise.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `get`/`first`/`last`/`left` found nothing for the given key/range.
    #[error("not found")]
    NotFound,

    /// `insert` found an existing entry at `(key, range_key)`.
    #[error("conflict: entry already exists")]
    Conflict,

    /// A backend-specific failure (connection, I/O, driver error).
    #[error("backend error: {0}")]
    Backend(String),

    /// A stored payload failed to decode while deriving [`crate::store::Store::stats`].
    #[error(transparent)]
    Corrupted(#[from] CoreError),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}
