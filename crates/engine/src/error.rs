//! Errors surfaced by the engine.

use bucketdb_core::CoreError;
use bucketdb_storage::StoreError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors the engine's insert/read pipelines can raise.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A bucket-format or key-validation error from `bucketdb-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A backing-store error from `bucketdb-storage`.
    #[error(transparent)]
    Store(#[from] StoreError),
}
