//! Error types for the bucketdb core layer
//!
//! Every public mutation that can fail on a bucket, column, or calendar
//! computation returns a [`CoreError`]. Storage- and engine-level errors
//! wrap this type rather than duplicating its variants.

use thiserror::Error;

/// Result type alias for bucketdb core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error types for the bucketdb core layer
#[derive(Debug, Error)]
pub enum CoreError {
    /// Metric key failed the `[A-Za-z0-9_\-\.]+` validation regex.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// An insert batch was empty or a point's value shape did not match
    /// the bucket's `item_type`.
    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    /// `range_key`/`ts_min`/`ts_max` was read on a zero-length item.
    #[error("empty bucket: {0}")]
    EmptyBucket(&'static str),

    /// `from_bytes` decoded an unknown type tag, a length that disagreed
    /// with the byte count, or reconstruction violated sortedness.
    #[error("corrupted payload: {0}")]
    CorruptedPayload(String),

    /// A tuple column operation received a value whose arity didn't match
    /// the column's declared arity.
    #[error("tuple arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Declared arity of the column
        expected: usize,
        /// Arity of the value that was supplied
        actual: usize,
    },

    /// A window produced by `ResultSet::aggregation` was empty. By
    /// construction windows are only ever emitted non-empty, so observing
    /// this indicates an internal bug.
    #[error("empty window during aggregation")]
    EmptyWindow,
}
