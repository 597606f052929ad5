//! bucketdb-storage: the backing store abstraction and its backends.
//!
//! Four interchangeable backends — memory, embedded SQL, sorted-set KV,
//! and wide-column — all implement [`Store`] and must pass the same
//! conformance suite (see `tests/conformance.rs`).

pub mod backend;
pub mod error;
pub mod kv;
pub mod memory;
pub mod sql;
pub mod store;
pub mod wide_column;

pub use backend::Backend;
pub use error::{Result, StoreError};
pub use store::{Entry, Store};
