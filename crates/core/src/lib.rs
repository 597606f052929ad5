//! bucketdb-core: binary bucket format, columnar storage, and calendar
//! helpers.
//!
//! This crate has no knowledge of any backing store or engine-level
//! policy; it owns the wire format and in-memory representation that
//! every other bucketdb crate builds on.

pub mod calendar;
pub mod column;
pub mod error;
pub mod item;
pub mod key;
pub mod resultset;
pub mod stats;

pub use column::{ColumnValue, ColumnVec, ScalarKind};
pub use error::{CoreError, Result};
pub use item::{
    Aggregation, BucketType, CalendarKind, Item, ItemType, PointValue, SplitLimit, HEADER_SIZE,
};
pub use key::Key;
pub use resultset::{AggregateOp, ResultSet, WindowKind};
pub use stats::DataStats;
