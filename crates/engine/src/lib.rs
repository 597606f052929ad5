//! bucketdb-engine: the insert/read pipelines, caching, settings, and
//! eventing that sit above the bucket format and the backing store.

pub mod cache;
pub mod engine;
pub mod error;
pub mod events;
pub mod settings;

pub use cache::{Cache, CacheNamespace};
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use events::{DataEvent, EventBus};
pub use settings::{
    BucketSizing, Settings, StorageKind, DEFAULT_CACHE_CAPACITY, DEFAULT_DYNAMIC_MAX,
    DEFAULT_DYNAMIC_TARGET,
};
