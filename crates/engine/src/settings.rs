//! Engine-wide configuration (spec §6, "Settings recognised by the engine")

use bucketdb_core::{BucketType, CalendarKind};

/// Default bucket-sizing policy applied to keys seen for the first time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketSizing {
    /// Point-count target/max thresholds.
    Dynamic,
    /// Hourly calendar windows.
    Hourly,
    /// Daily calendar windows.
    Daily,
    /// ISO-8601 weekly calendar windows.
    Weekly,
    /// Calendar-month windows.
    Monthly,
}

impl BucketSizing {
    /// Map to the core wire-level [`BucketType`].
    pub fn to_bucket_type(self) -> BucketType {
        match self {
            BucketSizing::Dynamic => BucketType::Dynamic,
            BucketSizing::Hourly => BucketType::Calendar(CalendarKind::Hourly),
            BucketSizing::Daily => BucketType::Calendar(CalendarKind::Daily),
            BucketSizing::Weekly => BucketType::Calendar(CalendarKind::Weekly),
            BucketSizing::Monthly => BucketType::Calendar(CalendarKind::Monthly),
        }
    }
}

/// Which backend to construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    /// In-process memory backend.
    Memory,
    /// Embedded SQLite backend at the given path (`None` = in-memory).
    EmbeddedSql(Option<String>),
    /// Sorted-set KV backend at the given Redis URL.
    Kv(String),
    /// In-process wide-column emulation.
    WideColumn,
}

/// Engine-wide configuration, applied at construction.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Default bucket-sizing policy for new keys.
    pub bucket_type: BucketSizing,
    /// Soft size threshold for dynamic buckets.
    pub dynamic_target: usize,
    /// Hard size threshold for dynamic buckets.
    pub dynamic_max: usize,
    /// Backend selector.
    pub storage: StorageKind,
    /// Whether event publication is active.
    pub enable_events: bool,
    /// Whether the tail/stats caches are consulted.
    pub enable_caching: bool,
    /// Capacity of each cache namespace, when caching is enabled.
    pub cache_capacity: usize,
}

/// `BUCKET_DYNAMIC_TARGET` default (spec §6).
pub const DEFAULT_DYNAMIC_TARGET: usize = 100;
/// `BUCKET_DYNAMIC_MAX` default (spec §6).
pub const DEFAULT_DYNAMIC_MAX: usize = 200;
/// Default LRU capacity for the `last_item`/`data_stats` cache namespaces.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bucket_type: BucketSizing::Dynamic,
            dynamic_target: DEFAULT_DYNAMIC_TARGET,
            dynamic_max: DEFAULT_DYNAMIC_MAX,
            storage: StorageKind::Memory,
            enable_events: true,
            enable_caching: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}
