//! bucketdb: a bucketed, columnar time-series datastore.
//!
//! This crate is a thin façade over [`bucketdb_engine::Engine`]: it wires
//! a [`Settings`] and a [`bucketdb_storage::Backend`] together and
//! re-exports the public vocabulary (`Key`, `PointValue`, `ResultSet`,
//! `DataStats`, ...) so a caller depends on one crate rather than three.

pub use bucketdb_core::{
    AggregateOp, Aggregation, BucketType, CalendarKind, ColumnValue, CoreError, DataStats, Item,
    ItemType, Key, PointValue, ResultSet, SplitLimit, WindowKind,
};
pub use bucketdb_engine::{
    BucketSizing, Cache, CacheNamespace, DataEvent, Engine, EngineError, EventBus, Settings,
    StorageKind, DEFAULT_CACHE_CAPACITY, DEFAULT_DYNAMIC_MAX, DEFAULT_DYNAMIC_TARGET,
};
pub use bucketdb_storage::{Backend, Entry, Store, StoreError};

use thiserror::Error;

/// Top-level result type covering construction and every engine operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the façade: either building the backing store
/// failed, or the operation itself did.
#[derive(Debug, Error)]
pub enum Error {
    /// Failure constructing the requested [`Backend`].
    #[error(transparent)]
    Storage(#[from] StoreError),
    /// Failure from the insert/read pipeline.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A bucketdb instance: a [`Settings`]-configured [`Engine`] over one
/// concrete [`Backend`], chosen by `settings.storage`.
pub struct Database {
    engine: Engine,
}

impl Database {
    /// Build a database, constructing its backend from `settings.storage`.
    ///
    /// # Errors
    /// Returns [`Error::Storage`] if the requested backend fails to open
    /// (e.g. a SQLite file cannot be created, or a Redis URL cannot be
    /// connected).
    pub fn open(settings: Settings) -> Result<Self> {
        let backend = match &settings.storage {
            StorageKind::Memory => Backend::memory(),
            StorageKind::WideColumn => Backend::wide_column(),
            StorageKind::EmbeddedSql(None) => Backend::sql_in_memory()?,
            StorageKind::EmbeddedSql(Some(path)) => Backend::sql(std::path::Path::new(path))?,
            StorageKind::Kv(url) => Backend::kv(url)?,
        };
        Ok(Database {
            engine: Engine::new(backend, settings),
        })
    }

    /// Insert a batch of `(timestamp, value)` points under `key`.
    ///
    /// # Errors
    /// Returns [`Error::Engine`] wrapping a [`CoreError`] for an invalid
    /// key or shape-mismatched batch, or a [`StoreError`] on backend
    /// failure.
    pub fn insert(&self, key: &str, points: Vec<(u32, PointValue)>) -> Result<DataStats> {
        Ok(self.engine.insert(key, points)?)
    }

    /// Read all points for `key` with `ts_min <= timestamp <= ts_max`.
    ///
    /// An unknown key yields an empty [`ResultSet`], not an error.
    ///
    /// # Errors
    /// Returns [`Error::Engine`] on an invalid key or a backend failure.
    pub fn query(&self, key: &str, ts_min: u32, ts_max: u32) -> Result<ResultSet> {
        Ok(self.engine.query(key, ts_min, ts_max)?)
    }

    /// `{ts_min, ts_max, count}` for `key`, derived from storage and
    /// cached under the `data_stats` namespace until the next insert.
    ///
    /// # Errors
    /// Returns [`Error::Storage`] wrapping [`StoreError::NotFound`] for
    /// an unknown key, or [`Error::Engine`] on an invalid key.
    pub fn stats(&self, key: &str) -> Result<DataStats> {
        Ok(self.engine.stats(key)?)
    }

    /// Subscribe a callback to data events on channels matching `pattern`
    /// (`*`-style glob). Subscriber panics are caught and recorded; see
    /// [`Database::last_error`].
    pub fn register_data_listener(&self, pattern: &str, callback: impl Fn(&DataStats) + Send + 'static) {
        self.engine.register_data_listener(pattern, callback);
    }

    /// The most recent subscriber failure caught by the event bus, if any.
    pub fn last_error(&self) -> Option<String> {
        self.engine.last_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_with_default_settings_and_round_trip_a_point() {
        let db = Database::open(Settings::default()).unwrap();
        db.insert("cpu.load", vec![(1, PointValue::F32(1.5))]).unwrap();
        let rs = db.query("cpu.load", 0, 100).unwrap();
        assert_eq!(rs.all(), vec![(1, PointValue::F32(1.5))]);
    }

    #[test]
    fn open_with_embedded_sql_in_memory_backend() {
        let settings = Settings {
            storage: StorageKind::EmbeddedSql(None),
            ..Settings::default()
        };
        let db = Database::open(settings).unwrap();
        db.insert("k", vec![(1, PointValue::F32(1.0))]).unwrap();
        assert_eq!(db.query("k", 0, 10).unwrap().len(), 1);
    }

    #[test]
    fn unknown_key_query_is_empty_not_an_error() {
        let db = Database::open(Settings::default()).unwrap();
        let rs = db.query("never-written", 0, 100).unwrap();
        assert!(rs.is_empty());
    }

    #[test]
    fn stats_reports_ts_bounds_and_count() {
        let db = Database::open(Settings::default()).unwrap();
        db.insert("cpu.load", vec![(1, PointValue::F32(1.0)), (5, PointValue::F32(5.0))])
            .unwrap();
        let stats = db.stats("cpu.load").unwrap();
        assert_eq!(stats.ts_min, 1);
        assert_eq!(stats.ts_max, 5);
        assert_eq!(stats.count, 2);
    }
}
