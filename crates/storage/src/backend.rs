//! Tagged dispatch over the four backend implementations
//!
//! The engine holds a [`Backend`], never a concrete backend type — no
//! backend-specific type leaks past this module (spec §9, "Dynamic
//! dispatch over storage").

use crate::error::Result;
use crate::kv::KvStore;
use crate::memory::MemoryStore;
use crate::sql::SqlStore;
use crate::store::{Entry, Store};
use crate::wide_column::WideColumnStore;
use bucketdb_core::Key;

/// One of the four interchangeable backing stores.
pub enum Backend {
    /// In-process memory backend.
    Memory(MemoryStore),
    /// Embedded SQLite backend.
    Sql(SqlStore),
    /// Redis sorted-set backend.
    Kv(KvStore),
    /// In-process wide-column emulation.
    WideColumn(WideColumnStore),
}

impl Backend {
    /// Build the default in-memory backend.
    pub fn memory() -> Self {
        Backend::Memory(MemoryStore::new())
    }

    /// Build the in-process wide-column backend.
    pub fn wide_column() -> Self {
        Backend::WideColumn(WideColumnStore::new())
    }

    /// Open the embedded SQL backend at `path`.
    pub fn sql(path: &std::path::Path) -> Result<Self> {
        Ok(Backend::Sql(SqlStore::open(path)?))
    }

    /// Open the embedded SQL backend in memory.
    pub fn sql_in_memory() -> Result<Self> {
        Ok(Backend::Sql(SqlStore::open_in_memory()?))
    }

    /// Connect the sorted-set KV backend to a Redis instance.
    pub fn kv(url: &str) -> Result<Self> {
        Ok(Backend::Kv(KvStore::open(url)?))
    }
}

impl Store for Backend {
    fn insert(&self, key: &Key, range_key: u32, data: Vec<u8>) -> Result<()> {
        match self {
            Backend::Memory(s) => s.insert(key, range_key, data),
            Backend::Sql(s) => s.insert(key, range_key, data),
            Backend::Kv(s) => s.insert(key, range_key, data),
            Backend::WideColumn(s) => s.insert(key, range_key, data),
        }
    }

    fn update(&self, key: &Key, range_key: u32, data: Vec<u8>) -> Result<()> {
        match self {
            Backend::Memory(s) => s.update(key, range_key, data),
            Backend::Sql(s) => s.update(key, range_key, data),
            Backend::Kv(s) => s.update(key, range_key, data),
            Backend::WideColumn(s) => s.update(key, range_key, data),
        }
    }

    fn get(&self, key: &Key, range_key: u32) -> Result<Vec<u8>> {
        match self {
            Backend::Memory(s) => s.get(key, range_key),
            Backend::Sql(s) => s.get(key, range_key),
            Backend::Kv(s) => s.get(key, range_key),
            Backend::WideColumn(s) => s.get(key, range_key),
        }
    }

    fn first(&self, key: &Key) -> Result<Entry> {
        match self {
            Backend::Memory(s) => s.first(key),
            Backend::Sql(s) => s.first(key),
            Backend::Kv(s) => s.first(key),
            Backend::WideColumn(s) => s.first(key),
        }
    }

    fn last(&self, key: &Key) -> Result<Entry> {
        match self {
            Backend::Memory(s) => s.last(key),
            Backend::Sql(s) => s.last(key),
            Backend::Kv(s) => s.last(key),
            Backend::WideColumn(s) => s.last(key),
        }
    }

    fn left(&self, key: &Key, range_key: u32) -> Result<Entry> {
        match self {
            Backend::Memory(s) => s.left(key, range_key),
            Backend::Sql(s) => s.left(key, range_key),
            Backend::Kv(s) => s.left(key, range_key),
            Backend::WideColumn(s) => s.left(key, range_key),
        }
    }

    fn range(&self, key: &Key, min: u32, max: u32) -> Result<Vec<Entry>> {
        match self {
            Backend::Memory(s) => s.range(key, min, max),
            Backend::Sql(s) => s.range(key, min, max),
            Backend::Kv(s) => s.range(key, min, max),
            Backend::WideColumn(s) => s.range(key, min, max),
        }
    }
}
