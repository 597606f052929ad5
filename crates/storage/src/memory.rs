//! In-process memory backend
//!
//! Ordered per-key map with binary-search-speed lookups, sharded across
//! keys by [`dashmap::DashMap`] so unrelated keys never contend on the
//! same lock.

use crate::error::{Result, StoreError};
use crate::store::{Entry, Store};
use bucketdb_core::Key;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// In-memory backend: a `DashMap<key, RwLock<BTreeMap<range_key, bytes>>>`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    series: DashMap<String, RwLock<BTreeMap<u32, Vec<u8>>>>,
}

impl MemoryStore {
    /// Build an empty store.
    pub fn new() -> Self {
        MemoryStore {
            series: DashMap::new(),
        }
    }
}

impl Store for MemoryStore {
    fn insert(&self, key: &Key, range_key: u32, data: Vec<u8>) -> Result<()> {
        let entry = self.series.entry(key.as_str().to_string()).or_default();
        let mut series = entry.write();
        if series.contains_key(&range_key) {
            return Err(StoreError::Conflict);
        }
        series.insert(range_key, data);
        Ok(())
    }

    fn update(&self, key: &Key, range_key: u32, data: Vec<u8>) -> Result<()> {
        let entry = self
            .series
            .get(key.as_str())
            .ok_or(StoreError::NotFound)?;
        let mut series = entry.write();
        if !series.contains_key(&range_key) {
            return Err(StoreError::NotFound);
        }
        series.insert(range_key, data);
        Ok(())
    }

    fn get(&self, key: &Key, range_key: u32) -> Result<Vec<u8>> {
        let entry = self
            .series
            .get(key.as_str())
            .ok_or(StoreError::NotFound)?;
        entry
            .read()
            .get(&range_key)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn first(&self, key: &Key) -> Result<Entry> {
        let entry = self
            .series
            .get(key.as_str())
            .ok_or(StoreError::NotFound)?;
        entry
            .read()
            .iter()
            .next()
            .map(|(k, v)| (*k, v.clone()))
            .ok_or(StoreError::NotFound)
    }

    fn last(&self, key: &Key) -> Result<Entry> {
        let entry = self
            .series
            .get(key.as_str())
            .ok_or(StoreError::NotFound)?;
        entry
            .read()
            .iter()
            .next_back()
            .map(|(k, v)| (*k, v.clone()))
            .ok_or(StoreError::NotFound)
    }

    fn left(&self, key: &Key, range_key: u32) -> Result<Entry> {
        let entry = self
            .series
            .get(key.as_str())
            .ok_or(StoreError::NotFound)?;
        entry
            .read()
            .range(..=range_key)
            .next_back()
            .map(|(k, v)| (*k, v.clone()))
            .ok_or(StoreError::NotFound)
    }

    fn range(&self, key: &Key, min: u32, max: u32) -> Result<Vec<Entry>> {
        let Some(entry) = self.series.get(key.as_str()) else {
            return Ok(Vec::new());
        };
        Ok(entry
            .read()
            .range(min..=max)
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }
}
