//! Wide-column backend (in-process emulation)
//!
//! Models the partition/cluster shape of a wide-column store (partition
//! key = metric key, clustering key = `range_key`) without a network
//! transport: spec §1 scopes "concrete network transports to external
//! stores" out, and no wide-column driver exists anywhere in the
//! dependency pack. Rows within a partition are held sorted by
//! clustering key, mirroring how such a store physically clusters data
//! on disk.

use crate::error::{Result, StoreError};
use crate::store::{Entry, Store};
use bucketdb_core::Key;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

struct Partition {
    rows: BTreeMap<u32, Vec<u8>>,
}

/// In-process emulation of a wide-column store's partition/cluster model.
#[derive(Default)]
pub struct WideColumnStore {
    partitions: RwLock<HashMap<String, Partition>>,
}

impl WideColumnStore {
    /// Build an empty store.
    pub fn new() -> Self {
        WideColumnStore {
            partitions: RwLock::new(HashMap::new()),
        }
    }
}

impl Store for WideColumnStore {
    fn insert(&self, key: &Key, range_key: u32, data: Vec<u8>) -> Result<()> {
        let mut partitions = self.partitions.write();
        let partition = partitions
            .entry(key.as_str().to_string())
            .or_insert_with(|| Partition { rows: BTreeMap::new() });
        if partition.rows.contains_key(&range_key) {
            return Err(StoreError::Conflict);
        }
        partition.rows.insert(range_key, data);
        Ok(())
    }

    fn update(&self, key: &Key, range_key: u32, data: Vec<u8>) -> Result<()> {
        let mut partitions = self.partitions.write();
        let partition = partitions.get_mut(key.as_str()).ok_or(StoreError::NotFound)?;
        if !partition.rows.contains_key(&range_key) {
            return Err(StoreError::NotFound);
        }
        partition.rows.insert(range_key, data);
        Ok(())
    }

    fn get(&self, key: &Key, range_key: u32) -> Result<Vec<u8>> {
        let partitions = self.partitions.read();
        let partition = partitions.get(key.as_str()).ok_or(StoreError::NotFound)?;
        partition.rows.get(&range_key).cloned().ok_or(StoreError::NotFound)
    }

    fn first(&self, key: &Key) -> Result<Entry> {
        let partitions = self.partitions.read();
        let partition = partitions.get(key.as_str()).ok_or(StoreError::NotFound)?;
        partition
            .rows
            .iter()
            .next()
            .map(|(k, v)| (*k, v.clone()))
            .ok_or(StoreError::NotFound)
    }

    fn last(&self, key: &Key) -> Result<Entry> {
        let partitions = self.partitions.read();
        let partition = partitions.get(key.as_str()).ok_or(StoreError::NotFound)?;
        partition
            .rows
            .iter()
            .next_back()
            .map(|(k, v)| (*k, v.clone()))
            .ok_or(StoreError::NotFound)
    }

    fn left(&self, key: &Key, range_key: u32) -> Result<Entry> {
        let partitions = self.partitions.read();
        let partition = partitions.get(key.as_str()).ok_or(StoreError::NotFound)?;
        partition
            .rows
            .range(..=range_key)
            .next_back()
            .map(|(k, v)| (*k, v.clone()))
            .ok_or(StoreError::NotFound)
    }

    fn range(&self, key: &Key, min: u32, max: u32) -> Result<Vec<Entry>> {
        let partitions = self.partitions.read();
        let Some(partition) = partitions.get(key.as_str()) else {
            return Ok(Vec::new());
        };
        Ok(partition
            .rows
            .range(min..=max)
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }
}
