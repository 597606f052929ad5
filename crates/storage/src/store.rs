//! The backing store abstract contract (C5)
//!
//! An ordered associative container parameterised by `key: Key` and
//! `range_key: u32`, storing opaque payload bytes. Every backend
//! implements the primitive capability set `{insert, update, get, first,
//! last, left, range}`; `query`'s left-prepend behaviour and `stats`'s
//! derivation are shared across backends as default methods so no
//! backend re-implements either.

use crate::error::{Result, StoreError};
use bucketdb_core::{DataStats, Item, Key};

/// One `(range_key, payload)` pair read back from a store.
pub type Entry = (u32, Vec<u8>);

/// The abstract backing store contract every backend implements.
///
/// No backend-specific type leaks through this trait: the engine holds
/// a [`Backend`] and never a concrete backend type.
pub trait Store: Send + Sync {
    /// Insert a new entry. Fails [`StoreError::Conflict`] if `(key,
    /// range_key)` already exists.
    fn insert(&self, key: &Key, range_key: u32, data: Vec<u8>) -> Result<()>;

    /// Replace an existing entry. Fails [`StoreError::NotFound`] if
    /// absent.
    fn update(&self, key: &Key, range_key: u32, data: Vec<u8>) -> Result<()>;

    /// Exact-match lookup. Fails [`StoreError::NotFound`] if absent.
    fn get(&self, key: &Key, range_key: u32) -> Result<Vec<u8>>;

    /// The entry with the smallest `range_key` for `key`. Fails
    /// [`StoreError::NotFound`] if the key has no entries.
    fn first(&self, key: &Key) -> Result<Entry>;

    /// The entry with the largest `range_key` for `key`. Fails
    /// [`StoreError::NotFound`] if the key has no entries.
    fn last(&self, key: &Key) -> Result<Entry>;

    /// The entry with the greatest `range_key' <= range_key`. Fails
    /// [`StoreError::NotFound`] if none qualifies.
    fn left(&self, key: &Key, range_key: u32) -> Result<Entry>;

    /// Entries with `range_key` in `[min, max]`, ascending, **without**
    /// the `left(key, min)` prepend — see [`Store::query`].
    fn range(&self, key: &Key, min: u32, max: u32) -> Result<Vec<Entry>>;

    /// All entries with `range_key ∈ [min, max]` in ascending order,
    /// plus the `left(key, min)` entry prepended iff it is not already
    /// the first element. This lets callers see the bucket that may
    /// hold points `>= min` even when its own `range_key < min`.
    fn query(&self, key: &Key, min: u32, max: u32) -> Result<Vec<Entry>> {
        let mut entries = self.range(key, min, max)?;
        match self.left(key, min) {
            Ok(left_entry) => {
                let already_first = entries.first().map(|(rk, _)| *rk) == Some(left_entry.0);
                if !already_first {
                    entries.insert(0, left_entry);
                }
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e),
        }
        Ok(entries)
    }

    /// `stats(key) -> {ts_min, ts_max, count}` (spec §4.5): derived, not
    /// stored. `ts_min` comes from decoding `first`, `ts_max` from
    /// decoding `last`, and `count` by summing decoded point counts
    /// across `query(key, -∞, +∞)`. Fails [`StoreError::NotFound`] if
    /// `key` has no entries.
    fn stats(&self, key: &Key) -> Result<DataStats> {
        let (_, first_bytes) = self.first(key)?;
        let (_, last_bytes) = self.last(key)?;
        let first_item = Item::from_db_data(key.clone(), &first_bytes)?;
        let last_item = Item::from_db_data(key.clone(), &last_bytes)?;

        let mut count = 0u64;
        for (_, bytes) in self.query(key, 0, u32::MAX)? {
            count += Item::from_db_data(key.clone(), &bytes)?.len() as u64;
        }

        Ok(DataStats::derived(key.to_string(), first_item.ts_min(), last_item.ts_max(), count))
    }
}
