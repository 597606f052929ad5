//! Tail-bucket and stats LRU caches (spec §6, "Cache contract")
//!
//! Two namespaces, `last_item` and `data_stats`, each a bounded LRU
//! keyed by metric key. Reads touch recency; writes evict the
//! least-recently-accessed entry once a namespace is at capacity.

use bucketdb_core::DataStats;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// A cache namespace, for `expire`/`clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    /// Serialised tail bucket, keyed by metric key.
    LastItem,
    /// Serialised stats record, keyed by metric key.
    DataStats,
}

/// The engine's tail-bucket and stats caches.
///
/// `data_stats` holds [`DataStats::to_text`]'s encoding rather than the
/// struct itself, matching the teacher's convention of caching small
/// structured records as text and round-tripping through the codec on
/// every access.
pub struct Cache {
    enabled: bool,
    last_item: Mutex<LruCache<String, Vec<u8>>>,
    data_stats: Mutex<LruCache<String, String>>,
}

impl Cache {
    /// Build a cache with the given per-namespace capacity. If
    /// `enabled` is false every read misses and every write is a no-op,
    /// so callers can unconditionally go through the cache without
    /// branching on settings.
    pub fn new(capacity: usize, enabled: bool) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Cache {
            enabled,
            last_item: Mutex::new(LruCache::new(capacity)),
            data_stats: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fetch the cached tail-bucket bytes for `key`, touching recency.
    pub fn get_last_item(&self, key: &str) -> Option<Vec<u8>> {
        if !self.enabled {
            return None;
        }
        self.last_item.lock().get(key).cloned()
    }

    /// Cache the tail-bucket bytes for `key`, evicting LRU entries if needed.
    pub fn put_last_item(&self, key: &str, bytes: Vec<u8>) {
        if !self.enabled {
            return;
        }
        self.last_item.lock().put(key.to_string(), bytes);
    }

    /// Fetch the cached stats record for `key`, touching recency and
    /// decoding the stored text form.
    pub fn get_stats(&self, key: &str) -> Option<DataStats> {
        if !self.enabled {
            return None;
        }
        let text = self.data_stats.lock().get(key).cloned()?;
        DataStats::from_text(&text)
    }

    /// Cache the stats record for `key` as its text encoding, evicting
    /// LRU entries if needed.
    pub fn put_stats(&self, key: &str, stats: DataStats) {
        if !self.enabled {
            return;
        }
        self.data_stats.lock().put(key.to_string(), stats.to_text());
    }

    /// Remove a single entry from the given namespace.
    pub fn expire(&self, namespace: CacheNamespace, key: &str) {
        match namespace {
            CacheNamespace::LastItem => {
                self.last_item.lock().pop(key);
            }
            CacheNamespace::DataStats => {
                self.data_stats.lock().pop(key);
            }
        }
    }

    /// Remove every entry in the given namespace.
    pub fn clear(&self, namespace: CacheNamespace) {
        match namespace {
            CacheNamespace::LastItem => self.last_item.lock().clear(),
            CacheNamespace::DataStats => self.data_stats.lock().clear(),
        }
    }
}
