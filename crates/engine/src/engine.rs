//! The insert (C6) and read (C7) pipelines.

use crate::cache::{Cache, CacheNamespace};
use crate::error::{EngineError, Result};
use crate::events::EventBus;
use crate::settings::Settings;
use bucketdb_core::{BucketType, CoreError, DataStats, Item, ItemType, Key, PointValue, ResultSet, SplitLimit};
use bucketdb_storage::{Backend, Store, StoreError};

/// The bucketed series engine: one backing store, its caches, its event
/// bus, and the default bucket policy for keys seen for the first time.
pub struct Engine {
    store: Backend,
    settings: Settings,
    cache: Cache,
    events: EventBus,
}

impl Engine {
    /// Build an engine over `store` governed by `settings`.
    pub fn new(store: Backend, settings: Settings) -> Self {
        let cache = Cache::new(settings.cache_capacity, settings.enable_caching);
        let events = EventBus::new(settings.enable_events);
        Engine {
            store,
            settings,
            cache,
            events,
        }
    }

    /// Subscribe a callback to data events on channels matching `pattern`.
    pub fn register_data_listener(&self, pattern: &str, callback: impl Fn(&DataStats) + Send + 'static) {
        self.events.subscribe(pattern, move |event| callback(&event.stats));
    }

    /// The most recent subscriber failure caught by the event bus, if any.
    pub fn last_error(&self) -> Option<String> {
        self.events.last_error()
    }

    /// The backing store, for callers that need to inspect committed
    /// bucket layout directly (diagnostics, tests).
    pub fn store(&self) -> &Backend {
        &self.store
    }

    fn default_item_type_for(first_value: &PointValue) -> ItemType {
        match first_value {
            PointValue::U32(_) => ItemType::RawU32,
            PointValue::F32(_) => ItemType::RawF32,
            PointValue::Tuple(v) => ItemType::tuple(v.len()).unwrap_or(ItemType::TupleF32_2),
            PointValue::Aggregation(_) => ItemType::Aggregation,
        }
    }

    fn default_bucket_type(&self) -> BucketType {
        self.settings.bucket_type.to_bucket_type()
    }

    fn decode(&self, key: &Key, bytes: &[u8]) -> Result<Item> {
        Item::from_db_data(key.clone(), bytes).map_err(EngineError::from)
    }

    /// Read the tail bucket for `key`, consulting the cache first.
    /// Synthesises a fresh empty item (`existing = false`) if the key has
    /// never been written.
    fn locate_tail(&self, key: &Key, first_value: &PointValue) -> Result<Item> {
        match self.store.last(key) {
            Ok((_range_key, bytes)) => {
                if let Some(cached) = self.cache.get_last_item(key.as_str()) {
                    if cached == bytes {
                        return self.decode(key, &cached);
                    }
                }
                self.decode(key, &bytes)
            }
            Err(StoreError::NotFound) => Ok(Item::new(
                key.clone(),
                Self::default_item_type_for(first_value),
                self.default_bucket_type(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// `insert(key, points) -> stats` (spec §4.6).
    ///
    /// # Errors
    /// Returns [`EngineError::Core`] for an invalid key or an empty/
    /// shape-mismatched batch, or [`EngineError::Store`] for a backend
    /// failure.
    pub fn insert(&self, key: &str, points: Vec<(u32, PointValue)>) -> Result<DataStats> {
        let key = Key::new(key).map_err(EngineError::from)?;
        if points.is_empty() {
            return Err(EngineError::from(CoreError::InvalidBatch(
                "insert batch must not be empty".to_string(),
            )));
        }

        let mut points = points;
        points.sort_by_key(|(ts, _)| *ts);
        let batch_ts_min = points.first().unwrap().0 as i64;
        let batch_ts_max = points.last().unwrap().0 as i64;
        let batch_count = points.len() as u64;

        let tail = self.locate_tail(&key, &points[0].1)?;
        let tail_range_key_before = tail.range_key().ok();
        let tail_was_append_target = (points[0].0 as i64) >= tail.ts_max();

        let mut appended = 0u64;
        let mut inserted = 0u64;
        let mut merged = 0u64;
        let mut updated_items: Vec<(Item, bool)>;

        if tail_was_append_target {
            let mut tail = tail;
            let written = tail.insert(points)?;
            appended += written as u64;
            updated_items = vec![(tail, true)];
        } else {
            let entries = self
                .store
                .query(&key, batch_ts_min as u32, batch_ts_max as u32)
                .map_err(EngineError::from)?;
            let mut merge_items: Vec<Item> = entries
                .into_iter()
                .map(|(_, bytes)| self.decode(&key, &bytes))
                .collect::<Result<Vec<_>>>()?;
            if merge_items.is_empty() {
                merge_items.push(tail);
            }
            merged = merge_items.len() as u64;

            let mut item_idx = merge_items.len() - 1;
            for (ts, value) in points.into_iter().rev() {
                while item_idx > 0 && (ts as i64) < merge_items[item_idx].ts_min() {
                    item_idx -= 1;
                }
                let written = merge_items[item_idx].insert_point(ts, value, false)?;
                inserted += written as u64;
            }

            let tail_rk = tail_range_key_before;
            updated_items = merge_items
                .into_iter()
                .map(|item| {
                    let is_tail = item.range_key().ok() == tail_rk;
                    (item, is_tail)
                })
                .collect();
        }

        if appended + inserted == 0 {
            return Ok(DataStats {
                key: key.to_string(),
                ts_min: batch_ts_min,
                ts_max: batch_ts_max,
                count: batch_count,
                appended: 0,
                inserted: 0,
                updated: 0,
                deleted: 0,
                splits: 0,
                merged,
            });
        }

        let mut splits = 0u64;
        let mut fragments: Vec<Item> = Vec::new();
        for (item, is_tail) in updated_items.drain(..) {
            let soft = item.split_needed(SplitLimit::Soft, self.settings.dynamic_target, self.settings.dynamic_max);
            if !soft {
                fragments.push(item);
                continue;
            }
            let hard = item.split_needed(SplitLimit::Hard, self.settings.dynamic_target, self.settings.dynamic_max);
            if !is_tail && !hard {
                fragments.push(item);
                continue;
            }
            let split_fragments = item.split_item(self.settings.dynamic_target);
            splits += 1;
            fragments.extend(split_fragments);
        }

        let mut committed = 0u64;
        for fragment in &fragments {
            let bytes = fragment.to_bytes();
            let range_key = fragment.range_key().map_err(EngineError::from)?;
            if fragment.existing() {
                self.store.update(&key, range_key, bytes).map_err(EngineError::from)?;
            } else {
                self.store.insert(&key, range_key, bytes).map_err(EngineError::from)?;
            }
            committed += 1;
        }

        let stats = DataStats {
            key: key.to_string(),
            ts_min: batch_ts_min,
            ts_max: batch_ts_max,
            count: batch_count,
            appended,
            inserted,
            updated: committed,
            deleted: 0,
            splits,
            merged,
        };

        self.cache.expire(CacheNamespace::DataStats, key.as_str());
        if let Some(last_fragment) = fragments.iter().max_by_key(|f| f.range_key().unwrap_or(0)) {
            let refresh = tail_range_key_before
                .map(|before| last_fragment.range_key().unwrap_or(0) >= before)
                .unwrap_or(true);
            if refresh {
                self.cache.put_last_item(key.as_str(), last_fragment.to_bytes());
            }
        }
        self.events.publish(key.to_string(), stats.clone());

        Ok(stats)
    }

    /// `query(key, ts_min, ts_max) -> ResultSet` (spec §4.7).
    ///
    /// An unknown key yields an empty result set, not an error.
    pub fn query(&self, key: &str, ts_min: u32, ts_max: u32) -> Result<ResultSet> {
        let key = Key::new(key).map_err(EngineError::from)?;
        let entries = match self.store.query(&key, ts_min, ts_max) {
            Ok(entries) => entries,
            Err(StoreError::NotFound) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        if entries.is_empty() {
            return Ok(ResultSet::new(key, ItemType::RawF32));
        }

        let items = entries
            .into_iter()
            .map(|(_, bytes)| self.decode(&key, &bytes))
            .collect::<Result<Vec<_>>>()?;
        let item_type = items[0].item_type();
        let mut result = ResultSet::from_items(key, item_type, &items).map_err(EngineError::from)?;
        result.trim(ts_min, ts_max);
        Ok(result)
    }

    /// `stats(key) -> {ts_min, ts_max, count}` (spec §4.5), read-through
    /// the `data_stats` cache: a hit returns directly, a miss derives via
    /// [`Store::stats`] and populates the cache before returning. `insert`
    /// expires this namespace on every commit, so a stale entry never
    /// survives past the write that invalidates it.
    pub fn stats(&self, key: &str) -> Result<DataStats> {
        let key = Key::new(key).map_err(EngineError::from)?;
        if let Some(cached) = self.cache.get_stats(key.as_str()) {
            return Ok(cached);
        }
        let stats = self.store.stats(&key).map_err(EngineError::from)?;
        self.cache.put_stats(key.as_str(), stats.clone());
        Ok(stats)
    }
}
