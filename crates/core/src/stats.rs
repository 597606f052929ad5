//! Per-insert-call statistics record (spec §6, "Stats record format")
//!
//! Returned by every `insert` call, cached under the `data_stats`
//! namespace, and published as the payload of every data event.
//! Serialises with `serde` for any backend that stores it as JSON, and
//! with a compact text encoding for the in-memory LRU cache round-trip.

use serde::{Deserialize, Serialize};

/// The stats record produced by one `insert` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataStats {
    /// The metric key this record describes.
    pub key: String,
    /// Smallest timestamp in the inserted batch.
    pub ts_min: i64,
    /// Largest timestamp in the inserted batch.
    pub ts_max: i64,
    /// Number of points in the inserted batch.
    pub count: u64,
    /// Points written to the tail bucket via the append path.
    pub appended: u64,
    /// Points written to a non-tail bucket via the merge path.
    pub inserted: u64,
    /// Fragments committed (`insert` or `update`) this call.
    pub updated: u64,
    /// Points removed. Point deletion is out of scope; always `0`.
    pub deleted: u64,
    /// Number of bucket splits performed this call.
    pub splits: u64,
    /// Number of existing buckets scanned on the merge path this call.
    pub merged: u64,
}

impl DataStats {
    /// A zeroed stats record for `key` describing an empty batch (no
    /// commit occurred: a pure-duplicate insert, or an insert on an
    /// empty key with nothing yet written).
    pub fn empty(key: impl Into<String>) -> Self {
        DataStats {
            key: key.into(),
            ts_min: -1,
            ts_max: -1,
            count: 0,
            appended: 0,
            inserted: 0,
            updated: 0,
            deleted: 0,
            splits: 0,
            merged: 0,
        }
    }

    /// A derived stats record for `key` (spec §4.5): `ts_min`/`ts_max`/
    /// `count` read back from storage rather than produced by an
    /// `insert` call, so the per-call fields are zeroed.
    pub fn derived(key: impl Into<String>, ts_min: i64, ts_max: i64, count: u64) -> Self {
        DataStats {
            key: key.into(),
            ts_min,
            ts_max,
            count,
            appended: 0,
            inserted: 0,
            updated: 0,
            deleted: 0,
            splits: 0,
            merged: 0,
        }
    }

    /// Encode as a single-line, colon-delimited text record, matching the
    /// teacher's convention of caching small structured records as text
    /// rather than full JSON.
    pub fn to_text(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.key,
            self.ts_min,
            self.ts_max,
            self.count,
            self.appended,
            self.inserted,
            self.updated,
            self.deleted,
            self.splits,
            self.merged
        )
    }

    /// Decode a record produced by [`DataStats::to_text`].
    pub fn from_text(s: &str) -> Option<Self> {
        let mut parts = s.split(':');
        Some(DataStats {
            key: parts.next()?.to_string(),
            ts_min: parts.next()?.parse().ok()?,
            ts_max: parts.next()?.parse().ok()?,
            count: parts.next()?.parse().ok()?,
            appended: parts.next()?.parse().ok()?,
            inserted: parts.next()?.parse().ok()?,
            updated: parts.next()?.parse().ok()?,
            deleted: parts.next()?.parse().ok()?,
            splits: parts.next()?.parse().ok()?,
            merged: parts.next()?.parse().ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataStats {
        DataStats {
            key: "cpu.load".to_string(),
            ts_min: 0,
            ts_max: 100,
            count: 12,
            appended: 10,
            inserted: 2,
            updated: 1,
            deleted: 0,
            splits: 1,
            merged: 0,
        }
    }

    #[test]
    fn text_round_trip() {
        let stats = sample();
        let text = stats.to_text();
        assert_eq!(DataStats::from_text(&text), Some(stats));
    }

    #[test]
    fn empty_uses_sentinel_timestamps() {
        let stats = DataStats::empty("cpu.load");
        assert_eq!(stats.ts_min, -1);
        assert_eq!(stats.ts_max, -1);
        assert_eq!(stats.key, "cpu.load");
    }

    #[test]
    fn from_text_rejects_malformed_input() {
        assert_eq!(DataStats::from_text(""), None);
    }
}
