//! Item (bucket): binary format, invariants, and the split/merge machinery (C2)
//!
//! An `Item` is an ordered, sorted, same-key cluster of points with an
//! 8-byte header, owning two [`ColumnVec`]s (timestamps and values). It
//! serialises to/from the byte string stored by the backing store.

use crate::calendar;
use crate::column::{ColumnValue, ColumnVec, ScalarKind};
use crate::error::CoreError;
use crate::key::Key;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// Fixed size of the bucket header: two `u16` type tags plus a `u32` count.
pub const HEADER_SIZE: usize = 8;

/// Payload shape of a bucket's value column.
///
/// Wire discriminants are fixed to match the original `pytsdb` numbering
/// (`raw_float=1, raw_int=2, tuple_float_2=3, tuple_float_3=4,
/// tuple_float_4=5, basic_aggregation=6`) so the binary layout scenarios
/// of spec §8 decode exactly as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    /// Scalar `f32` payload.
    RawF32,
    /// Scalar `u32` payload.
    RawU32,
    /// 2-tuple of `f32`.
    TupleF32_2,
    /// 3-tuple of `f32`.
    TupleF32_3,
    /// 4-tuple of `f32`.
    TupleF32_4,
    /// 4-tuple of `f32` carrying `(min, max, sum, count)`.
    Aggregation,
}

impl ItemType {
    /// Construct a tuple item type for `k ∈ {2,3,4}`.
    pub fn tuple(k: usize) -> Result<ItemType, CoreError> {
        match k {
            2 => Ok(ItemType::TupleF32_2),
            3 => Ok(ItemType::TupleF32_3),
            4 => Ok(ItemType::TupleF32_4),
            _ => Err(CoreError::InvalidBatch(format!(
                "tuple item type arity must be 2..=4, got {k}"
            ))),
        }
    }

    /// Column arity (`k` for tuples, `1` for scalars).
    pub fn arity(self) -> usize {
        match self {
            ItemType::RawF32 | ItemType::RawU32 => 1,
            ItemType::TupleF32_2 => 2,
            ItemType::TupleF32_3 => 3,
            ItemType::TupleF32_4 => 4,
            ItemType::Aggregation => 4,
        }
    }

    /// Per-point payload width in bytes (`4 * arity`).
    pub fn width_bytes(self) -> usize {
        4 * self.arity()
    }

    fn scalar_kind(self) -> ScalarKind {
        match self {
            ItemType::RawU32 => ScalarKind::U32,
            _ => ScalarKind::F32,
        }
    }

    fn wire_tag(self) -> u16 {
        match self {
            ItemType::RawF32 => 1,
            ItemType::RawU32 => 2,
            ItemType::TupleF32_2 => 3,
            ItemType::TupleF32_3 => 4,
            ItemType::TupleF32_4 => 5,
            ItemType::Aggregation => 6,
        }
    }

    fn from_wire_tag(tag: u16) -> Result<ItemType, CoreError> {
        match tag {
            1 => Ok(ItemType::RawF32),
            2 => Ok(ItemType::RawU32),
            3 => Ok(ItemType::TupleF32_2),
            4 => Ok(ItemType::TupleF32_3),
            5 => Ok(ItemType::TupleF32_4),
            6 => Ok(ItemType::Aggregation),
            other => Err(CoreError::CorruptedPayload(format!(
                "unknown item_type tag {other}"
            ))),
        }
    }
}

/// The calendar window a calendar-sized bucket is split on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarKind {
    /// One-hour windows.
    Hourly,
    /// One-day windows.
    Daily,
    /// ISO-8601 week (Monday start) windows.
    Weekly,
    /// Calendar-month windows.
    Monthly,
}

impl CalendarKind {
    fn window(self, t: u32) -> (u32, u32) {
        match self {
            CalendarKind::Hourly => (calendar::hour_left(t), calendar::hour_right(t)),
            CalendarKind::Daily => (calendar::day_left(t), calendar::day_right(t)),
            CalendarKind::Weekly => (calendar::week_left(t), calendar::week_right(t)),
            CalendarKind::Monthly => (calendar::month_left(t), calendar::month_right(t)),
        }
    }
}

/// Bucket-sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketType {
    /// Split thresholds are a target/max point count.
    Dynamic,
    /// Split thresholds are derived from a calendar window of the range_key.
    Calendar(CalendarKind),
    /// Reserved value flagging a read-only [`crate::resultset::ResultSet`] instance.
    ResultSet,
}

impl BucketType {
    fn wire_tag(self) -> u16 {
        match self {
            BucketType::Dynamic => 1,
            BucketType::Calendar(CalendarKind::Hourly) => 2,
            BucketType::Calendar(CalendarKind::Daily) => 3,
            BucketType::Calendar(CalendarKind::Weekly) => 4,
            BucketType::Calendar(CalendarKind::Monthly) => 5,
            BucketType::ResultSet => 6,
        }
    }

    fn from_wire_tag(tag: u16) -> Result<BucketType, CoreError> {
        match tag {
            1 => Ok(BucketType::Dynamic),
            2 => Ok(BucketType::Calendar(CalendarKind::Hourly)),
            3 => Ok(BucketType::Calendar(CalendarKind::Daily)),
            4 => Ok(BucketType::Calendar(CalendarKind::Weekly)),
            5 => Ok(BucketType::Calendar(CalendarKind::Monthly)),
            6 => Ok(BucketType::ResultSet),
            other => Err(CoreError::CorruptedPayload(format!(
                "unknown bucket_type tag {other}"
            ))),
        }
    }
}

/// A decoded `(min, max, sum, count)` aggregation record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregation {
    /// Minimum value in the aggregation window.
    pub min: f32,
    /// Maximum value in the aggregation window.
    pub max: f32,
    /// Sum of values in the aggregation window.
    pub sum: f32,
    /// Number of values folded into the aggregation.
    pub count: f32,
}

/// The value of one point, shaped to match its bucket's [`ItemType`].
#[derive(Debug, Clone, PartialEq)]
pub enum PointValue {
    /// Matches [`ItemType::RawU32`].
    U32(u32),
    /// Matches [`ItemType::RawF32`].
    F32(f32),
    /// Matches [`ItemType::TupleF32_2`], [`ItemType::TupleF32_3`], or [`ItemType::TupleF32_4`].
    Tuple(Vec<f32>),
    /// Matches [`ItemType::Aggregation`].
    Aggregation(Aggregation),
}

impl PointValue {
    fn into_column_value(self, item_type: ItemType) -> Result<ColumnValue, CoreError> {
        match (item_type, self) {
            (ItemType::RawU32, PointValue::U32(v)) => Ok(ColumnValue::U32(v)),
            (ItemType::RawF32, PointValue::F32(v)) => Ok(ColumnValue::F32(v)),
            (ItemType::TupleF32_2, PointValue::Tuple(v)) if v.len() == 2 => {
                Ok(ColumnValue::Tuple(v))
            }
            (ItemType::TupleF32_3, PointValue::Tuple(v)) if v.len() == 3 => {
                Ok(ColumnValue::Tuple(v))
            }
            (ItemType::TupleF32_4, PointValue::Tuple(v)) if v.len() == 4 => {
                Ok(ColumnValue::Tuple(v))
            }
            (ItemType::Aggregation, PointValue::Aggregation(a)) => {
                Ok(ColumnValue::Tuple(vec![a.min, a.max, a.sum, a.count]))
            }
            (expected, actual) => Err(CoreError::InvalidBatch(format!(
                "point value shape does not match item_type {expected:?}: {actual:?}"
            ))),
        }
    }

    pub(crate) fn from_column_value(item_type: ItemType, value: ColumnValue) -> PointValue {
        match (item_type, value) {
            (ItemType::RawU32, ColumnValue::U32(v)) => PointValue::U32(v),
            (ItemType::RawF32, ColumnValue::F32(v)) => PointValue::F32(v),
            (ItemType::Aggregation, ColumnValue::Tuple(v)) => {
                PointValue::Aggregation(Aggregation {
                    min: v[0],
                    max: v[1],
                    sum: v[2],
                    count: v[3],
                })
            }
            (_, ColumnValue::Tuple(v)) => PointValue::Tuple(v),
            (_, ColumnValue::U32(v)) => PointValue::U32(v),
            (_, ColumnValue::F32(v)) => PointValue::F32(v),
        }
    }
}

/// Which split threshold to evaluate: soft (`target`) or hard (`max`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitLimit {
    /// `target`: the bucket should be split if convenient.
    Soft,
    /// `max`: the bucket must be split.
    Hard,
}

/// An ordered, sorted, same-key cluster of points (a bucket).
#[derive(Debug, Clone)]
pub struct Item {
    key: Key,
    item_type: ItemType,
    bucket_type: BucketType,
    ts: ColumnVec,
    values: ColumnVec,
    existing: bool,
    dirty: bool,
}

impl Item {
    /// Build a brand-new, empty bucket. `existing = false, dirty = false`.
    pub fn new(key: Key, item_type: ItemType, bucket_type: BucketType) -> Self {
        let values = match item_type.arity() {
            1 => ColumnVec::new_scalar(item_type.scalar_kind()),
            k => ColumnVec::new_tuple(k).expect("arity validated by ItemType::tuple"),
        };
        Item {
            key,
            item_type,
            bucket_type,
            ts: ColumnVec::new_scalar(ScalarKind::U32),
            values,
            existing: false,
            dirty: false,
        }
    }

    /// The bucket's metric key.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The bucket's payload shape.
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// The bucket's sizing policy.
    pub fn bucket_type(&self) -> BucketType {
        self.bucket_type
    }

    /// `true` if this item was loaded from storage (drives insert vs.
    /// update at commit time).
    pub fn existing(&self) -> bool {
        self.existing
    }

    /// `true` if this item has been mutated since it was loaded/created
    /// (drives whether a commit is needed).
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Number of points in the bucket.
    pub fn len(&self) -> usize {
        self.ts.len()
    }

    /// `true` iff the bucket holds no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The timestamp of the first point in the bucket; immutable once the
    /// bucket is first populated and used as the storage sort/partition key.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyBucket`] if the bucket holds no points.
    pub fn range_key(&self) -> Result<u32, CoreError> {
        if self.is_empty() {
            return Err(CoreError::EmptyBucket("range_key"));
        }
        Ok(self.ts.get_u32(0))
    }

    /// First timestamp, or `-1` if the bucket is empty.
    pub fn ts_min(&self) -> i64 {
        if self.is_empty() {
            -1
        } else {
            self.ts.get_u32(0) as i64
        }
    }

    /// Last timestamp, or `-1` if the bucket is empty.
    pub fn ts_max(&self) -> i64 {
        if self.is_empty() {
            -1
        } else {
            self.ts.get_u32(self.len() - 1) as i64
        }
    }

    /// Read the `(timestamp, value)` pair at index `i`.
    pub fn at(&self, i: usize) -> (u32, PointValue) {
        (
            self.ts.get_u32(i),
            PointValue::from_column_value(self.item_type, self.values.get(i)),
        )
    }

    /// Materialise every point in the bucket, in order.
    pub fn to_vec(&self) -> Vec<(u32, PointValue)> {
        (0..self.len()).map(|i| self.at(i)).collect()
    }

    fn lower_bound(&self, ts: u32) -> usize {
        let mut lo = 0usize;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.ts.get_u32(mid) < ts {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Insert one point. Locates the insertion point by lower-bound on the
    /// timestamp column:
    /// - if past the end, appends;
    /// - if a duplicate timestamp exists, overwrites it when `overwrite` is
    ///   set, else is silently skipped (first-write-wins);
    /// - otherwise inserts in place, preserving sortedness.
    ///
    /// Returns `1` if a point was written, `0` if a duplicate was skipped.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidBatch`] if `value`'s shape does not
    /// match the bucket's `item_type`.
    pub fn insert_point(
        &mut self,
        ts: u32,
        value: PointValue,
        overwrite: bool,
    ) -> Result<u8, CoreError> {
        let column_value = value.into_column_value(self.item_type)?;
        let idx = self.lower_bound(ts);
        if idx == self.len() {
            self.ts.append_u32(ts);
            self.values
                .append(column_value)
                .expect("arity already validated");
            self.dirty = true;
            return Ok(1);
        }
        if self.ts.get_u32(idx) == ts {
            tracing::debug!(key = %self.key, ts, "duplicate insert");
            if overwrite {
                self.values
                    .set(idx, column_value)
                    .expect("arity already validated");
                self.dirty = true;
                return Ok(1);
            }
            return Ok(0);
        }
        self.ts.insert_u32(idx, ts);
        self.values
            .insert(idx, column_value)
            .expect("arity already validated");
        self.dirty = true;
        Ok(1)
    }

    /// Insert a batch of points. The order of `points` does not affect the
    /// outcome: sorted order is maintained by construction.
    ///
    /// Returns the number of points actually written (duplicates excluded).
    pub fn insert(&mut self, points: Vec<(u32, PointValue)>) -> Result<usize, CoreError> {
        let mut written = 0usize;
        for (ts, value) in points {
            written += self.insert_point(ts, value, false)? as usize;
        }
        Ok(written)
    }

    /// Whether this bucket needs to be split, evaluated at the given
    /// [`SplitLimit`].
    ///
    /// For `Dynamic` buckets this compares point count against
    /// `dynamic_target`/`dynamic_max`. For calendar buckets, hard and soft
    /// are equivalent: the bucket must split iff its last timestamp has
    /// crossed the right edge of the calendar window anchored at its
    /// `range_key`.
    pub fn split_needed(&self, limit: SplitLimit, dynamic_target: usize, dynamic_max: usize) -> bool {
        match self.bucket_type {
            BucketType::Dynamic => match limit {
                SplitLimit::Hard => self.len() > dynamic_max,
                SplitLimit::Soft => self.len() > dynamic_target,
            },
            BucketType::Calendar(kind) => {
                if self.is_empty() {
                    return false;
                }
                let range_key = self.ts.get_u32(0);
                let (_, right) = kind.window(range_key);
                self.ts.get_u32(self.len() - 1) > right
            }
            BucketType::ResultSet => false,
        }
    }

    /// Split this bucket into fragments.
    ///
    /// For `Dynamic` buckets, fragments are consecutive chunks of exactly
    /// `dynamic_target` points except the tail, which may be shorter. For
    /// calendar buckets, fragments are chunked at calendar window edges.
    ///
    /// The first fragment is `self`, truncated in place (retaining its
    /// `existing` flag, marked `dirty`). Every subsequent fragment is a
    /// fresh `Item` with `dirty = true, existing = false`, inheriting
    /// `key`, `item_type`, and `bucket_type`. Each fragment's `range_key`
    /// equals the first timestamp it holds.
    pub fn split_item(mut self, dynamic_target: usize) -> Vec<Item> {
        let boundaries = match self.bucket_type {
            BucketType::Dynamic => {
                let mut b = Vec::new();
                let mut i = dynamic_target;
                while i < self.len() {
                    b.push(i);
                    i += dynamic_target;
                }
                b
            }
            BucketType::Calendar(kind) => {
                let mut b = Vec::new();
                let mut i = 0usize;
                while i < self.len() {
                    let window_start_ts = self.ts.get_u32(i);
                    let (_, right) = kind.window(window_start_ts);
                    let mut j = i;
                    while j < self.len() && self.ts.get_u32(j) <= right {
                        j += 1;
                    }
                    if j < self.len() {
                        b.push(j);
                    }
                    i = j;
                }
                b
            }
            BucketType::ResultSet => Vec::new(),
        };

        if boundaries.is_empty() {
            self.dirty = true;
            return vec![self];
        }

        let mut splits = boundaries;
        splits.push(self.len());

        let mut fragments = Vec::with_capacity(splits.len());
        let mut prev = 0usize;
        for &boundary in &splits {
            let ts_chunk = self.ts.slice(prev, boundary);
            let values_chunk = self.values.slice(prev, boundary);
            fragments.push((ts_chunk, values_chunk));
            prev = boundary;
        }

        let mut first = fragments.remove(0);
        std::mem::swap(&mut self.ts, &mut first.0);
        std::mem::swap(&mut self.values, &mut first.1);
        self.dirty = true;

        let mut out = vec![self];
        for (ts_chunk, values_chunk) in fragments {
            out.push(Item {
                key: out[0].key.clone(),
                item_type: out[0].item_type,
                bucket_type: out[0].bucket_type,
                ts: ts_chunk,
                values: values_chunk,
                existing: false,
                dirty: true,
            });
        }
        out
    }

    /// Serialise to the on-disk byte representation (header + ts column +
    /// values column). `existing`/`dirty` are not part of the byte format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_SIZE];
        LittleEndian::write_u16(&mut out[0..2], self.item_type.wire_tag());
        LittleEndian::write_u16(&mut out[2..4], self.bucket_type.wire_tag());
        LittleEndian::write_u32(&mut out[4..8], self.len() as u32);
        out.extend_from_slice(&self.ts.to_bytes());
        out.extend_from_slice(&self.values.to_bytes());
        out
    }

    /// Reconstruct an item from a byte string previously produced by
    /// [`Item::to_bytes`]. `existing = false, dirty = false`.
    ///
    /// # Errors
    /// Returns [`CoreError::CorruptedPayload`] if the header decodes to an
    /// unknown `item_type`/`bucket_type`, the declared length disagrees
    /// with the byte count, or the reconstructed timestamp column is not
    /// non-decreasing.
    pub fn from_bytes(key: Key, bytes: &[u8]) -> Result<Item, CoreError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CoreError::CorruptedPayload(format!(
                "payload shorter than header: {} bytes",
                bytes.len()
            )));
        }
        let item_type = ItemType::from_wire_tag(LittleEndian::read_u16(&bytes[0..2]))?;
        let bucket_type = BucketType::from_wire_tag(LittleEndian::read_u16(&bytes[2..4]))?;
        let count = LittleEndian::read_u32(&bytes[4..8]) as usize;

        let ts_bytes_len = count * 4;
        let values_bytes_len = count * item_type.width_bytes();
        let expected_total = HEADER_SIZE + ts_bytes_len + values_bytes_len;
        if bytes.len() != expected_total {
            return Err(CoreError::CorruptedPayload(format!(
                "declared length {expected_total} disagrees with byte count {}",
                bytes.len()
            )));
        }

        let ts_bytes = &bytes[HEADER_SIZE..HEADER_SIZE + ts_bytes_len];
        let values_bytes = &bytes[HEADER_SIZE + ts_bytes_len..expected_total];

        let ts = ColumnVec::from_bytes(ScalarKind::U32, 1, ts_bytes, count)?;
        let values =
            ColumnVec::from_bytes(item_type.scalar_kind(), item_type.arity(), values_bytes, count)?;

        for i in 1..count {
            if ts.get_u32(i) < ts.get_u32(i - 1) {
                return Err(CoreError::CorruptedPayload(
                    "timestamp column is not non-decreasing".to_string(),
                ));
            }
        }

        Ok(Item {
            key,
            item_type,
            bucket_type,
            ts,
            values,
            existing: false,
            dirty: false,
        })
    }

    /// Like [`Item::from_bytes`], but additionally marks the item as
    /// `existing = true` — the factory used when decoding a payload read
    /// back from the backing store.
    pub fn from_db_data(key: Key, bytes: &[u8]) -> Result<Item, CoreError> {
        let mut item = Item::from_bytes(key, bytes)?;
        item.existing = true;
        Ok(item)
    }

    /// Mark dirty. Used by callers (e.g. the engine's merge path) that
    /// mutate an item through [`Item::insert_point`] but need to force the
    /// dirty flag even on a fully-duplicate merge (normally unnecessary,
    /// since `insert_point` already sets it on any real write).
    #[cfg(test)]
    pub(crate) fn mark_dirty_for_test(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn columns(&self) -> (&ColumnVec, &ColumnVec) {
        (&self.ts, &self.values)
    }

    pub(crate) fn from_columns(
        key: Key,
        item_type: ItemType,
        bucket_type: BucketType,
        ts: ColumnVec,
        values: ColumnVec,
    ) -> Item {
        Item {
            key,
            item_type,
            bucket_type,
            ts,
            values,
            existing: false,
            dirty: false,
        }
    }
}

/// Two items are equal iff same key, same `item_type`, same `bucket_type`,
/// same length, and — when non-empty — identical first and last
/// timestamps. This is a deliberately weak structural identity used by
/// the engine's "is this still the tail bucket?" check; it is **not**
/// deep equality.
impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        if self.key != other.key
            || self.item_type != other.item_type
            || self.bucket_type != other.bucket_type
            || self.len() != other.len()
        {
            return false;
        }
        if !self.is_empty() {
            if self.ts.get_u32(0) != other.ts.get_u32(0) {
                return false;
            }
            if self.ts.get_u32(self.len() - 1) != other.ts.get_u32(other.len() - 1) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min_ts = self.ts_min();
        write!(
            f,
            "<{} series({}), min_ts: {}, items: {:?}, buckets: {:?}>",
            self.key,
            self.len(),
            min_ts,
            self.item_type,
            self.bucket_type
        )
    }
}
