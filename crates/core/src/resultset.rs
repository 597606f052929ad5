//! Read-path result container and windowed aggregation (C4)
//!
//! A `ResultSet` is a distinct, read-only type produced by concatenating
//! the columns of one or more [`Item`]s that answer a query. It is
//! composition over the item's columns, not a bucket subclass: its
//! `bucket_type` is always the reserved [`BucketType::ResultSet`] tag and
//! it is never written back to a store.

use crate::calendar;
use crate::column::{ColumnValue, ColumnVec, ScalarKind};
use crate::error::CoreError;
use crate::item::{Aggregation, BucketType, Item, ItemType, PointValue};
use crate::key::Key;

/// The calendar granularity to window a [`ResultSet`] by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// One-hour windows.
    Hourly,
    /// One-day windows.
    Daily,
    /// ISO-8601 week windows.
    Weekly,
    /// Calendar-month windows.
    Monthly,
}

impl WindowKind {
    fn edges(self, t: u32) -> (u32, u32) {
        match self {
            WindowKind::Hourly => (calendar::hour_left(t), calendar::hour_right(t)),
            WindowKind::Daily => (calendar::day_left(t), calendar::day_right(t)),
            WindowKind::Weekly => (calendar::week_left(t), calendar::week_right(t)),
            WindowKind::Monthly => (calendar::month_left(t), calendar::month_right(t)),
        }
    }
}

/// A scalar reduction to compute per window in [`ResultSet::aggregation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    /// Sum of the values in the window.
    Sum,
    /// Count of the values in the window.
    Count,
    /// Minimum value in the window.
    Min,
    /// Maximum value in the window.
    Max,
    /// Arithmetic mean of the values in the window.
    Mean,
    /// Amplitude: `max - min`.
    Amp,
}

/// A read-only, query-answering concatenation of one or more items' data.
#[derive(Debug, Clone)]
pub struct ResultSet {
    key: Key,
    item_type: ItemType,
    ts: ColumnVec,
    values: ColumnVec,
}

impl ResultSet {
    /// Build an empty result set for `key`/`item_type`.
    pub fn new(key: Key, item_type: ItemType) -> Self {
        let values = match item_type.arity() {
            1 => ColumnVec::new_scalar(if matches!(item_type, ItemType::RawU32) {
                ScalarKind::U32
            } else {
                ScalarKind::F32
            }),
            k => ColumnVec::new_tuple(k).expect("arity validated by ItemType"),
        };
        ResultSet {
            key,
            item_type,
            ts: ColumnVec::new_scalar(ScalarKind::U32),
            values,
        }
    }

    /// Concatenate the columns of `items`, in the order given. Callers are
    /// responsible for passing items pre-sorted by `range_key` so the
    /// result stays timestamp-ordered.
    ///
    /// # Errors
    /// Returns [`CoreError::ArityMismatch`] if the items do not all share
    /// `item_type`.
    pub fn from_items(key: Key, item_type: ItemType, items: &[Item]) -> Result<ResultSet, CoreError> {
        let mut out = ResultSet::new(key, item_type);
        for item in items {
            if item.item_type() != item_type {
                return Err(CoreError::ArityMismatch {
                    expected: item_type.arity(),
                    actual: item.item_type().arity(),
                });
            }
            let (ts, values) = item.columns();
            out.ts.concat(ts)?;
            out.values.concat(values)?;
        }
        Ok(out)
    }

    /// The reserved bucket type tag for a result set.
    pub fn bucket_type(&self) -> BucketType {
        BucketType::ResultSet
    }

    /// The metric key this result set answers for.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The payload shape of the underlying data.
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Number of points held.
    pub fn len(&self) -> usize {
        self.ts.len()
    }

    /// `true` iff the result set holds no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First timestamp, or `-1` if empty.
    pub fn ts_min(&self) -> i64 {
        if self.is_empty() {
            -1
        } else {
            self.ts.get_u32(0) as i64
        }
    }

    /// Last timestamp, or `-1` if empty.
    pub fn ts_max(&self) -> i64 {
        if self.is_empty() {
            -1
        } else {
            self.ts.get_u32(self.len() - 1) as i64
        }
    }

    /// Read the point at index `i`.
    pub fn at(&self, i: usize) -> (u32, PointValue) {
        (
            self.ts.get_u32(i),
            PointValue::from_column_value(self.item_type, self.values.get(i)),
        )
    }

    /// Keep only points with `ts_min <= timestamp <= ts_max`, in place.
    pub fn trim(&mut self, ts_min: u32, ts_max: u32) {
        let lo = self.lower_bound(ts_min);
        let hi = self.upper_bound(ts_max);
        self.ts = self.ts.slice(lo, hi);
        self.values = self.values.slice(lo, hi);
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

    fn upper_bound(&self, ts: u32) -> usize {
        let mut lo = 0usize;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.ts.get_u32(mid) <= ts {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Materialise every point, in order.
    pub fn all(&self) -> Vec<(u32, PointValue)> {
        (0..self.len()).map(|i| self.at(i)).collect()
    }

    /// Split into `(window_start, ResultSet)` groups of calendar
    /// granularity `kind`. Every returned sub-result-set is non-empty.
    pub fn windows(&self, kind: WindowKind) -> Vec<(u32, ResultSet)> {
        let mut out = Vec::new();
        let mut i = 0usize;
        while i < self.len() {
            let (left, right) = kind.edges(self.ts.get_u32(i));
            let mut j = i;
            while j < self.len() && self.ts.get_u32(j) <= right {
                j += 1;
            }
            out.push((
                left,
                ResultSet {
                    key: self.key.clone(),
                    item_type: self.item_type,
                    ts: self.ts.slice(i, j),
                    values: self.values.slice(i, j),
                },
            ));
            i = j;
        }
        out
    }

    /// Shorthand for [`ResultSet::windows`] with [`WindowKind::Hourly`].
    pub fn hourly(&self) -> Vec<(u32, ResultSet)> {
        self.windows(WindowKind::Hourly)
    }

    /// Shorthand for [`ResultSet::windows`] with [`WindowKind::Daily`].
    pub fn daily(&self) -> Vec<(u32, ResultSet)> {
        self.windows(WindowKind::Daily)
    }

    fn scalar_values(&self) -> Result<Vec<f32>, CoreError> {
        (0..self.len())
            .map(|i| match self.values.get(i) {
                ColumnValue::F32(v) => Ok(v),
                ColumnValue::U32(v) => Ok(v as f32),
                ColumnValue::Tuple(_) => Err(CoreError::InvalidBatch(
                    "aggregation requires a scalar item_type".to_string(),
                )),
            })
            .collect()
    }

    fn reduce(values: &[f32], op: AggregateOp) -> Result<f32, CoreError> {
        if values.is_empty() {
            return Err(CoreError::EmptyWindow);
        }
        let sum: f32 = values.iter().sum();
        let min = values.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let count = values.len() as f32;
        Ok(match op {
            AggregateOp::Sum => sum,
            AggregateOp::Count => count,
            AggregateOp::Min => min,
            AggregateOp::Max => max,
            AggregateOp::Mean => sum / count,
            AggregateOp::Amp => max - min,
        })
    }

    /// Compute one scalar reduction per calendar window. Requires a
    /// scalar `item_type` (`RawF32`/`RawU32`).
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidBatch`] if `item_type` is a tuple
    /// shape.
    pub fn aggregation(&self, window: WindowKind, op: AggregateOp) -> Result<Vec<(u32, f32)>, CoreError> {
        let mut out = Vec::new();
        for (window_start, sub) in self.windows(window) {
            let values = sub.scalar_values()?;
            out.push((window_start, ResultSet::reduce(&values, op)?));
        }
        Ok(out)
    }

    /// Compute a full `(min, max, sum, count)` [`Aggregation`] per
    /// calendar window, the shape written back as `basic_aggregation`
    /// buckets.
    pub fn full_aggregation(&self, window: WindowKind) -> Result<Vec<(u32, Aggregation)>, CoreError> {
        let mut out = Vec::new();
        for (window_start, sub) in self.windows(window) {
            let values = sub.scalar_values()?;
            if values.is_empty() {
                continue;
            }
            let min = ResultSet::reduce(&values, AggregateOp::Min)?;
            let max = ResultSet::reduce(&values, AggregateOp::Max)?;
            let sum = ResultSet::reduce(&values, AggregateOp::Sum)?;
            let count = ResultSet::reduce(&values, AggregateOp::Count)?;
            out.push((window_start, Aggregation { min, max, sum, count }));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{BucketType as ItemBucketType, Item};

    fn key(s: &str) -> Key {
        Key::new(s).unwrap()
    }

    fn sample_items() -> Vec<Item> {
        let mut a = Item::new(key("k"), ItemType::RawF32, ItemBucketType::Dynamic);
        a.insert(vec![
            (0, PointValue::F32(1.0)),
            (1, PointValue::F32(2.0)),
        ])
        .unwrap();
        let mut b = Item::new(key("k"), ItemType::RawF32, ItemBucketType::Dynamic);
        b.insert(vec![
            (3600, PointValue::F32(3.0)),
            (3601, PointValue::F32(4.0)),
        ])
        .unwrap();
        vec![a, b]
    }

    #[test]
    fn from_items_concatenates_in_order() {
        let rs = ResultSet::from_items(key("k"), ItemType::RawF32, &sample_items()).unwrap();
        assert_eq!(rs.len(), 4);
        assert_eq!(rs.ts_min(), 0);
        assert_eq!(rs.ts_max(), 3601);
        assert_eq!(rs.bucket_type(), BucketType::ResultSet);
    }

    #[test]
    fn trim_narrows_to_inclusive_range() {
        let mut rs = ResultSet::from_items(key("k"), ItemType::RawF32, &sample_items()).unwrap();
        rs.trim(1, 3600);
        assert_eq!(rs.all(), vec![(1, PointValue::F32(2.0)), (3600, PointValue::F32(3.0))]);
    }

    #[test]
    fn hourly_windows_split_on_hour_boundary() {
        let rs = ResultSet::from_items(key("k"), ItemType::RawF32, &sample_items()).unwrap();
        let windows = rs.hourly();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].1.len(), 2);
        assert_eq!(windows[1].1.len(), 2);
        assert_eq!(windows[1].0, 3600);
    }

    #[test]
    fn aggregation_computes_sum_and_mean_per_window() {
        let rs = ResultSet::from_items(key("k"), ItemType::RawF32, &sample_items()).unwrap();
        let sums = rs.aggregation(WindowKind::Hourly, AggregateOp::Sum).unwrap();
        assert_eq!(sums, vec![(0, 3.0), (3600, 7.0)]);
        let means = rs.aggregation(WindowKind::Hourly, AggregateOp::Mean).unwrap();
        assert_eq!(means, vec![(0, 1.5), (3600, 3.5)]);
    }

    #[test]
    fn full_aggregation_reports_min_max_sum_count() {
        let rs = ResultSet::from_items(key("k"), ItemType::RawF32, &sample_items()).unwrap();
        let agg = rs.full_aggregation(WindowKind::Hourly).unwrap();
        assert_eq!(agg[0].1, Aggregation { min: 1.0, max: 2.0, sum: 3.0, count: 2.0 });
    }
}
