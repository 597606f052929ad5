//! Parallel packed column container (C1: ColumnVec)
//!
//! A growable ordered sequence of fixed-width 4-byte records. Two shapes
//! are supported: **scalar** (arity 1, either `u32` or `f32`) and
//! **tuple** (arity `k ∈ [2,20]`, always `f32` sub-columns, stored as `k`
//! parallel scalar sequences so serialisation stays a clean
//! concatenation rather than an interleave).

use crate::error::CoreError;
use byteorder::{ByteOrder, LittleEndian};

/// The native scalar type underlying a column's 4-byte records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Unsigned 32-bit integer records.
    U32,
    /// IEEE-754 single precision float records.
    F32,
}

/// A single decoded record read out of a [`ColumnVec`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// A scalar `u32` record.
    U32(u32),
    /// A scalar `f32` record.
    F32(f32),
    /// A tuple record of `arity` parallel `f32` values, in declaration order.
    Tuple(Vec<f32>),
}

impl ColumnValue {
    /// Number of 4-byte sub-records this value occupies.
    pub fn arity(&self) -> usize {
        match self {
            ColumnValue::U32(_) | ColumnValue::F32(_) => 1,
            ColumnValue::Tuple(v) => v.len(),
        }
    }
}

/// Parallel packed column container.
///
/// Scalar columns store a single `Vec<u32>` of raw bit patterns
/// (reinterpreted as `f32` when `kind == F32`). Tuple columns store
/// `arity` parallel `Vec<u32>` bit-pattern columns, one per tuple slot,
/// always of `F32` kind.
#[derive(Debug, Clone)]
pub struct ColumnVec {
    kind: ScalarKind,
    arity: usize,
    columns: Vec<Vec<u32>>,
}

impl ColumnVec {
    /// Build an empty scalar column of the given native type.
    pub fn new_scalar(kind: ScalarKind) -> Self {
        ColumnVec {
            kind,
            arity: 1,
            columns: vec![Vec::new()],
        }
    }

    /// Build an empty tuple column of `f32` sub-columns.
    ///
    /// # Errors
    /// Returns [`CoreError::ArityMismatch`] if `arity` is outside `[2,20]`.
    pub fn new_tuple(arity: usize) -> Result<Self, CoreError> {
        if !(2..=20).contains(&arity) {
            return Err(CoreError::ArityMismatch {
                expected: 2,
                actual: arity,
            });
        }
        Ok(ColumnVec {
            kind: ScalarKind::F32,
            arity,
            columns: vec![Vec::new(); arity],
        })
    }

    /// The scalar kind backing this column's 4-byte records.
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Tuple arity (`1` for scalar columns).
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    /// True iff this column holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_arity(&self, value: &ColumnValue) -> Result<(), CoreError> {
        if value.arity() != self.arity {
            return Err(CoreError::ArityMismatch {
                expected: self.arity,
                actual: value.arity(),
            });
        }
        match (self.kind, value) {
            (ScalarKind::U32, ColumnValue::U32(_)) => Ok(()),
            (ScalarKind::F32, ColumnValue::F32(_)) if self.arity == 1 => Ok(()),
            (ScalarKind::F32, ColumnValue::Tuple(_)) if self.arity > 1 => Ok(()),
            _ => Err(CoreError::ArityMismatch {
                expected: self.arity,
                actual: value.arity(),
            }),
        }
    }

    fn bits_of(&self, value: &ColumnValue) -> Vec<u32> {
        match value {
            ColumnValue::U32(v) => vec![*v],
            ColumnValue::F32(v) => vec![v.to_bits()],
            ColumnValue::Tuple(vs) => vs.iter().map(|v| v.to_bits()).collect(),
        }
    }

    fn value_at_bits(&self, bits: &[u32]) -> ColumnValue {
        match (self.kind, self.arity) {
            (ScalarKind::U32, 1) => ColumnValue::U32(bits[0]),
            (ScalarKind::F32, 1) => ColumnValue::F32(f32::from_bits(bits[0])),
            (ScalarKind::F32, _) => {
                ColumnValue::Tuple(bits.iter().map(|b| f32::from_bits(*b)).collect())
            }
            (ScalarKind::U32, _) => unreachable!("tuple columns are always f32"),
        }
    }

    /// Read the record at index `i`.
    pub fn get(&self, i: usize) -> ColumnValue {
        let bits: Vec<u32> = self.columns.iter().map(|c| c[i]).collect();
        self.value_at_bits(&bits)
    }

    /// Read a raw `u32` column value directly — used for the timestamp
    /// column, which is always a scalar `U32` column.
    pub fn get_u32(&self, i: usize) -> u32 {
        debug_assert_eq!(self.arity, 1);
        self.columns[0][i]
    }

    /// Overwrite the record at index `i`.
    pub fn set(&mut self, i: usize, value: ColumnValue) -> Result<(), CoreError> {
        self.check_arity(&value)?;
        let bits = self.bits_of(&value);
        for (col, b) in self.columns.iter_mut().zip(bits) {
            col[i] = b;
        }
        Ok(())
    }

    /// Append a record to the end of the column.
    pub fn append(&mut self, value: ColumnValue) -> Result<(), CoreError> {
        self.check_arity(&value)?;
        let bits = self.bits_of(&value);
        for (col, b) in self.columns.iter_mut().zip(bits) {
            col.push(b);
        }
        Ok(())
    }

    /// Append a raw `u32` record — used for the timestamp column.
    pub fn append_u32(&mut self, v: u32) {
        debug_assert_eq!(self.arity, 1);
        self.columns[0].push(v);
    }

    /// Insert a record at index `i`, shifting later records right.
    pub fn insert(&mut self, i: usize, value: ColumnValue) -> Result<(), CoreError> {
        self.check_arity(&value)?;
        let bits = self.bits_of(&value);
        for (col, b) in self.columns.iter_mut().zip(bits) {
            col.insert(i, b);
        }
        Ok(())
    }

    /// Insert a raw `u32` record at index `i` — used for the timestamp column.
    pub fn insert_u32(&mut self, i: usize, v: u32) {
        debug_assert_eq!(self.arity, 1);
        self.columns[0].insert(i, v);
    }

    /// Remove the record at index `i`, shifting later records left.
    pub fn delete(&mut self, i: usize) {
        for col in self.columns.iter_mut() {
            col.remove(i);
        }
    }

    /// Append every record of `other` onto the end of this column.
    ///
    /// # Errors
    /// Returns [`CoreError::ArityMismatch`] if `other` has a different
    /// kind/arity.
    pub fn concat(&mut self, other: &ColumnVec) -> Result<(), CoreError> {
        if self.kind != other.kind || self.arity != other.arity {
            return Err(CoreError::ArityMismatch {
                expected: self.arity,
                actual: other.arity,
            });
        }
        for (col, other_col) in self.columns.iter_mut().zip(other.columns.iter()) {
            col.extend_from_slice(other_col);
        }
        Ok(())
    }

    /// Return a new owned column holding only records in `[lo, hi)`.
    pub fn slice(&self, lo: usize, hi: usize) -> ColumnVec {
        ColumnVec {
            kind: self.kind,
            arity: self.arity,
            columns: self.columns.iter().map(|c| c[lo..hi].to_vec()).collect(),
        }
    }

    /// Serialise to the on-disk byte representation: the concatenation
    /// (not interleave) of sub-columns in declaration order, each a
    /// little-endian `u32`-width record stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * self.arity * 4);
        for col in &self.columns {
            let mut buf = vec![0u8; col.len() * 4];
            LittleEndian::write_u32_into(col, &mut buf);
            out.extend_from_slice(&buf);
        }
        out
    }

    /// Reconstruct a column of `len_records` records of the given
    /// kind/arity from a byte slice produced by [`ColumnVec::to_bytes`].
    ///
    /// # Errors
    /// Returns [`CoreError::CorruptedPayload`] if `bytes` does not hold
    /// exactly `arity * len_records` 4-byte records.
    pub fn from_bytes(
        kind: ScalarKind,
        arity: usize,
        bytes: &[u8],
        len_records: usize,
    ) -> Result<ColumnVec, CoreError> {
        let expected_len = arity * len_records * 4;
        if bytes.len() != expected_len {
            return Err(CoreError::CorruptedPayload(format!(
                "column byte length {} does not match arity {} * records {} * 4",
                bytes.len(),
                arity,
                len_records
            )));
        }
        let mut columns = Vec::with_capacity(arity);
        for c in 0..arity {
            let start = c * len_records * 4;
            let end = start + len_records * 4;
            let mut col = vec![0u32; len_records];
            LittleEndian::read_u32_into(&bytes[start..end], &mut col);
            columns.push(col);
        }
        Ok(ColumnVec {
            kind,
            arity,
            columns,
        })
    }
}
