//! Vectorized qualifier evaluation.
//!
//! Each `Qual` is `column OP constant`, evaluated over an entire
//! `ColumnArray` in one branch-free pass that folds directly into a
//! `BitMask`. Nulls never satisfy a qualifier, strict or not: a null
//! operand makes the comparison false, full stop.

use crate::array::{BitMask, ColumnArray};
use crate::scalar::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

impl CmpOp {
    #[inline]
    fn apply<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ne => lhs != rhs,
        }
    }

    /// The operator to use when the constant and column operand are
    /// swapped, so `5 > x` can be normalized to `x < 5` before
    /// classification. Every variant has one, so commuting never fails.
    pub fn commute(self) -> CmpOp {
        match self {
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Le => CmpOp::Ge,
            CmpOp::Eq => CmpOp::Eq,
            CmpOp::Ge => CmpOp::Le,
            CmpOp::Gt => CmpOp::Lt,
            CmpOp::Ne => CmpOp::Ne,
        }
    }

    /// Scalar-level comparison used by row-at-a-time evaluation (residual
    /// predicates and the non-bulk qualifier path): a null on either side
    /// never satisfies, and mismatched numeric kinds never satisfy.
    pub fn apply_scalars(self, lhs: ScalarValue, rhs: ScalarValue) -> bool {
        match (lhs, rhs) {
            (ScalarValue::Int32(a), ScalarValue::Int32(b)) => self.apply(a, b),
            (ScalarValue::Int64(a), ScalarValue::Int64(b)) => self.apply(a, b),
            (ScalarValue::Float32(a), ScalarValue::Float32(b)) => self.apply(a, b),
            (ScalarValue::Float64(a), ScalarValue::Float64(b)) => self.apply(a, b),
            _ => false,
        }
    }
}

/// A single `column OP constant` predicate against one compressed column,
/// identified by its dense-prefix index in the column table.
#[derive(Debug, Clone)]
pub struct Qual {
    pub compressed_index: usize,
    pub op: CmpOp,
    pub constant: ScalarValue,
}

impl Qual {
    /// A qualifier whose constant is null is unsatisfiable by construction
    /// — nulls never satisfy — so the caller can special case this to
    /// short-circuit the whole batch without touching the array at all.
    pub fn is_constant_unsatisfiable(&self) -> bool {
        self.constant.is_null()
    }
}

/// Evaluate one qualifier against one decoded array, ANDing the result
/// into `mask` in place. Rows already excluded by `mask` are still
/// evaluated (branch-free); only the final AND matters.
pub fn evaluate_into(qual: &Qual, array: &ColumnArray<'_>, mask: &mut BitMask) {
    if qual.is_constant_unsatisfiable() {
        *mask = BitMask::new_all_zeros(mask.len());
        return;
    }
    let len = array.len();
    let mut result = BitMask::new_all_zeros(len);
    match (array, qual.constant) {
        (ColumnArray::Int32 { values, validity }, ScalarValue::Int32(c)) => {
            for i in 0..len {
                let hit = validity.is_valid(i) && qual.op.apply(values[i], c);
                result.set(i, hit);
            }
        }
        (ColumnArray::Int64 { values, validity }, ScalarValue::Int64(c)) => {
            for i in 0..len {
                let hit = validity.is_valid(i) && qual.op.apply(values[i], c);
                result.set(i, hit);
            }
        }
        (ColumnArray::Float32 { values, validity }, ScalarValue::Float32(c)) => {
            for i in 0..len {
                let hit = validity.is_valid(i) && qual.op.apply(values[i], c);
                result.set(i, hit);
            }
        }
        (ColumnArray::Float64 { values, validity }, ScalarValue::Float64(c)) => {
            for i in 0..len {
                let hit = validity.is_valid(i) && qual.op.apply(values[i], c);
                result.set(i, hit);
            }
        }
        _ => {
            // Type mismatch between qualifier constant and column: the
            // planner is responsible for ensuring these always agree, so
            // here it means no row can possibly match.
        }
    }
    mask.and_assign(&result);
}

/// Row-at-a-time counterpart to `evaluate_into`, used when
/// `enable_bulk_decompression` is off: per-row `get_scalar` plus a scalar
/// comparison instead of the type-specialized bulk loop over the same
/// array. Produces the same mask as `evaluate_into` for every input.
pub fn evaluate_row_at_a_time(qual: &Qual, array: &ColumnArray<'_>, mask: &mut BitMask) {
    if qual.is_constant_unsatisfiable() {
        *mask = BitMask::new_all_zeros(mask.len());
        return;
    }
    let len = array.len();
    let mut result = BitMask::new_all_zeros(len);
    for i in 0..len {
        let value = array.get_scalar(i);
        result.set(i, qual.op.apply_scalars(value, qual.constant));
    }
    mask.and_assign(&result);
}
