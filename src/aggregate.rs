//! Vectorized partial aggregation.
//!
//! `SUM` over an entire masked `ColumnArray` in one pass, bypassing row
//! materialization entirely. Only `int4`/`float4`/`float8` are
//! supported, matching the column types the evaluator and decoder know
//! about; anything else falls back to row-at-a-time aggregation
//! upstream of this crate.

use crate::array::{BitMask, ColumnArray};
use crate::column::LogicalType;
use crate::error::{OperatorError, Result};
use crate::scalar::ScalarValue;

/// Running partial-sum accumulator. Integer sums are tracked as `i64` to
/// give headroom over `int4` inputs before an explicit overflow check;
/// float sums accumulate in `f64`.
#[derive(Debug, Clone, Copy)]
pub enum SumAccumulator {
    Int(i64),
    Float(f64),
}

impl SumAccumulator {
    pub fn zero_for(array: &ColumnArray<'_>) -> Self {
        match array {
            ColumnArray::Int32 { .. } | ColumnArray::Int64 { .. } => SumAccumulator::Int(0),
            ColumnArray::Float32 { .. } | ColumnArray::Float64 { .. } => SumAccumulator::Float(0.0),
        }
    }

    /// Fold every masked, non-null row of `array` into `self` in one pass.
    pub fn accumulate(&mut self, array: &ColumnArray<'_>, mask: &BitMask) -> Result<()> {
        let validity = array.validity();
        match (self, array) {
            (SumAccumulator::Int(total), ColumnArray::Int32 { values, .. }) => {
                for i in 0..array.len() {
                    if mask.get(i) && validity.is_valid(i) {
                        *total = total
                            .checked_add(values[i] as i64)
                            .ok_or_else(|| OperatorError::NumericOverflow("sum(int4)".into()))?;
                    }
                }
                Ok(())
            }
            (SumAccumulator::Int(total), ColumnArray::Int64 { values, .. }) => {
                for i in 0..array.len() {
                    if mask.get(i) && validity.is_valid(i) {
                        *total = total
                            .checked_add(values[i])
                            .ok_or_else(|| OperatorError::NumericOverflow("sum(int8)".into()))?;
                    }
                }
                Ok(())
            }
            (SumAccumulator::Float(total), ColumnArray::Float32 { values, .. }) => {
                for i in 0..array.len() {
                    if mask.get(i) && validity.is_valid(i) {
                        *total += values[i] as f64;
                    }
                }
                Ok(())
            }
            (SumAccumulator::Float(total), ColumnArray::Float64 { values, .. }) => {
                for i in 0..array.len() {
                    if mask.get(i) && validity.is_valid(i) {
                        *total += values[i];
                    }
                }
                Ok(())
            }
            _ => Err(OperatorError::UnsupportedAggregate(
                "accumulator/array type mismatch".into(),
            )),
        }
    }

    pub fn as_scalar(&self) -> ScalarValue {
        match *self {
            SumAccumulator::Int(v) => ScalarValue::Int64(v),
            SumAccumulator::Float(v) => ScalarValue::Float64(v),
        }
    }

    /// Fold a segmentby batch's `value * count` into `self`: the value
    /// is constant across every row in the batch, so the whole batch
    /// contributes in one multiply-add rather than a loop. A null value
    /// contributes nothing.
    pub fn accumulate_scalar_repeated(&mut self, value: ScalarValue, count: usize) -> Result<()> {
        match (self, value) {
            (_, ScalarValue::Null) => Ok(()),
            (SumAccumulator::Int(total), ScalarValue::Int32(v)) => {
                let contribution = (v as i64)
                    .checked_mul(count as i64)
                    .ok_or_else(|| OperatorError::NumericOverflow("sum(int4) segmentby".into()))?;
                *total = total.checked_add(contribution).ok_or_else(|| {
                    OperatorError::NumericOverflow("sum(int4) segmentby".into())
                })?;
                Ok(())
            }
            (SumAccumulator::Int(total), ScalarValue::Int64(v)) => {
                let contribution = v
                    .checked_mul(count as i64)
                    .ok_or_else(|| OperatorError::NumericOverflow("sum(int8) segmentby".into()))?;
                *total = total.checked_add(contribution).ok_or_else(|| {
                    OperatorError::NumericOverflow("sum(int8) segmentby".into())
                })?;
                Ok(())
            }
            (SumAccumulator::Float(total), ScalarValue::Float32(v)) => {
                *total += v as f64 * count as f64;
                Ok(())
            }
            (SumAccumulator::Float(total), ScalarValue::Float64(v)) => {
                *total += v * count as f64;
                Ok(())
            }
            _ => Err(OperatorError::UnsupportedAggregate(
                "accumulator/scalar type mismatch".into(),
            )),
        }
    }

    /// An accumulator seeded from a scalar's own numeric kind, for when
    /// the aggregated column is segmentby and no array is available to
    /// infer the kind from.
    pub fn zero_for_scalar(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::Int32(_) | ScalarValue::Int64(_) => Some(SumAccumulator::Int(0)),
            ScalarValue::Float32(_) | ScalarValue::Float64(_) => Some(SumAccumulator::Float(0.0)),
            ScalarValue::Null => None,
        }
    }

    /// Whether `sum()` can run against a column of this logical type at
    /// all, checked once at operator construction: an unsupported
    /// aggregate target is a planner-time contract error, not something
    /// discovered mid-stream.
    pub fn supports_logical_type(logical_type: LogicalType) -> bool {
        matches!(
            logical_type,
            LogicalType::Int32 | LogicalType::Int64 | LogicalType::Float32 | LogicalType::Float64
        )
    }

    /// Fold a single scalar value into `self`, skipping nulls, for the
    /// row-at-a-time aggregation path (`enable_vectorized_aggregation`
    /// off). Produces the same running total as `accumulate` applied one
    /// row at a time over the same values.
    pub fn accumulate_one_scalar(&mut self, value: ScalarValue) -> Result<()> {
        match (self, value) {
            (_, ScalarValue::Null) => Ok(()),
            (SumAccumulator::Int(total), ScalarValue::Int32(v)) => {
                *total = total
                    .checked_add(v as i64)
                    .ok_or_else(|| OperatorError::NumericOverflow("sum(int4)".into()))?;
                Ok(())
            }
            (SumAccumulator::Int(total), ScalarValue::Int64(v)) => {
                *total = total
                    .checked_add(v)
                    .ok_or_else(|| OperatorError::NumericOverflow("sum(int8)".into()))?;
                Ok(())
            }
            (SumAccumulator::Float(total), ScalarValue::Float32(v)) => {
                *total += v as f64;
                Ok(())
            }
            (SumAccumulator::Float(total), ScalarValue::Float64(v)) => {
                *total += v;
                Ok(())
            }
            _ => Err(OperatorError::UnsupportedAggregate(
                "accumulator/scalar type mismatch".into(),
            )),
        }
    }
}
