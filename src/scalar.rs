//! A minimal typed scalar, used for segmentby values, qualifier constants,
//! min/max metadata, and materialized output cells.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Null,
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ScalarValue::Int32(v) => Some(v as f64),
            ScalarValue::Int64(v) => Some(v as f64),
            ScalarValue::Float32(v) => Some(v as f64),
            ScalarValue::Float64(v) => Some(v),
            ScalarValue::Null => None,
        }
    }

    /// Total ordering used by the heap queue's tie-breaking and by tests.
    /// Nulls compare via the caller's nulls-first flag, not here.
    pub fn partial_cmp_value(&self, other: &ScalarValue) -> Option<std::cmp::Ordering> {
        self.as_f64()?.partial_cmp(&other.as_f64()?)
    }
}
