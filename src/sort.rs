//! Sort metadata for the heap-merge batch queue and the planner's
//! batch-ordering decision.
//!
//! A compressed batch carries, alongside its data, a `min`/`max` pair for
//! the column the query needs sorted output on. Every batch pushed to
//! the heap queue is open at once, keyed by the decoded value at its
//! current cursor row (`OrderColumn`) rather than by this summary, so
//! two open batches whose windows overlap interleave row by row rather
//! than one fully draining first.

use std::cmp::Ordering;

use crate::scalar::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// Static sort requirement the planner derived from the query's ORDER BY.
#[derive(Debug, Clone, Copy)]
pub struct SortInfo {
    pub direction: SortDirection,
    pub nulls: NullsOrder,
}

impl SortInfo {
    /// Compare two batches' min/max summaries for heap ordering: a batch's
    /// "lead" value is its min under ascending order, its max under
    /// descending order — the value most likely to produce the next row.
    pub fn lead_value(&self, min: ScalarValue, max: ScalarValue) -> ScalarValue {
        match self.direction {
            SortDirection::Ascending => min,
            SortDirection::Descending => max,
        }
    }

    /// Total order over two (possibly null) scalar values honoring
    /// `nulls` and `direction`, used both for the heap comparator and to
    /// validate incoming batches are already internally sorted.
    pub fn compare(&self, a: ScalarValue, b: ScalarValue) -> Ordering {
        let base = match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => {
                return match self.nulls {
                    NullsOrder::First => Ordering::Less,
                    NullsOrder::Last => Ordering::Greater,
                }
            }
            (false, true) => {
                return match self.nulls {
                    NullsOrder::First => Ordering::Greater,
                    NullsOrder::Last => Ordering::Less,
                }
            }
            (false, false) => a
                .partial_cmp_value(&b)
                .unwrap_or(Ordering::Equal),
        };
        match self.direction {
            SortDirection::Ascending => base,
            SortDirection::Descending => base.reverse(),
        }
    }
}

/// A compressed batch's min/max summary on the sort column, used to gate
/// which batches are worth comparing before a single one is ever decoded.
#[derive(Debug, Clone, Copy)]
pub struct BatchSortKey {
    pub min: ScalarValue,
    pub max: ScalarValue,
}

/// Which decoded value supplies a batch's current-cursor-row ordering key
/// once it's open: a dense-prefix compressed column by index, or a
/// segmentby column by its position among the table's segmentby columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderColumn {
    Compressed(usize),
    Segmentby(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascending_orders_nulls_first_by_default() {
        let info = SortInfo {
            direction: SortDirection::Ascending,
            nulls: NullsOrder::First,
        };
        assert_eq!(
            info.compare(ScalarValue::Null, ScalarValue::Int32(1)),
            Ordering::Less
        );
        assert_eq!(
            info.compare(ScalarValue::Int32(1), ScalarValue::Int32(2)),
            Ordering::Less
        );
    }

    #[test]
    fn descending_reverses_value_order_but_not_nulls_placement() {
        let info = SortInfo {
            direction: SortDirection::Descending,
            nulls: NullsOrder::Last,
        };
        assert_eq!(
            info.compare(ScalarValue::Int32(5), ScalarValue::Int32(1)),
            Ordering::Less
        );
        assert_eq!(
            info.compare(ScalarValue::Null, ScalarValue::Int32(1)),
            Ordering::Greater
        );
    }

    #[test]
    fn lead_value_picks_min_or_max_by_direction() {
        let asc = SortInfo {
            direction: SortDirection::Ascending,
            nulls: NullsOrder::First,
        };
        let desc = SortInfo {
            direction: SortDirection::Descending,
            nulls: NullsOrder::First,
        };
        let min = ScalarValue::Int32(1);
        let max = ScalarValue::Int32(9);
        assert_eq!(asc.lead_value(min, max), min);
        assert_eq!(desc.lead_value(min, max), max);
    }
}
