//! Turning a child's column shape and a query's predicates/ordering into
//! the static structures the rest of the crate executes against: the
//! `ColumnTable`, the vectorizable subset of qualifiers, and (when
//! needed) a `SortInfo`.

use crate::column::{ColumnDescriptor, ColumnKind, ColumnTable, LogicalType};
use crate::error::{OperatorError, Result};
use crate::qual::{CmpOp, Qual};
use crate::row::Row;
use crate::scalar::ScalarValue;
use crate::sort::{NullsOrder, OrderColumn, SortDirection, SortInfo};

/// Which side of the predicate the constant was written on. `5 > x` and
/// `x < 5` classify identically, but only once the constant-left form has
/// been commuted to its column-left equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandOrder {
    ColumnLeft,
    ConstantLeft,
}

/// A candidate `column OP constant` predicate as handed down from the
/// query, before classification.
#[derive(Debug, Clone)]
pub struct PredicateSpec {
    pub column_name: String,
    pub op: CmpOp,
    pub constant: ScalarValue,
    pub order: OperandOrder,
}

impl PredicateSpec {
    /// The operator to actually run against `column_name`, commuting it
    /// first if the constant was written on the left. Every `CmpOp`
    /// variant has a registered commuter, so this never fails to produce
    /// one.
    pub fn effective_op(&self) -> CmpOp {
        match self.order {
            OperandOrder::ColumnLeft => self.op,
            OperandOrder::ConstantLeft => self.op.commute(),
        }
    }
}

/// The planner's verdict on a query's predicate list: the subset that
/// can run through the vectorized evaluator, and the subset that must
/// still be checked row-at-a-time after materialization (non-numeric
/// columns, or columns the bulk decoder can't produce an array for).
pub struct ClassifiedPredicates {
    pub vectorized: Vec<Qual>,
    pub row_at_a_time: Vec<PredicateSpec>,
}

/// Build the column table from the child's raw descriptor list. Thin
/// wrapper kept separate from `ColumnTable::build` so the planner is the
/// single place that owns the raw-to-validated transition.
pub fn build_column_table(descriptors: Vec<ColumnDescriptor>) -> Result<ColumnTable> {
    ColumnTable::build(descriptors)
}

/// Split `predicates` into the part the vectorized evaluator can run and
/// the part that can't be vectorized, matching each by column name
/// against the table's compressed, bulk-ok, numeric columns.
pub fn classify_predicates(
    table: &ColumnTable,
    predicates: Vec<PredicateSpec>,
) -> ClassifiedPredicates {
    let mut vectorized = Vec::new();
    let mut row_at_a_time = Vec::new();

    for predicate in predicates {
        let found = table
            .compressed()
            .iter()
            .enumerate()
            .find(|(_, d)| d.name == predicate.column_name);
        match found {
            Some((index, descriptor)) if descriptor.bulk_ok && constant_matches_type(descriptor, &predicate.constant) => {
                vectorized.push(Qual {
                    compressed_index: index,
                    op: predicate.effective_op(),
                    constant: predicate.constant,
                });
            }
            _ => row_at_a_time.push(predicate),
        }
    }

    ClassifiedPredicates {
        vectorized,
        row_at_a_time,
    }
}

fn constant_matches_type(descriptor: &ColumnDescriptor, constant: &ScalarValue) -> bool {
    if constant.is_null() {
        // A null constant is classified as vectorizable: the evaluator
        // short-circuits it to all-false without touching the array.
        return true;
    }
    matches!(
        (descriptor.logical_type, constant),
        (LogicalType::Int32, ScalarValue::Int32(_))
            | (LogicalType::Int64, ScalarValue::Int64(_))
            | (LogicalType::Float32, ScalarValue::Float32(_))
            | (LogicalType::Float64, ScalarValue::Float64(_))
    )
}

/// Build `SortInfo` plus the `OrderColumn` it's keyed on, for a query that
/// needs output ordered on `order_column`: it must be either a compressed
/// column (matched by its dense-prefix index) or a segmentby column
/// (matched by its position among the table's segmentby columns) that the
/// child already sorts its batches on. Returns `None` if the query has no
/// ordering requirement.
pub fn build_sort_info(
    table: &ColumnTable,
    order_column: Option<&str>,
    descending: bool,
    nulls_first: bool,
) -> Result<Option<(SortInfo, OrderColumn)>> {
    let Some(name) = order_column else {
        return Ok(None);
    };
    let resolved = table
        .compressed()
        .iter()
        .position(|d| d.name == name)
        .map(OrderColumn::Compressed)
        .or_else(|| {
            table
                .segmentby()
                .position(|d| d.name == name)
                .map(OrderColumn::Segmentby)
        });
    let Some(order_column) = resolved else {
        return Err(OperatorError::PlannerContract(format!(
            "order-by column {} is not part of this child's row shape",
            name
        )));
    };
    let sort_info = SortInfo {
        direction: if descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        },
        nulls: if nulls_first {
            NullsOrder::First
        } else {
            NullsOrder::Last
        },
    };
    Ok(Some((sort_info, order_column)))
}

/// Check every residual (non-vectorized) predicate against an already
/// materialized row, after the vectorized qualifiers have already been
/// applied to produce that row. Predicates against a column the table
/// doesn't know never match.
pub fn row_passes_residual(table: &ColumnTable, predicates: &[PredicateSpec], row: &Row) -> bool {
    predicates.iter().all(|predicate| predicate_passes(table, predicate, row))
}

fn predicate_passes(table: &ColumnTable, predicate: &PredicateSpec, row: &Row) -> bool {
    let Some(descriptor) = table.all().iter().find(|d| d.name == predicate.column_name) else {
        return false;
    };
    if descriptor.output_position < 0 {
        return false;
    }
    let Some(cell) = row.get(descriptor.output_position as usize) else {
        return false;
    };
    predicate.effective_op().apply_scalars(*cell, predicate.constant)
}

/// Convenience check used by the operator's explain hook and by
/// `require_vector_qual`: true iff every predicate the query carries
/// made it into the vectorized set.
pub fn all_predicates_vectorized(classified: &ClassifiedPredicates) -> bool {
    classified.row_at_a_time.is_empty()
}
