//! A transparent decompression execution operator for batched,
//! columnar-compressed time-series data.
//!
//! A child produces one opaque compressed "batch row" at a time — a
//! segmentby prefix, a handful of compressed columns, and row-count
//! metadata. This crate turns that into ordinary output rows: bulk
//! decoding each batch's columns into arrays, folding qualifiers and
//! aggregates over those arrays directly, and only ever materializing a
//! row at the very last step. See [`operator::DecompressOperator`] for
//! the entry point.

pub mod aggregate;
pub mod arena;
pub mod array;
pub mod batch;
pub mod child;
pub mod codec;
pub mod column;
pub mod config;
pub mod error;
pub mod metrics;
pub mod operator;
pub mod planner;
pub mod qual;
pub mod queue;
pub mod row;
pub mod scalar;
pub mod sort;

pub use aggregate::SumAccumulator;
pub use arena::Arena;
pub use array::{BitMask, ColumnArray, Validity};
pub use batch::BatchState;
pub use child::{CompressedBatchSource, CompressedColumnBytes, CompressedRow};
pub use codec::{BulkDecompressor, CodecRegistry, CodecTag};
pub use column::{ColumnDescriptor, ColumnKind, ColumnTable, LogicalType, N_MAX, NO_OUTPUT};
pub use config::{GlobalContext, OperatorConfig, SortedMergeGate, Toggle, VectorQualGate};
pub use error::{OperatorError, Result};
pub use metrics::MetricsCollector;
pub use operator::{AggregateRequest, AggregateTarget, DecompressOperator, ExplainInfo};
pub use planner::{
    build_column_table, build_sort_info, classify_predicates, row_passes_residual,
    ClassifiedPredicates, OperandOrder, PredicateSpec,
};
pub use qual::{CmpOp, Qual};
pub use queue::{FifoQueue, HeapQueue};
pub use row::Row;
pub use scalar::ScalarValue;
pub use sort::{BatchSortKey, NullsOrder, OrderColumn, SortDirection, SortInfo};
