//! Error kinds for the decompression operator.
//!
//! Every error here is fatal to the query: there is no per-row recovery, and
//! the operator never retries or swallows an error.

use thiserror::Error;

/// All errors the operator can raise, at plan time or at execution time.
#[derive(Debug, Error)]
pub enum OperatorError {
    /// A needed output attribute has no column descriptor, or a mandatory
    /// metadata column (`count`) is missing from the child's row shape.
    #[error("planner contract violation: {0}")]
    PlannerContract(String),

    /// A system column other than the rowid-like table identity was
    /// requested as a pass-through.
    #[error("unsupported system column: {0}")]
    UnsupportedSystemColumn(String),

    /// The codec produced a shape that disagrees with the declared column
    /// type, or failed outright. A batch is atomic: this aborts the batch
    /// (and, per section 4.2, the whole query).
    #[error("codec error decoding column {column} of batch {batch_id}: {reason}")]
    Codec {
        column: String,
        batch_id: u64,
        reason: String,
    },

    /// Integer (or float-range) overflow while folding a batch's partial sum
    /// into the running accumulator.
    #[error("numeric overflow in aggregate accumulation: {0}")]
    NumericOverflow(String),

    /// Raised at operator init only, never mid-stream: the requested
    /// aggregate shape is not one of the supported partial aggregates.
    #[error("unsupported aggregate: {0}")]
    UnsupportedAggregate(String),

    /// Propagated when the global cancel flag is observed set at a batch
    /// boundary or inner-loop checkpoint.
    #[error("query cancelled")]
    Cancelled,

    /// A `require_vector_qual`/`require_batch_sorted_merge` testing gate was
    /// violated (section 6).
    #[error("configuration gate violated: {0}")]
    ConfigGate(String),
}

pub type Result<T> = std::result::Result<T, OperatorError>;
