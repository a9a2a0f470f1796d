//! The data model the operator pulls from its child: one opaque
//! compressed row per batch, carrying segmentby scalars, per-column
//! compressed byte blobs, row count, and optional ordering metadata.

use crate::codec::CodecTag;
use crate::error::Result;
use crate::scalar::ScalarValue;
use crate::sort::BatchSortKey;

/// One compressed column's bytes plus the tag identifying how to decode
/// them, as handed up by the child for one compressed batch row.
#[derive(Debug, Clone)]
pub struct CompressedColumnBytes {
    pub codec: CodecTag,
    pub bytes: Vec<u8>,
}

/// One row of the child's output: a whole compressed batch, still
/// opaque. `compressed` is indexed in the same dense-prefix order as
/// `ColumnTable::compressed()`.
#[derive(Debug, Clone)]
pub struct CompressedRow {
    pub segmentby: Vec<ScalarValue>,
    pub compressed: Vec<CompressedColumnBytes>,
    pub count: usize,
    pub sequence: Option<i64>,
    /// Present only when the query needs sorted output; the min/max of
    /// the sort column within this batch.
    pub sort_key: Option<BatchSortKey>,
}

/// The operator's child: a source of compressed batch rows, pulled one
/// at a time, cooperatively, under a single-threaded pull-based
/// execution model.
pub trait CompressedBatchSource {
    fn open(&mut self) -> Result<()>;

    /// Pull the next compressed batch row, or `None` once exhausted.
    fn next_row(&mut self) -> Result<Option<CompressedRow>>;

    /// Reset to the beginning, as for a nested-loop rescan.
    fn rescan(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}
