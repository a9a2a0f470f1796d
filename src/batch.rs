//! Batch state: one decompressed compressed-row, live in its own arena,
//! with a working validity/qualifier mask and a read cursor.

use tracing::debug;

use crate::arena::Arena;
use crate::array::{BitMask, ColumnArray};
use crate::child::CompressedRow;
use crate::codec::{self, CodecRegistry};
use crate::column::ColumnTable;
use crate::error::Result;
use crate::qual::{evaluate_into, evaluate_row_at_a_time, Qual};
use crate::scalar::ScalarValue;
use crate::sort::{BatchSortKey, OrderColumn};

/// A monotonic counter used only to label batches in errors and logs.
#[derive(Debug, Default)]
pub struct BatchIdAllocator {
    next: u64,
}

impl BatchIdAllocator {
    pub fn alloc(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// One decompressed batch: the dense-prefix compressed columns as
/// `ColumnArray`s borrowed from `arena`, the segmentby scalars (shared by
/// every row), and a working mask produced by folding every qualifier.
pub struct BatchState<'a> {
    pub id: u64,
    pub arena: &'a Arena,
    pub columns: Vec<ColumnArray<'a>>,
    pub segmentby: Vec<ScalarValue>,
    pub mask: BitMask,
    pub cursor: usize,
    pub len: usize,
    pub sort_key: Option<BatchSortKey>,
}

impl<'a> BatchState<'a> {
    /// Decode every compressed column of `row` into `arena`, then fold in
    /// every qualifier to produce the initial working mask. `bulk_qual_eval`
    /// selects the vectorized array loop when true, or a per-row scalar
    /// loop when false (`enable_bulk_decompression` off forces the latter);
    /// both produce the same mask.
    pub fn decode(
        id: u64,
        arena: &'a Arena,
        row: &CompressedRow,
        table: &ColumnTable,
        codecs: &CodecRegistry,
        quals: &[Qual],
        bulk_qual_eval: bool,
    ) -> Result<Self> {
        let len = row.count;
        let mut columns = Vec::with_capacity(table.num_compressed());
        for (i, descriptor) in table.compressed().iter().enumerate() {
            let column_bytes = &row.compressed[i];
            let decoder = codecs.get(column_bytes.codec);
            let array = decoder
                .decode(arena, descriptor.logical_type, &column_bytes.bytes, len)
                .map_err(|e| codec::with_context(e, &descriptor.name, id))?;
            columns.push(array);
        }

        let mut mask = BitMask::new_all_ones(len);
        for qual in quals {
            if let Some(array) = columns.get(qual.compressed_index) {
                if bulk_qual_eval {
                    evaluate_into(qual, array, &mut mask);
                } else {
                    evaluate_row_at_a_time(qual, array, &mut mask);
                }
                if mask.is_all_zero() {
                    debug!(batch_id = id, "batch fully excluded by qualifier");
                    break;
                }
            }
        }

        Ok(Self {
            id,
            arena,
            columns,
            segmentby: row.segmentby.clone(),
            mask,
            cursor: 0,
            len,
            sort_key: row.sort_key,
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.len
    }

    /// Advance the cursor to the next row that survives the mask, or to
    /// `len` if none remain.
    pub fn advance_to_next_match(&mut self) -> Option<usize> {
        let found = self.mask.next_set_from(self.cursor);
        self.cursor = found.map(|i| i + 1).unwrap_or(self.len);
        found
    }

    pub fn remaining_match_count(&self) -> usize {
        (self.cursor..self.len).filter(|&i| self.mask.get(i)).count()
    }

    /// Index of the next row that survives the mask, without consuming it
    /// — unlike `advance_to_next_match`, the cursor doesn't move. Used by
    /// the heap queue to key an open batch by its current row without
    /// committing to yield it yet.
    pub fn peek_match_index(&self) -> Option<usize> {
        self.mask.next_set_from(self.cursor)
    }

    /// The value of `order_column` at `row_index`, used by the heap queue
    /// to compare open batches on their actual current row instead of a
    /// static min/max summary.
    pub fn order_value(&self, order_column: OrderColumn, row_index: usize) -> ScalarValue {
        match order_column {
            OrderColumn::Compressed(index) => self
                .columns
                .get(index)
                .map(|array| array.get_scalar(row_index))
                .unwrap_or(ScalarValue::Null),
            OrderColumn::Segmentby(index) => {
                self.segmentby.get(index).copied().unwrap_or(ScalarValue::Null)
            }
        }
    }
}
