//! Heap-merge batch queue.
//!
//! Used when the query needs output sorted on a column the child already
//! sorts within each batch. Every batch pushed here is open at once,
//! keyed by the decoded value at its *current* cursor row rather than a
//! static summary, so two open batches whose sort windows overlap
//! interleave row by row instead of one fully draining before the next
//! is even considered.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::batch::BatchState;
use crate::scalar::ScalarValue;
use crate::sort::{OrderColumn, SortInfo};

struct HeapEntry<'a> {
    sort_info: SortInfo,
    key: ScalarValue,
    seq: usize,
    batch: BatchState<'a>,
}

impl<'a> PartialEq for HeapEntry<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<'a> Eq for HeapEntry<'a> {}

impl<'a> PartialOrd for HeapEntry<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a> Ord for HeapEntry<'a> {
    fn cmp(&self, other: &Self) -> Ordering {
        let primary = self.sort_info.compare(self.key, other.key).reverse();
        if primary != Ordering::Equal {
            return primary;
        }
        // Stable tie-break: earlier arrival (lower seq) pops first.
        other.seq.cmp(&self.seq)
    }
}

pub struct HeapQueue<'a> {
    sort_info: SortInfo,
    order_column: OrderColumn,
    heap: BinaryHeap<HeapEntry<'a>>,
    /// The one batch currently handed out by `front_mut`. Re-keyed and
    /// dropped back into `heap` by `resift_current` after each row
    /// consumed, so this is a rotating slot, not a dedicated "open" batch.
    current: Option<BatchState<'a>>,
    next_seq: usize,
}

impl<'a> HeapQueue<'a> {
    pub fn new(sort_info: SortInfo, order_column: OrderColumn) -> Self {
        Self {
            sort_info,
            order_column,
            heap: BinaryHeap::new(),
            current: None,
            next_seq: 0,
        }
    }

    /// Insert a batch, keyed on the decoded value at its first surviving
    /// row. Returns `false` without inserting anything if the batch has
    /// no surviving rows at all (fully excluded by a qualifier, or
    /// empty) — the caller owns releasing such a batch's arena.
    pub fn push(&mut self, batch: BatchState<'a>) -> bool {
        let Some(row_index) = batch.peek_match_index() else {
            return false;
        };
        let key = batch.order_value(self.order_column, row_index);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(HeapEntry {
            sort_info: self.sort_info,
            key,
            seq,
            batch,
        });
        true
    }

    /// Promote the heap's minimum-key entry into `current` if nothing is
    /// there already.
    fn ensure_current(&mut self) {
        if self.current.is_some() {
            return;
        }
        self.current = self.heap.pop().map(|entry| entry.batch);
    }

    pub fn front_mut(&mut self) -> Option<&mut BatchState<'a>> {
        self.ensure_current();
        self.current.as_mut()
    }

    /// Re-key the batch held in `current` from its (now advanced) cursor
    /// row and drop it back into the heap, so the next `front_mut` call
    /// picks whichever open batch has the smallest key next — possibly
    /// the same batch again, possibly another whose window now leads.
    /// Must be called after every row consumed via the batch returned by
    /// `front_mut`. A no-op if `current` has no rows left; `pop_exhausted`
    /// handles that case instead.
    pub fn resift_current(&mut self) {
        let Some(row_index) = self.current.as_ref().and_then(BatchState::peek_match_index) else {
            return;
        };
        let batch = self.current.take().expect("checked Some above");
        let key = batch.order_value(self.order_column, row_index);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(HeapEntry {
            sort_info: self.sort_info,
            key,
            seq,
            batch,
        });
    }

    /// Drop the batch held in `current` once it has no rows left,
    /// returning it so the caller can release its arena.
    pub fn pop_exhausted(&mut self) -> Option<BatchState<'a>> {
        if matches!(&self.current, Some(b) if b.peek_match_index().is_none()) {
            self.current.take()
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        let current_is_live = matches!(&self.current, Some(b) if b.peek_match_index().is_some());
        self.heap.is_empty() && !current_is_live
    }

    pub fn len(&self) -> usize {
        self.heap.len() + self.current.is_some() as usize
    }
}
