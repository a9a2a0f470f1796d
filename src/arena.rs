//! Per-batch memory arenas.
//!
//! One-shot page acquisition per batch, reset and reused rather than
//! freed and reallocated, so a long scan never triggers allocator
//! churn. Wraps `bumpalo::Bump`.

use bumpalo::Bump;

use crate::column::N_MAX;

/// Fixed per-column header overhead folded into the sizing formula: a few
/// words of bookkeeping (pointer + length + capacity) that `bumpalo` itself
/// spends per allocation.
const HEADER_OVERHEAD_BYTES: usize = 32;

const ONE_MIB: usize = 1 << 20;
const FOUR_KIB: usize = 4 << 10;

/// Compute the arena target size (bytes) for an operator instance, per the
/// section 3 formula, given the value widths (in bytes) of every column the
/// operator will bulk-decompress.
pub fn arena_target_bytes(bulk_ok_value_widths: &[usize]) -> usize {
    let mut total = 0usize;
    for &width in bulk_ok_value_widths {
        total += (N_MAX + 64) * width;
        total += (N_MAX / 64) * 8;
        total += HEADER_OVERHEAD_BYTES;
    }
    let rounded = total.div_ceil(FOUR_KIB) * FOUR_KIB;
    rounded.min(ONE_MIB).max(FOUR_KIB)
}

/// A per-batch bump arena. Every `ColumnArray` decoded into a `BatchState`
/// borrows from this; releasing the batch drops the whole arena at once.
pub struct Arena {
    bump: Bump,
}

impl Arena {
    pub fn with_capacity(target_bytes: usize) -> Self {
        Self {
            bump: Bump::with_capacity(target_bytes),
        }
    }

    pub fn alloc_slice_copy<'a, T: Copy>(&'a self, src: &[T]) -> &'a mut [T] {
        self.bump.alloc_slice_copy(src)
    }

    pub fn alloc_slice_fill_copy<'a, T: Copy>(&'a self, len: usize, value: T) -> &'a mut [T] {
        self.bump.alloc_slice_fill_copy(len, value)
    }

    /// Bytes currently live in the arena (approximate, for the arena
    /// discipline invariant in section 8).
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Drop everything allocated so far and reuse the backing storage. Used
    /// both for batch release and for the shared scratch arena, which is
    /// reset between columns of the same batch (section 4.2).
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}
