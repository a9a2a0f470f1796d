//! The plain FIFO batch queue used when the query has no ordering
//! requirement on the operator's output: batches are consumed in the
//! order the child produced them.

use std::collections::VecDeque;

use crate::batch::BatchState;

pub struct FifoQueue<'a> {
    batches: VecDeque<BatchState<'a>>,
}

impl<'a> FifoQueue<'a> {
    pub fn new() -> Self {
        Self {
            batches: VecDeque::new(),
        }
    }

    pub fn push(&mut self, batch: BatchState<'a>) {
        self.batches.push_back(batch);
    }

    /// The batch currently being drained, if any.
    pub fn front_mut(&mut self) -> Option<&mut BatchState<'a>> {
        self.batches.front_mut()
    }

    /// Drop the front batch once it's exhausted.
    pub fn pop_front(&mut self) -> Option<BatchState<'a>> {
        self.batches.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }
}

impl<'a> Default for FifoQueue<'a> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::array::BitMask;

    fn dummy_batch(arena: &Arena, id: u64) -> BatchState<'_> {
        BatchState {
            id,
            arena,
            columns: vec![],
            segmentby: vec![],
            mask: BitMask::new_all_ones(0),
            cursor: 0,
            len: 0,
            sort_key: None,
        }
    }

    #[test]
    fn pushes_and_pops_in_arrival_order() {
        let arena = Arena::with_capacity(4096);
        let mut queue = FifoQueue::new();
        queue.push(dummy_batch(&arena, 0));
        queue.push(dummy_batch(&arena, 1));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_front().unwrap().id, 0);
        assert_eq!(queue.pop_front().unwrap().id, 1);
        assert!(queue.is_empty());
    }
}
