//! Batch queues.
//!
//! Two queue disciplines sit between the child and the row cursor: plain
//! FIFO when the query doesn't need sorted output, and a K-way
//! heap-merge when it does.

mod fifo;
mod heap;

pub use fifo::FifoQueue;
pub use heap::HeapQueue;
