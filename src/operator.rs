//! The decompression execution operator: a pull-based, single-threaded
//! iterator (`open`/`next`/`rescan`/`close`) that sits between a
//! compressed-batch child and the row consumer above it, plus an
//! explain hook reporting which parts of the plan vectorized.
//!
//! State machine: `Init -> Running -> Drained`, with `close()` reachable
//! from any state.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::aggregate::SumAccumulator;
use crate::arena::{arena_target_bytes, Arena};
use crate::array::ColumnArray;
use crate::batch::{BatchIdAllocator, BatchState};
use crate::child::CompressedBatchSource;
use crate::column::ColumnTable;
use crate::config::{GlobalContext, SortedMergeGate, VectorQualGate};
use crate::error::{OperatorError, Result};
use crate::metrics::MetricsCollector;
use crate::planner::{self, ClassifiedPredicates};
use crate::qual::Qual;
use crate::queue::{FifoQueue, HeapQueue};
use crate::row::Row;
use crate::scalar::ScalarValue;
use crate::sort::{OrderColumn, SortInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperatorState {
    Init,
    Running,
    Drained,
    Closed,
}

/// A decoded batch bundled with the arena its `ColumnArray`s borrow
/// from. The arena is boxed so its backing storage has a stable address
/// across moves of `OwnedBatch` itself; `state`'s slices are erased to
/// `'static` and are only ever read while this struct (and therefore the
/// arena) is alive. This is the standard pattern for pairing a bump
/// arena with the values it owns when the two can't be expressed with a
/// single named lifetime.
struct OwnedBatch {
    state: BatchState<'static>,
    _arena: Box<Arena>,
}

impl OwnedBatch {
    fn new(
        id: u64,
        row: &crate::child::CompressedRow,
        table: &ColumnTable,
        ctx: &GlobalContext,
        quals: &[Qual],
        bulk_qual_eval: bool,
    ) -> Result<Self> {
        let widths: Vec<usize> = table
            .compressed()
            .iter()
            .filter_map(|d| d.logical_type.value_width_bytes())
            .collect();
        let arena = Box::new(Arena::with_capacity(arena_target_bytes(&widths)));
        let arena_ref: &Arena = &arena;
        // SAFETY: `arena` is boxed and not moved again; `arena_ref`'s
        // target therefore stays at a fixed address for the lifetime of
        // `OwnedBatch`. The erased lifetime is never exposed outside
        // this module without being re-tied to `&self`/`&mut self`.
        let arena_static: &'static Arena = unsafe { std::mem::transmute(arena_ref) };
        let state =
            BatchState::decode(id, arena_static, row, table, &ctx.codecs, quals, bulk_qual_eval)?;
        Ok(Self {
            state,
            _arena: arena,
        })
    }
}

enum Queue {
    Fifo(FifoQueue<'static>),
    Heap(HeapQueue<'static>),
}

/// Which column `SUM` is requested over.
#[derive(Debug, Clone, Copy)]
pub enum AggregateTarget {
    /// A bulk-decompressed column, by its dense-prefix index.
    Compressed(usize),
    /// A segmentby column, by its position among the table's segmentby
    /// columns; contributes `value * batch.len` per batch.
    Segmentby(usize),
}

/// Optional single vectorized aggregate this operator instance computes
/// instead of emitting per-row output.
pub struct AggregateRequest {
    pub target: AggregateTarget,
}

/// What `explain()` reports back to the consumer about how this operator
/// instance's plan executed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExplainInfo {
    pub bulk_decompression_enabled: bool,
    pub vectorized_aggregation_enabled: bool,
    pub vectorized_qual_count: usize,
    pub row_at_a_time_qual_count: usize,
    pub sorted_merge: bool,
    pub batches_read: usize,
    pub rows_emitted: usize,
}

impl ExplainInfo {
    /// `EXPLAIN (FORMAT JSON)`-style rendering of this operator's plan
    /// summary.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub struct DecompressOperator<S: CompressedBatchSource> {
    state: OperatorState,
    child: S,
    table: ColumnTable,
    classified: ClassifiedPredicates,
    sort: Option<(SortInfo, OrderColumn)>,
    aggregate: Option<AggregateRequest>,
    ctx: GlobalContext,
    queue: Option<Queue>,
    /// Arenas backing the batches currently in `queue`, keyed by batch
    /// id. An arena is dropped (freeing its memory) the moment its
    /// batch is popped off the queue as exhausted, rather than living
    /// for the whole scan.
    arena_pool: std::collections::HashMap<u64, Box<Arena>>,
    id_alloc: BatchIdAllocator,
    cancel: Arc<AtomicBool>,
    metrics: Arc<MetricsCollector>,
    batches_read: usize,
    rows_emitted: usize,
    aggregate_done: bool,
}

impl<S: CompressedBatchSource> DecompressOperator<S> {
    pub fn new(
        child: S,
        table: ColumnTable,
        classified: ClassifiedPredicates,
        sort: Option<(SortInfo, OrderColumn)>,
        aggregate: Option<AggregateRequest>,
        ctx: GlobalContext,
        cancel: Arc<AtomicBool>,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self> {
        if let VectorQualGate::Require = ctx.config.require_vector_qual {
            if !classified.row_at_a_time.is_empty() {
                return Err(OperatorError::ConfigGate(
                    "require_vector_qual is set but some predicates could not be vectorized"
                        .into(),
                ));
            }
        }
        if let VectorQualGate::Forbid = ctx.config.require_vector_qual {
            if !classified.vectorized.is_empty() {
                return Err(OperatorError::ConfigGate(
                    "require_vector_qual forbids vectorized predicates for this test".into(),
                ));
            }
        }
        if let SortedMergeGate::On = ctx.config.require_batch_sorted_merge {
            if sort.is_none() {
                return Err(OperatorError::ConfigGate(
                    "require_batch_sorted_merge is set but no sort order was requested".into(),
                ));
            }
        }
        if let Some(request) = &aggregate {
            let logical_type = match request.target {
                AggregateTarget::Compressed(index) => {
                    table.compressed().get(index).map(|d| d.logical_type)
                }
                AggregateTarget::Segmentby(index) => {
                    table.segmentby().nth(index).map(|d| d.logical_type)
                }
            };
            let supported = logical_type
                .map(SumAccumulator::supports_logical_type)
                .unwrap_or(false);
            if !supported {
                return Err(OperatorError::UnsupportedAggregate(
                    "sum() is not supported over this aggregate target's column type".into(),
                ));
            }
        }
        Ok(Self {
            state: OperatorState::Init,
            child,
            table,
            classified,
            sort,
            aggregate,
            ctx,
            queue: None,
            arena_pool: std::collections::HashMap::new(),
            id_alloc: BatchIdAllocator::default(),
            cancel,
            metrics,
            batches_read: 0,
            rows_emitted: 0,
            aggregate_done: false,
        })
    }

    #[instrument(skip(self))]
    pub fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.queue = Some(match self.sort {
            Some((info, order_column)) => Queue::Heap(HeapQueue::new(info, order_column)),
            None => Queue::Fifo(FifoQueue::new()),
        });
        self.state = OperatorState::Running;
        self.batches_read = 0;
        self.rows_emitted = 0;
        self.aggregate_done = false;
        info!("operator opened");
        Ok(())
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.load(AtomicOrdering::Relaxed) {
            return Err(OperatorError::Cancelled);
        }
        Ok(())
    }

    /// Pull and decode the next compressed batch from the child, without
    /// placing it anywhere; the caller decides whether it's queued for
    /// row-at-a-time consumption or folded straight into an aggregate.
    fn decode_next_batch(&mut self) -> Result<Option<OwnedBatch>> {
        let Some(row) = self.child.next_row()? else {
            return Ok(None);
        };
        let id = self.id_alloc.alloc();
        let bulk_qual_eval = self.ctx.config.enable_bulk_decompression.is_on();
        let owned = OwnedBatch::new(
            id,
            &row,
            &self.table,
            &self.ctx,
            &self.classified.vectorized,
            bulk_qual_eval,
        )?;
        self.metrics.record("batches_read", 1.0);
        self.metrics.record("rows_per_batch", owned.state.len as f64);
        self.batches_read += 1;
        debug!(batch_id = id, "batch pulled and decoded");
        Ok(Some(owned))
    }

    fn pull_one_batch(&mut self) -> Result<bool> {
        let Some(owned) = self.decode_next_batch()? else {
            return Ok(false);
        };
        let id = owned.state.id;
        let pushed = match self.queue.as_mut().expect("queue initialized in open()") {
            Queue::Fifo(q) => {
                q.push(owned.state);
                true
            }
            Queue::Heap(q) => q.push(owned.state),
        };
        if pushed {
            self.arena_pool.insert(id, owned._arena);
        }
        Ok(true)
    }

    /// When an aggregate was requested, drain the whole child up front
    /// and fold every batch's masked column into a single accumulator,
    /// bypassing row materialization entirely. Batches never need to be
    /// queued for this: each is decoded, folded, and dropped in turn.
    fn run_aggregate(&mut self) -> Result<Row> {
        let target = self
            .aggregate
            .as_ref()
            .expect("run_aggregate only called when aggregate is Some")
            .target;
        let vectorized = self.ctx.config.enable_vectorized_aggregation.is_on();
        let mut total: Option<SumAccumulator> = None;
        loop {
            self.check_cancelled()?;
            let Some(owned) = self.decode_next_batch()? else {
                break;
            };
            match target {
                AggregateTarget::Compressed(index) => {
                    if let Some(array) = owned.state.columns.get(index) {
                        accumulate_one(&mut total, array, &owned.state, vectorized)?;
                    }
                }
                AggregateTarget::Segmentby(index) => {
                    if let Some(&value) = owned.state.segmentby.get(index) {
                        if !value.is_null() {
                            if vectorized {
                                seed_scalar_accumulator(&mut total, &value)?
                                    .accumulate_scalar_repeated(value, owned.state.len)?;
                            } else {
                                for _ in 0..owned.state.len {
                                    seed_scalar_accumulator(&mut total, &value)?
                                        .accumulate_one_scalar(value)?;
                                }
                            }
                        }
                    }
                }
            }
        }
        let scalar = total.map(|a| a.as_scalar()).unwrap_or(ScalarValue::Null);
        self.rows_emitted = 1;
        self.metrics.record("rows_emitted", 1.0);
        Ok(Row::new(vec![scalar]))
    }

    /// Advance to the next output row, or `None` once the child and any
    /// buffered batches are exhausted.
    #[instrument(skip(self))]
    pub fn next(&mut self) -> Result<Option<Row>> {
        if self.state != OperatorState::Running {
            return Ok(None);
        }
        self.check_cancelled()?;

        if self.aggregate.is_some() {
            if self.aggregate_done {
                self.state = OperatorState::Drained;
                return Ok(None);
            }
            let row = self.run_aggregate()?;
            self.aggregate_done = true;
            return Ok(Some(row));
        }

        loop {
            self.check_cancelled()?;
            let batch_ptr: *mut BatchState<'static>;
            {
                let queue = self.queue.as_mut().expect("queue initialized in open()");
                let is_heap = matches!(queue, Queue::Heap(_));
                let maybe_batch = match queue {
                    Queue::Fifo(q) => q.front_mut(),
                    Queue::Heap(q) => q.front_mut(),
                };
                match maybe_batch {
                    Some(b) => batch_ptr = b as *mut _,
                    None => {
                        // The heap queue needs every remaining batch open
                        // at once to interleave correctly across their
                        // full sort-key windows; the FIFO queue only ever
                        // holds one.
                        let mut pulled_any = false;
                        if is_heap {
                            while self.pull_one_batch()? {
                                pulled_any = true;
                            }
                        } else {
                            pulled_any = self.pull_one_batch()?;
                        }
                        if !pulled_any {
                            self.state = OperatorState::Drained;
                            return Ok(None);
                        }
                        continue;
                    }
                }
            }
            // SAFETY: `batch_ptr` is derived from a borrow of `self.queue`
            // that has already ended; no other live borrow of `self`
            // aliases it concurrently, and it's used only to read the
            // row once below.
            let batch = unsafe { &mut *batch_ptr };
            if let Some(row_index) = batch.advance_to_next_match() {
                let row = materialize_row(batch, &self.table, row_index);
                // `batch` must not be touched again after this: resifting
                // may move it out of the queue's current slot.
                let queue = self.queue.as_mut().expect("queue initialized in open()");
                if let Queue::Heap(q) = queue {
                    q.resift_current();
                }
                if !planner::row_passes_residual(&self.table, &self.classified.row_at_a_time, &row)
                {
                    continue;
                }
                self.rows_emitted += 1;
                self.metrics.record("rows_emitted", 1.0);
                return Ok(Some(row));
            }
            // batch exhausted, drop it and loop to pull or promote next
            let queue = self.queue.as_mut().expect("queue initialized in open()");
            let dropped = match queue {
                Queue::Fifo(q) => q.pop_front(),
                Queue::Heap(q) => q.pop_exhausted(),
            };
            if let Some(dropped) = dropped {
                self.arena_pool.remove(&dropped.id);
            }
        }
    }

    #[instrument(skip(self))]
    pub fn rescan(&mut self) -> Result<()> {
        self.child.rescan()?;
        self.queue = Some(match self.sort {
            Some((info, order_column)) => Queue::Heap(HeapQueue::new(info, order_column)),
            None => Queue::Fifo(FifoQueue::new()),
        });
        self.arena_pool.clear();
        self.state = OperatorState::Running;
        self.batches_read = 0;
        self.rows_emitted = 0;
        self.aggregate_done = false;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if self.state == OperatorState::Closed {
            return Ok(());
        }
        self.child.close()?;
        self.queue = None;
        self.arena_pool.clear();
        self.state = OperatorState::Closed;
        warn_if_cancelled_unobserved(&self.cancel);
        Ok(())
    }

    pub fn explain(&self) -> ExplainInfo {
        ExplainInfo {
            bulk_decompression_enabled: self.ctx.config.enable_bulk_decompression.is_on(),
            vectorized_aggregation_enabled: self.ctx.config.enable_vectorized_aggregation.is_on(),
            vectorized_qual_count: self.classified.vectorized.len(),
            row_at_a_time_qual_count: self.classified.row_at_a_time.len(),
            sorted_merge: self.sort.is_some(),
            batches_read: self.batches_read,
            rows_emitted: self.rows_emitted,
        }
    }
}

fn warn_if_cancelled_unobserved(cancel: &Arc<AtomicBool>) {
    if cancel.load(AtomicOrdering::Relaxed) {
        warn!("operator closed after observing a cancellation request");
    }
}

/// Fold one batch's masked column into `total`, leaving it unseeded
/// (`None`) until a genuinely non-null, mask-surviving value is seen — an
/// all-null or fully-excluded column must never collapse the final sum to
/// zero. `vectorized` selects the whole-array path
/// (`enable_vectorized_aggregation` on) or a per-row scalar path (off),
/// both producing the same running total.
fn accumulate_one(
    total: &mut Option<SumAccumulator>,
    array: &ColumnArray<'_>,
    batch: &BatchState<'static>,
    vectorized: bool,
) -> Result<()> {
    if vectorized {
        let validity = array.validity();
        let has_contribution = (0..array.len()).any(|i| batch.mask.get(i) && validity.is_valid(i));
        if !has_contribution {
            return Ok(());
        }
        let acc = total.get_or_insert_with(|| SumAccumulator::zero_for(array));
        acc.accumulate(array, &batch.mask)
    } else {
        for i in 0..array.len() {
            if !batch.mask.get(i) {
                continue;
            }
            let value = array.get_scalar(i);
            if value.is_null() {
                continue;
            }
            let acc = total.get_or_insert_with(|| SumAccumulator::zero_for(array));
            acc.accumulate_one_scalar(value)?;
        }
        Ok(())
    }
}

/// Seed `total` from `seed_value`'s numeric kind if nothing has
/// contributed yet, returning the accumulator either way. Only called once
/// `seed_value` is already known non-null.
fn seed_scalar_accumulator<'t>(
    total: &'t mut Option<SumAccumulator>,
    seed_value: &ScalarValue,
) -> Result<&'t mut SumAccumulator> {
    if total.is_none() {
        let seed = SumAccumulator::zero_for_scalar(seed_value).ok_or_else(|| {
            OperatorError::UnsupportedAggregate("segmentby aggregate seed is null".into())
        })?;
        *total = Some(seed);
    }
    Ok(total.as_mut().expect("seeded immediately above"))
}

fn materialize_row(batch: &BatchState<'static>, table: &ColumnTable, row_index: usize) -> Row {
    let mut positioned: Vec<(i32, ScalarValue)> = Vec::new();
    for descriptor in table.all() {
        if descriptor.output_position < 0 {
            continue;
        }
        let value = match descriptor.kind {
            crate::column::ColumnKind::Segmentby => table
                .segmentby()
                .position(|d| std::ptr::eq(d, descriptor))
                .and_then(|i| batch.segmentby.get(i))
                .copied()
                .unwrap_or(ScalarValue::Null),
            crate::column::ColumnKind::Compressed => table
                .compressed_index_for_output(descriptor.output_position)
                .and_then(|i| batch.columns.get(i))
                .map(|array| array.get_scalar(row_index))
                .unwrap_or(ScalarValue::Null),
            _ => ScalarValue::Null,
        };
        positioned.push((descriptor.output_position, value));
    }
    positioned.sort_by_key(|(pos, _)| *pos);
    Row::new(positioned.into_iter().map(|(_, v)| v).collect())
}
