//! Operator-level scenarios: a compressed child feeding rows through
//! scan, filter, sort-merge, and aggregate configurations.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use decompress_exec::{
    build_column_table, classify_predicates, AggregateRequest, AggregateTarget, CmpOp,
    CodecRegistry, CodecTag, ColumnDescriptor, ColumnKind, CompressedBatchSource,
    CompressedColumnBytes, CompressedRow, DecompressOperator, GlobalContext, LogicalType,
    MetricsCollector, NullsOrder, OperandOrder, OperatorConfig, OrderColumn, PredicateSpec,
    ScalarValue, SortDirection, SortInfo, VectorQualGate, NO_OUTPUT,
};

struct VecSource {
    rows: Vec<CompressedRow>,
    cursor: usize,
}

impl VecSource {
    fn new(rows: Vec<CompressedRow>) -> Self {
        Self { rows, cursor: 0 }
    }
}

impl CompressedBatchSource for VecSource {
    fn open(&mut self) -> decompress_exec::Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn next_row(&mut self) -> decompress_exec::Result<Option<CompressedRow>> {
        if self.cursor >= self.rows.len() {
            return Ok(None);
        }
        let row = self.rows[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(row))
    }

    fn rescan(&mut self) -> decompress_exec::Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn close(&mut self) -> decompress_exec::Result<()> {
        Ok(())
    }
}

fn encode_plain_i32(values: &[i32]) -> Vec<u8> {
    let words = (values.len() + 63) / 64;
    let bitmap = vec![u64::MAX; words];
    let mut out = Vec::new();
    for w in bitmap {
        out.extend_from_slice(&w.to_le_bytes());
    }
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn one_int32_column_table() -> decompress_exec::ColumnTable {
    build_column_table(vec![
        ColumnDescriptor {
            input_position: 0,
            output_position: NO_OUTPUT,
            kind: ColumnKind::MetadataCount,
            logical_type: LogicalType::Opaque,
            value_width_bytes: 0,
            bulk_ok: false,
            name: "count".into(),
        },
        ColumnDescriptor {
            input_position: 1,
            output_position: 0,
            kind: ColumnKind::Compressed,
            logical_type: LogicalType::Int32,
            value_width_bytes: 4,
            bulk_ok: true,
            name: "reading".into(),
        },
    ])
    .unwrap()
}

fn row_from(values: &[i32]) -> CompressedRow {
    CompressedRow {
        segmentby: vec![],
        compressed: vec![CompressedColumnBytes {
            codec: CodecTag::Plain,
            bytes: encode_plain_i32(values),
        }],
        count: values.len(),
        sequence: None,
        sort_key: None,
    }
}

fn default_ctx() -> GlobalContext {
    GlobalContext::new(
        OperatorConfig::default(),
        Arc::new(CodecRegistry::with_reference_codecs()),
    )
}

#[test]
fn plain_scan_emits_every_row_in_batch_order() {
    let table = one_int32_column_table();
    let child = VecSource::new(vec![row_from(&[1, 2, 3]), row_from(&[4, 5])]);
    let mut op = DecompressOperator::new(
        child,
        table,
        classify_predicates(&one_int32_column_table(), vec![]),
        None,
        None,
        default_ctx(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(MetricsCollector::new()),
    )
    .unwrap();
    op.open().unwrap();
    let mut values = vec![];
    while let Some(row) = op.next().unwrap() {
        if let ScalarValue::Int32(v) = row.get(0).unwrap() {
            values.push(*v);
        }
    }
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
    op.close().unwrap();
}

#[test]
fn vectorized_qualifier_filters_rows_across_batches() {
    let table = one_int32_column_table();
    let predicates = vec![PredicateSpec {
        column_name: "reading".into(),
        op: CmpOp::Gt,
        constant: ScalarValue::Int32(3),
        order: OperandOrder::ColumnLeft,
    }];
    let classified = classify_predicates(&table, predicates);
    assert_eq!(classified.vectorized.len(), 1);
    let child = VecSource::new(vec![row_from(&[1, 5, 2]), row_from(&[4, 0, 10])]);
    let mut op = DecompressOperator::new(
        child,
        table,
        classified,
        None,
        None,
        default_ctx(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(MetricsCollector::new()),
    )
    .unwrap();
    op.open().unwrap();
    let mut values = vec![];
    while let Some(row) = op.next().unwrap() {
        if let ScalarValue::Int32(v) = row.get(0).unwrap() {
            values.push(*v);
        }
    }
    assert_eq!(values, vec![5, 4, 10]);
}

#[test]
fn all_rows_filtered_out_of_a_batch_advances_cleanly() {
    let table = one_int32_column_table();
    let predicates = vec![PredicateSpec {
        column_name: "reading".into(),
        op: CmpOp::Gt,
        constant: ScalarValue::Int32(1000),
        order: OperandOrder::ColumnLeft,
    }];
    let classified = classify_predicates(&table, predicates);
    let child = VecSource::new(vec![row_from(&[1, 2, 3]), row_from(&[4, 5])]);
    let mut op = DecompressOperator::new(
        child,
        table,
        classified,
        None,
        None,
        default_ctx(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(MetricsCollector::new()),
    )
    .unwrap();
    op.open().unwrap();
    assert!(op.next().unwrap().is_none());
}

#[test]
fn vectorized_aggregate_sums_across_all_batches_without_row_output() {
    let table = one_int32_column_table();
    let child = VecSource::new(vec![row_from(&[1, 2, 3]), row_from(&[4, 5])]);
    let mut op = DecompressOperator::new(
        child,
        table,
        classify_predicates(&one_int32_column_table(), vec![]),
        None,
        Some(AggregateRequest {
            target: AggregateTarget::Compressed(0),
        }),
        default_ctx(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(MetricsCollector::new()),
    )
    .unwrap();
    op.open().unwrap();
    let row = op.next().unwrap().expect("one aggregate row");
    assert_eq!(row.get(0), Some(&ScalarValue::Int64(15)));
    assert!(op.next().unwrap().is_none());
}

fn segmentby_only_table() -> decompress_exec::ColumnTable {
    build_column_table(vec![
        ColumnDescriptor {
            input_position: 0,
            output_position: NO_OUTPUT,
            kind: ColumnKind::MetadataCount,
            logical_type: LogicalType::Opaque,
            value_width_bytes: 0,
            bulk_ok: false,
            name: "count".into(),
        },
        ColumnDescriptor {
            input_position: 1,
            output_position: 0,
            kind: ColumnKind::Segmentby,
            logical_type: LogicalType::Int32,
            value_width_bytes: 4,
            bulk_ok: false,
            name: "v".into(),
        },
    ])
    .unwrap()
}

fn segmentby_row(v: i32, count: usize) -> CompressedRow {
    CompressedRow {
        segmentby: vec![ScalarValue::Int32(v)],
        compressed: vec![],
        count,
        sequence: None,
        sort_key: None,
    }
}

#[test]
fn segmentby_aggregate_multiplies_value_by_batch_count() {
    let table = segmentby_only_table();
    let child = VecSource::new(vec![segmentby_row(3, 1000)]);
    let mut op = DecompressOperator::new(
        child,
        table,
        classify_predicates(&segmentby_only_table(), vec![]),
        None,
        Some(AggregateRequest {
            target: AggregateTarget::Segmentby(0),
        }),
        default_ctx(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(MetricsCollector::new()),
    )
    .unwrap();
    op.open().unwrap();
    let row = op.next().unwrap().expect("one aggregate row");
    assert_eq!(row.get(0), Some(&ScalarValue::Int64(3000)));
}

#[test]
fn segmentby_aggregate_overflow_surfaces_as_an_error() {
    let table = segmentby_only_table();
    let child = VecSource::new(vec![segmentby_row(i32::MAX, 5_000_000_000)]);
    let mut op = DecompressOperator::new(
        child,
        table,
        classify_predicates(&segmentby_only_table(), vec![]),
        None,
        Some(AggregateRequest {
            target: AggregateTarget::Segmentby(0),
        }),
        default_ctx(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(MetricsCollector::new()),
    )
    .unwrap();
    op.open().unwrap();
    assert!(op.next().is_err());
}

#[test]
fn require_vector_qual_rejects_unvectorizable_predicates() {
    let table = one_int32_column_table();
    let predicates = vec![PredicateSpec {
        column_name: "nonexistent".into(),
        op: CmpOp::Eq,
        constant: ScalarValue::Int32(1),
        order: OperandOrder::ColumnLeft,
    }];
    let classified = classify_predicates(&table, predicates);
    let mut ctx = default_ctx();
    ctx.config.require_vector_qual = VectorQualGate::Require;
    let child = VecSource::new(vec![row_from(&[1])]);
    let result = DecompressOperator::new(
        child,
        table,
        classified,
        None,
        None,
        ctx,
        Arc::new(AtomicBool::new(false)),
        Arc::new(MetricsCollector::new()),
    );
    assert!(result.is_err());
}

#[test]
fn cancellation_flag_stops_the_scan() {
    let table = one_int32_column_table();
    let child = VecSource::new(vec![row_from(&[1, 2, 3]), row_from(&[4, 5])]);
    let cancel = Arc::new(AtomicBool::new(false));
    let mut op = DecompressOperator::new(
        child,
        table,
        classify_predicates(&one_int32_column_table(), vec![]),
        None,
        None,
        default_ctx(),
        cancel.clone(),
        Arc::new(MetricsCollector::new()),
    )
    .unwrap();
    op.open().unwrap();
    assert!(op.next().unwrap().is_some());
    cancel.store(true, std::sync::atomic::Ordering::Relaxed);
    assert!(op.next().is_err());
}

#[test]
fn rescan_restarts_from_the_beginning() {
    let table = one_int32_column_table();
    let child = VecSource::new(vec![row_from(&[1, 2])]);
    let mut op = DecompressOperator::new(
        child,
        table,
        classify_predicates(&one_int32_column_table(), vec![]),
        None,
        None,
        default_ctx(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(MetricsCollector::new()),
    )
    .unwrap();
    op.open().unwrap();
    assert!(op.next().unwrap().is_some());
    assert!(op.next().unwrap().is_some());
    assert!(op.next().unwrap().is_none());
    op.rescan().unwrap();
    assert!(op.next().unwrap().is_some());
}

#[test]
fn explain_reports_vectorization_and_batch_counts() {
    let table = one_int32_column_table();
    let predicates = vec![PredicateSpec {
        column_name: "reading".into(),
        op: CmpOp::Ge,
        constant: ScalarValue::Int32(0),
        order: OperandOrder::ColumnLeft,
    }];
    let classified = classify_predicates(&table, predicates);
    let child = VecSource::new(vec![row_from(&[1, 2, 3])]);
    let mut op = DecompressOperator::new(
        child,
        table,
        classified,
        None,
        None,
        default_ctx(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(MetricsCollector::new()),
    )
    .unwrap();
    op.open().unwrap();
    while op.next().unwrap().is_some() {}
    let info = op.explain();
    assert_eq!(info.vectorized_qual_count, 1);
    assert_eq!(info.row_at_a_time_qual_count, 0);
    assert_eq!(info.batches_read, 1);
    assert_eq!(info.rows_emitted, 3);
    let json = info.to_json().unwrap();
    assert!(json.contains("\"vectorized_qual_count\":1"));
}

fn two_int32_column_table() -> decompress_exec::ColumnTable {
    build_column_table(vec![
        ColumnDescriptor {
            input_position: 0,
            output_position: NO_OUTPUT,
            kind: ColumnKind::MetadataCount,
            logical_type: LogicalType::Opaque,
            value_width_bytes: 0,
            bulk_ok: false,
            name: "count".into(),
        },
        ColumnDescriptor {
            input_position: 1,
            output_position: 0,
            kind: ColumnKind::Compressed,
            logical_type: LogicalType::Int32,
            value_width_bytes: 4,
            bulk_ok: true,
            name: "reading".into(),
        },
        ColumnDescriptor {
            input_position: 2,
            output_position: 1,
            kind: ColumnKind::Compressed,
            logical_type: LogicalType::Int32,
            value_width_bytes: 4,
            bulk_ok: false,
            name: "flag".into(),
        },
    ])
    .unwrap()
}

fn two_column_row(reading: &[i32], flag: &[i32]) -> CompressedRow {
    CompressedRow {
        segmentby: vec![],
        compressed: vec![
            CompressedColumnBytes {
                codec: CodecTag::Plain,
                bytes: encode_plain_i32(reading),
            },
            CompressedColumnBytes {
                codec: CodecTag::Plain,
                bytes: encode_plain_i32(flag),
            },
        ],
        count: reading.len(),
        sequence: None,
        sort_key: None,
    }
}

#[test]
fn residual_predicate_filters_rows_after_vectorized_qualifier() {
    let table = two_int32_column_table();
    let predicates = vec![
        PredicateSpec {
            column_name: "reading".into(),
            op: CmpOp::Ge,
            constant: ScalarValue::Int32(0),
            order: OperandOrder::ColumnLeft,
        },
        PredicateSpec {
            column_name: "flag".into(),
            op: CmpOp::Eq,
            constant: ScalarValue::Int32(1),
            order: OperandOrder::ColumnLeft,
        },
    ];
    let classified = classify_predicates(&table, predicates);
    assert_eq!(classified.vectorized.len(), 1);
    assert_eq!(classified.row_at_a_time.len(), 1);
    let child = VecSource::new(vec![two_column_row(&[10, 20, 30], &[0, 1, 1])]);
    let mut op = DecompressOperator::new(
        child,
        table,
        classified,
        None,
        None,
        default_ctx(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(MetricsCollector::new()),
    )
    .unwrap();
    op.open().unwrap();
    let mut values = vec![];
    while let Some(row) = op.next().unwrap() {
        if let ScalarValue::Int32(v) = row.get(0).unwrap() {
            values.push(*v);
        }
    }
    assert_eq!(values, vec![20, 30]);
}

#[test]
fn sorted_merge_interleaves_overlapping_batches_by_current_row() {
    let table = one_int32_column_table();
    let predicates = vec![];
    let classified = classify_predicates(&table, predicates);
    // batch A: [1, 4, 7], batch B: [2, 3, 8] — overlapping windows must
    // interleave into 1,2,3,4,7,8 rather than draining A before B opens.
    let child = VecSource::new(vec![row_from(&[1, 4, 7]), row_from(&[2, 3, 8])]);
    let sort = Some((
        SortInfo {
            direction: SortDirection::Ascending,
            nulls: NullsOrder::First,
        },
        OrderColumn::Compressed(0),
    ));
    let mut op = DecompressOperator::new(
        child,
        table,
        classified,
        sort,
        None,
        default_ctx(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(MetricsCollector::new()),
    )
    .unwrap();
    op.open().unwrap();
    let mut values = vec![];
    while let Some(row) = op.next().unwrap() {
        if let ScalarValue::Int32(v) = row.get(0).unwrap() {
            values.push(*v);
        }
    }
    assert_eq!(values, vec![1, 2, 3, 4, 7, 8]);
}
