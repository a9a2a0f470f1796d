use criterion::{black_box, criterion_group, criterion_main, Criterion};

use decompress_exec::{
    qual::evaluate_into, BitMask, CmpOp, ColumnArray, Qual, ScalarValue, Validity, N_MAX,
};

fn bench_vectorized_qual(c: &mut Criterion) {
    let values: Vec<i32> = (0..N_MAX as i32).collect();
    let words = vec![u64::MAX; N_MAX / 64];
    let validity = Validity::from_words(&words, N_MAX);
    let array = ColumnArray::Int32 {
        values: &values,
        validity,
    };
    let qual = Qual {
        compressed_index: 0,
        op: CmpOp::Gt,
        constant: ScalarValue::Int32(N_MAX as i32 / 2),
    };

    c.bench_function("vectorized_qual_int32_n_max", |b| {
        b.iter(|| {
            let mut mask = BitMask::new_all_ones(N_MAX);
            evaluate_into(black_box(&qual), black_box(&array), &mut mask);
            black_box(mask.count_set())
        });
    });
}

fn bench_vectorized_sum(c: &mut Criterion) {
    use decompress_exec::SumAccumulator;

    let values: Vec<i32> = (0..N_MAX as i32).collect();
    let words = vec![u64::MAX; N_MAX / 64];
    let validity = Validity::from_words(&words, N_MAX);
    let array = ColumnArray::Int32 {
        values: &values,
        validity,
    };
    let mask = BitMask::new_all_ones(N_MAX);

    c.bench_function("vectorized_sum_int32_n_max", |b| {
        b.iter(|| {
            let mut acc = SumAccumulator::zero_for(&array);
            acc.accumulate(black_box(&array), black_box(&mask)).unwrap();
            black_box(acc.as_scalar())
        });
    });
}

criterion_group!(benches, bench_vectorized_qual, bench_vectorized_sum);
criterion_main!(benches);
