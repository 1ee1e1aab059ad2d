//! Criterion benchmarks for output scoring.
//!
//! Scores identical, partially differing and type-mismatched outputs at a few
//! sizes, which bounds how much verification adds to each kernel run.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use mokt_common::HostArray;
use mokt_verify::{score_with, Tolerance};

fn ramp(n: usize) -> Vec<f32> {
    (0..n).map(|i| (i as f32) * 0.001 - 0.5).collect()
}

// ---------------------------------------------------------------------------
// Identical outputs
// ---------------------------------------------------------------------------

fn bench_equal(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_equal");

    for n in [1 << 10, 1 << 16, 1 << 20] {
        let expected = HostArray::from(ramp(n));
        let actual = expected.clone();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| score_with(black_box(&expected), black_box(&actual), Tolerance::default()))
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Every 16th element nudged by 1e-3
// ---------------------------------------------------------------------------

fn bench_sparse_mismatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_sparse_mismatch");

    for n in [1 << 10, 1 << 16, 1 << 20] {
        let values = ramp(n);
        let expected = HostArray::from(values.clone());
        let actual: Vec<f32> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| if i % 16 == 0 { v + 1e-3 } else { v })
            .collect();
        let actual = HostArray::from(actual);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| score_with(black_box(&expected), black_box(&actual), Tolerance::default()))
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Mixed element types (widened to f64)
// ---------------------------------------------------------------------------

fn bench_mixed_types(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_mixed_types");

    for n in [1 << 10, 1 << 16] {
        let expected = HostArray::from((0..n as i32).collect::<Vec<_>>());
        let actual = HostArray::from((0..n).map(|i| i as f32).collect::<Vec<_>>());
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| score_with(black_box(&expected), black_box(&actual), Tolerance::default()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_equal, bench_sparse_mismatch, bench_mixed_types);
criterion_main!(benches);
