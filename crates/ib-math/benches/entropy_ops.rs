//! Criterion benchmarks for `ib-math`.
//!
//! Focus on the kernels evaluated once per solver call in curve tracing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ib_math::{conditional_rows, marginal, mutual_information, normalize, renyi_entropy, Axis, Matrix};

fn synthetic_joint(n: usize) -> Matrix {
    let weights: Vec<f64> = (0..n * n)
        .map(|i| {
            let (r, c) = (i / n, i % n);
            1.0 / (1.0 + (r as f64 - c as f64).abs())
        })
        .collect();
    let p = normalize(&weights).expect("positive weights");
    Matrix::new(n, n, p).expect("square shape")
}

fn bench_information(c: &mut Criterion) {
    let mut group = c.benchmark_group("information");

    for n in [4usize, 32, 128] {
        let pxy = synthetic_joint(n);
        let px = marginal(&pxy, Axis::Rows).expect("mass");
        let pygx = conditional_rows(&pxy);

        group.bench_with_input(BenchmarkId::new("mutual_information", n), &n, |b, _| {
            b.iter(|| black_box(mutual_information(black_box(&pygx), black_box(&px))));
        });

        group.bench_with_input(BenchmarkId::new("renyi_entropy", n), &n, |b, _| {
            b.iter(|| black_box(renyi_entropy(black_box(&px), black_box(2.0))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_information);
criterion_main!(benches);
