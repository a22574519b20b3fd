// Validation Engine Performance Benchmarks
// Exercises the hot paths a protected call pays for on every request:
// profiling a sample, generating a standard from it, and scoring a
// dataset of varying size against that standard.

use adri::generator::{GeneratorConfig, StandardGenerator};
use adri::profiler::DataProfiler;
use adri::validation::ValidationEngine;
use adri::value::{Cell, Column, Dataset};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn synthetic_customers(row_count: usize) -> Dataset {
    let ids = (0..row_count as i64).map(Cell::Integer).collect();
    let emails = (0..row_count)
        .map(|i| Cell::Text(format!("user{i}@example.com")))
        .collect();
    let ages = (0..row_count)
        .map(|i| Cell::Integer(18 + (i % 60) as i64))
        .collect();
    let status = (0..row_count)
        .map(|i| Cell::Text(if i % 3 == 0 { "active".into() } else { "inactive".into() }))
        .collect();

    Dataset::new(vec![
        Column::new("customer_id", ids),
        Column::new("email", emails),
        Column::new("age", ages),
        Column::new("status", status),
    ])
}

fn bench_profile(c: &mut Criterion) {
    let mut group = c.benchmark_group("profile");
    for row_count in [100usize, 10_000, 100_000] {
        let data = synthetic_customers(row_count);
        group.bench_with_input(BenchmarkId::new("profile", row_count), &data, |b, data| {
            let profiler = DataProfiler::new();
            b.iter(|| black_box(profiler.profile(black_box(data))));
        });
    }
    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_standard");
    for row_count in [100usize, 10_000] {
        let data = synthetic_customers(row_count);
        group.bench_with_input(BenchmarkId::new("generate", row_count), &data, |b, data| {
            let generator = StandardGenerator::new(GeneratorConfig::default());
            b.iter(|| black_box(generator.generate("customers", black_box(data))));
        });
    }
    group.finish();
}

fn bench_assess(c: &mut Criterion) {
    let mut group = c.benchmark_group("assess");
    for row_count in [100usize, 10_000, 100_000] {
        let data = synthetic_customers(row_count);
        let standard = StandardGenerator::new(GeneratorConfig::default()).generate("customers", &data);
        group.bench_with_input(BenchmarkId::new("assess", row_count), &(data, standard), |b, (data, standard)| {
            let engine = ValidationEngine::new();
            b.iter(|| black_box(engine.assess(black_box(data), black_box(standard))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_profile, bench_generate, bench_assess);
criterion_main!(benches);
