//! Benchmarks for gitradar core operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gitradar::core::{
    qualifying_tags, AggregateView, Analysis, RelPath, ResolutionError, Stage, StageResult,
};

/// Release-style tags with some noise the filter should drop.
fn generate_tags(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| match i % 10 {
            0 => format!("v{}.{}.{}-stable", i / 100, (i / 10) % 10, i % 10),
            1 => format!("showcase-{}", i),
            _ => format!("v{}.{}.{}", i / 100, (i / 10) % 10, i % 10),
        })
        .collect()
}

/// Stage file sets of `n` paths each with partial overlap.
fn generate_analysis(n: usize) -> Analysis {
    let stage_files = |offset: usize| {
        StageResult::with_files(
            (offset..offset + n).map(|i| RelPath::new(format!("src/module_{}/file_{}.rs", i % 37, i))),
        )
    };
    Analysis::from_outcomes([
        Ok(stage_files(0)),
        Ok(stage_files(n / 2)),
        Ok(stage_files(n)),
        Ok(stage_files(n * 3 / 2)),
        Ok(stage_files(n * 2)),
        Ok(stage_files(n * 5 / 2)),
        Err(ResolutionError::InsufficientTags { needed: 3, found: 2 }),
    ])
}

fn bench_qualifying_tags(c: &mut Criterion) {
    let mut group = c.benchmark_group("qualifying_tags");
    let exclude = vec!["stable".to_string(), "show".to_string()];

    for size in [100, 1_000, 10_000] {
        let tags = generate_tags(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &tags, |b, tags| {
            b.iter(|| qualifying_tags(black_box(tags.as_slice()), black_box(exclude.as_slice())));
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("AggregateView::build");

    for size in [100, 1_000, 10_000] {
        let analysis = generate_analysis(size);
        group.throughput(Throughput::Elements((size * Stage::COUNT) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &analysis, |b, analysis| {
            b.iter(|| AggregateView::build(black_box(analysis)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_qualifying_tags, bench_aggregate);
criterion_main!(benches);
