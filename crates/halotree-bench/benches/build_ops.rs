//! Criterion micro-benchmarks for catalog reading and forest construction.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use halotree_bench::{identity_mapping, lineage_profile, reference_profile};
use halotree_catalog::CatalogSource;
use halotree_collective::SingleRank;
use halotree_core::LogContext;
use halotree_forest::TreeBuilder;
use halotree_test_utils::MemorySource;

/// Benchmark: decode one snapshot of the reference profile.
fn bench_read_snapshot(c: &mut Criterion) {
    let ds = reference_profile();
    let source = MemorySource::new(&ds).unwrap();
    let step = ds.config().read_step;

    c.bench_function("read_snapshot_256", |b| {
        b.iter(|| {
            let reader = source.open_snapshot(0, 0, step).unwrap();
            let mut particles = 0i64;
            for group in reader.groups() {
                let group = group.unwrap();
                particles += i64::from(group.particles);
            }
            black_box(particles);
        });
    });
}

/// Benchmark: full build of the reference profile.
fn bench_build_reference(c: &mut Criterion) {
    let ds = reference_profile();
    let source = MemorySource::new(&ds).unwrap();
    let log = LogContext::silent();
    let builder = TreeBuilder::new(ds.config().clone(), identity_mapping(&ds), &log);

    c.bench_function("build_reference_32x256", |b| {
        b.iter(|| {
            let trees = builder.build(&source, &mut SingleRank::new()).unwrap();
            black_box(trees.arena().len());
        });
    });
}

/// Benchmark: full build with pointer resolution and classification.
fn bench_build_lineage(c: &mut Criterion) {
    let ds = lineage_profile(32, 256);
    let source = MemorySource::new(&ds).unwrap();
    let log = LogContext::silent();
    let builder = TreeBuilder::new(ds.config().clone(), identity_mapping(&ds), &log);

    c.bench_function("build_lineage_32x256", |b| {
        b.iter(|| {
            let trees = builder.build(&source, &mut SingleRank::new()).unwrap();
            black_box(trees.case_digest());
        });
    });
}

criterion_group!(
    benches,
    bench_read_snapshot,
    bench_build_reference,
    bench_build_lineage
);
criterion_main!(benches);
