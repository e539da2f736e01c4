//! B+tree index benchmarks for pagetree
//!
//! Measures the operations a select drives: inserts during load, point
//! lookups, and range scans over the leaf chain.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pagetree::index::btree::{BTreeIndex, IndexOptions};
use pagetree::storage::OpenMode;
use pagetree::{PageId, RecordId};
use tempfile::{tempdir, TempDir};

fn rid(i: u32) -> RecordId {
    RecordId::new(PageId::new(i / 38), i % 38)
}

/// Deterministic permutation of `0..count`.
fn shuffled(count: u32) -> Vec<i32> {
    const STRIDE: u64 = 7919;
    (0..count as u64)
        .map(|i| ((i * STRIDE) % count as u64) as i32)
        .collect()
}

fn build_index(keys: &[i32]) -> (TempDir, BTreeIndex) {
    let dir = tempdir().unwrap();
    let mut index = BTreeIndex::open_with(
        dir.path().join("bench.idx"),
        OpenMode::Write,
        IndexOptions::default(),
    )
    .unwrap();
    for (i, &k) in keys.iter().enumerate() {
        index.insert(k, rid(i as u32)).unwrap();
    }
    (dir, index)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_insert");

    for count in [1_000u32, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("sequential", count), count, |b, &count| {
            let keys: Vec<i32> = (0..count as i32).collect();
            b.iter_with_setup(|| keys.clone(), |keys| build_index(black_box(&keys)));
        });

        group.bench_with_input(BenchmarkId::new("shuffled", count), count, |b, &count| {
            let keys = shuffled(count);
            b.iter_with_setup(|| keys.clone(), |keys| build_index(black_box(&keys)));
        });
    }

    group.finish();
}

fn bench_locate(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_locate");
    let count = 10_000u32;
    let (_dir, mut index) = build_index(&shuffled(count));
    let lookups = shuffled(count);

    group.throughput(Throughput::Elements(1));
    group.bench_function("hit", |b| {
        let mut i = 0;
        b.iter(|| {
            let key = lookups[i % lookups.len()];
            i += 1;
            black_box(index.locate(black_box(key)).unwrap())
        });
    });

    group.bench_function("miss", |b| {
        let mut i = 0i32;
        b.iter(|| {
            i = i.wrapping_add(1);
            black_box(index.locate(black_box(count as i32 + i)).unwrap())
        });
    });

    group.finish();
}

fn bench_range_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_range_scan");
    let (_dir, mut index) = build_index(&shuffled(50_000));

    for width in [100i32, 10_000].iter() {
        group.throughput(Throughput::Elements(*width as u64));
        group.bench_with_input(BenchmarkId::new("width", width), width, |b, &width| {
            b.iter(|| {
                let scanned = index
                    .range(black_box(20_000), black_box(20_000 + width - 1))
                    .unwrap()
                    .map(|r| r.unwrap())
                    .count();
                black_box(scanned)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_locate, bench_range_scan);
criterion_main!(benches);
