use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fibheap::{FibHeap, Handle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::{cmp::Reverse, collections::BinaryHeap, hint::black_box};

const SIZES: [u64; 5] = [10, 100, 1000, 10000, 100000];

fn build_fibheap(size: u64) -> FibHeap<u64, u64> {
    (0..size).map(|i| (i, i)).collect()
}
fn build_binary_heap(size: u64) -> BinaryHeap<Reverse<u64>> {
    (0..size).map(Reverse).collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("bench_insert");
    for &size in &SIZES {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("FibHeap", size), &size, |b, &size| {
            b.iter(|| {
                let mut heap = FibHeap::new();
                (0..size).for_each(|i| {
                    heap.insert(black_box(i), i);
                });
            });
        });
        group.bench_with_input(BenchmarkId::new("BinaryHeap", size), &size, |b, &size| {
            b.iter(|| {
                let mut heap = BinaryHeap::new();
                (0..size).for_each(|i| heap.push(black_box(Reverse(i))));
            });
        });
    }
    group.finish();
}

fn bench_extract_min(c: &mut Criterion) {
    let mut group = c.benchmark_group("bench_extract_min");
    for &size in &SIZES {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("FibHeap", size), &size, |b, &size| {
            b.iter(|| {
                let mut heap = build_fibheap(size);
                while let Ok(entry) = heap.extract_min() {
                    black_box(entry);
                }
            });
        });
        group.bench_with_input(BenchmarkId::new("BinaryHeap", size), &size, |b, &size| {
            b.iter(|| {
                let mut heap = build_binary_heap(size);
                while let Some(entry) = heap.pop() {
                    black_box(entry);
                }
            });
        });
    }
    group.finish();
}

fn bench_decrease_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("bench_decrease_key");
    for &size in &SIZES {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("FibHeap", size), &size, |b, &size| {
            let mut rng = StdRng::seed_from_u64(size);
            b.iter(|| {
                let mut heap = FibHeap::new();
                let handles: Vec<Handle> =
                    (0..size).map(|i| heap.insert(size + i, i)).collect();
                // one extraction so decreases hit real trees, not a flat root ring
                heap.extract_min().unwrap();
                for _ in 0..size {
                    let h = handles[rng.random_range(0..handles.len())];
                    if let Ok((&key, _)) = heap.get(h) {
                        let new_key = key.saturating_sub(rng.random_range(0..size));
                        heap.decrease_key(h, new_key).unwrap();
                    }
                }
                black_box(heap.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_extract_min, bench_decrease_key);
criterion_main!(benches);
