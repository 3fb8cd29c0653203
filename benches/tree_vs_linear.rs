use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sommatori::backend::MemoryBackend;
use sommatori::context::Context;
use sommatori::counters::{IntCounter, RangeCounter};
use sommatori::tree::TreeShape;

const POPULATED: i64 = 100_000;
const QUERY_WIDTHS: [i64; 4] = [10, 1_000, 10_000, 100_000];
const SHAPES: [(u32, u32); 4] = [(8, 2), (6, 3), (5, 4), (17, 1)];
const NUM_THREADS: usize = 8;
const INCREMENTS_PER_THREAD: i64 = 10_000;

fn kinds() -> Vec<(String, Option<TreeShape>)> {
    let mut kinds = vec![("linear".to_string(), None)];
    for (h, b) in SHAPES {
        if let Ok(shape) = TreeShape::new(h, b) {
            kinds.push((format!("tree({h},{b})"), Some(shape)));
        }
    }
    kinds
}

fn build(backend: &MemoryBackend, shape: Option<TreeShape>) -> IntCounter<&MemoryBackend> {
    match shape {
        Some(shape) => IntCounter::tree(backend, shape),
        None => IntCounter::linear(backend),
    }
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_sum");
    let ctx = Context::background();

    for (name, shape) in kinds() {
        let backend = MemoryBackend::new();
        let counter = build(&backend, shape);
        for at in 0..POPULATED {
            counter.increment(&ctx, at, 1).unwrap();
        }

        for width in QUERY_WIDTHS {
            group.bench_with_input(BenchmarkId::new(&name, width), &width, |b, &width| {
                let from = (POPULATED - width) / 2;
                b.iter(|| black_box(counter.query_sum(&ctx, from, from + width - 1).unwrap()))
            });
        }
    }

    group.finish();
}

fn bench_increment(c: &mut Criterion) {
    let mut group = c.benchmark_group("increment");
    let ctx = Context::background();

    for (name, shape) in kinds() {
        let backend = MemoryBackend::new();
        let counter = build(&backend, shape);
        let mut at = 0i64;
        group.bench_function(BenchmarkId::new(&name, "single"), |b| {
            b.iter(|| {
                at = (at + 7919) % POPULATED;
                counter.increment(&ctx, black_box(at), 1).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_concurrent_increment(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_increment");

    for (name, shape) in kinds() {
        group.bench_function(
            BenchmarkId::new(
                &name,
                format!("{}threads x {}iter", NUM_THREADS, INCREMENTS_PER_THREAD),
            ),
            |b| {
                b.iter(|| {
                    let backend = MemoryBackend::new();
                    let counter = build(&backend, shape);
                    thread::scope(|s| {
                        for t in 0..NUM_THREADS as i64 {
                            let counter = &counter;
                            s.spawn(move || {
                                let ctx = Context::background();
                                for i in 0..INCREMENTS_PER_THREAD {
                                    counter.increment(&ctx, t * INCREMENTS_PER_THREAD + i, 1).unwrap();
                                }
                            });
                        }
                    });
                    black_box(backend.len())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_query, bench_increment, bench_concurrent_increment);
criterion_main!(benches);
