//! Micro-benchmarks for the computed table.
//!
//! These benchmarks measure the raw performance of cache operations
//! in isolation, without the overhead of diagram operations.
//!
//! Run with:
//! ```bash
//! cargo bench --bench cache_micro
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qmdd_rs::amplitude::AmpId;
use qmdd_rs::cache::{Cache, OpKey};
use qmdd_rs::edge::Edge;
use qmdd_rs::types::NodeId;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Generate deterministic random edges for reproducible benchmarks.
fn random_edges(seed: u64, count: usize) -> Vec<Edge> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let node = NodeId::new(rng.random_range(1..10000u32));
            let weight = if rng.random_bool(0.5) {
                AmpId::ONE
            } else {
                AmpId::new(rng.random_range(2..64u32))
            };
            Edge::new(node, weight)
        })
        .collect()
}

/// Generate sequential unit-weight edges (worst case for some hash functions).
fn sequential_edges(start: u32, count: usize) -> Vec<Edge> {
    (start..start + count as u32).map(|i| Edge::new(NodeId::new(i), AmpId::ONE)).collect()
}

fn make_keys(edges: &[Edge]) -> Vec<OpKey> {
    edges
        .chunks(2)
        .filter(|chunk| chunk.len() == 2)
        .enumerate()
        .map(|(i, chunk)| match i % 3 {
            0 => OpKey::add(chunk[0], chunk[1]),
            1 => OpKey::Multiply(chunk[0].node, chunk[1].node),
            _ => OpKey::Transpose(chunk[0].node),
        })
        .collect()
}

// ============================================================================
// Benchmark: Insert
// ============================================================================

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache/insert");

    for cache_bits in [14, 16, 18] {
        let size = 1 << cache_bits;
        let keys = make_keys(&random_edges(42, size * 2));
        let values = random_edges(123, keys.len());

        group.throughput(Throughput::Elements(keys.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("random", format!("2^{}", cache_bits)),
            &(keys, values),
            |b, (keys, values)| {
                b.iter_with_setup(
                    || Cache::<OpKey, Edge>::new(cache_bits),
                    |mut cache| {
                        for (key, value) in keys.iter().zip(values.iter()) {
                            cache.insert(*key, *value);
                        }
                        cache
                    },
                );
            },
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: Lookup
// ============================================================================

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache/lookup");

    for cache_bits in [14, 16, 18] {
        let size = 1 << cache_bits;
        let keys = make_keys(&random_edges(7, size));
        let mut cache = Cache::<OpKey, Edge>::new(cache_bits);
        for (key, value) in keys.iter().zip(random_edges(8, keys.len())) {
            cache.insert(*key, value);
        }
        // Half of the queried keys were never inserted.
        let mut queries = keys.clone();
        queries.extend(make_keys(&random_edges(9, size)));

        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("mixed", format!("2^{}", cache_bits)),
            &queries,
            |b, queries| {
                b.iter(|| queries.iter().filter(|key| cache.get(key).is_some()).count());
            },
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: Sequential keys
// ============================================================================

fn bench_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache/sequential");

    for cache_bits in [14, 16] {
        let size = 1 << cache_bits;
        let keys = make_keys(&sequential_edges(1, size * 2));
        let values = sequential_edges(1, keys.len());

        group.throughput(Throughput::Elements(keys.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("insert_lookup", format!("2^{}", cache_bits)),
            &(keys, values),
            |b, (keys, values)| {
                b.iter_with_setup(
                    || Cache::<OpKey, Edge>::new(cache_bits),
                    |mut cache| {
                        for (key, value) in keys.iter().zip(values.iter()) {
                            cache.insert(*key, *value);
                        }
                        keys.iter().filter(|key| cache.get(key).is_some()).count()
                    },
                );
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup, bench_sequential);
criterion_main!(benches);
