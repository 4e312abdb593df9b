//! Diagram-level benchmarks.
//!
//! Circuit construction exercises multiply and add through the computed
//! table; sifting exercises the swap primitive.
//!
//! Run with:
//! ```bash
//! cargo bench --bench qmdd_ops
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use qmdd_rs::edge::Edge;
use qmdd_rs::gate::{Control, Gate, GateKind, Side};
use qmdd_rs::qmdd::Qmdd;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// Helper: a ladder of entangling gates
// ============================================================================

/// H on every line, then a CNOT chain and a T layer, repeated `depth` times.
fn build_ladder(qmdd: &Qmdd, n: usize, depth: usize) -> Edge {
    let vars = qmdd.add_vars(n);
    let mut e = qmdd.identity();
    let mut push = |gate: Gate| {
        let next = qmdd.apply_gate(e, &gate, Side::Left).unwrap();
        qmdd.incref(next).unwrap();
        qmdd.decref(e).unwrap();
        e = next;
    };
    for &v in &vars {
        push(Gate::single(GateKind::H, v));
    }
    for _ in 0..depth {
        for w in vars.windows(2) {
            push(Gate::cnot(w[0], w[1]));
        }
        for &v in &vars {
            push(Gate::single(GateKind::T, v));
        }
    }
    e
}

/// `len` deterministic random Clifford+T gates, one target and up to two controls each.
fn random_circuit(qmdd: &Qmdd, n: usize, len: usize, seed: u64) -> Edge {
    const KINDS: [GateKind; 5] = [GateKind::X, GateKind::H, GateKind::S, GateKind::T, GateKind::Z];
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let vars = qmdd.add_vars(n);
    let mut e = qmdd.identity();
    for _ in 0..len {
        let mut lines = vars.clone();
        lines.shuffle(&mut rng);
        let controls = rng.random_range(0..=2.min(n - 1));
        let kind = KINDS[rng.random_range(0..KINDS.len())];
        let controls: Vec<Control> = lines[1..=controls].iter().map(|&v| Control::pos(v)).collect();
        let gate = Gate::controlled(kind, controls, lines[0]);
        let next = qmdd.apply_gate(e, &gate, Side::Left).unwrap();
        qmdd.incref(next).unwrap();
        qmdd.decref(e).unwrap();
        e = next;
    }
    e
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("qmdd/build");
    group.sample_size(10);

    for n in [4, 6, 8] {
        group.bench_with_input(BenchmarkId::new("ladder", n), &n, |b, &n| {
            b.iter(|| {
                let qmdd = Qmdd::default();
                let e = build_ladder(&qmdd, n, 3);
                qmdd.active_node_count() + e.node.index()
            });
        });
        group.bench_with_input(BenchmarkId::new("random", n), &n, |b, &n| {
            b.iter(|| {
                let qmdd = Qmdd::default();
                let e = random_circuit(&qmdd, n, 40, 42);
                qmdd.active_node_count() + e.node.index()
            });
        });
    }

    group.finish();
}

fn bench_equivalence(c: &mut Criterion) {
    let mut group = c.benchmark_group("qmdd/equivalence");
    group.sample_size(10);

    for n in [4, 6] {
        group.bench_with_input(BenchmarkId::new("inverse", n), &n, |b, &n| {
            let qmdd = Qmdd::default();
            let e = build_ladder(&qmdd, n, 3);
            b.iter(|| {
                let adjoint = qmdd.conjugate_transpose(e).unwrap();
                let product = qmdd.multiply(e, adjoint).unwrap();
                assert!(qmdd.is_identity(product));
            });
        });
    }

    group.finish();
}

fn bench_sift(c: &mut Criterion) {
    let mut group = c.benchmark_group("qmdd/sift");
    group.sample_size(10);

    for n in [4, 6] {
        group.bench_with_input(BenchmarkId::new("ladder", n), &n, |b, &n| {
            b.iter_with_setup(
                || {
                    let qmdd = Qmdd::default();
                    let e = build_ladder(&qmdd, n, 2);
                    (qmdd, e)
                },
                |(qmdd, e)| {
                    let mut roots = vec![e];
                    qmdd.sift(&mut roots).unwrap().final_size
                },
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_equivalence, bench_sift);
criterion_main!(benches);
