use qmdd_rs::config::QmddConfig;
use qmdd_rs::gate::{Control, GateKind};
use qmdd_rs::qmdd::Qmdd;
use test_log::test;

#[test]
fn test_balanced_refcounts_leave_no_leak() {
    let qmdd = Qmdd::default();
    let vars = qmdd.add_vars(3);
    let kept = qmdd.gate(GateKind::H, &[], vars[0]).unwrap();
    qmdd.incref(kept).unwrap();
    let baseline = qmdd.active_node_count();

    let a = qmdd.gate(GateKind::X, &[Control::pos(vars[0]), Control::neg(vars[1])], vars[2]).unwrap();
    qmdd.incref(a).unwrap();
    let b = qmdd.multiply(a, kept).unwrap();
    qmdd.incref(b).unwrap();
    qmdd.incref(b).unwrap();
    let c = qmdd.transpose(b).unwrap();
    qmdd.incref(c).unwrap();
    assert!(qmdd.active_node_count() > baseline);

    qmdd.decref(b).unwrap();
    qmdd.decref(c).unwrap();
    qmdd.decref(a).unwrap();
    qmdd.decref(b).unwrap();
    assert_eq!(qmdd.active_node_count(), baseline);

    qmdd.collect_garbage();
    assert_eq!(qmdd.allocated_node_count(), baseline);
    assert!(qmdd.peak_node_count() >= baseline);
}

#[test]
fn test_gc_during_long_build_keeps_roots() {
    // A tiny GC threshold forces collections at most operation entries.
    let qmdd = Qmdd::new(QmddConfig::default().with_gc_threshold(4));
    let vars = qmdd.add_vars(4);
    let mut e = qmdd.identity();
    for round in 0..6 {
        for (i, &v) in vars.iter().enumerate() {
            let kind = if (round + i) % 2 == 0 { GateKind::H } else { GateKind::T };
            let g = qmdd.gate(kind, &[Control::pos(vars[(i + 1) % 4])], v).unwrap();
            let next = qmdd.multiply(g, e).unwrap();
            qmdd.incref(next).unwrap();
            qmdd.decref(e).unwrap();
            e = next;
        }
    }
    assert!(qmdd.stats().gc_runs > 0);
    assert!(qmdd.is_unitary(e).unwrap());
    let adjoint = qmdd.conjugate_transpose(e).unwrap();
    assert!(qmdd.is_identity(qmdd.multiply(adjoint, e).unwrap()));
}
