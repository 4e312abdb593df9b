//! Recursive diagram operators.
//!
//! Every public operator validates its operands, gives the garbage collector a
//! chance to run (with the operands protected), and then recurses without any
//! further collection. A recursion that exhausts the node store is retried
//! once after a full collection. Results are unreferenced edges.
//!
//! # Block structure
//!
//! A node for variable `x` splits its matrix into four blocks, indexed
//! `k = 2*row + col` by the row and column bit of `x`:
//!
//! ```text
//! ┌────┬────┐
//! │ e0 │ e1 │
//! ├────┼────┤
//! │ e2 │ e3 │
//! └────┴────┘
//! ```
//!
//! An edge that skips the level of `x` denotes the identity on `x`, i.e. the
//! blocks `[e, 0, 0, e]`.

use std::collections::HashMap;

use log::debug;

use crate::amplitude::{AmpId, AmplitudeTable, Cyclotomic};
use crate::cache::OpKey;
use crate::edge::Edge;
use crate::error::{QmddError, Result};
use crate::qmdd::Qmdd;
use crate::types::{Level, NodeId, Var};

impl<A: AmplitudeTable> Qmdd<A> {
    /// The four blocks of `e` with respect to the variable at `level`.
    ///
    /// `e` must not sit above `level`.
    pub(crate) fn cofactors(&self, e: Edge, level: Level) -> [Edge; 4] {
        if e.is_zero() {
            return [Edge::ZERO; 4];
        }
        if self.edge_level(e) == Some(level) {
            self.children(e.node).map(|child| self.scale(child, e.weight))
        } else {
            [e, Edge::ZERO, Edge::ZERO, e]
        }
    }

    /// The identity matrix over all variables.
    pub fn identity(&self) -> Edge {
        Edge::ONE
    }

    /// Structural equality: same node, equal weights.
    pub fn equal(&self, a: Edge, b: Edge) -> bool {
        a.node == b.node && self.amplitudes().eq(a.weight, b.weight)
    }

    pub fn is_identity(&self, a: Edge) -> bool {
        self.equal(a, Edge::ONE)
    }

    // ========================================================================
    // Add
    // ========================================================================

    /// Matrix sum `a + b`.
    pub fn add(&self, a: Edge, b: Edge) -> Result<Edge> {
        self.check_edge(a)?;
        self.check_edge(b)?;
        self.with_gc(&[a, b], || self.add_rec(a, b))
    }

    pub(crate) fn add_rec(&self, a: Edge, b: Edge) -> Result<Edge> {
        debug!("add(a = {}, b = {})", a, b);

        if a.is_zero() {
            return Ok(b);
        }
        if b.is_zero() {
            return Ok(a);
        }
        if a.node == b.node {
            let w = self.amp_add(a.weight, b.weight);
            return Ok(self.weighted(a.node, w));
        }

        let key = OpKey::add(a, b);
        let cached = self.cache.borrow().get(&key).copied();
        if let Some(res) = cached {
            debug!("cache: add(a = {}, b = {}) -> {}", a, b, res);
            return Ok(res);
        }

        // Distinct nodes, so at least one of them is not the terminal.
        let level = match self.edge_level(a).max(self.edge_level(b)) {
            Some(level) => level,
            None => unreachable!("two distinct terminal nodes"),
        };
        let var = self.var_at(level);
        let ca = self.cofactors(a, level);
        let cb = self.cofactors(b, level);

        let mut children = [Edge::ZERO; 4];
        for k in 0..4 {
            children[k] = self.add_rec(ca[k], cb[k])?;
        }
        let res = self.mk_node(var, children)?;

        debug!("computed: add(a = {}, b = {}) -> {}", a, b, res);
        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    // ========================================================================
    // Multiply
    // ========================================================================

    /// Matrix product `a · b`.
    pub fn multiply(&self, a: Edge, b: Edge) -> Result<Edge> {
        self.check_edge(a)?;
        self.check_edge(b)?;
        self.with_gc(&[a, b], || self.mul_rec(a, b))
    }

    pub(crate) fn mul_rec(&self, a: Edge, b: Edge) -> Result<Edge> {
        debug!("multiply(a = {}, b = {})", a, b);

        if a.is_zero() || b.is_zero() {
            return Ok(Edge::ZERO);
        }
        let w = self.amp_mul(a.weight, b.weight);
        if a.is_terminal() {
            return Ok(self.weighted(b.node, w));
        }
        if b.is_terminal() {
            return Ok(self.weighted(a.node, w));
        }

        let key = OpKey::Multiply(a.node, b.node);
        let cached = self.cache.borrow().get(&key).copied();
        let unit = match cached {
            Some(res) => {
                debug!("cache: multiply({}, {}) -> {}", a.node, b.node, res);
                res
            }
            None => {
                let ua = a.with_weight(AmpId::ONE);
                let ub = b.with_weight(AmpId::ONE);
                let level = match self.edge_level(ua).max(self.edge_level(ub)) {
                    Some(level) => level,
                    None => unreachable!("terminal operands handled above"),
                };
                let var = self.var_at(level);
                let ca = self.cofactors(ua, level);
                let cb = self.cofactors(ub, level);

                let mut children = [Edge::ZERO; 4];
                for row in 0..2 {
                    for col in 0..2 {
                        let left = self.mul_rec(ca[2 * row], cb[col])?;
                        let right = self.mul_rec(ca[2 * row + 1], cb[2 + col])?;
                        children[2 * row + col] = self.add_rec(left, right)?;
                    }
                }
                let res = self.mk_node(var, children)?;
                debug!("computed: multiply({}, {}) -> {}", a.node, b.node, res);
                self.cache.borrow_mut().insert(key, res);
                res
            }
        };
        Ok(self.scale(unit, w))
    }

    // ========================================================================
    // Transpose
    // ========================================================================

    /// Matrix transpose.
    pub fn transpose(&self, a: Edge) -> Result<Edge> {
        self.check_edge(a)?;
        self.with_gc(&[a], || self.transpose_rec(a, false))
    }

    /// Conjugate transpose (adjoint).
    pub fn conjugate_transpose(&self, a: Edge) -> Result<Edge> {
        self.check_edge(a)?;
        self.with_gc(&[a], || self.transpose_rec(a, true))
    }

    fn transpose_rec(&self, a: Edge, conjugate: bool) -> Result<Edge> {
        if a.is_zero() {
            return Ok(Edge::ZERO);
        }
        let w = if conjugate { self.amp_conj(a.weight) } else { a.weight };
        if a.is_terminal() {
            return Ok(Edge::terminal(w));
        }

        let key = if conjugate {
            OpKey::ConjugateTranspose(a.node)
        } else {
            OpKey::Transpose(a.node)
        };
        let cached = self.cache.borrow().get(&key).copied();
        let unit = match cached {
            Some(res) => {
                debug!("cache: {:?} -> {}", key, res);
                res
            }
            None => {
                let node = self.node(a.node);
                let e = node.edges;
                let children = [
                    self.transpose_rec(e[0], conjugate)?,
                    self.transpose_rec(e[2], conjugate)?,
                    self.transpose_rec(e[1], conjugate)?,
                    self.transpose_rec(e[3], conjugate)?,
                ];
                let res = self.mk_node(node.var, children)?;
                debug!("computed: {:?} -> {}", key, res);
                self.cache.borrow_mut().insert(key, res);
                res
            }
        };
        Ok(self.scale(unit, w))
    }

    // ========================================================================
    // Trace
    // ========================================================================

    /// Partial trace over the variables in `remove`, or over all variables if
    /// `general` is set.
    ///
    /// Remaining variables keep their levels; removed ones are skipped in the
    /// result. A full trace returns a terminal (scalar) edge.
    pub fn trace(&self, a: Edge, remove: &[Var], general: bool) -> Result<Edge> {
        self.check_edge(a)?;
        let mut marked = vec![general; self.num_vars()];
        for &var in remove {
            self.level(var)?;
            marked[var.index()] = true;
        }

        debug!("trace(a = {}, remove = {:?}, general = {})", a, remove, general);
        let two = self.lookup(&Cyclotomic::integer(2));
        let top = self.num_vars().checked_sub(1).map(Level::new);
        self.with_gc(&[a], || {
            let mut memo = HashMap::new();
            self.trace_rec(a, top, &marked, two, &mut memo)
        })
    }

    /// Full trace as a scalar.
    pub fn trace_value(&self, a: Edge) -> Result<AmpId> {
        let e = self.trace(a, &[], true)?;
        Ok(e.weight)
    }

    fn trace_rec(
        &self,
        a: Edge,
        level: Option<Level>,
        marked: &[bool],
        two: AmpId,
        memo: &mut HashMap<(NodeId, usize), Edge>,
    ) -> Result<Edge> {
        if a.is_zero() {
            return Ok(Edge::ZERO);
        }
        let Some(level) = level else {
            return Ok(a);
        };
        if let Some(&unit) = memo.get(&(a.node, level.index())) {
            return Ok(self.scale(unit, a.weight));
        }

        let below = level.prev();
        let var = self.var_at(level);
        let unit_edge = a.with_weight(AmpId::ONE);
        let unit = if self.edge_level(unit_edge) == Some(level) {
            let c = self.children(a.node);
            if marked[var.index()] {
                let d0 = self.trace_rec(c[0], below, marked, two, memo)?;
                let d1 = self.trace_rec(c[3], below, marked, two, memo)?;
                self.add_rec(d0, d1)?
            } else {
                let mut children = [Edge::ZERO; 4];
                for k in 0..4 {
                    children[k] = self.trace_rec(c[k], below, marked, two, memo)?;
                }
                self.mk_node(var, children)?
            }
        } else {
            // Identity on a skipped variable: its trace is 2.
            let inner = self.trace_rec(unit_edge, below, marked, two, memo)?;
            if marked[var.index()] {
                self.scale(inner, two)
            } else {
                inner
            }
        };

        memo.insert((a.node, level.index()), unit);
        Ok(self.scale(unit, a.weight))
    }

    // ========================================================================
    // Column extraction
    // ========================================================================

    /// Keep column `column` of `a` (bit `column[x]` for variable `x`) and place
    /// it in column 0; all other columns become zero.
    ///
    /// Applied to a unitary, this yields the image of the basis state `column`.
    pub fn extract_column(&self, column: &[bool], a: Edge) -> Result<Edge> {
        self.check_edge(a)?;
        if column.len() != self.num_vars() {
            return Err(QmddError::ColumnLength {
                expected: self.num_vars(),
                got: column.len(),
            });
        }

        debug!("extract_column(column = {:?}, a = {})", column, a);
        let top = self.num_vars().checked_sub(1).map(Level::new);
        self.with_gc(&[a], || {
            let mut memo = HashMap::new();
            self.column_rec(a, top, column, &mut memo)
        })
    }

    fn column_rec(
        &self,
        a: Edge,
        level: Option<Level>,
        column: &[bool],
        memo: &mut HashMap<(NodeId, usize), Edge>,
    ) -> Result<Edge> {
        if a.is_zero() {
            return Ok(Edge::ZERO);
        }
        let Some(level) = level else {
            return Ok(a);
        };
        if let Some(&unit) = memo.get(&(a.node, level.index())) {
            return Ok(self.scale(unit, a.weight));
        }

        let below = level.prev();
        let var = self.var_at(level);
        let col = column[var.index()] as usize;
        let blocks = self.cofactors(a.with_weight(AmpId::ONE), level);
        let top = self.column_rec(blocks[col], below, column, memo)?;
        let bottom = self.column_rec(blocks[2 + col], below, column, memo)?;
        let unit = self.mk_node(var, [top, Edge::ZERO, bottom, Edge::ZERO])?;

        memo.insert((a.node, level.index()), unit);
        Ok(self.scale(unit, a.weight))
    }

    // ========================================================================
    // Evaluation and checks
    // ========================================================================

    /// Matrix element at (`row`, `col`), bits indexed by variable.
    pub fn entry(&self, a: Edge, row: &[bool], col: &[bool]) -> Result<AmpId> {
        self.check_edge(a)?;
        let n = self.num_vars();
        for bits in [row, col] {
            if bits.len() != n {
                return Err(QmddError::ColumnLength {
                    expected: n,
                    got: bits.len(),
                });
            }
        }

        let mut acc = AmpId::ONE;
        let mut e = a;
        for index in (0..n).rev() {
            if e.is_zero() {
                return Ok(AmpId::ZERO);
            }
            let level = Level::new(index);
            let var = self.var_at(level);
            let (r, c) = (row[var.index()], col[var.index()]);
            if self.edge_level(e) == Some(level) {
                acc = self.amp_mul(acc, e.weight);
                e = self.children(e.node)[2 * r as usize + c as usize];
            } else if r != c {
                return Ok(AmpId::ZERO);
            }
        }
        Ok(self.amp_mul(acc, e.weight))
    }

    /// Whether `a · a†` is the identity.
    pub fn is_unitary(&self, a: Edge) -> Result<bool> {
        self.check_edge(a)?;
        let product = self.protect(&[a], || {
            let adjoint = self.conjugate_transpose(a)?;
            self.multiply(a, adjoint)
        })?;
        Ok(self.is_identity(product))
    }

    /// Whether every matrix element of `a` is 0 or 1.
    pub fn is_zero_one(&self, a: Edge) -> Result<bool> {
        self.check_edge(a)?;
        if a.is_zero() {
            return Ok(true);
        }
        if !self.amplitudes().is_one(a.weight) {
            return Ok(false);
        }
        let mut visited = std::collections::HashSet::new();
        let mut stack = vec![a.node];
        while let Some(id) = stack.pop() {
            if id.is_terminal() || !visited.insert(id) {
                continue;
            }
            for child in self.children(id) {
                if child.is_zero() {
                    continue;
                }
                if !self.amplitudes().is_one(child.weight) {
                    return Ok(false);
                }
                stack.push(child.node);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::gate::{Control, GateKind};

    fn hadamard(qmdd: &Qmdd, var: Var) -> Edge {
        qmdd.gate(GateKind::H, &[], var).unwrap()
    }

    fn bits(n: usize, value: usize) -> Vec<bool> {
        (0..n).map(|i| value >> i & 1 == 1).collect()
    }

    #[test]
    fn test_hadamard_squared_is_identity() {
        let qmdd = Qmdd::default();
        let x = qmdd.add_var("q0");
        let h = hadamard(&qmdd, x);
        assert!(!qmdd.is_identity(h));
        let hh = qmdd.multiply(h, h).unwrap();
        assert_eq!(hh, qmdd.identity());
        assert!(qmdd.is_unitary(h).unwrap());
    }

    #[test]
    fn test_hadamard_entries() {
        let qmdd = Qmdd::default();
        let x = qmdd.add_var("q0");
        let h = hadamard(&qmdd, x);
        let s = qmdd.lookup(&Cyclotomic::frac_1_sqrt2());
        let minus_s = qmdd.lookup(&-&Cyclotomic::frac_1_sqrt2());
        assert_eq!(qmdd.entry(h, &[false], &[false]).unwrap(), s);
        assert_eq!(qmdd.entry(h, &[true], &[false]).unwrap(), s);
        assert_eq!(qmdd.entry(h, &[true], &[true]).unwrap(), minus_s);
    }

    #[test]
    fn test_add_commutative() {
        let qmdd = Qmdd::default();
        let vars = qmdd.add_vars(2);
        let a = qmdd.gate(GateKind::X, &[Control::pos(vars[0])], vars[1]).unwrap();
        qmdd.incref(a).unwrap();
        let b = hadamard(&qmdd, vars[0]);
        qmdd.incref(b).unwrap();
        let ab = qmdd.add(a, b).unwrap();
        let ba = qmdd.add(b, a).unwrap();
        assert_eq!(ab, ba);
        qmdd.cache.borrow_mut().clear();
        assert_eq!(qmdd.add(b, a).unwrap(), ab);
    }

    #[test]
    fn test_add_self_doubles() {
        let qmdd = Qmdd::default();
        let x = qmdd.add_var("q0");
        let h = hadamard(&qmdd, x);
        let two = qmdd.lookup(&Cyclotomic::integer(2));
        let sum = qmdd.add(h, h).unwrap();
        assert_eq!(sum, qmdd.scale(h, two));
        let minus_one = qmdd.lookup(&Cyclotomic::integer(-1));
        let neg = qmdd.scale(h, minus_one);
        assert_eq!(qmdd.add(h, neg).unwrap(), Edge::ZERO);
    }

    #[test]
    fn test_transpose_involution() {
        let qmdd = Qmdd::default();
        let vars = qmdd.add_vars(3);
        let g = qmdd.gate(GateKind::T, &[Control::pos(vars[2])], vars[0]).unwrap();
        qmdd.incref(g).unwrap();
        let h = hadamard(&qmdd, vars[1]);
        let m = qmdd.multiply(g, h).unwrap();
        let y = qmdd.gate(GateKind::Y, &[Control::neg(vars[0])], vars[2]).unwrap();
        let m = qmdd.multiply(y, m).unwrap();
        qmdd.incref(m).unwrap();

        let t = qmdd.transpose(m).unwrap();
        assert_ne!(t, m);
        let tt = qmdd.transpose(t).unwrap();
        assert_eq!(tt, m);

        let ct = qmdd.conjugate_transpose(m).unwrap();
        assert_eq!(qmdd.conjugate_transpose(ct).unwrap(), m);
        assert!(qmdd.is_unitary(m).unwrap());
    }

    #[test]
    fn test_transpose_entries() {
        let qmdd = Qmdd::default();
        let x = qmdd.add_var("q0");
        let y = qmdd.gate(GateKind::Y, &[], x).unwrap();
        let yt = qmdd.transpose(y).unwrap();
        let yct = qmdd.conjugate_transpose(y).unwrap();
        // Y is Hermitian but not symmetric.
        assert_eq!(yct, y);
        let minus_one = qmdd.lookup(&Cyclotomic::integer(-1));
        assert_eq!(yt, qmdd.scale(y, minus_one));
    }

    #[test]
    fn test_multiply_associative() {
        let qmdd = Qmdd::default();
        let vars = qmdd.add_vars(3);
        let a = qmdd.gate(GateKind::H, &[], vars[0]).unwrap();
        qmdd.incref(a).unwrap();
        let b = qmdd.gate(GateKind::X, &[Control::pos(vars[0])], vars[2]).unwrap();
        qmdd.incref(b).unwrap();
        let c = qmdd.gate(GateKind::V, &[Control::neg(vars[2])], vars[1]).unwrap();
        qmdd.incref(c).unwrap();

        let ab = qmdd.multiply(a, b).unwrap();
        qmdd.incref(ab).unwrap();
        let ab_c = qmdd.multiply(ab, c).unwrap();
        let bc = qmdd.multiply(b, c).unwrap();
        qmdd.incref(bc).unwrap();
        let a_bc = qmdd.multiply(a, bc).unwrap();
        assert_eq!(ab_c, a_bc);
    }

    #[test]
    fn test_identity_element() {
        let qmdd = Qmdd::default();
        let vars = qmdd.add_vars(2);
        let g = qmdd.gate(GateKind::S, &[Control::pos(vars[1])], vars[0]).unwrap();
        let id = qmdd.identity();
        assert_eq!(qmdd.multiply(g, id).unwrap(), g);
        assert_eq!(qmdd.multiply(id, g).unwrap(), g);
    }

    #[test]
    fn test_trace() {
        let qmdd = Qmdd::default();
        let vars = qmdd.add_vars(3);
        let two = qmdd.lookup(&Cyclotomic::integer(2));
        let eight = qmdd.lookup(&Cyclotomic::integer(8));
        assert_eq!(qmdd.trace_value(qmdd.identity()).unwrap(), eight);

        // Z has trace 0, so Z ⊗ I ⊗ I does too.
        let z = qmdd.gate(GateKind::Z, &[], vars[1]).unwrap();
        qmdd.incref(z).unwrap();
        assert_eq!(qmdd.trace_value(z).unwrap(), AmpId::ZERO);

        // Tracing out the other variables of Z leaves 4·Z.
        let partial = qmdd.trace(z, &[vars[0], vars[2]], false).unwrap();
        let four = qmdd.amp_mul(two, two);
        assert_eq!(partial, qmdd.scale(z, four));

        // Tracing out the variable Z acts on leaves zero.
        assert_eq!(qmdd.trace(z, &[vars[1]], false).unwrap(), Edge::ZERO);
    }

    #[test]
    fn test_trace_of_controlled_not() {
        let qmdd = Qmdd::default();
        let vars = qmdd.add_vars(2);
        let cx = qmdd.gate(GateKind::X, &[Control::pos(vars[1])], vars[0]).unwrap();
        // tr(CNOT) = 2
        let two = qmdd.lookup(&Cyclotomic::integer(2));
        assert_eq!(qmdd.trace_value(cx).unwrap(), two);
        // Tracing out the target leaves 2·|0⟩⟨0| on the control.
        let partial = qmdd.trace(cx, &[vars[0]], false).unwrap();
        assert_eq!(qmdd.entry(partial, &[false, false], &[false, false]).unwrap(), two);
        assert_eq!(qmdd.entry(partial, &[false, true], &[false, true]).unwrap(), AmpId::ZERO);
    }

    #[test]
    fn test_extract_column() {
        let qmdd = Qmdd::default();
        let vars = qmdd.add_vars(2);
        let h = hadamard(&qmdd, vars[0]);
        qmdd.incref(h).unwrap();
        let cx = qmdd.gate(GateKind::X, &[Control::pos(vars[0])], vars[1]).unwrap();
        let bell = qmdd.multiply(cx, h).unwrap();
        qmdd.incref(bell).unwrap();

        let col = qmdd.extract_column(&[false, false], bell).unwrap();
        let s = qmdd.lookup(&Cyclotomic::frac_1_sqrt2());
        let zero_col = bits(2, 0);
        for row in 0..4 {
            let expected = if row == 0 || row == 3 { s } else { AmpId::ZERO };
            assert_eq!(qmdd.entry(col, &bits(2, row), &zero_col).unwrap(), expected);
            // Only column 0 is populated.
            assert_eq!(qmdd.entry(col, &bits(2, row), &bits(2, 1)).unwrap(), AmpId::ZERO);
        }

        // Column extraction of the identity gives the basis state.
        let basis = qmdd.extract_column(&[true, false], qmdd.identity()).unwrap();
        assert_eq!(qmdd.entry(basis, &bits(2, 1), &zero_col).unwrap(), AmpId::ONE);
        assert_eq!(qmdd.entry(basis, &bits(2, 0), &zero_col).unwrap(), AmpId::ZERO);

        assert!(matches!(
            qmdd.extract_column(&[true], bell),
            Err(QmddError::ColumnLength { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_is_zero_one() {
        let qmdd = Qmdd::default();
        let vars = qmdd.add_vars(2);
        let cx = qmdd.gate(GateKind::X, &[Control::pos(vars[0])], vars[1]).unwrap();
        assert!(qmdd.is_zero_one(cx).unwrap());
        let h = hadamard(&qmdd, vars[0]);
        assert!(!qmdd.is_zero_one(h).unwrap());
        let z = qmdd.gate(GateKind::Z, &[], vars[0]).unwrap();
        assert!(!qmdd.is_zero_one(z).unwrap());
    }

    #[test]
    fn test_invalid_edge_rejected() {
        let qmdd = Qmdd::default();
        qmdd.add_var("q0");
        let bogus = Edge::new(NodeId::new(77), AmpId::ONE);
        assert!(matches!(qmdd.add(bogus, Edge::ONE), Err(QmddError::InvalidEdge(_))));
        assert!(matches!(qmdd.multiply(Edge::ONE, bogus), Err(QmddError::InvalidEdge(_))));
    }

    #[test]
    fn test_float_table_manager() {
        let qmdd = Qmdd::new_float(crate::config::QmddConfig::default());
        let x = qmdd.add_var("q0");
        let h = qmdd.gate(GateKind::H, &[], x).unwrap();
        let hh = qmdd.multiply(h, h).unwrap();
        assert!(qmdd.is_identity(hh));
    }

    #[test]
    fn test_exhausted_store_is_collected_and_retried() {
        // 8 slots: the terminal plus 7 nodes. Below 6 allocated nodes no
        // collection runs at operation entry.
        let config = crate::config::QmddConfig::default()
            .with_storage_bits(3)
            .with_gc_threshold(usize::MAX);
        let qmdd = Qmdd::new(config);
        let vars = qmdd.add_vars(3);

        // Upper triangular blocks, so every transposed node is new.
        let mut a = qmdd.make_node(vars[0], [Edge::ONE, Edge::ONE, Edge::ZERO, Edge::ONE]).unwrap();
        for &var in &vars[1..] {
            a = qmdd.make_node(var, [a, a, Edge::ZERO, a]).unwrap();
        }
        qmdd.make_node(vars[0], [Edge::ZERO, Edge::ONE, Edge::ZERO, Edge::ZERO]).unwrap();
        qmdd.make_node(vars[0], [Edge::ZERO, Edge::ZERO, Edge::ONE, Edge::ZERO]).unwrap();
        assert_eq!(qmdd.allocated_node_count(), 5);

        let t = qmdd.transpose(a).unwrap();
        assert_eq!(qmdd.stats().gc_runs, 1);
        assert_eq!(qmdd.allocated_node_count(), 6);
        for row in 0..8 {
            for col in 0..8 {
                assert_eq!(
                    qmdd.entry(t, &bits(3, row), &bits(3, col)).unwrap(),
                    qmdd.entry(a, &bits(3, col), &bits(3, row)).unwrap(),
                    "row {row}, col {col}"
                );
            }
        }
    }

    #[test]
    fn test_exhausted_store_with_live_nodes_fails() {
        let config = crate::config::QmddConfig::default()
            .with_storage_bits(2)
            .with_gc_threshold(usize::MAX);
        let qmdd = Qmdd::new(config);
        let vars = qmdd.add_vars(3);
        let mut a = qmdd.make_node(vars[0], [Edge::ONE, Edge::ONE, Edge::ZERO, Edge::ONE]).unwrap();
        for &var in &vars[1..] {
            a = qmdd.make_node(var, [a, a, Edge::ZERO, a]).unwrap();
        }
        let res = qmdd.transpose(a);
        assert!(matches!(res, Err(QmddError::NodeStoreExhausted { capacity: 4 })));
        // The operand survives the collection.
        assert_eq!(qmdd.allocated_node_count(), 3);
        assert!(qmdd.check_edge(a).is_ok());
    }
}
