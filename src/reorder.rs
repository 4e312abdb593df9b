//! Variable reordering for QMDDs.
//!
//! # Variable order
//!
//! The size of a QMDD depends heavily on the order of its variables. For a
//! circuit, lines that interact through many controlled gates should sit close
//! to each other; a bad order can make the diagram exponentially larger.
//!
//! # Adjacent swap
//!
//! The elementary move exchanges the variables at two adjacent levels. Let `a`
//! be the upper and `b` the lower variable. A node of `a` whose children are
//! nodes of `b` describes a 4×4 block matrix `g[k][l]`: block `k` of `a`, sub
//! block `l` of `b`. After the swap the same matrix is described by a node of
//! `b` whose block `l` is the `a`-node with children `g[0][l] .. g[3][l]`.
//!
//! Nodes of `a` that skip `b`, and all nodes of `b`, stay valid as they are.
//! Rebuilt nodes are mapped old → new, and every live node above them is
//! rebuilt with remapped children. The caller's roots are remapped as well.
//!
//! Rebuilding goes through the unique table, and no garbage collection runs
//! inside a swap unless the node store runs out. Swapping the same level twice
//! therefore finds the original nodes again and returns edge-identical roots.
//!
//! Old nodes keep their identity and are left dead, so a swap is only sound if
//! every referenced edge reaching them is among the roots. A swap that would
//! leave a rebuilt node referenced is rolled back and reported.
//!
//! # Sifting
//!
//! Rudell's sifting moves one variable at a time through every level,
//! recording the active node count after each swap, and finally leaves it at
//! the best level seen. Variables with more nodes are sifted first.
//!
//! # Exact reordering
//!
//! All `n!` orders are visited with the Steinhaus-Johnson-Trotter sequence,
//! where consecutive permutations differ by one adjacent transposition, i.e.
//! one swap each. Exponential; only meant as a baseline for small `n`.
//!
//! # References
//!
//! - R. Rudell. "Dynamic variable ordering for ordered binary decision diagrams."
//!   ICCAD 1993. DOI: 10.1109/ICCAD.1993.580054
//!
//! - D. M. Miller, M. A. Thornton. "QMDD: A Decision Diagram Structure for
//!   Reversible and Quantum Circuits." ISMVL 2006.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::amplitude::AmplitudeTable;
use crate::edge::Edge;
use crate::error::{QmddError, Result};
use crate::qmdd::Qmdd;
use crate::types::{Level, NodeId, Var};

/// Statistics collected during sifting.
#[derive(Debug, Clone, Default)]
pub struct SiftStats {
    /// Number of adjacent swaps performed.
    pub swaps: usize,
    /// Active node count before sifting.
    pub initial_size: usize,
    /// Active node count after sifting.
    pub final_size: usize,
    /// Largest active node count observed.
    pub largest_size: usize,
    /// Active node count after every swap, starting with the initial count.
    pub history: Vec<usize>,
    /// Number of variables sifted.
    pub variables_processed: usize,
    /// Number of full passes.
    pub passes: usize,
}

impl SiftStats {
    /// Calculate the size reduction ratio.
    pub fn reduction_ratio(&self) -> f64 {
        if self.initial_size == 0 {
            return 0.0;
        }
        1.0 - (self.final_size as f64 / self.initial_size as f64)
    }

    /// Calculate the percentage reduction.
    pub fn reduction_percent(&self) -> f64 {
        self.reduction_ratio() * 100.0
    }
}

/// Statistics of an exhaustive reordering.
#[derive(Debug, Clone, Default)]
pub struct ExactStats {
    /// Number of orders evaluated, the initial one included.
    pub permutations: usize,
    pub swaps: usize,
    pub initial_size: usize,
    pub best_size: usize,
    /// The best order, from the top level down.
    pub best_order: Vec<Var>,
}

/// Steinhaus-Johnson-Trotter sequence of adjacent transpositions.
///
/// Yields `n! - 1` positions `i`, each meaning "swap elements `i` and `i + 1`".
/// Applied in sequence to any arrangement of `n` elements, the swaps visit
/// every permutation exactly once.
#[derive(Debug, Clone)]
pub struct SjtSwaps {
    perm: Vec<usize>,
    /// `true` if the element at the same position moves left.
    left: Vec<bool>,
}

impl SjtSwaps {
    pub fn new(n: usize) -> Self {
        Self {
            perm: (0..n).collect(),
            left: vec![true; n],
        }
    }
}

impl Iterator for SjtSwaps {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let n = self.perm.len();
        // Largest mobile element: it points at a smaller neighbour.
        let mut mobile: Option<usize> = None;
        for pos in 0..n {
            let neighbour = if self.left[pos] { pos.checked_sub(1) } else { Some(pos + 1).filter(|&p| p < n) };
            let Some(neighbour) = neighbour else {
                continue;
            };
            if self.perm[neighbour] < self.perm[pos] && mobile.map_or(true, |m| self.perm[pos] > self.perm[m]) {
                mobile = Some(pos);
            }
        }
        let pos = mobile?;
        let value = self.perm[pos];
        let other = if self.left[pos] { pos - 1 } else { pos + 1 };
        self.perm.swap(pos, other);
        self.left.swap(pos, other);
        for p in 0..n {
            if self.perm[p] > value {
                self.left[p] = !self.left[p];
            }
        }
        Some(pos.min(other))
    }
}

impl<A: AmplitudeTable> Qmdd<A> {
    /// Exchange the variables at `level` and `level + 1`.
    ///
    /// `roots` must hold every referenced edge the caller intends to keep; they
    /// are replaced by edges denoting the same matrices under the new order.
    /// Unreferenced edges held elsewhere become invalid.
    ///
    /// # Errors
    ///
    /// On error the order, the roots and all reference counts are left as they
    /// were.
    ///
    /// - [`QmddError::InvalidLevel`] if `level` is the top level.
    /// - [`QmddError::InvalidEdge`] if a root is not referenced.
    /// - [`QmddError::UnlistedReference`] if a node that has to be rebuilt is
    ///   still referenced through an edge missing from `roots`.
    /// - [`QmddError::NodeStoreExhausted`] if the rebuilt nodes do not fit even
    ///   after a garbage collection.
    ///
    /// # Examples
    ///
    /// ```
    /// use qmdd_rs::gate::{Control, GateKind};
    /// use qmdd_rs::qmdd::Qmdd;
    /// use qmdd_rs::types::Level;
    ///
    /// let qmdd = Qmdd::default();
    /// let vars = qmdd.add_vars(2);
    /// let cx = qmdd.gate(GateKind::X, &[Control::pos(vars[0])], vars[1]).unwrap();
    /// qmdd.incref(cx).unwrap();
    ///
    /// let mut roots = vec![cx];
    /// qmdd.swap_adjacent_levels(&mut roots, Level::new(0)).unwrap();
    /// assert_eq!(qmdd.level(vars[0]).unwrap(), Level::new(1));
    /// qmdd.swap_adjacent_levels(&mut roots, Level::new(0)).unwrap();
    /// assert_eq!(roots[0], cx);
    /// ```
    pub fn swap_adjacent_levels(&self, roots: &mut [Edge], level: Level) -> Result<()> {
        let levels = self.num_vars();
        if level.index() + 1 >= levels {
            return Err(QmddError::InvalidLevel {
                level: level.index(),
                levels,
            });
        }
        for &root in roots.iter() {
            self.check_edge(root)?;
            if !root.is_terminal() && self.ref_count(root.node) == 0 {
                return Err(QmddError::InvalidEdge(root));
            }
        }

        match self.try_swap(roots, level) {
            Err(QmddError::NodeStoreExhausted { capacity }) => {
                debug!("swap: store exhausted (capacity {}), collecting and retrying", capacity);
                self.collect_garbage();
                self.try_swap(roots, level)
            }
            res => res,
        }
    }

    fn try_swap(&self, roots: &mut [Edge], level: Level) -> Result<()> {
        let upper = level.next();
        let a = self.var_at(upper);
        let b = self.var_at(level);
        debug!("Swapping {} at {} with {} at {}", a, upper, b, level);

        let upper_nodes = self.alive_nodes(a);
        self.swap_order(level);
        let mapping = match self.rebuild_swapped(upper_nodes, a, b, upper) {
            Ok(mapping) => mapping,
            Err(err) => {
                self.swap_order(level);
                return Err(err);
            }
        };

        let remapped: Vec<Edge> = roots.iter().map(|&e| self.remap(&mapping, e)).collect();
        for &root in &remapped {
            self.incref(root)?;
        }
        for &root in roots.iter() {
            self.decref(root)?;
        }

        // Anything still holding an old node would now read it under the new order.
        if let Some(&stale) = mapping.keys().find(|&&id| self.ref_count(id) > 0) {
            debug!("swap: {} still referenced, rolling back", stale);
            for &root in roots.iter() {
                self.incref(root)?;
            }
            for &root in &remapped {
                self.decref(root)?;
            }
            self.swap_order(level);
            return Err(QmddError::UnlistedReference(stale));
        }

        roots.copy_from_slice(&remapped);
        self.cache.borrow_mut().clear();
        Ok(())
    }

    /// Rebuild, under the already swapped order, the live nodes of `a` that
    /// have children of `b`, and every live node above them.
    fn rebuild_swapped(&self, upper_nodes: Vec<NodeId>, a: Var, b: Var, upper: Level) -> Result<HashMap<NodeId, Edge>> {
        let is_b = |e: Edge| !e.is_terminal() && self.var_of(e.node) == b;
        let mut mapping: HashMap<NodeId, Edge> = HashMap::new();
        for id in upper_nodes {
            let children = self.children(id);
            if !children.iter().any(|&c| is_b(c)) {
                continue;
            }
            let g: [[Edge; 4]; 4] = children.map(|c| {
                if is_b(c) {
                    self.children(c.node).map(|gc| self.scale(gc, c.weight))
                } else {
                    [c, Edge::ZERO, Edge::ZERO, c]
                }
            });
            let mut new_children = [Edge::ZERO; 4];
            for l in 0..4 {
                new_children[l] = self.mk_node(a, [g[0][l], g[1][l], g[2][l], g[3][l]])?;
            }
            let rebuilt = self.mk_node(b, new_children)?;
            debug!("  {} -> {}", id, rebuilt);
            mapping.insert(id, rebuilt);
        }

        // Ancestors, bottom-up so that children are remapped first.
        if !mapping.is_empty() {
            for index in upper.next().index()..self.num_vars() {
                let var = self.var_at(Level::new(index));
                for id in self.alive_nodes(var) {
                    let children = self.children(id);
                    if !children.iter().any(|c| mapping.contains_key(&c.node)) {
                        continue;
                    }
                    let new_children = children.map(|c| self.remap(&mapping, c));
                    let rebuilt = self.mk_node(var, new_children)?;
                    mapping.insert(id, rebuilt);
                }
            }
        }
        Ok(mapping)
    }

    fn remap(&self, mapping: &HashMap<NodeId, Edge>, e: Edge) -> Edge {
        match mapping.get(&e.node) {
            Some(&m) => self.scale(m, e.weight),
            None => e,
        }
    }

    /// Move `var` to `target` by adjacent swaps. Returns the number of swaps.
    pub fn move_variable(&self, roots: &mut [Edge], var: Var, target: Level) -> Result<usize> {
        let mut current = self.level(var)?;
        if target.index() >= self.num_vars() {
            return Err(QmddError::InvalidLevel {
                level: target.index(),
                levels: self.num_vars(),
            });
        }
        let mut swaps = 0;
        while current < target {
            self.swap_adjacent_levels(roots, current)?;
            current = current.next();
            swaps += 1;
        }
        while let Some(below) = current.prev().filter(|_| current > target) {
            self.swap_adjacent_levels(roots, below)?;
            current = below;
            swaps += 1;
        }
        Ok(swaps)
    }

    /// Variables from the top level down.
    pub fn order_top_down(&self) -> Vec<Var> {
        let mut order = self.variable_order();
        order.reverse();
        order
    }

    /// Reorder to `order`, given from the top level down. Returns the number
    /// of swaps.
    pub fn reorder(&self, roots: &mut [Edge], order: &[Var]) -> Result<usize> {
        let n = self.num_vars();
        if order.len() != n {
            return Err(QmddError::InvalidOrder(format!("expected {} variables, got {}", n, order.len())));
        }
        let mut seen = HashSet::new();
        for &var in order {
            self.level(var)?;
            if !seen.insert(var) {
                return Err(QmddError::InvalidOrder(format!("{} appears twice", var)));
            }
        }

        let mut swaps = 0;
        for (pos, &var) in order.iter().enumerate() {
            swaps += self.move_variable(roots, var, Level::new(n - 1 - pos))?;
        }
        debug!("reorder: {} swaps", swaps);
        Ok(swaps)
    }

    /// One sifting pass over every variable.
    ///
    /// The node count never grows: each variable ends at the best level it
    /// visited, its starting level included.
    pub fn sift(&self, roots: &mut [Edge]) -> Result<SiftStats> {
        let initial_size = self.active_node_count();
        let mut stats = SiftStats {
            initial_size,
            final_size: initial_size,
            largest_size: initial_size,
            history: vec![initial_size],
            passes: 1,
            ..Default::default()
        };
        let n = self.num_vars();
        if n <= 1 {
            return Ok(stats);
        }

        let mut vars: Vec<Var> = (0..n).map(|i| Var::new(i as u32)).collect();
        vars.sort_by_key(|&v| (Reverse(self.var_node_count(v)), v));
        debug!("Sifting {} variables in order: {:?}", n, vars);

        for var in vars {
            self.maybe_collect(roots)?;
            self.sift_variable(roots, var, &mut stats)?;
            stats.variables_processed += 1;
        }

        stats.final_size = self.active_node_count();
        info!(
            "sift: size {} -> {} ({:.1}% reduction), largest {}, {} swaps",
            stats.initial_size,
            stats.final_size,
            stats.reduction_percent(),
            stats.largest_size,
            stats.swaps
        );
        Ok(stats)
    }

    fn sift_variable(&self, roots: &mut [Edge], var: Var, stats: &mut SiftStats) -> Result<()> {
        let top = self.num_vars() - 1;
        let start = self.level_of(var).index();
        let distance = |level: usize| level.abs_diff(start);

        let mut best = (self.active_node_count(), start);
        let mut current = start;

        // Nearer boundary first.
        let bounds = if start <= top - start { [0, top] } else { [top, 0] };
        for bound in bounds {
            while current != bound {
                if current < bound {
                    self.swap_adjacent_levels(roots, Level::new(current))?;
                    current += 1;
                } else {
                    self.swap_adjacent_levels(roots, Level::new(current - 1))?;
                    current -= 1;
                }
                stats.swaps += 1;

                let size = self.active_node_count();
                stats.history.push(size);
                stats.largest_size = stats.largest_size.max(size);
                let (best_size, best_level) = best;
                if size < best_size || (size == best_size && (distance(current), current) < (distance(best_level), best_level)) {
                    best = (size, current);
                }
            }
        }

        debug!("  {}: best level {} with size {}", var, best.1, best.0);
        stats.swaps += self.move_variable(roots, var, Level::new(best.1))?;
        stats.history.push(self.active_node_count());
        Ok(())
    }

    /// Repeat sifting passes until the node count stops improving.
    pub fn sift_to_fixpoint(&self, roots: &mut [Edge]) -> Result<SiftStats> {
        let mut total = self.sift(roots)?;
        let mut improved = total.final_size < total.initial_size;
        while improved {
            let pass = self.sift(roots)?;
            total.swaps += pass.swaps;
            total.largest_size = total.largest_size.max(pass.largest_size);
            total.history.extend(pass.history.into_iter().skip(1));
            total.variables_processed += pass.variables_processed;
            total.passes += 1;
            improved = pass.final_size < total.final_size;
            total.final_size = pass.final_size;
        }
        info!("sift: fixpoint after {} passes, size {}", total.passes, total.final_size);
        Ok(total)
    }

    /// Try every variable order and move to the smallest one.
    pub fn exact_reorder(&self, roots: &mut [Edge]) -> Result<ExactStats> {
        let initial_size = self.active_node_count();
        let mut stats = ExactStats {
            permutations: 1,
            initial_size,
            best_size: initial_size,
            best_order: self.order_top_down(),
            ..Default::default()
        };

        for pos in SjtSwaps::new(self.num_vars()) {
            self.maybe_collect(roots)?;
            self.swap_adjacent_levels(roots, Level::new(pos))?;
            stats.swaps += 1;
            stats.permutations += 1;
            let size = self.active_node_count();
            if size < stats.best_size {
                stats.best_size = size;
                stats.best_order = self.order_top_down();
            }
        }

        stats.swaps += self.reorder(roots, &stats.best_order)?;
        info!(
            "exact: {} orders, size {} -> {}",
            stats.permutations, stats.initial_size, stats.best_size
        );
        Ok(stats)
    }
}
