use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::{self, Debug, Display};

use log::{debug, info};

use crate::amplitude::{AmpId, AmplitudeTable, Cyclotomic, CyclotomicTable, FloatTable};
use crate::cache::{Cache, OpKey};
use crate::config::QmddConfig;
use crate::edge::Edge;
use crate::error::{QmddError, Result};
use crate::node::Node;
use crate::storage::Storage;
use crate::subtable::Subtable;
use crate::types::{Level, NodeId, Var};

/// The QMDD manager.
///
/// Owns the node store, the per-variable unique tables, the computed table, the
/// amplitude table and the variable order. All diagram operations go through it.
///
/// Edges returned by operations are *unreferenced*: a caller that keeps an edge
/// across further operations must [`incref`][Qmdd::incref] it, otherwise a
/// garbage collection pass at the start of a later operation may reclaim it.
pub struct Qmdd<A: AmplitudeTable = CyclotomicTable> {
    config: QmddConfig,
    storage: RefCell<Storage<Node>>,
    /// Unique tables, indexed by variable.
    subtables: RefCell<Vec<Subtable>>,
    /// Variable at each level (index 0 = bottom).
    var_order: RefCell<Vec<Var>>,
    /// Level of each variable.
    level_map: RefCell<Vec<Level>>,
    labels: RefCell<Vec<String>>,
    pub(crate) cache: RefCell<Cache<OpKey, Edge>>,
    amps: RefCell<A>,
    active: Cell<usize>,
    active_per_var: RefCell<Vec<usize>>,
    peak: Cell<usize>,
    gc_limit: Cell<usize>,
    gc_runs: Cell<usize>,
}

impl Qmdd<CyclotomicTable> {
    /// Manager with exact amplitudes.
    pub fn new(config: QmddConfig) -> Self {
        Self::with_table(config, CyclotomicTable::new())
    }
}

impl Qmdd<FloatTable> {
    /// Manager with floating amplitudes, canonicalized with `config.tolerance`.
    pub fn new_float(config: QmddConfig) -> Self {
        let table = FloatTable::with_tolerance(config.tolerance);
        Self::with_table(config, table)
    }
}

impl Default for Qmdd<CyclotomicTable> {
    fn default() -> Self {
        Qmdd::new(QmddConfig::default())
    }
}

impl<A: AmplitudeTable> Debug for Qmdd<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("Qmdd")
            .field("capacity", &storage.capacity())
            .field("allocated", &storage.real_size())
            .field("active", &self.active.get())
            .field("vars", &self.num_vars())
            .finish()
    }
}

impl<A: AmplitudeTable> Qmdd<A> {
    pub fn with_table(config: QmddConfig, table: A) -> Self {
        let storage = Storage::new(config.storage_bits);
        let cache = Cache::new(config.cache_bits);
        let gc_limit = config.gc_threshold;
        Self {
            config,
            storage: RefCell::new(storage),
            subtables: RefCell::new(Vec::new()),
            var_order: RefCell::new(Vec::new()),
            level_map: RefCell::new(Vec::new()),
            labels: RefCell::new(Vec::new()),
            cache: RefCell::new(cache),
            amps: RefCell::new(table),
            active: Cell::new(0),
            active_per_var: RefCell::new(Vec::new()),
            peak: Cell::new(0),
            gc_limit: Cell::new(gc_limit),
            gc_runs: Cell::new(0),
        }
    }

    pub fn config(&self) -> &QmddConfig {
        &self.config
    }

    pub fn cache(&self) -> std::cell::Ref<'_, Cache<OpKey, Edge>> {
        self.cache.borrow()
    }

    pub fn amplitudes(&self) -> std::cell::Ref<'_, A> {
        self.amps.borrow()
    }
}

// ============================================================================
// Variables and order
// ============================================================================

impl<A: AmplitudeTable> Qmdd<A> {
    /// Register a new variable on top of the current order.
    pub fn add_var(&self, label: impl Into<String>) -> Var {
        let var = Var::new(self.num_vars() as u32);
        let level = Level::new(self.num_vars());
        self.subtables.borrow_mut().push(Subtable::new(var));
        self.var_order.borrow_mut().push(var);
        self.level_map.borrow_mut().push(level);
        self.labels.borrow_mut().push(label.into());
        self.active_per_var.borrow_mut().push(0);
        debug!("add_var({}) at {}", var, level);
        var
    }

    /// Register `n` variables labelled `x0`, `x1`, ... (the last one on top).
    pub fn add_vars(&self, n: usize) -> Vec<Var> {
        (0..n)
            .map(|_| {
                let label = format!("x{}", self.num_vars());
                self.add_var(label)
            })
            .collect()
    }

    pub fn num_vars(&self) -> usize {
        self.var_order.borrow().len()
    }

    /// Level of `var` in the current order.
    pub fn level(&self, var: Var) -> Result<Level> {
        self.level_map.borrow().get(var.index()).copied().ok_or(QmddError::UnknownVariable(var))
    }

    /// Variable at `level` in the current order.
    pub fn var_at_level(&self, level: Level) -> Option<Var> {
        self.var_order.borrow().get(level.index()).copied()
    }

    pub fn label(&self, var: Var) -> Result<String> {
        self.labels.borrow().get(var.index()).cloned().ok_or(QmddError::UnknownVariable(var))
    }

    /// Find a variable by its label.
    pub fn var_by_label(&self, label: &str) -> Option<Var> {
        self.labels.borrow().iter().position(|l| l == label).map(|i| Var::new(i as u32))
    }

    /// Variables from the bottom level up.
    pub fn variable_order(&self) -> Vec<Var> {
        self.var_order.borrow().clone()
    }

    pub(crate) fn level_of(&self, var: Var) -> Level {
        self.level_map.borrow()[var.index()]
    }

    pub(crate) fn var_at(&self, level: Level) -> Var {
        self.var_order.borrow()[level.index()]
    }

    /// Exchange the variables at `lower` and `lower + 1` in the order tables.
    pub(crate) fn swap_order(&self, lower: Level) {
        let upper = lower.next();
        let mut var_order = self.var_order.borrow_mut();
        let mut level_map = self.level_map.borrow_mut();
        var_order.swap(lower.index(), upper.index());
        level_map[var_order[lower.index()].index()] = lower;
        level_map[var_order[upper.index()].index()] = upper;
    }
}

// ============================================================================
// Nodes, edges and amplitudes
// ============================================================================

impl<A: AmplitudeTable> Qmdd<A> {
    pub fn node(&self, id: NodeId) -> Node {
        *self.storage.borrow().value(id.index())
    }

    pub fn var_of(&self, id: NodeId) -> Var {
        self.storage.borrow().value(id.index()).var
    }

    pub fn children(&self, id: NodeId) -> [Edge; 4] {
        self.storage.borrow().value(id.index()).edges
    }

    pub fn ref_count(&self, id: NodeId) -> u32 {
        if id.is_terminal() {
            return 0;
        }
        self.storage.borrow().value(id.index()).ref_count
    }

    /// Level of the node an edge points to, `None` for the terminal.
    pub fn edge_level(&self, e: Edge) -> Option<Level> {
        if e.is_terminal() {
            None
        } else {
            Some(self.level_of(self.var_of(e.node)))
        }
    }

    /// Check that `e` is a canonical edge into this manager's node store.
    pub fn check_edge(&self, e: Edge) -> Result<()> {
        let valid_weight = e.weight.index() < self.amps.borrow().len();
        let valid_node = e.is_terminal() || (self.storage.borrow().is_occupied(e.node.index()) && !e.is_zero());
        let canonical_zero = !e.is_zero() || e == Edge::ZERO;
        if valid_weight && valid_node && canonical_zero {
            Ok(())
        } else {
            Err(QmddError::InvalidEdge(e))
        }
    }

    pub fn lookup(&self, value: &Cyclotomic) -> AmpId {
        self.amps.borrow_mut().lookup(value)
    }

    pub(crate) fn amp_add(&self, a: AmpId, b: AmpId) -> AmpId {
        self.amps.borrow_mut().add(a, b)
    }

    pub(crate) fn amp_sub(&self, a: AmpId, b: AmpId) -> AmpId {
        self.amps.borrow_mut().sub(a, b)
    }

    pub(crate) fn amp_mul(&self, a: AmpId, b: AmpId) -> AmpId {
        self.amps.borrow_mut().mul(a, b)
    }

    pub(crate) fn amp_div(&self, a: AmpId, b: AmpId) -> AmpId {
        self.amps.borrow_mut().div(a, b)
    }

    pub(crate) fn amp_conj(&self, a: AmpId) -> AmpId {
        self.amps.borrow_mut().conj(a)
    }

    pub(crate) fn amp_is_zero(&self, a: AmpId) -> bool {
        self.amps.borrow().is_zero(a)
    }

    /// `node` with weight `w`, or the zero edge if `w` is zero.
    pub(crate) fn weighted(&self, node: NodeId, w: AmpId) -> Edge {
        if self.amp_is_zero(w) {
            Edge::ZERO
        } else {
            Edge::new(node, w)
        }
    }

    /// Multiply the weight of `e` by `w`.
    pub fn scale(&self, e: Edge, w: AmpId) -> Edge {
        if e.is_zero() {
            return Edge::ZERO;
        }
        let product = self.amp_mul(e.weight, w);
        self.weighted(e.node, product)
    }
}

// ============================================================================
// Unique table
// ============================================================================

impl<A: AmplitudeTable> Qmdd<A> {
    /// Build (or find) the node for `var` with the given children.
    ///
    /// Every non-zero child must sit strictly below the level of `var`.
    /// The children are normalized first; the returned edge carries the
    /// factored-out weight.
    pub fn make_node(&self, var: Var, edges: [Edge; 4]) -> Result<Edge> {
        let level = self.level(var)?;
        for child in edges {
            self.check_edge(child)?;
            if let Some(child_level) = self.edge_level(child) {
                if child_level >= level {
                    return Err(QmddError::ChildAboveParent { var, level, child });
                }
            }
        }
        self.mk_node(var, edges)
    }

    /// Index of the child whose weight is factored out: the largest magnitude,
    /// lowest index among equals. `None` if all children are zero.
    fn pivot(&self, edges: &[Edge; 4]) -> Option<usize> {
        let amps = self.amps.borrow();
        let mut best: Option<usize> = None;
        for (k, e) in edges.iter().enumerate() {
            if e.is_zero() {
                continue;
            }
            match best {
                None => best = Some(k),
                Some(b) => {
                    if amps.cmp_magnitude(e.weight, edges[b].weight) == Ordering::Greater {
                        best = Some(k);
                    }
                }
            }
        }
        best
    }

    pub(crate) fn mk_node(&self, var: Var, mut edges: [Edge; 4]) -> Result<Edge> {
        debug!("mk(var = {}, edges = [{}, {}, {}, {}])", var, edges[0], edges[1], edges[2], edges[3]);

        for e in edges.iter_mut() {
            if self.amp_is_zero(e.weight) {
                *e = Edge::ZERO;
            }
        }

        let Some(pivot) = self.pivot(&edges) else {
            debug!("mk: all children zero");
            return Ok(Edge::ZERO);
        };
        let w = edges[pivot].weight;
        if w != AmpId::ONE {
            for e in edges.iter_mut() {
                if !e.is_zero() {
                    e.weight = self.amp_div(e.weight, w);
                }
            }
        }

        // Identity block on this variable: the node is redundant.
        if edges[1].is_zero() && edges[2].is_zero() && edges[0] == edges[3] {
            debug!("mk: identity block on {}", var);
            return Ok(Edge::new(edges[0].node, w));
        }

        let found = self.subtables.borrow()[var.index()].find(&edges);
        let id = match found {
            Some(id) => id,
            None => {
                let added = self.storage.borrow_mut().add(Node::new(var, edges));
                let Some(index) = added else {
                    let capacity = self.storage.borrow().capacity();
                    return Err(QmddError::NodeStoreExhausted { capacity });
                };
                let id = NodeId::new(index as u32);
                self.subtables.borrow_mut()[var.index()].insert(edges, id);
                id
            }
        };
        Ok(Edge::new(id, w))
    }
}

// ============================================================================
// Reference counting and garbage collection
// ============================================================================

impl<A: AmplitudeTable> Qmdd<A> {
    /// Register an external reference to `e`.
    pub fn incref(&self, e: Edge) -> Result<()> {
        self.check_edge(e)?;
        if !e.is_terminal() {
            self.incref_node(e.node);
        }
        Ok(())
    }

    /// Release an external reference to `e`.
    ///
    /// # Panics
    ///
    /// Panics if the node's reference count is already zero.
    pub fn decref(&self, e: Edge) -> Result<()> {
        self.check_edge(e)?;
        if !e.is_terminal() {
            self.decref_node(e.node);
        }
        Ok(())
    }

    fn incref_node(&self, id: NodeId) {
        let (alive_now, var, children) = {
            let mut storage = self.storage.borrow_mut();
            let node = storage.value_mut(id.index());
            node.ref_count = node
                .ref_count
                .checked_add(1)
                .unwrap_or_else(|| panic!("Reference count overflow on node {}", id));
            (node.ref_count == 1, node.var, node.edges)
        };
        if alive_now {
            self.active.set(self.active.get() + 1);
            self.active_per_var.borrow_mut()[var.index()] += 1;
            if self.active.get() > self.peak.get() {
                self.peak.set(self.active.get());
            }
            for child in children {
                if !child.is_terminal() {
                    self.incref_node(child.node);
                }
            }
        }
    }

    fn decref_node(&self, id: NodeId) {
        let (dead_now, var, children) = {
            let mut storage = self.storage.borrow_mut();
            let node = storage.value_mut(id.index());
            assert!(node.ref_count > 0, "Reference count underflow on node {}", id);
            node.ref_count -= 1;
            (node.ref_count == 0, node.var, node.edges)
        };
        if dead_now {
            self.active.set(self.active.get() - 1);
            self.active_per_var.borrow_mut()[var.index()] -= 1;
            for child in children {
                if !child.is_terminal() {
                    self.decref_node(child.node);
                }
            }
        }
    }

    /// Run `f` with `edges` temporarily referenced.
    pub(crate) fn protect<T>(&self, edges: &[Edge], f: impl FnOnce() -> Result<T>) -> Result<T> {
        for &e in edges {
            self.incref(e)?;
        }
        let res = f();
        for &e in edges {
            self.decref(e)?;
        }
        res
    }

    /// Reclaim every node with a zero reference count, and clear the computed table.
    ///
    /// Returns the number of reclaimed nodes.
    pub fn collect_garbage(&self) -> usize {
        debug!("Collecting garbage...");
        let mut reclaimed = 0;
        {
            let mut subtables = self.subtables.borrow_mut();
            let mut storage = self.storage.borrow_mut();
            for subtable in subtables.iter_mut() {
                let dead: Vec<(NodeId, [Edge; 4])> = subtable
                    .indices()
                    .map(|id| (id, storage.value(id.index())))
                    .filter(|(_, node)| !node.is_alive())
                    .map(|(id, node)| (id, node.edges))
                    .collect();
                for (id, edges) in dead {
                    debug!("Dropping {}", id);
                    subtable.remove(&edges);
                    storage.drop(id.index());
                    reclaimed += 1;
                }
            }
        }
        self.cache.borrow_mut().clear();
        self.gc_runs.set(self.gc_runs.get() + 1);
        info!(
            "gc: reclaimed {} nodes, {} allocated, {} active",
            reclaimed,
            self.allocated_node_count(),
            self.active_node_count()
        );
        reclaimed
    }

    /// Collect garbage if the allocation count crossed the current limit.
    ///
    /// Called at the entry of every public operation, with that operation's
    /// operands in `protect`.
    pub(crate) fn maybe_collect(&self, protect: &[Edge]) -> Result<()> {
        let (allocated, capacity) = {
            let storage = self.storage.borrow();
            (storage.real_size(), storage.capacity())
        };
        if allocated < self.gc_limit.get() && allocated < capacity - capacity / 4 {
            return Ok(());
        }
        self.protect(protect, || Ok(self.collect_garbage()))?;
        // Raise the limit when most of the store is live anyway.
        let allocated = self.allocated_node_count();
        if allocated * 2 > self.gc_limit.get() {
            self.gc_limit.set(allocated * 2);
            debug!("gc: limit raised to {}", self.gc_limit.get());
        }
        Ok(())
    }
}

impl<A: AmplitudeTable> Qmdd<A> {
    /// Run the body of a public operation on `operands`.
    ///
    /// The collector gets its regular chance first. If `f` then runs out of
    /// nodes, everything it built is garbage: a full pass with `operands`
    /// protected reclaims it, and `f` is retried once.
    pub(crate) fn with_gc<T>(&self, operands: &[Edge], f: impl Fn() -> Result<T>) -> Result<T> {
        self.maybe_collect(operands)?;
        match f() {
            Err(QmddError::NodeStoreExhausted { capacity }) => {
                debug!("gc: store exhausted (capacity {}), collecting and retrying", capacity);
                self.protect(operands, || Ok(self.collect_garbage()))?;
                f()
            }
            res => res,
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Snapshot of manager statistics.
#[derive(Debug, Clone, Default)]
pub struct QmddStats {
    pub allocated: usize,
    pub active: usize,
    pub peak: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub amplitudes: usize,
    pub gc_runs: usize,
}

impl Display for QmddStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocated={} active={} peak={} cache={}/{} amplitudes={} gc_runs={}",
            self.allocated,
            self.active,
            self.peak,
            self.cache_hits,
            self.cache_hits + self.cache_misses,
            self.amplitudes,
            self.gc_runs
        )
    }
}

impl<A: AmplitudeTable> Qmdd<A> {
    /// Number of nodes with a non-zero reference count.
    pub fn active_node_count(&self) -> usize {
        self.active.get()
    }

    /// Largest active node count observed so far.
    pub fn peak_node_count(&self) -> usize {
        self.peak.get()
    }

    /// Number of nodes in the store, dead ones included.
    pub fn allocated_node_count(&self) -> usize {
        self.storage.borrow().real_size()
    }

    /// Active node count of every level, from the bottom level up.
    pub fn level_node_counts(&self) -> Vec<usize> {
        let per_var = self.active_per_var.borrow();
        self.var_order.borrow().iter().map(|v| per_var[v.index()]).collect()
    }

    /// Active node count of one variable.
    pub fn var_node_count(&self, var: Var) -> usize {
        self.active_per_var.borrow().get(var.index()).copied().unwrap_or(0)
    }

    /// Live nodes of `var`, in unspecified order.
    pub(crate) fn alive_nodes(&self, var: Var) -> Vec<NodeId> {
        let subtables = self.subtables.borrow();
        let storage = self.storage.borrow();
        subtables[var.index()]
            .indices()
            .filter(|id| storage.value(id.index()).is_alive())
            .collect()
    }

    /// Number of distinct nodes reachable from `roots` (terminal excluded).
    pub fn count_nodes(&self, roots: &[Edge]) -> usize {
        let mut visited = HashSet::new();
        let mut stack: Vec<NodeId> = roots.iter().filter(|e| !e.is_terminal()).map(|e| e.node).collect();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            for child in self.children(id) {
                if !child.is_terminal() {
                    stack.push(child.node);
                }
            }
        }
        visited.len()
    }

    pub fn stats(&self) -> QmddStats {
        let cache = self.cache.borrow();
        QmddStats {
            allocated: self.allocated_node_count(),
            active: self.active_node_count(),
            peak: self.peak_node_count(),
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
            amplitudes: self.amps.borrow().len(),
            gc_runs: self.gc_runs.get(),
        }
    }
}
