//! Per-variable unique table for QMDD nodes.
//!
//! Each subtable stores the nodes of one variable, keyed by their four
//! normalized child edges:
//!
//! ```text
//! subtables[x0] → nodes labelled with x0
//! subtables[x1] → nodes labelled with x1
//! ...
//! ```
//!
//! Since all nodes in a subtable have the same variable, the variable is not part
//! of the key. Subtables are indexed by variable rather than by level, so
//! reordering does not move entries between subtables: a swap only inserts the
//! nodes it rebuilds.

use std::collections::HashMap;

use crate::edge::Edge;
use crate::types::{NodeId, Var};

/// A subtable storing QMDD nodes for a single variable.
#[derive(Debug, Clone)]
pub struct Subtable {
    /// The variable for all nodes in this subtable.
    pub variable: Var,

    /// Map from the four children to node index in the global storage.
    nodes: HashMap<[Edge; 4], NodeId>,
}

impl Subtable {
    /// Create a new empty subtable for the given variable.
    pub fn new(variable: Var) -> Self {
        Self {
            variable,
            nodes: HashMap::new(),
        }
    }

    /// Look up a node by its children.
    pub fn find(&self, edges: &[Edge; 4]) -> Option<NodeId> {
        self.nodes.get(edges).copied()
    }

    /// Insert a node into the subtable.
    ///
    /// # Panics
    ///
    /// Panics if another node is already registered under the same children,
    /// which would break canonicity.
    pub fn insert(&mut self, edges: [Edge; 4], id: NodeId) {
        let previous = self.nodes.insert(edges, id);
        assert!(
            previous.is_none(),
            "Unique table corrupted: {:?} already maps to {:?}",
            edges,
            previous
        );
    }

    /// Remove a node from the subtable.
    ///
    /// Returns the node index if the node was present.
    pub fn remove(&mut self, edges: &[Edge; 4]) -> Option<NodeId> {
        self.nodes.remove(edges)
    }

    /// Get the number of nodes in this subtable.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the subtable is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all node indices in this subtable.
    pub fn indices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.values().copied()
    }

    /// Clear all nodes from the subtable.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
