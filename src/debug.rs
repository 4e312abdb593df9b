//! Debug utilities for inspecting QMDD structure.
//!
//! This module provides the export surface for external tooling: node
//! enumeration with a cap, the variable order as labels, and small dense
//! matrix dumps. These are primarily useful in tests and during development.

use std::collections::{HashSet, VecDeque};
use std::fmt::{self, Display};

use num_complex::Complex64;

use crate::amplitude::AmplitudeTable;
use crate::edge::Edge;
use crate::qmdd::Qmdd;
use crate::types::{Level, NodeId, Var};

/// Detailed information about a single QMDD node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub var: Var,
    pub label: String,
    /// Level of the variable in the current ordering
    pub level: Level,
    pub edges: [Edge; 4],
    pub ref_count: u32,
}

impl Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}={}, level={}, rc={}, edges=[{}, {}, {}, {}])",
            self.id,
            self.var,
            self.label,
            self.level.index(),
            self.ref_count,
            self.edges[0],
            self.edges[1],
            self.edges[2],
            self.edges[3],
        )
    }
}

/// A flat listing of the nodes below a root.
#[derive(Debug, Clone)]
pub struct QmddTree {
    pub root: Edge,
    pub nodes: Vec<NodeInfo>,
    /// Set if the node cap cut the listing short.
    pub truncated: bool,
}

impl Display for QmddTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "QMDD {} (size={}):", self.root, self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {}", node)?;
        }
        if self.truncated {
            writeln!(f, "  ...")?;
        }
        Ok(())
    }
}

impl<A: AmplitudeTable> Qmdd<A> {
    pub fn node_info(&self, id: NodeId) -> NodeInfo {
        let node = self.node(id);
        NodeInfo {
            id,
            var: node.var,
            label: self.label(node.var).unwrap_or_default(),
            level: self.level_of(node.var),
            edges: node.edges,
            ref_count: node.ref_count,
        }
    }

    /// Nodes reachable from `root` in breadth-first order, at most `limit` of
    /// them. The terminal is not listed.
    pub fn nodes(&self, root: Edge, limit: usize) -> Vec<NodeInfo> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([root.node]);

        while let Some(id) = queue.pop_front() {
            if result.len() >= limit {
                break;
            }
            if id.is_terminal() || !visited.insert(id) {
                continue;
            }
            let info = self.node_info(id);
            queue.extend(info.edges.iter().map(|e| e.node));
            result.push(info);
        }
        result
    }

    /// Listing of the nodes below `root`, sorted from the top level down.
    pub fn debug_tree(&self, root: Edge, limit: usize) -> QmddTree {
        let mut nodes = self.nodes(root, limit.saturating_add(1));
        let truncated = nodes.len() > limit;
        nodes.truncate(limit);
        nodes.sort_by_key(|n| std::cmp::Reverse(n.level));
        QmddTree { root, nodes, truncated }
    }

    /// Labels of the variables from the root level down.
    pub fn order_labels(&self) -> Vec<String> {
        self.order_top_down()
            .into_iter()
            .map(|var| self.label(var).unwrap_or_default())
            .collect()
    }

    /// Print the current variable ordering.
    pub fn debug_ordering(&self) -> String {
        let parts: Vec<String> = self
            .order_top_down()
            .into_iter()
            .map(|var| format!("{}@{}", self.label(var).unwrap_or_default(), self.level_of(var)))
            .collect();
        format!("Ordering: [{}]", parts.join(", "))
    }

    /// The full matrix of `root`, rows and columns indexed with bit `i` taken
    /// from variable `i`. Only sensible for a handful of variables.
    pub fn dense_matrix(&self, root: Edge) -> Vec<Vec<Complex64>> {
        let n = self.num_vars();
        let dim = 1usize << n;
        let bits = |value: usize| (0..n).map(|i| value >> i & 1 == 1).collect::<Vec<_>>();
        (0..dim)
            .map(|row| {
                (0..dim)
                    .map(|col| match self.entry(root, &bits(row), &bits(col)) {
                        Ok(w) => self.amplitudes().to_complex(w),
                        Err(_) => Complex64::new(f64::NAN, f64::NAN),
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::gate::{Control, GateKind};

    #[test]
    fn test_node_info() {
        let qmdd = Qmdd::default();
        let vars = qmdd.add_vars(2);
        let cx = qmdd.gate(GateKind::X, &[Control::pos(vars[1])], vars[0]).unwrap();

        let info = qmdd.node_info(cx.node);
        assert_eq!(info.var, vars[1]);
        assert_eq!(info.label, "x1");
        assert_eq!(info.level, Level::new(1));
        assert_eq!(info.ref_count, 0);
    }

    #[test]
    fn test_nodes_with_limit() {
        let qmdd = Qmdd::default();
        let vars = qmdd.add_vars(2);
        let cx = qmdd.gate(GateKind::X, &[Control::pos(vars[1])], vars[0]).unwrap();

        // Control node plus the X node below it.
        assert_eq!(qmdd.nodes(cx, 100).len(), 2);
        assert_eq!(qmdd.nodes(cx, 1).len(), 1);
        assert_eq!(qmdd.nodes(cx, 1)[0].id, cx.node);
        assert!(qmdd.nodes(Edge::ONE, 10).is_empty());

        let tree = qmdd.debug_tree(cx, 1);
        assert!(tree.truncated);
        let s = tree.to_string();
        assert!(s.contains("x1"), "Expected x1 in: {}", s);
    }

    #[test]
    fn test_order_labels() {
        let qmdd = Qmdd::default();
        qmdd.add_var("a");
        qmdd.add_var("b");
        qmdd.add_var("c");
        assert_eq!(qmdd.order_labels(), vec!["c", "b", "a"]);
        assert_eq!(qmdd.debug_ordering(), "Ordering: [c@L2, b@L1, a@L0]");
    }

    #[test]
    fn test_dense_matrix() {
        let qmdd = Qmdd::default();
        let x = qmdd.add_var("q");
        let y = qmdd.gate(GateKind::Y, &[], x).unwrap();
        let m = qmdd.dense_matrix(y);
        assert!((m[0][1] - Complex64::new(0.0, -1.0)).norm() < 1e-12);
        assert!((m[1][0] - Complex64::new(0.0, 1.0)).norm() < 1e-12);
        assert!(m[0][0].norm() < 1e-12);
    }
}
