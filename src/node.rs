use crate::edge::Edge;
use crate::types::Var;
use crate::utils::{pairing2, MyHash};

/// A QMDD node: one variable and four weighted children.
///
/// Child `k = 2*row + col` is the sub-block selected by the row and column bit
/// of this node's variable.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Node {
    pub var: Var,
    pub edges: [Edge; 4],
    pub ref_count: u32,
}

impl Node {
    pub fn new(var: Var, edges: [Edge; 4]) -> Self {
        Self {
            var,
            edges,
            ref_count: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.ref_count > 0
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(Var::new(u32::MAX), [Edge::ZERO; 4])
    }
}

impl MyHash for Edge {
    fn hash(&self) -> u64 {
        pairing2(self.node.raw() as u64, self.weight.index() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_dead() {
        let node = Node::new(Var::new(0), [Edge::ONE, Edge::ZERO, Edge::ZERO, Edge::ZERO]);
        assert!(!node.is_alive());
        assert_eq!(node.ref_count, 0);
    }
}
