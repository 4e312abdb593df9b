use std::fmt::{Display, Formatter};

use crate::amplitude::AmpId;
use crate::types::NodeId;

/// A weighted reference to a node: the node's matrix scaled by an amplitude.
///
/// Every edge whose weight is zero is the [`Edge::ZERO`] edge, pointing to the terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Edge {
    pub node: NodeId,
    pub weight: AmpId,
}

impl Edge {
    /// The zero matrix.
    pub const ZERO: Edge = Edge::new(NodeId::TERMINAL, AmpId::ZERO);
    /// The identity matrix (all levels skipped, weight one).
    pub const ONE: Edge = Edge::new(NodeId::TERMINAL, AmpId::ONE);

    pub const fn new(node: NodeId, weight: AmpId) -> Self {
        Self { node, weight }
    }

    pub const fn terminal(weight: AmpId) -> Self {
        Self::new(NodeId::TERMINAL, weight)
    }

    pub fn is_terminal(&self) -> bool {
        self.node.is_terminal()
    }

    pub fn is_zero(&self) -> bool {
        self.weight == AmpId::ZERO
    }

    /// Same node, different weight.
    pub fn with_weight(self, weight: AmpId) -> Self {
        Self::new(self.node, weight)
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.weight, self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_constants() {
        assert!(Edge::ZERO.is_zero());
        assert!(Edge::ZERO.is_terminal());
        assert!(!Edge::ONE.is_zero());
        assert_eq!(Edge::ONE.to_string(), "w1@T");
        assert_eq!(Edge::new(NodeId::new(5), AmpId::new(7)).to_string(), "w7@5");
    }
}
