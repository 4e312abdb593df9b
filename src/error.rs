//! Error types for the QMDD engine.

use thiserror::Error;

use crate::edge::Edge;
use crate::types::{Level, NodeId, Var};

/// Errors reported to callers of the engine.
///
/// Precondition violations and resource exhaustion are returned as values.
/// Internal invariant violations (reference count underflow, division by a
/// zero amplitude) panic instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QmddError {
    /// Swap requested at a level that has no neighbour above it.
    #[error("Level {level} cannot be swapped (order has {levels} levels)")]
    InvalidLevel {
        /// The requested lower level of the swap.
        level: usize,
        /// Number of levels in the current order.
        levels: usize,
    },

    /// Variable not registered in the manager.
    #[error("Unknown variable {0}")]
    UnknownVariable(Var),

    /// Edge points outside the node store or to a reclaimed node.
    #[error("Edge {0} does not reference a live node of this manager")]
    InvalidEdge(Edge),

    /// A child edge is not strictly below the node being built.
    #[error("Child {child} of a node for {var} is not below {level}")]
    ChildAboveParent {
        /// Variable of the node being built.
        var: Var,
        /// Level of that variable.
        level: Level,
        /// The offending child edge.
        child: Edge,
    },

    /// Target order is not a permutation of the registered variables.
    #[error("Invalid variable order: {0}")]
    InvalidOrder(String),

    /// Column specification does not cover every variable.
    #[error("Column specification has {got} bits, expected {expected}")]
    ColumnLength {
        /// Number of variables.
        expected: usize,
        /// Length of the given specification.
        got: usize,
    },

    /// Gate lists its target among its controls.
    #[error("Gate target {0} is also a control")]
    TargetIsControl(Var),

    /// Gate lists the same control variable more than once.
    #[error("Control {0} appears more than once")]
    DuplicateControl(Var),

    /// A reorder would change the meaning of a referenced node that is not
    /// reachable from the roots handed to it.
    #[error("Node {0} is referenced outside the roots being reordered")]
    UnlistedReference(NodeId),

    /// No free slot is left in the node store.
    #[error("Node store exhausted (capacity {capacity})")]
    NodeStoreExhausted {
        /// Capacity of the store.
        capacity: usize,
    },

    /// Malformed circuit description.
    #[error("Line {line}: {message}")]
    Parse {
        /// 1-based line number in the input.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QmddError>;
