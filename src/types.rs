//! Type-safe wrappers for QMDD variables, levels and node handles.
//!
//! This module provides newtype wrappers that enforce compile-time distinction
//! between variable IDs, level indices and node indices, preventing common
//! mistakes in diagram manipulation code.
use std::fmt;

/// A variable identifier (0-indexed circuit line).
///
/// Variables correspond to qubit lines of a circuit. Unlike levels,
/// variable IDs are stable across reordering operations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given ID.
    pub const fn new(id: u32) -> Self {
        Var(id)
    }

    /// Returns the raw variable ID as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Returns the variable ID as an index into per-variable tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A level in the variable ordering (0-indexed).
///
/// Levels represent the position of a variable in the current ordering.
/// Unlike variable IDs, levels change when variables are reordered.
///
/// # Invariants
///
/// - Level 0 is the bottom level (closest to the terminal)
/// - Levels increase upward toward the root
/// - The terminal node has no level
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(usize);

impl Level {
    /// Creates a new level with the given index.
    pub fn new(index: usize) -> Self {
        Level(index)
    }

    /// Returns the raw level index as a `usize`.
    pub fn index(self) -> usize {
        self.0
    }

    /// Returns the next level up (index + 1), toward the root.
    pub fn next(self) -> Self {
        Level(self.0 + 1)
    }

    /// Returns the level below (index - 1), or None if at level 0.
    pub fn prev(self) -> Option<Self> {
        if self.0 > 0 {
            Some(Level(self.0 - 1))
        } else {
            None
        }
    }

    /// Checks if this is the bottom level (level 0).
    pub fn is_bottom(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl From<Level> for usize {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl From<usize> for Level {
    fn from(index: usize) -> Self {
        Level(index)
    }
}

/// Index of a node in the node store.
///
/// Index 0 is reserved for the terminal node, which represents the scalar 1
/// and is never reclaimed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The terminal node.
    pub const TERMINAL: NodeId = NodeId(0);

    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_terminal(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "@T")
        } else {
            write!(f, "@{}", self.0)
        }
    }
}
