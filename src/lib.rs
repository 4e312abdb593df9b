//! # qmdd-rs: Quantum Multiple-valued Decision Diagrams in Rust
//!
//! **`qmdd-rs`** is a manager-centric library for representing the unitary
//! matrices of quantum and reversible circuits as **QMDDs**, comparing them
//! for exact equivalence and shrinking them by variable reordering.
//!
//! ## What is a QMDD?
//!
//! A QMDD is a decision diagram for a `2^n × 2^n` complex matrix. Each node
//! splits the matrix by the row and column bit of one variable into four
//! blocks, and each edge carries a complex weight. With normalized weights
//! and hash-consed nodes the diagram is **canonical**: for a fixed variable
//! order, every matrix has exactly one representation, so equivalence of two
//! circuits is an identity check on their root edges.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: all operations go through the
//!   [`Qmdd`][crate::qmdd::Qmdd] manager, which owns the node store, the
//!   unique tables, the computed table and the amplitude table.
//! - **Exact amplitudes**: weights live in the cyclotomic field Q(ω),
//!   ω = e^{iπ/4}, which covers Clifford+T, V and Hadamard circuits exactly.
//!   A tolerance-based floating table is available behind the same trait.
//! - **Reference counting**: callers [`incref`][crate::qmdd::Qmdd::incref]
//!   the edges they keep; garbage is collected between operations.
//! - **Reordering**: adjacent swaps, sifting and exhaustive search.
//!
//! ## Basic Usage
//!
//! ```rust
//! use qmdd_rs::gate::{Control, GateKind};
//! use qmdd_rs::qmdd::Qmdd;
//!
//! // 1. Initialize the manager
//! let qmdd = Qmdd::default();
//!
//! // 2. Register two qubits (the last one on top)
//! let vars = qmdd.add_vars(2);
//!
//! // 3. H on qubit 0, twice, is the identity
//! let h = qmdd.gate(GateKind::H, &[], vars[0]).unwrap();
//! let hh = qmdd.multiply(h, h).unwrap();
//! assert!(qmdd.is_identity(hh));
//!
//! // 4. CNOT is its own inverse
//! let cx = qmdd.gate(GateKind::X, &[Control::pos(vars[0])], vars[1]).unwrap();
//! qmdd.incref(cx).unwrap();
//! let id = qmdd.multiply(cx, cx).unwrap();
//! assert_eq!(id, qmdd.identity());
//! ```
//!
//! ## Core Components
//!
//! - **[`qmdd`]**: the manager: variables, node construction, reference
//!   counting, garbage collection and statistics.
//! - **[`ops`]**: add, multiply, transpose, trace, column extraction.
//! - **[`reorder`]**: swaps, sifting and exact reordering.
//! - **[`gate`]** and **[`circuit`]**: building diagrams from gates and RevLib files.

pub mod amplitude;
pub mod cache;
pub mod circuit;
pub mod config;
pub mod debug;
pub mod edge;
pub mod error;
pub mod gate;
pub mod node;
pub mod ops;
pub mod qmdd;
pub mod reorder;
pub mod storage;
pub mod subtable;
pub mod types;
pub mod utils;
