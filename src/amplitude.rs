//! Amplitude tables: canonical complex values addressed by index.
//!
//! The diagram engine never touches complex numbers directly. Edge weights are
//! [`AmpId`] indices into an [`AmplitudeTable`], and every arithmetic operation
//! returns a canonical index, so two weights denote the same value exactly when
//! their indices are equal. This is what makes node canonicity well-defined.
//!
//! Two implementations are provided:
//!
//! - [`CyclotomicTable`]: exact arithmetic in the field Q(ω), ω = e^{iπ/4},
//!   with arbitrary precision rational coefficients. All Clifford+T gates,
//!   the V gate and the Hadamard gate live in this field.
//! - [`FloatTable`]: `f64` complex values canonicalized by a tolerance grid.

use std::cmp::Ordering;
use std::fmt;

use num_complex::Complex64;

pub mod cyclotomic;
pub mod float;

pub use cyclotomic::{Cyclotomic, CyclotomicTable};
pub use float::FloatTable;

/// Index of a canonical amplitude.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct AmpId(u32);

impl AmpId {
    pub const ZERO: AmpId = AmpId(0);
    pub const ONE: AmpId = AmpId(1);

    pub const fn new(index: u32) -> Self {
        AmpId(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AmpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Canonical table of complex amplitudes.
///
/// Implementations must store zero at [`AmpId::ZERO`] and one at [`AmpId::ONE`],
/// and must return the same index for equal values.
pub trait AmplitudeTable {
    /// Return the index of `value`, inserting it if necessary.
    fn lookup(&mut self, value: &Cyclotomic) -> AmpId;

    fn add(&mut self, a: AmpId, b: AmpId) -> AmpId;
    fn sub(&mut self, a: AmpId, b: AmpId) -> AmpId;
    fn mul(&mut self, a: AmpId, b: AmpId) -> AmpId;

    /// Divide `a` by `b`.
    ///
    /// # Panics
    ///
    /// Panics if `b` is zero.
    fn div(&mut self, a: AmpId, b: AmpId) -> AmpId;

    fn neg(&mut self, a: AmpId) -> AmpId;
    fn conj(&mut self, a: AmpId) -> AmpId;

    /// Equality of the denoted values (within tolerance for inexact tables).
    fn eq(&self, a: AmpId, b: AmpId) -> bool {
        a == b
    }

    fn is_zero(&self, a: AmpId) -> bool {
        a == AmpId::ZERO
    }

    fn is_one(&self, a: AmpId) -> bool {
        a == AmpId::ONE
    }

    /// Magnitude `|a|`.
    fn norm(&self, a: AmpId) -> f64;

    /// Compare `|a|` with `|b|`.
    fn cmp_magnitude(&self, a: AmpId, b: AmpId) -> Ordering;

    /// Approximate value, for printing and export.
    fn to_complex(&self, a: AmpId) -> Complex64;

    /// Number of stored amplitudes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Conj,
}
