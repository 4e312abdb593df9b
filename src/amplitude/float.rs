//! Floating-point amplitudes canonicalized by tolerance.
//!
//! Values within `tolerance` of an already stored value map to the stored index.
//! Lookup hashes the value into a grid with cell size `tolerance` and scans the
//! neighbouring cells, so it stays O(1) on average.

use std::cmp::Ordering;
use std::collections::HashMap;

use num_complex::Complex64;

use super::{AmpId, AmplitudeTable, ArithOp, Cyclotomic};

#[derive(Debug, Clone)]
pub struct FloatTable {
    values: Vec<Complex64>,
    grid: HashMap<(i64, i64), Vec<AmpId>>,
    computed: HashMap<(ArithOp, AmpId, AmpId), AmpId>,
    tolerance: f64,
}

impl Default for FloatTable {
    fn default() -> Self {
        Self::with_tolerance(1e-12)
    }
}

impl FloatTable {
    pub fn with_tolerance(tolerance: f64) -> Self {
        assert!(tolerance > 0.0, "Tolerance must be positive");
        let mut table = Self {
            values: Vec::new(),
            grid: HashMap::new(),
            computed: HashMap::new(),
            tolerance,
        };
        let zero = table.lookup_complex(Complex64::new(0.0, 0.0));
        let one = table.lookup_complex(Complex64::new(1.0, 0.0));
        assert_eq!(zero, AmpId::ZERO);
        assert_eq!(one, AmpId::ONE);
        table
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn value(&self, a: AmpId) -> Complex64 {
        self.values[a.index()]
    }

    fn cell(&self, z: Complex64) -> (i64, i64) {
        ((z.re / self.tolerance).round() as i64, (z.im / self.tolerance).round() as i64)
    }

    /// Return the index of a stored value within tolerance of `z`, inserting `z` otherwise.
    pub fn lookup_complex(&mut self, z: Complex64) -> AmpId {
        let (cx, cy) = self.cell(z);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(ids) = self.grid.get(&(cx + dx, cy + dy)) {
                    for &id in ids {
                        if (self.values[id.index()] - z).norm() <= self.tolerance {
                            return id;
                        }
                    }
                }
            }
        }
        let id = AmpId::new(self.values.len() as u32);
        self.values.push(z);
        self.grid.entry((cx, cy)).or_default().push(id);
        id
    }

    fn computed<F>(&mut self, op: ArithOp, a: AmpId, b: AmpId, f: F) -> AmpId
    where
        F: FnOnce(Complex64, Complex64) -> Complex64,
    {
        if let Some(&res) = self.computed.get(&(op, a, b)) {
            return res;
        }
        let res = self.lookup_complex(f(self.value(a), self.value(b)));
        self.computed.insert((op, a, b), res);
        res
    }
}

impl AmplitudeTable for FloatTable {
    fn lookup(&mut self, value: &Cyclotomic) -> AmpId {
        self.lookup_complex(value.to_complex())
    }

    fn add(&mut self, a: AmpId, b: AmpId) -> AmpId {
        if a == AmpId::ZERO {
            return b;
        }
        if b == AmpId::ZERO {
            return a;
        }
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        self.computed(ArithOp::Add, a, b, |x, y| x + y)
    }

    fn sub(&mut self, a: AmpId, b: AmpId) -> AmpId {
        if b == AmpId::ZERO {
            return a;
        }
        if a == b {
            return AmpId::ZERO;
        }
        self.computed(ArithOp::Sub, a, b, |x, y| x - y)
    }

    fn mul(&mut self, a: AmpId, b: AmpId) -> AmpId {
        if a == AmpId::ZERO || b == AmpId::ZERO {
            return AmpId::ZERO;
        }
        if a == AmpId::ONE {
            return b;
        }
        if b == AmpId::ONE {
            return a;
        }
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        self.computed(ArithOp::Mul, a, b, |x, y| x * y)
    }

    fn div(&mut self, a: AmpId, b: AmpId) -> AmpId {
        assert_ne!(b, AmpId::ZERO, "Division by zero amplitude");
        if a == AmpId::ZERO {
            return AmpId::ZERO;
        }
        if b == AmpId::ONE {
            return a;
        }
        if a == b {
            return AmpId::ONE;
        }
        self.computed(ArithOp::Div, a, b, |x, y| x / y)
    }

    fn neg(&mut self, a: AmpId) -> AmpId {
        if a == AmpId::ZERO {
            return a;
        }
        self.computed(ArithOp::Neg, a, a, |x, _| -x)
    }

    fn conj(&mut self, a: AmpId) -> AmpId {
        if a == AmpId::ZERO || a == AmpId::ONE {
            return a;
        }
        self.computed(ArithOp::Conj, a, a, |x, _| x.conj())
    }

    fn eq(&self, a: AmpId, b: AmpId) -> bool {
        a == b || (self.value(a) - self.value(b)).norm() <= self.tolerance
    }

    fn is_zero(&self, a: AmpId) -> bool {
        self.eq(a, AmpId::ZERO)
    }

    fn is_one(&self, a: AmpId) -> bool {
        self.eq(a, AmpId::ONE)
    }

    fn norm(&self, a: AmpId) -> f64 {
        self.value(a).norm()
    }

    fn cmp_magnitude(&self, a: AmpId, b: AmpId) -> Ordering {
        let (x, y) = (self.norm(a), self.norm(b));
        if (x - y).abs() <= self.tolerance {
            Ordering::Equal
        } else if x < y {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    fn to_complex(&self, a: AmpId) -> Complex64 {
        self.value(a)
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_tolerance_lookup() {
        let mut table = FloatTable::with_tolerance(1e-9);
        let a = table.lookup_complex(Complex64::new(0.5, 0.25));
        let b = table.lookup_complex(Complex64::new(0.5 + 1e-11, 0.25 - 1e-11));
        assert_eq!(a, b);
        let c = table.lookup_complex(Complex64::new(0.5 + 1e-6, 0.25));
        assert_ne!(a, c);
        assert_eq!(table.lookup_complex(Complex64::new(1e-12, 0.0)), AmpId::ZERO);
    }

    #[test]
    fn test_arithmetic_matches_exact() {
        let mut table = FloatTable::default();
        let h = table.lookup(&Cyclotomic::frac_1_sqrt2());
        let hh = table.mul(h, h);
        let half = table.lookup(&Cyclotomic::rational(1, 2));
        assert_eq!(hh, half);
        assert_eq!(table.add(hh, hh), AmpId::ONE);
        let i = table.lookup(&Cyclotomic::i());
        let minus_i = table.conj(i);
        assert_eq!(table.mul(i, minus_i), AmpId::ONE);
        assert_eq!(table.cmp_magnitude(i, AmpId::ONE), Ordering::Equal);
        assert_eq!(table.cmp_magnitude(h, AmpId::ONE), Ordering::Less);
    }
}
