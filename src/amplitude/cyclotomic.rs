//! Exact amplitudes in the cyclotomic field Q(ω), ω = e^{iπ/4}.
//!
//! An element is `c0 + c1·ω + c2·ω² + c3·ω³` with rational coefficients,
//! using `ω⁴ = -1`. Useful identities:
//!
//! ```text
//! i  = ω²
//! √2 = ω - ω³
//! ```
//!
//! Equality of elements is equality of coefficient vectors, so the table
//! canonicalizes values exactly (no tolerance involved).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use log::debug;
use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use super::{AmpId, AmplitudeTable, ArithOp};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cyclotomic {
    coeffs: [BigRational; 4],
}

impl Cyclotomic {
    pub fn from_coeffs(coeffs: [BigRational; 4]) -> Self {
        Self { coeffs }
    }

    pub fn zero() -> Self {
        Self::from_coeffs(std::array::from_fn(|_| BigRational::zero()))
    }

    pub fn one() -> Self {
        Self::integer(1)
    }

    pub fn integer(n: i64) -> Self {
        let mut value = Self::zero();
        value.coeffs[0] = BigRational::from_integer(BigInt::from(n));
        value
    }

    /// The rational `numer / denom`.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    pub fn rational(numer: i64, denom: i64) -> Self {
        let mut value = Self::zero();
        value.coeffs[0] = BigRational::new(BigInt::from(numer), BigInt::from(denom));
        value
    }

    /// `ω^k`, the k-th power of the primitive 8th root of unity.
    pub fn omega(k: u32) -> Self {
        let k = (k % 8) as usize;
        let mut value = Self::zero();
        if k < 4 {
            value.coeffs[k] = BigRational::one();
        } else {
            value.coeffs[k - 4] = -BigRational::one();
        }
        value
    }

    pub fn i() -> Self {
        Self::omega(2)
    }

    pub fn sqrt2() -> Self {
        &Self::omega(1) - &Self::omega(3)
    }

    /// `1/√2 = (ω - ω³) / 2`.
    pub fn frac_1_sqrt2() -> Self {
        Self::sqrt2().scale(&BigRational::new(BigInt::from(1), BigInt::from(2)))
    }

    /// `(a + b·√2) / c`.
    ///
    /// # Panics
    ///
    /// Panics if `c` is zero.
    pub fn qmake(a: i64, b: i64, c: i64) -> Self {
        let sum = &Self::integer(a) + &Self::sqrt2().scale(&BigRational::from_integer(BigInt::from(b)));
        sum.scale(&BigRational::new(BigInt::from(1), BigInt::from(c)))
    }

    pub fn coeffs(&self) -> &[BigRational; 4] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|c| c.is_zero())
    }

    pub fn is_one(&self) -> bool {
        self.coeffs[0].is_one() && self.coeffs[1..].iter().all(|c| c.is_zero())
    }

    pub fn scale(&self, factor: &BigRational) -> Self {
        Self::from_coeffs(std::array::from_fn(|k| &self.coeffs[k] * factor))
    }

    /// Apply the field automorphism `ω ↦ ω^k` (k odd).
    pub fn galois(&self, k: u32) -> Self {
        let mut out = Self::zero();
        for (j, c) in self.coeffs.iter().enumerate() {
            let e = (k as usize * j) % 8;
            if e < 4 {
                out.coeffs[e] += c.clone();
            } else {
                out.coeffs[e - 4] -= c.clone();
            }
        }
        out
    }

    /// Complex conjugate, `ω ↦ ω⁷`.
    pub fn conj(&self) -> Self {
        self.galois(7)
    }

    /// Multiplicative inverse, or `None` for zero.
    ///
    /// Uses the field norm: `x⁻¹ = σ3(x)·σ5(x)·σ7(x) / N(x)`, where
    /// `N(x) = x·σ3(x)·σ5(x)·σ7(x)` is rational.
    pub fn inverse(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        let conjugates = &(&self.galois(3) * &self.galois(5)) * &self.galois(7);
        let norm = (self * &conjugates).coeffs[0].clone();
        Some(conjugates.scale(&norm.recip()))
    }

    /// `|x|²` written as `p + q·√2` with rational `p`, `q`.
    pub fn norm_sqr(&self) -> (BigRational, BigRational) {
        let r = self * &self.conj();
        let [p, q, _, _] = r.coeffs;
        (p, q)
    }

    /// Compare `|self|` with `|other|` exactly.
    pub fn cmp_magnitude(&self, other: &Self) -> Ordering {
        let (p1, q1) = self.norm_sqr();
        let (p2, q2) = other.norm_sqr();
        sign_with_sqrt2(&(p1 - p2), &(q1 - q2))
    }

    pub fn to_complex(&self) -> Complex64 {
        let c: [f64; 4] = std::array::from_fn(|k| ratio_to_f64(&self.coeffs[k]));
        let s = std::f64::consts::FRAC_1_SQRT_2;
        Complex64::new(c[0] + s * (c[1] - c[3]), c[2] + s * (c[1] + c[3]))
    }
}

/// Sign of `p + q·√2`.
fn sign_with_sqrt2(p: &BigRational, q: &BigRational) -> Ordering {
    let zero = BigRational::zero();
    match (p.cmp(&zero), q.cmp(&zero)) {
        (Ordering::Equal, qs) => qs,
        (ps, Ordering::Equal) => ps,
        (Ordering::Greater, Ordering::Greater) => Ordering::Greater,
        (Ordering::Less, Ordering::Less) => Ordering::Less,
        (Ordering::Greater, Ordering::Less) => {
            let two_q2 = q * q * BigRational::from_integer(BigInt::from(2));
            (p * p).cmp(&two_q2)
        }
        (Ordering::Less, Ordering::Greater) => {
            let two_q2 = q * q * BigRational::from_integer(BigInt::from(2));
            two_q2.cmp(&(p * p))
        }
    }
}

fn ratio_to_f64(r: &BigRational) -> f64 {
    let numer = r.numer().to_f64().unwrap_or(f64::NAN);
    let denom = r.denom().to_f64().unwrap_or(f64::NAN);
    numer / denom
}

impl Add for &Cyclotomic {
    type Output = Cyclotomic;

    fn add(self, rhs: &Cyclotomic) -> Cyclotomic {
        Cyclotomic::from_coeffs(std::array::from_fn(|k| &self.coeffs[k] + &rhs.coeffs[k]))
    }
}

impl Sub for &Cyclotomic {
    type Output = Cyclotomic;

    fn sub(self, rhs: &Cyclotomic) -> Cyclotomic {
        Cyclotomic::from_coeffs(std::array::from_fn(|k| &self.coeffs[k] - &rhs.coeffs[k]))
    }
}

impl Mul for &Cyclotomic {
    type Output = Cyclotomic;

    fn mul(self, rhs: &Cyclotomic) -> Cyclotomic {
        let mut out = Cyclotomic::zero();
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in rhs.coeffs.iter().enumerate() {
                let prod = a * b;
                // ω⁴ = -1
                if i + j < 4 {
                    out.coeffs[i + j] += prod;
                } else {
                    out.coeffs[i + j - 4] -= prod;
                }
            }
        }
        out
    }
}

impl Neg for &Cyclotomic {
    type Output = Cyclotomic;

    fn neg(self) -> Cyclotomic {
        Cyclotomic::from_coeffs(std::array::from_fn(|k| -&self.coeffs[k]))
    }
}

impl fmt::Display for Cyclotomic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        const BASIS: [&str; 4] = ["", "ω", "ω²", "ω³"];
        let mut first = true;
        for (c, basis) in self.coeffs.iter().zip(BASIS) {
            if c.is_zero() {
                continue;
            }
            if !first {
                write!(f, " {} ", if c.is_negative() { '-' } else { '+' })?;
            } else if c.is_negative() {
                write!(f, "-")?;
            }
            let magnitude = c.abs();
            if basis.is_empty() || !magnitude.is_one() {
                write!(f, "{}", magnitude)?;
            }
            write!(f, "{}", basis)?;
            first = false;
        }
        Ok(())
    }
}

/// Exact amplitude table over Q(ω).
///
/// Values are never removed. Results of arithmetic are memoized by operand indices.
#[derive(Debug, Clone)]
pub struct CyclotomicTable {
    values: Vec<Cyclotomic>,
    index: HashMap<Cyclotomic, AmpId>,
    computed: HashMap<(ArithOp, AmpId, AmpId), AmpId>,
}

impl Default for CyclotomicTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CyclotomicTable {
    pub fn new() -> Self {
        let mut table = Self {
            values: Vec::new(),
            index: HashMap::new(),
            computed: HashMap::new(),
        };
        let zero = table.lookup(&Cyclotomic::zero());
        let one = table.lookup(&Cyclotomic::one());
        assert_eq!(zero, AmpId::ZERO);
        assert_eq!(one, AmpId::ONE);
        table
    }

    pub fn value(&self, a: AmpId) -> &Cyclotomic {
        &self.values[a.index()]
    }

    fn computed<F>(&mut self, op: ArithOp, a: AmpId, b: AmpId, f: F) -> AmpId
    where
        F: FnOnce(&Cyclotomic, &Cyclotomic) -> Cyclotomic,
    {
        if let Some(&res) = self.computed.get(&(op, a, b)) {
            return res;
        }
        let value = f(&self.values[a.index()], &self.values[b.index()]);
        let res = self.lookup(&value);
        debug!("amplitude: {:?}({}, {}) -> {} = {}", op, a, b, res, value);
        self.computed.insert((op, a, b), res);
        res
    }
}

impl AmplitudeTable for CyclotomicTable {
    fn lookup(&mut self, value: &Cyclotomic) -> AmpId {
        if let Some(&id) = self.index.get(value) {
            return id;
        }
        let id = AmpId::new(self.values.len() as u32);
        self.values.push(value.clone());
        self.index.insert(value.clone(), id);
        id
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
        self.computed(ArithOp::Div, a, b, |x, y| {
            let inv = y.inverse().unwrap_or_else(|| panic!("Division by zero amplitude"));
            x * &inv
        })
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

    fn norm(&self, a: AmpId) -> f64 {
        let (p, q) = self.value(a).norm_sqr();
        (ratio_to_f64(&p) + ratio_to_f64(&q) * std::f64::consts::SQRT_2).max(0.0).sqrt()
    }

    fn cmp_magnitude(&self, a: AmpId, b: AmpId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        self.value(a).cmp_magnitude(self.value(b))
    }

    fn to_complex(&self, a: AmpId) -> Complex64 {
        self.value(a).to_complex()
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}
