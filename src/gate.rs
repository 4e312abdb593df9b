use std::collections::HashSet;

use log::debug;

use crate::amplitude::{AmpId, AmplitudeTable, Cyclotomic};
use crate::edge::Edge;
use crate::error::{QmddError, Result};
use crate::qmdd::Qmdd;
use crate::types::{Level, Var};

/// Single-qubit base gates. All of them have entries in Q(ω).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GateKind {
    X,
    Y,
    Z,
    H,
    S,
    Sdg,
    T,
    Tdg,
    /// Square root of X.
    V,
    Vdg,
}

impl GateKind {
    /// The 2×2 matrix, entries indexed `2*row + col`.
    pub fn matrix(self) -> [Cyclotomic; 4] {
        let zero = Cyclotomic::zero;
        let one = Cyclotomic::one;
        match self {
            GateKind::X => [zero(), one(), one(), zero()],
            GateKind::Y => [zero(), -&Cyclotomic::i(), Cyclotomic::i(), zero()],
            GateKind::Z => [one(), zero(), zero(), Cyclotomic::integer(-1)],
            GateKind::H => {
                let s = Cyclotomic::frac_1_sqrt2();
                [s.clone(), s.clone(), s.clone(), -&s]
            }
            GateKind::S => [one(), zero(), zero(), Cyclotomic::i()],
            GateKind::Sdg => [one(), zero(), zero(), -&Cyclotomic::i()],
            GateKind::T => [one(), zero(), zero(), Cyclotomic::omega(1)],
            GateKind::Tdg => [one(), zero(), zero(), Cyclotomic::omega(7)],
            GateKind::V | GateKind::Vdg => {
                let half = Cyclotomic::rational(1, 2);
                let half_i = &Cyclotomic::i() * &half;
                let plus = &half + &half_i;
                let minus = &half - &half_i;
                if self == GateKind::V {
                    [plus.clone(), minus.clone(), minus, plus]
                } else {
                    [minus.clone(), plus.clone(), plus, minus]
                }
            }
        }
    }

    pub fn adjoint(self) -> GateKind {
        match self {
            GateKind::S => GateKind::Sdg,
            GateKind::Sdg => GateKind::S,
            GateKind::T => GateKind::Tdg,
            GateKind::Tdg => GateKind::T,
            GateKind::V => GateKind::Vdg,
            GateKind::Vdg => GateKind::V,
            other => other,
        }
    }
}

/// A control line: the gate acts when `var` is 1 (`positive`) or 0.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Control {
    pub var: Var,
    pub positive: bool,
}

impl Control {
    pub fn pos(var: Var) -> Self {
        Self { var, positive: true }
    }

    pub fn neg(var: Var) -> Self {
        Self { var, positive: false }
    }
}

/// Which side of the diagram a gate is multiplied on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Side {
    /// `gate · diagram`, i.e. the gate is applied after the diagram.
    Left,
    /// `diagram · gate`.
    Right,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Gate {
    /// Controlled single-qubit gate.
    Single {
        kind: GateKind,
        controls: Vec<Control>,
        target: Var,
    },
    /// Controlled swap of `a` and `b` (Fredkin gate when controlled).
    Swap { controls: Vec<Control>, a: Var, b: Var },
    /// Peres gate: `first ^= controls`, after `second ^= controls ∧ first`.
    Peres {
        controls: Vec<Control>,
        first: Var,
        second: Var,
    },
}

// Constructors
impl Gate {
    pub fn single(kind: GateKind, target: Var) -> Gate {
        Gate::Single {
            kind,
            controls: Vec::new(),
            target,
        }
    }

    pub fn controlled(kind: GateKind, controls: impl Into<Vec<Control>>, target: Var) -> Gate {
        Gate::Single {
            kind,
            controls: controls.into(),
            target,
        }
    }

    pub fn cnot(control: Var, target: Var) -> Gate {
        Gate::controlled(GateKind::X, [Control::pos(control)], target)
    }

    pub fn toffoli(c1: Var, c2: Var, target: Var) -> Gate {
        Gate::controlled(GateKind::X, [Control::pos(c1), Control::pos(c2)], target)
    }
}

impl Gate {
    /// The same gate as a sequence of controlled single-qubit gates, in
    /// application order.
    pub fn decompose(&self) -> Vec<(GateKind, Vec<Control>, Var)> {
        match self {
            Gate::Single { kind, controls, target } => vec![(*kind, controls.clone(), *target)],
            Gate::Swap { controls, a, b } => {
                let mut middle = controls.clone();
                middle.push(Control::pos(*a));
                vec![
                    (GateKind::X, vec![Control::pos(*b)], *a),
                    (GateKind::X, middle, *b),
                    (GateKind::X, vec![Control::pos(*b)], *a),
                ]
            }
            Gate::Peres { controls, first, second } => {
                let mut inner = controls.clone();
                inner.push(Control::pos(*first));
                vec![
                    (GateKind::X, inner, *second),
                    (GateKind::X, controls.clone(), *first),
                ]
            }
        }
    }
}

impl<A: AmplitudeTable> Qmdd<A> {
    /// Diagram of a controlled single-qubit gate over all variables.
    ///
    /// Uncontrolled, the gate is a single node on `target`. With controls it is
    /// built as `I + P ⊗ (U - I)`, where `P` projects the controls onto their
    /// active values.
    pub fn gate(&self, kind: GateKind, controls: &[Control], target: Var) -> Result<Edge> {
        self.level(target)?;
        let mut seen = HashSet::new();
        for c in controls {
            self.level(c.var)?;
            if c.var == target {
                return Err(QmddError::TargetIsControl(target));
            }
            if !seen.insert(c.var) {
                return Err(QmddError::DuplicateControl(c.var));
            }
        }
        debug!("gate(kind = {:?}, controls = {:?}, target = {})", kind, controls, target);
        self.with_gc(&[], || self.gate_rec(kind, controls, target))
    }

    fn gate_rec(&self, kind: GateKind, controls: &[Control], target: Var) -> Result<Edge> {
        let matrix = kind.matrix().map(|value| self.lookup(&value));
        if controls.is_empty() {
            return self.mk_node(target, matrix.map(Edge::terminal));
        }

        // U - I
        let mut diff = matrix;
        for k in [0, 3] {
            diff[k] = self.amp_sub(matrix[k], AmpId::ONE);
        }

        let mut e = Edge::ONE;
        for index in 0..self.num_vars() {
            let var = self.var_at(Level::new(index));
            if var == target {
                let children = diff.map(|w| self.scale(e, w));
                e = self.mk_node(var, children)?;
            } else if let Some(c) = controls.iter().find(|c| c.var == var) {
                let children = if c.positive {
                    [Edge::ZERO, Edge::ZERO, Edge::ZERO, e]
                } else {
                    [e, Edge::ZERO, Edge::ZERO, Edge::ZERO]
                };
                e = self.mk_node(var, children)?;
            }
        }
        self.add_rec(Edge::ONE, e)
    }

    /// Diagram of any [`Gate`], composite gates multiplied out.
    pub fn gate_edge(&self, gate: &Gate) -> Result<Edge> {
        let mut acc = Edge::ONE;
        for (kind, controls, target) in gate.decompose() {
            let g = self.protect(&[acc], || self.gate(kind, &controls, target))?;
            acc = self.multiply(g, acc)?;
        }
        Ok(acc)
    }

    /// Compose `gate` onto `diagram`.
    pub fn apply_gate(&self, diagram: Edge, gate: &Gate, side: Side) -> Result<Edge> {
        self.check_edge(diagram)?;
        let g = self.protect(&[diagram], || self.gate_edge(gate))?;
        match side {
            Side::Left => self.multiply(g, diagram),
            Side::Right => self.multiply(diagram, g),
        }
    }
}
