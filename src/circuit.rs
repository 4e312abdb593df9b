//! RevLib `.real` circuit reader.
//!
//! ```text
//! .version 1.0
//! .numvars 3
//! .variables a b c
//! .begin
//! t2 a b
//! t3 -a b c
//! f3 a b c
//! .end
//! ```
//!
//! Gate tokens are `t` (Toffoli), `f` (Fredkin), `p` (Peres), `v`, `v+`, `h`,
//! `z` and `y`, followed by the number of lines they touch. A `-` in front of
//! a control line makes it a negative control. `#` starts a comment.

use std::collections::HashMap;

use log::debug;

use crate::amplitude::AmplitudeTable;
use crate::edge::Edge;
use crate::error::{QmddError, Result};
use crate::gate::{Control, Gate, GateKind, Side};
use crate::qmdd::Qmdd;
use crate::types::Var;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GateOp {
    Toffoli,
    Fredkin,
    Peres,
    V,
    Vdg,
    H,
    Z,
    Y,
}

impl GateOp {
    fn parse(name: &str) -> Option<GateOp> {
        match name {
            "t" => Some(GateOp::Toffoli),
            "f" => Some(GateOp::Fredkin),
            "p" => Some(GateOp::Peres),
            "v" => Some(GateOp::V),
            "v+" => Some(GateOp::Vdg),
            "h" => Some(GateOp::H),
            "z" => Some(GateOp::Z),
            "y" => Some(GateOp::Y),
            _ => None,
        }
    }

    fn num_targets(self) -> usize {
        match self {
            GateOp::Fredkin | GateOp::Peres => 2,
            _ => 1,
        }
    }
}

/// One gate of a circuit, lines given as indices into [`Circuit::lines`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CircuitGate {
    pub op: GateOp,
    /// Control lines with polarity (`true` = positive).
    pub controls: Vec<(usize, bool)>,
    pub targets: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Circuit {
    pub version: Option<String>,
    /// Line (variable) labels, in declaration order.
    pub lines: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    /// Constant input per line, `None` for a free input.
    pub constants: Vec<Option<bool>>,
    /// Garbage output per line.
    pub garbage: Vec<bool>,
    pub gates: Vec<CircuitGate>,
}

fn parse_error(line: usize, message: impl Into<String>) -> QmddError {
    QmddError::Parse {
        line,
        message: message.into(),
    }
}

impl Circuit {
    pub fn parse(text: &str) -> Result<Circuit> {
        Self::parse_with(text, None)
    }

    /// Parse a circuit over the same lines as `reference`, with the lines
    /// renumbered to the reference's declaration order.
    pub fn parse_matching(text: &str, reference: &Circuit) -> Result<Circuit> {
        Self::parse_with(text, Some(reference))
    }

    fn parse_with(text: &str, reference: Option<&Circuit>) -> Result<Circuit> {
        let mut circuit = Circuit::default();
        let mut numvars: Option<usize> = None;
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut in_body = false;
        let mut ended = false;

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            if ended {
                return Err(parse_error(line_no, "content after .end"));
            }
            let mut tokens = content.split_whitespace();
            let Some(head) = tokens.next() else {
                continue;
            };
            let args: Vec<&str> = tokens.collect();

            if let Some(directive) = head.strip_prefix('.') {
                match directive {
                    "version" => circuit.version = Some(args.join(" ")),
                    "numvars" => {
                        let n = args
                            .first()
                            .and_then(|s| s.parse().ok())
                            .ok_or_else(|| parse_error(line_no, "expected a line count after .numvars"))?;
                        numvars = Some(n);
                    }
                    "variables" => {
                        let declared: Vec<String> = args.iter().map(|s| s.to_string()).collect();
                        if let Some(n) = numvars {
                            if declared.len() != n {
                                return Err(parse_error(
                                    line_no,
                                    format!(".numvars is {} but {} variables are declared", n, declared.len()),
                                ));
                            }
                        }
                        circuit.lines = match reference {
                            Some(reference) => {
                                let mut mine = declared.clone();
                                let mut theirs = reference.lines.clone();
                                mine.sort();
                                theirs.sort();
                                if mine != theirs {
                                    return Err(parse_error(line_no, "variables do not match the reference circuit"));
                                }
                                reference.lines.clone()
                            }
                            None => declared,
                        };
                        index.clear();
                        for (k, name) in circuit.lines.iter().enumerate() {
                            if index.insert(name.clone(), k).is_some() {
                                return Err(parse_error(line_no, format!("duplicate variable '{}'", name)));
                            }
                        }
                    }
                    "inputs" => circuit.inputs = args.iter().map(|s| s.to_string()).collect(),
                    "outputs" => circuit.outputs = args.iter().map(|s| s.to_string()).collect(),
                    "constants" => {
                        let spec = args.concat();
                        circuit.constants = spec
                            .chars()
                            .map(|c| match c {
                                '0' => Ok(Some(false)),
                                '1' => Ok(Some(true)),
                                '-' => Ok(None),
                                _ => Err(parse_error(line_no, format!("bad constant '{}'", c))),
                            })
                            .collect::<Result<_>>()?;
                    }
                    "garbage" => {
                        let spec = args.concat();
                        circuit.garbage = spec
                            .chars()
                            .map(|c| match c {
                                '1' => Ok(true),
                                '-' => Ok(false),
                                _ => Err(parse_error(line_no, format!("bad garbage flag '{}'", c))),
                            })
                            .collect::<Result<_>>()?;
                    }
                    "begin" => {
                        if circuit.lines.is_empty() {
                            return Err(parse_error(line_no, ".begin before .variables"));
                        }
                        in_body = true;
                    }
                    "end" => {
                        if !in_body {
                            return Err(parse_error(line_no, ".end without .begin"));
                        }
                        in_body = false;
                        ended = true;
                    }
                    // Other directives (.define, .inputbus, ...) carry no semantics here.
                    _ => debug!("Ignoring directive .{} on line {}", directive, line_no),
                }
                continue;
            }

            if !in_body {
                return Err(parse_error(line_no, format!("gate '{}' outside .begin/.end", head)));
            }
            let gate = Self::parse_gate(line_no, head, &args, &index)?;
            circuit.gates.push(gate);
        }

        if in_body {
            return Err(parse_error(text.lines().count(), "missing .end"));
        }
        let n = circuit.lines.len();
        if !circuit.constants.is_empty() && circuit.constants.len() != n {
            return Err(parse_error(0, format!(".constants has {} entries for {} lines", circuit.constants.len(), n)));
        }
        if !circuit.garbage.is_empty() && circuit.garbage.len() != n {
            return Err(parse_error(0, format!(".garbage has {} entries for {} lines", circuit.garbage.len(), n)));
        }
        debug!("Parsed circuit: {} lines, {} gates", n, circuit.gates.len());
        Ok(circuit)
    }

    fn parse_gate(line_no: usize, head: &str, args: &[&str], index: &HashMap<String, usize>) -> Result<CircuitGate> {
        let split = head.find(|c: char| c.is_ascii_digit()).unwrap_or(head.len());
        let (name, count) = head.split_at(split);
        let op = GateOp::parse(name).ok_or_else(|| parse_error(line_no, format!("unknown gate '{}'", head)))?;
        if !count.is_empty() {
            let count: usize = count
                .parse()
                .map_err(|_| parse_error(line_no, format!("bad line count in '{}'", head)))?;
            if count != args.len() {
                return Err(parse_error(
                    line_no,
                    format!("'{}' expects {} lines, got {}", head, count, args.len()),
                ));
            }
        }
        if args.len() < op.num_targets() {
            return Err(parse_error(line_no, format!("'{}' needs at least {} lines", head, op.num_targets())));
        }

        let mut resolved = Vec::with_capacity(args.len());
        for arg in args {
            let (name, positive) = match arg.strip_prefix('-') {
                Some(name) => (name, false),
                None => (*arg, true),
            };
            let line = *index
                .get(name)
                .ok_or_else(|| parse_error(line_no, format!("unknown variable '{}'", name)))?;
            if resolved.iter().any(|&(l, _)| l == line) {
                return Err(parse_error(line_no, format!("variable '{}' used twice", name)));
            }
            resolved.push((line, positive));
        }

        let targets_from = resolved.len() - op.num_targets();
        let targets: Vec<usize> = resolved[targets_from..]
            .iter()
            .map(|&(line, positive)| {
                if positive {
                    Ok(line)
                } else {
                    Err(parse_error(line_no, "target lines cannot be negated"))
                }
            })
            .collect::<Result<_>>()?;
        resolved.truncate(targets_from);

        Ok(CircuitGate {
            op,
            controls: resolved,
            targets,
        })
    }
}

impl CircuitGate {
    /// The gate on the manager variables `vars` (indexed by line).
    pub fn to_gate(&self, vars: &[Var]) -> Gate {
        let controls: Vec<Control> = self
            .controls
            .iter()
            .map(|&(line, positive)| Control { var: vars[line], positive })
            .collect();
        let single = |kind| Gate::Single {
            kind,
            controls: controls.clone(),
            target: vars[self.targets[0]],
        };
        match self.op {
            GateOp::Toffoli => single(GateKind::X),
            GateOp::V => single(GateKind::V),
            GateOp::Vdg => single(GateKind::Vdg),
            GateOp::H => single(GateKind::H),
            GateOp::Z => single(GateKind::Z),
            GateOp::Y => single(GateKind::Y),
            GateOp::Fredkin => Gate::Swap {
                controls: controls.clone(),
                a: vars[self.targets[0]],
                b: vars[self.targets[1]],
            },
            GateOp::Peres => Gate::Peres {
                controls: controls.clone(),
                first: vars[self.targets[0]],
                second: vars[self.targets[1]],
            },
        }
    }
}

impl<A: AmplitudeTable> Qmdd<A> {
    /// Manager variables for the lines of `circuit`.
    ///
    /// Lines are matched to existing variables by label. Missing ones are
    /// registered from the last line up, so that in a fresh manager the first
    /// declared line ends on top.
    pub fn circuit_vars(&self, circuit: &Circuit) -> Vec<Var> {
        let mut vars = vec![Var::new(0); circuit.lines.len()];
        for (k, label) in circuit.lines.iter().enumerate().rev() {
            vars[k] = match self.var_by_label(label) {
                Some(var) => var,
                None => self.add_var(label.as_str()),
            };
        }
        vars
    }

    /// Diagram of the whole circuit.
    pub fn build_circuit(&self, circuit: &Circuit) -> Result<Edge> {
        self.append_circuit(self.identity(), circuit, Side::Left)
    }

    /// Compose `circuit` onto `diagram`: after it ([`Side::Left`]) or before
    /// it ([`Side::Right`]).
    pub fn append_circuit(&self, diagram: Edge, circuit: &Circuit, side: Side) -> Result<Edge> {
        let vars = self.circuit_vars(circuit);
        let gates: Vec<Gate> = circuit.gates.iter().map(|g| g.to_gate(&vars)).collect();
        debug!("append_circuit: {} gates, side {:?}", gates.len(), side);

        let mut e = diagram;
        let ordered: Box<dyn Iterator<Item = &Gate>> = match side {
            Side::Left => Box::new(gates.iter()),
            Side::Right => Box::new(gates.iter().rev()),
        };
        for gate in ordered {
            e = self.apply_gate(e, gate, side)?;
        }
        Ok(e)
    }
}
