//! PLONK-style sparse constraint systems.
//!
//! Every gate is `qL·a + qR·b + qO·c + qM·a·b + qC = 0` on at most three wires. A rank-1
//! system is lowered gate by gate: each linear combination with more than one wire is folded
//! into a fresh internal wire through a chain of addition gates, then the product constraint
//! becomes one gate over the folded wires.

use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::RngCore;

use super::{
    run_hint, ConstraintSystem, Instruction, LinearCombination, R1cs, Solution, SolveError,
    Wire, WireValues,
};
use crate::frontend::schema::Schema;
use crate::solver::SolverConfig;
use crate::witness::Witness;

#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Gate<F: PrimeField> {
    /// `a`, `b`, `c`; `None` is a slot whose value is zero and whose selector is unused.
    pub wires: [Option<Wire>; 3],
    pub ql: F,
    pub qr: F,
    pub qo: F,
    pub qm: F,
    pub qc: F,
}

impl<F: PrimeField> Gate<F> {
    pub fn evaluate(&self, a: F, b: F, c: F) -> F {
        self.ql * a + self.qr * b + self.qo * c + self.qm * a * b + self.qc
    }
}

#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct SparseR1cs<F: PrimeField> {
    pub(crate) schema: Schema,
    pub(crate) nb_internal: u32,
    pub(crate) gates: Vec<Gate<F>>,
    pub(crate) hints: Vec<super::HintCall<F>>,
    pub(crate) instructions: Vec<Instruction>,
}

struct Lowering<F: PrimeField> {
    nb_internal: u32,
    gates: Vec<Gate<F>>,
    instructions: Vec<Instruction>,
}

impl<F: PrimeField> Lowering<F> {
    fn push(&mut self, gate: Gate<F>) {
        self.instructions
            .push(Instruction::Constraint(self.gates.len() as u32));
        self.gates.push(gate);
    }

    /// Rewrites `lc` as `coeff·wire + constant`, emitting addition gates when it spans
    /// several wires.
    fn reduce(&mut self, lc: &LinearCombination<F>) -> (Option<(Wire, F)>, F) {
        let mut constant = F::zero();
        let mut acc: Option<(Wire, F)> = None;
        for (wire, coeff) in lc.terms() {
            if *wire == Wire::One {
                constant += coeff;
                continue;
            }
            acc = Some(match acc {
                None => (*wire, *coeff),
                Some((prev, prev_coeff)) => {
                    let sum = Wire::Internal(self.nb_internal);
                    self.nb_internal += 1;
                    self.push(Gate {
                        wires: [Some(prev), Some(*wire), Some(sum)],
                        ql: prev_coeff,
                        qr: *coeff,
                        qo: -F::one(),
                        qm: F::zero(),
                        qc: F::zero(),
                    });
                    (sum, F::one())
                }
            });
        }
        (acc, constant)
    }

    /// (ca·a + ka)(cb·b + kb) = cc·c + kc
    fn lower_product(
        &mut self,
        a: &LinearCombination<F>,
        b: &LinearCombination<F>,
        c: &LinearCombination<F>,
    ) {
        let (wa, ka) = self.reduce(a);
        let (wb, kb) = self.reduce(b);
        let (wc, kc) = self.reduce(c);
        let ca = wa.map_or(F::zero(), |(_, c)| c);
        let cb = wb.map_or(F::zero(), |(_, c)| c);
        let cc = wc.map_or(F::zero(), |(_, c)| c);
        self.push(Gate {
            wires: [wa.map(|w| w.0), wb.map(|w| w.0), wc.map(|w| w.0)],
            ql: ca * kb,
            qr: ka * cb,
            qo: -cc,
            qm: ca * cb,
            qc: ka * kb - kc,
        });
    }
}

impl<F: PrimeField> From<&R1cs<F>> for SparseR1cs<F> {
    fn from(r1cs: &R1cs<F>) -> Self {
        let mut lowering = Lowering {
            nb_internal: r1cs.nb_internal,
            gates: Vec::with_capacity(r1cs.constraints.len()),
            instructions: Vec::with_capacity(r1cs.instructions.len()),
        };
        for instruction in &r1cs.instructions {
            match *instruction {
                Instruction::Hint(i) => lowering.instructions.push(Instruction::Hint(i)),
                Instruction::Constraint(i) => {
                    let r1c = &r1cs.constraints[i as usize];
                    lowering.lower_product(&r1c.a, &r1c.b, &r1c.c);
                }
            }
        }
        SparseR1cs {
            schema: r1cs.schema.clone(),
            nb_internal: lowering.nb_internal,
            gates: lowering.gates,
            hints: r1cs.hints.clone(),
            instructions: lowering.instructions,
        }
    }
}

impl<F: PrimeField> SparseR1cs<F> {
    pub fn gates(&self) -> &[Gate<F>] {
        &self.gates
    }

    fn solve_gate(&self, index: usize, values: &mut WireValues<F>) -> Result<(), SolveError> {
        let gate = &self.gates[index];
        let slot = |w: Option<Wire>| match w {
            None => Some(F::zero()),
            Some(w) => values.get(w),
        };
        let [a, b, c] = [slot(gate.wires[0]), slot(gate.wires[1]), slot(gate.wires[2])];

        let unknown: Vec<usize> = [a, b, c]
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.is_none().then_some(i))
            .collect();
        let (a0, b0, c0) = (a.unwrap_or_default(), b.unwrap_or_default(), c.unwrap_or_default());

        let (slot_index, linear, rest) = match unknown.as_slice() {
            [] => {
                if !gate.evaluate(a0, b0, c0).is_zero() {
                    return Err(SolveError::Unsatisfied {
                        index,
                        detail: format!(
                            "{}·{a0} + {}·{b0} + {}·{c0} + {}·{a0}·{b0} + {} != 0",
                            gate.ql, gate.qr, gate.qo, gate.qm, gate.qc
                        ),
                    });
                }
                return Ok(());
            }
            [0] => (0, gate.ql + gate.qm * b0, gate.qr * b0 + gate.qo * c0 + gate.qc),
            [1] => (1, gate.qr + gate.qm * a0, gate.ql * a0 + gate.qo * c0 + gate.qc),
            [2] => (2, gate.qo, gate.ql * a0 + gate.qr * b0 + gate.qm * a0 * b0 + gate.qc),
            _ => {
                return Err(SolveError::Unsolvable {
                    index,
                    detail: format!("gate has {} unknown wires", unknown.len()),
                })
            }
        };
        let Some(Wire::Internal(wire)) = gate.wires[slot_index] else {
            return Err(SolveError::Unsolvable {
                index,
                detail: "unknown slot is not an internal wire".to_string(),
            });
        };
        // the same wire may occupy another slot of this gate
        if gate
            .wires
            .iter()
            .enumerate()
            .any(|(i, w)| i != slot_index && *w == Some(Wire::Internal(wire)))
        {
            return Err(SolveError::Unsolvable {
                index,
                detail: format!("w{wire} appears non-linearly"),
            });
        }
        let inv = linear.inverse().ok_or_else(|| SolveError::Unsolvable {
            index,
            detail: format!("zero coefficient on w{wire}"),
        })?;
        values.set_internal(wire, -rest * inv);
        Ok(())
    }

    fn run(
        &self,
        witness: &Witness<F>,
        config: &SolverConfig,
        rng: Option<&mut dyn RngCore>,
    ) -> Result<Solution<F>, SolveError> {
        let _guard = config.logger().enter();
        let mut values = WireValues::new(witness, &self.schema, self.nb_internal as usize)?;
        for instruction in &self.instructions {
            let result = match *instruction {
                Instruction::Hint(i) => run_hint(&self.hints[i as usize], &mut values, config, i as usize),
                Instruction::Constraint(i) => self.solve_gate(i as usize, &mut values),
            };
            match (result, rng.is_some()) {
                (Ok(()), _) => {}
                (Err(err), true) => tracing::trace!(%err, "ignored while force-solving"),
                (Err(err), false) => {
                    tracing::debug!(%err, "solve failed");
                    return Err(err);
                }
            }
        }
        values.into_solution(rng)
    }
}

impl<F: PrimeField> ConstraintSystem<F> for SparseR1cs<F> {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn nb_constraints(&self) -> usize {
        self.gates.len()
    }

    fn nb_internal(&self) -> usize {
        self.nb_internal as usize
    }

    #[tracing::instrument(skip_all, name = "SparseR1cs::solve", fields(nb_gates = self.gates.len()))]
    fn solve(&self, witness: &Witness<F>, config: &SolverConfig) -> Result<Solution<F>, SolveError> {
        self.run(witness, config, None)
    }

    fn solve_unchecked(
        &self,
        witness: &Witness<F>,
        config: &SolverConfig,
        rng: &mut dyn RngCore,
    ) -> Result<Solution<F>, SolveError> {
        self.run(witness, config, Some(rng))
    }
}
