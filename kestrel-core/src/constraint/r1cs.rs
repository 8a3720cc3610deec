//! Rank-1 constraint systems: every constraint is `A · B = C` over linear combinations.

use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::RngCore;

use super::{
    run_hint, ConstraintSystem, HintCall, Instruction, LinearCombination, Solution, SolveError,
    WireValues,
};
use crate::frontend::schema::Schema;
use crate::solver::SolverConfig;
use crate::witness::Witness;

#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct R1c<F: PrimeField> {
    pub a: LinearCombination<F>,
    pub b: LinearCombination<F>,
    pub c: LinearCombination<F>,
}

#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct R1cs<F: PrimeField> {
    pub(crate) schema: Schema,
    pub(crate) nb_internal: u32,
    pub(crate) constraints: Vec<R1c<F>>,
    pub(crate) hints: Vec<HintCall<F>>,
    pub(crate) instructions: Vec<Instruction>,
}

/// Which side of `A · B = C` the single unknown sits on.
enum Side {
    A,
    B,
    C,
}

impl<F: PrimeField> R1cs<F> {
    pub fn constraints(&self) -> &[R1c<F>] {
        &self.constraints
    }

    pub fn hints(&self) -> &[HintCall<F>] {
        &self.hints
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    fn solve_constraint(
        &self,
        index: usize,
        values: &mut WireValues<F>,
    ) -> Result<(), SolveError> {
        let r1c = &self.constraints[index];
        let (a, ua) = r1c.a.partial_eval(values);
        let (b, ub) = r1c.b.partial_eval(values);
        let (c, uc) = r1c.c.partial_eval(values);

        let unknown = match (ua.as_slice(), ub.as_slice(), uc.as_slice()) {
            ([], [], []) => {
                if a * b != c {
                    return Err(SolveError::Unsatisfied {
                        index,
                        detail: format!("({}) · ({}) != {}: {a} · {b} != {c}", r1c.a, r1c.b, r1c.c),
                    });
                }
                return Ok(());
            }
            ([u], [], []) => (Side::A, *u),
            ([], [u], []) => (Side::B, *u),
            ([], [], [u]) => (Side::C, *u),
            _ => {
                return Err(SolveError::Unsolvable {
                    index,
                    detail: format!(
                        "{} unknown wires in ({}) · ({}) = {}",
                        ua.len() + ub.len() + uc.len(),
                        r1c.a,
                        r1c.b,
                        r1c.c
                    ),
                })
            }
        };

        // (known + coeff·w) on the unknown side, solve for w
        let (side, (wire, coeff)) = unknown;
        let (target, known) = match side {
            Side::C => (a * b, c),
            Side::A => (Self::quotient(index, c, b)?, a),
            Side::B => (Self::quotient(index, c, a)?, b),
        };
        let value = (target - known) * coeff.inverse().unwrap_or_default();
        values.set_internal(wire, value);
        Ok(())
    }

    fn quotient(index: usize, num: F, den: F) -> Result<F, SolveError> {
        den.inverse()
            .map(|inv| num * inv)
            .ok_or_else(|| SolveError::Unsolvable {
                index,
                detail: "unknown is multiplied by zero".to_string(),
            })
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
                Instruction::Constraint(i) => self.solve_constraint(i as usize, &mut values),
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

impl<F: PrimeField> ConstraintSystem<F> for R1cs<F> {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn nb_constraints(&self) -> usize {
        self.constraints.len()
    }

    fn nb_internal(&self) -> usize {
        self.nb_internal as usize
    }

    #[tracing::instrument(skip_all, name = "R1cs::solve", fields(nb_constraints = self.constraints.len()))]
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
