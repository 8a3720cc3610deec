//! Compiles a circuit description into a rank-1 constraint system.
//!
//! Invariant relied upon by the solvers: every emitted constraint either introduces exactly one
//! fresh internal wire, alone on the `C` side, or only references wires that are already solved
//! when the constraint is reached.

use ark_ff::PrimeField;

use super::schema::Schema;
use super::{Api, Circuit, CircuitError};
use crate::constraint::{HintCall, Instruction, LinearCombination, R1c, R1cs, Wire};
use crate::hint::HintId;

#[derive(Debug, Default)]
pub struct Builder<F: PrimeField> {
    schema: Schema,
    nb_internal: u32,
    constraints: Vec<R1c<F>>,
    hints: Vec<HintCall<F>>,
    instructions: Vec<Instruction>,
}

/// Compiles `circuit` over `F`.
#[tracing::instrument(skip_all, name = "compile", fields(circuit = std::any::type_name::<C>()))]
pub fn compile<F: PrimeField, C: Circuit>(circuit: &C) -> Result<R1cs<F>, CircuitError> {
    let mut builder = Builder::new();
    circuit.define(&mut builder)?;
    let r1cs = builder.finish();
    tracing::debug!(
        nb_constraints = r1cs.constraints.len(),
        nb_hints = r1cs.hints.len(),
        nb_public = r1cs.schema.nb_public(),
        nb_secret = r1cs.schema.nb_secret(),
        "compiled"
    );
    Ok(r1cs)
}

impl<F: PrimeField> Builder<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> R1cs<F> {
        R1cs {
            schema: self.schema,
            nb_internal: self.nb_internal,
            constraints: self.constraints,
            hints: self.hints,
            instructions: self.instructions,
        }
    }

    fn check_fresh(&self, name: &str) -> Result<(), CircuitError> {
        match self.schema.visibility(name) {
            Some(_) => Err(CircuitError::DuplicateInput(name.to_string())),
            None => Ok(()),
        }
    }

    fn next_internal(&mut self) -> u32 {
        self.nb_internal += 1;
        self.nb_internal - 1
    }

    fn push_constraint(
        &mut self,
        a: LinearCombination<F>,
        b: LinearCombination<F>,
        c: LinearCombination<F>,
    ) {
        self.instructions
            .push(Instruction::Constraint(self.constraints.len() as u32));
        self.constraints.push(R1c { a, b, c });
    }
}

impl<F: PrimeField> Api<F> for Builder<F> {
    type Var = LinearCombination<F>;

    fn public_input(&mut self, name: &str) -> Result<Self::Var, CircuitError> {
        self.check_fresh(name)?;
        let wire = Wire::Public(self.schema.public.len() as u32);
        self.schema.public.push(name.to_string());
        Ok(LinearCombination::wire(wire))
    }

    fn secret_input(&mut self, name: &str) -> Result<Self::Var, CircuitError> {
        self.check_fresh(name)?;
        let wire = Wire::Secret(self.schema.secret.len() as u32);
        self.schema.secret.push(name.to_string());
        Ok(LinearCombination::wire(wire))
    }

    fn constant(&mut self, value: F) -> Self::Var {
        LinearCombination::constant(value)
    }

    fn constant_value(&self, v: &Self::Var) -> Option<F> {
        v.constant_value()
    }

    fn add(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var {
        a.add(b)
    }

    fn sub(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var {
        a.sub(b)
    }

    fn neg(&mut self, a: &Self::Var) -> Self::Var {
        a.neg()
    }

    fn mul(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var {
        if let Some(c) = a.constant_value() {
            return b.scale(c);
        }
        if let Some(c) = b.constant_value() {
            return a.scale(c);
        }
        let out = Wire::Internal(self.next_internal());
        self.push_constraint(a.clone(), b.clone(), LinearCombination::wire(out));
        LinearCombination::wire(out)
    }

    fn new_hint(
        &mut self,
        hint: HintId,
        nb_outputs: usize,
        inputs: &[Self::Var],
    ) -> Result<Vec<Self::Var>, CircuitError> {
        let outputs: Vec<u32> = (0..nb_outputs).map(|_| self.next_internal()).collect();
        self.instructions
            .push(Instruction::Hint(self.hints.len() as u32));
        self.hints.push(HintCall {
            id: hint,
            inputs: inputs.to_vec(),
            outputs: outputs.clone(),
        });
        Ok(outputs
            .into_iter()
            .map(|i| LinearCombination::wire(Wire::Internal(i)))
            .collect())
    }

    fn assert_product(
        &mut self,
        a: &Self::Var,
        b: &Self::Var,
        c: &Self::Var,
    ) -> Result<(), CircuitError> {
        if let (Some(va), Some(vb), Some(vc)) =
            (a.constant_value(), b.constant_value(), c.constant_value())
        {
            if va * vb != vc {
                return Err(CircuitError::AssertionFailed(format!(
                    "constant assertion {va} · {vb} == {vc}"
                )));
            }
            return Ok(());
        }
        self.push_constraint(a.clone(), b.clone(), c.clone());
        Ok(())
    }
}
