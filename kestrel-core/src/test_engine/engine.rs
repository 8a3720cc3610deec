//! Reference evaluator: runs a circuit description directly on integers modulo the field order.
//!
//! It shares nothing with the compiler or the solvers beyond the [`Api`] gadgets and the hint
//! functions, so agreement between the two is meaningful. In constant mode every input is
//! reported as a compile-time constant, which routes the gadgets through their constant-folding
//! branches.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use ark_ff::PrimeField;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::frontend::{Api, Assignment, Circuit, CircuitError};
use crate::hint::HintId;
use crate::solver::SolverConfig;
use crate::utils::math::{biguint_to_field, field_to_biguint, modulus, reduce_bigint};

/// How the evaluator presents input values to the circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Variable,
    Constant,
}

/// A value in `[0, p)` and whether it is known at compile time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Value {
    pub value: BigUint,
    pub constant: bool,
}

pub struct Engine<'a, F: PrimeField> {
    modulus: BigUint,
    assignment: &'a Assignment,
    config: &'a SolverConfig,
    mode: InputMode,
    declared: BTreeSet<String>,
    _field: PhantomData<F>,
}

/// Evaluates `circuit` under `assignment`; `Ok` iff every assertion holds.
pub fn evaluate<F: PrimeField, C: Circuit>(
    circuit: &C,
    assignment: &Assignment,
    config: &SolverConfig,
    mode: InputMode,
) -> Result<(), CircuitError> {
    let mut engine = Engine::<F>::new(assignment, config, mode);
    circuit.define(&mut engine)
}

impl<'a, F: PrimeField> Engine<'a, F> {
    pub fn new(assignment: &'a Assignment, config: &'a SolverConfig, mode: InputMode) -> Self {
        Self {
            modulus: modulus::<F>(),
            assignment,
            config,
            mode,
            declared: BTreeSet::new(),
            _field: PhantomData,
        }
    }

    fn input(&mut self, name: &str) -> Result<Value, CircuitError> {
        if !self.declared.insert(name.to_string()) {
            return Err(CircuitError::DuplicateInput(name.to_string()));
        }
        let raw = self
            .assignment
            .get(name)
            .ok_or_else(|| CircuitError::MissingInput(name.to_string()))?;
        Ok(Value {
            value: reduce_bigint(raw, &self.modulus),
            constant: self.mode == InputMode::Constant,
        })
    }

    fn combine(&self, a: &Value, b: &Value, value: BigUint) -> Value {
        Value {
            value: value % &self.modulus,
            constant: a.constant && b.constant,
        }
    }
}

impl<F: PrimeField> Api<F> for Engine<'_, F> {
    type Var = Value;

    fn public_input(&mut self, name: &str) -> Result<Value, CircuitError> {
        self.input(name)
    }

    fn secret_input(&mut self, name: &str) -> Result<Value, CircuitError> {
        self.input(name)
    }

    fn constant(&mut self, value: F) -> Value {
        Value {
            value: field_to_biguint(&value),
            constant: true,
        }
    }

    fn constant_value(&self, v: &Value) -> Option<F> {
        v.constant.then(|| biguint_to_field(&v.value))
    }

    fn add(&mut self, a: &Value, b: &Value) -> Value {
        self.combine(a, b, &a.value + &b.value)
    }

    fn sub(&mut self, a: &Value, b: &Value) -> Value {
        self.combine(a, b, &a.value + &self.modulus - &b.value)
    }

    fn neg(&mut self, a: &Value) -> Value {
        Value {
            value: (&self.modulus - &a.value) % &self.modulus,
            constant: a.constant,
        }
    }

    fn mul(&mut self, a: &Value, b: &Value) -> Value {
        self.combine(a, b, &a.value * &b.value)
    }

    fn new_hint(
        &mut self,
        hint: HintId,
        nb_outputs: usize,
        inputs: &[Value],
    ) -> Result<Vec<Value>, CircuitError> {
        let named = self
            .config
            .hint(hint)
            .ok_or(CircuitError::HintNotFound { id: hint })?;
        let inputs: Vec<BigUint> = inputs.iter().map(|v| v.value.clone()).collect();
        let mut outputs = vec![BigUint::zero(); nb_outputs];
        (named.func)(&self.modulus, &inputs, &mut outputs)
            .map_err(|source| CircuitError::Hint { id: hint, source })?;
        Ok(outputs
            .into_iter()
            .map(|value| Value {
                value: value % &self.modulus,
                constant: false,
            })
            .collect())
    }

    fn assert_product(&mut self, a: &Value, b: &Value, c: &Value) -> Result<(), CircuitError> {
        let product = (&a.value * &b.value) % &self.modulus;
        if product != c.value {
            return Err(CircuitError::AssertionFailed(format!(
                "{} · {} != {}",
                a.value, b.value, c.value
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_ff::Field;

    struct Inverse;

    impl Circuit for Inverse {
        fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
            let x = api.secret_input("x")?;
            let y = api.public_input("y")?;
            let inv = api.inverse(&x)?;
            api.assert_is_equal(&inv, &y)
        }
    }

    fn run(x: i64, y: i64, mode: InputMode) -> Result<(), CircuitError> {
        let assignment = Assignment::new().with("x", x).with("y", y);
        evaluate::<Fr, _>(&Inverse, &assignment, &SolverConfig::default(), mode)
    }

    #[test]
    fn both_modes_agree_on_valid_input() {
        let y = field_to_biguint(&Fr::from(4u64).inverse().unwrap());
        let assignment = Assignment::new()
            .with("x", 4)
            .with("y", num_bigint::BigInt::from(y));
        for mode in [InputMode::Variable, InputMode::Constant] {
            evaluate::<Fr, _>(&Inverse, &assignment, &SolverConfig::default(), mode).unwrap();
        }
    }

    #[test]
    fn zero_has_no_inverse_in_either_mode() {
        assert!(matches!(
            run(0, 0, InputMode::Variable),
            Err(CircuitError::Hint { .. })
        ));
        assert_eq!(run(0, 0, InputMode::Constant), Err(CircuitError::DivisionByZero));
    }

    #[test]
    fn negative_inputs_wrap() {
        // (-1)⁻¹ = -1
        run(-1, -1, InputMode::Variable).unwrap();
        assert!(run(-1, 1, InputMode::Variable).is_err());
    }

    #[test]
    fn missing_and_duplicate_inputs() {
        let assignment = Assignment::new().with("x", 1);
        assert_eq!(
            evaluate::<Fr, _>(&Inverse, &assignment, &SolverConfig::default(), InputMode::Variable),
            Err(CircuitError::MissingInput("y".into()))
        );

        struct Twice;
        impl Circuit for Twice {
            fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
                api.secret_input("x")?;
                api.public_input("x")?;
                Ok(())
            }
        }
        assert_eq!(
            evaluate::<Fr, _>(&Twice, &assignment, &SolverConfig::default(), InputMode::Variable),
            Err(CircuitError::DuplicateInput("x".into()))
        );
    }
}
