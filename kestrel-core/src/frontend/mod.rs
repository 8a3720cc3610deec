//! Circuit description surface.
//!
//! A [`Circuit`] describes itself against the [`Api`] trait. The same description is run by the
//! compiler ([`builder::Builder`], which records constraints) and by the reference evaluator in
//! [`crate::test_engine`] (which computes values directly). Gadgets written as provided methods
//! of [`Api`] therefore behave identically under both.

pub mod assignment;
pub mod builder;
pub mod schema;

use std::fmt::Debug;
use std::slice;

use ark_ff::{BigInteger, PrimeField};

use crate::hint::builtin::{DIV, INVERSE, INVERSE_OR_ZERO, N_BITS};
use crate::hint::{HintError, HintId};

pub use assignment::Assignment;
pub use builder::{compile, Builder};
pub use schema::{Schema, Visibility};

/// Errors raised while describing (compiling or evaluating) a circuit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CircuitError {
    /// Two inputs share a name
    #[error("input {0:?} declared twice")]
    DuplicateInput(String),

    /// The assignment has no value for a declared input
    #[error("no value assigned to input {0:?}")]
    MissingInput(String),

    /// Division by a value known to be zero
    #[error("division by zero")]
    DivisionByZero,

    /// An assertion evaluated to false
    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    /// The evaluator was asked for a hint it does not know
    #[error("hint {id} not found")]
    HintNotFound { id: HintId },

    /// A hint returned an error during evaluation
    #[error("hint {id} failed: {source}")]
    Hint {
        id: HintId,
        #[source]
        source: HintError,
    },
}

/// A circuit: a description of inputs and constraints, independent of the field.
pub trait Circuit {
    fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError>;
}

/// Operations available to circuit descriptions.
pub trait Api<F: PrimeField> {
    type Var: Clone + Debug;

    fn public_input(&mut self, name: &str) -> Result<Self::Var, CircuitError>;

    fn secret_input(&mut self, name: &str) -> Result<Self::Var, CircuitError>;

    fn constant(&mut self, value: F) -> Self::Var;

    /// The value of `v` if it is known while the circuit is being described.
    fn constant_value(&self, v: &Self::Var) -> Option<F>;

    fn add(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var;

    fn sub(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var;

    fn neg(&mut self, a: &Self::Var) -> Self::Var;

    fn mul(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var;

    /// Declares `nb_outputs` values computed by hint `hint` from `inputs`. The outputs are
    /// unconstrained; callers must constrain them.
    fn new_hint(
        &mut self,
        hint: HintId,
        nb_outputs: usize,
        inputs: &[Self::Var],
    ) -> Result<Vec<Self::Var>, CircuitError>;

    /// Asserts `a · b == c`.
    fn assert_product(
        &mut self,
        a: &Self::Var,
        b: &Self::Var,
        c: &Self::Var,
    ) -> Result<(), CircuitError>;

    fn is_constant(&self, v: &Self::Var) -> bool {
        self.constant_value(v).is_some()
    }

    fn assert_is_equal(&mut self, a: &Self::Var, b: &Self::Var) -> Result<(), CircuitError> {
        let one = self.constant(F::one());
        self.assert_product(a, &one, b)
    }

    fn assert_is_boolean(&mut self, a: &Self::Var) -> Result<(), CircuitError> {
        if let Some(v) = self.constant_value(a) {
            if !v.is_zero() && !v.is_one() {
                return Err(CircuitError::AssertionFailed(format!("{v} is not boolean")));
            }
            return Ok(());
        }
        self.assert_product(a, a, a)
    }

    fn inverse(&mut self, a: &Self::Var) -> Result<Self::Var, CircuitError> {
        if let Some(v) = self.constant_value(a) {
            let inv = v.inverse().ok_or(CircuitError::DivisionByZero)?;
            return Ok(self.constant(inv));
        }
        let inv = single(self.new_hint(INVERSE, 1, slice::from_ref(a))?);
        let one = self.constant(F::one());
        self.assert_product(a, &inv, &one)?;
        Ok(inv)
    }

    /// `a / b`; fails to solve when `b` is zero.
    fn div(&mut self, a: &Self::Var, b: &Self::Var) -> Result<Self::Var, CircuitError> {
        if let Some(v) = self.constant_value(b) {
            let inv = v.inverse().ok_or(CircuitError::DivisionByZero)?;
            let inv = self.constant(inv);
            return Ok(self.mul(a, &inv));
        }
        let q = single(self.new_hint(DIV, 1, &[a.clone(), b.clone()])?);
        self.assert_product(&q, b, a)?;
        Ok(q)
    }

    /// 1 if `a == 0`, else 0.
    fn is_zero(&mut self, a: &Self::Var) -> Result<Self::Var, CircuitError> {
        if let Some(v) = self.constant_value(a) {
            return Ok(self.constant(if v.is_zero() { F::one() } else { F::zero() }));
        }
        let m = single(self.new_hint(INVERSE_OR_ZERO, 1, slice::from_ref(a))?);
        let am = self.mul(a, &m);
        let one = self.constant(F::one());
        let y = self.sub(&one, &am);
        let zero = self.constant(F::zero());
        self.assert_product(a, &y, &zero)?;
        Ok(y)
    }

    /// `cond ? a : b`; `cond` is constrained to be boolean.
    fn select(
        &mut self,
        cond: &Self::Var,
        a: &Self::Var,
        b: &Self::Var,
    ) -> Result<Self::Var, CircuitError> {
        self.assert_is_boolean(cond)?;
        if let Some(c) = self.constant_value(cond) {
            return Ok(if c.is_one() { a.clone() } else { b.clone() });
        }
        let diff = self.sub(a, b);
        let picked = self.mul(cond, &diff);
        Ok(self.add(b, &picked))
    }

    /// Selects `table[b0 + 2·b1]`.
    fn lookup2(
        &mut self,
        b0: &Self::Var,
        b1: &Self::Var,
        table: [&Self::Var; 4],
    ) -> Result<Self::Var, CircuitError> {
        let lo = self.select(b0, table[1], table[0])?;
        let hi = self.select(b0, table[3], table[2])?;
        self.select(b1, &hi, &lo)
    }

    /// Little-endian decomposition of `a` into `nb_bits` boolean values.
    fn to_binary(&mut self, a: &Self::Var, nb_bits: usize) -> Result<Vec<Self::Var>, CircuitError> {
        if let Some(v) = self.constant_value(a) {
            let repr = v.into_bigint();
            if repr.num_bits() as usize > nb_bits {
                return Err(CircuitError::AssertionFailed(format!(
                    "{v} does not fit in {nb_bits} bits"
                )));
            }
            return Ok((0..nb_bits)
                .map(|i| self.constant(F::from(repr.get_bit(i) as u64)))
                .collect());
        }
        let bits = self.new_hint(N_BITS, nb_bits, slice::from_ref(a))?;
        for bit in &bits {
            self.assert_is_boolean(bit)?;
        }
        let recomposed = self.from_binary(&bits);
        self.assert_is_equal(&recomposed, a)?;
        Ok(bits)
    }

    /// Σ bitsᵢ·2ⁱ. The inputs are not constrained to be boolean.
    fn from_binary(&mut self, bits: &[Self::Var]) -> Self::Var {
        let mut acc = self.constant(F::zero());
        let mut coeff = F::one();
        for bit in bits {
            let c = self.constant(coeff);
            let term = self.mul(bit, &c);
            acc = self.add(&acc, &term);
            coeff.double_in_place();
        }
        acc
    }

    fn sum(&mut self, terms: &[Self::Var]) -> Self::Var {
        let zero = self.constant(F::zero());
        terms.iter().fold(zero, |acc, t| self.add(&acc, t))
    }
}

fn single<V>(mut outputs: Vec<V>) -> V {
    debug_assert_eq!(outputs.len(), 1);
    outputs.swap_remove(0)
}
