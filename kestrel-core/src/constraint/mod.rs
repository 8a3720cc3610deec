//! Compiled constraint systems and the hint-augmented solving protocol.
//!
//! Both representations share the same wire model: the constant wire [`Wire::One`], public and
//! secret inputs, and internal wires. Internal wires are produced either by a hint (outputs are
//! filled by calling the hint on its inputs) or by a constraint that has exactly one unknown
//! wire left when it is reached. Solving walks [`Instruction`]s in compilation order.

pub mod r1cs;
pub mod sparse;

use std::fmt;
use std::io::{Read, Write};

use ark_ff::PrimeField;
use ark_serialize::{
    CanonicalDeserialize, CanonicalSerialize, Compress, SerializationError, Valid, Validate,
};
use ark_std::rand::RngCore;
use num_bigint::BigUint;

use crate::frontend::schema::Schema;
use crate::hint::{HintError, HintId};
use crate::solver::SolverConfig;
use crate::utils::math::{biguint_to_field, field_to_biguint, modulus};
use crate::witness::Witness;

pub use r1cs::{R1c, R1cs};
pub use sparse::{Gate, SparseR1cs};

/// A variable of the constraint system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Wire {
    One,
    Public(u32),
    Secret(u32),
    Internal(u32),
}

impl Wire {
    fn tag(&self) -> (u8, u32) {
        match *self {
            Wire::One => (0, 0),
            Wire::Public(i) => (1, i),
            Wire::Secret(i) => (2, i),
            Wire::Internal(i) => (3, i),
        }
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wire::One => write!(f, "1"),
            Wire::Public(i) => write!(f, "pub{i}"),
            Wire::Secret(i) => write!(f, "sec{i}"),
            Wire::Internal(i) => write!(f, "w{i}"),
        }
    }
}

impl CanonicalSerialize for Wire {
    fn serialize_with_mode<W: Write>(
        &self,
        mut writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        let (tag, index) = self.tag();
        tag.serialize_with_mode(&mut writer, compress)?;
        index.serialize_with_mode(&mut writer, compress)
    }

    fn serialized_size(&self, compress: Compress) -> usize {
        0u8.serialized_size(compress) + 0u32.serialized_size(compress)
    }
}

impl Valid for Wire {
    fn check(&self) -> Result<(), SerializationError> {
        Ok(())
    }
}

impl CanonicalDeserialize for Wire {
    fn deserialize_with_mode<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        let tag = u8::deserialize_with_mode(&mut reader, compress, validate)?;
        let index = u32::deserialize_with_mode(&mut reader, compress, validate)?;
        match tag {
            0 => Ok(Wire::One),
            1 => Ok(Wire::Public(index)),
            2 => Ok(Wire::Secret(index)),
            3 => Ok(Wire::Internal(index)),
            _ => Err(SerializationError::InvalidData),
        }
    }
}

/// Sparse linear combination Σ cᵢ·wᵢ, kept sorted by wire with no zero coefficients.
#[derive(Clone, Debug, Default, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct LinearCombination<F: PrimeField> {
    terms: Vec<(Wire, F)>,
}

impl<F: PrimeField> LinearCombination<F> {
    pub fn zero() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn constant(value: F) -> Self {
        Self::term(Wire::One, value)
    }

    pub fn wire(wire: Wire) -> Self {
        Self::term(wire, F::one())
    }

    pub fn term(wire: Wire, coeff: F) -> Self {
        if coeff.is_zero() {
            return Self::zero();
        }
        Self {
            terms: vec![(wire, coeff)],
        }
    }

    pub fn terms(&self) -> &[(Wire, F)] {
        &self.terms
    }

    /// `Some(c)` if the combination only involves the constant wire.
    pub fn constant_value(&self) -> Option<F> {
        match self.terms.as_slice() {
            [] => Some(F::zero()),
            [(Wire::One, c)] => Some(*c),
            _ => None,
        }
    }

    pub fn scale(&self, by: F) -> Self {
        if by.is_zero() {
            return Self::zero();
        }
        Self {
            terms: self.terms.iter().map(|(w, c)| (*w, *c * by)).collect(),
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        let mut terms = Vec::with_capacity(self.terms.len() + other.terms.len());
        let (mut i, mut j) = (0, 0);
        while i < self.terms.len() && j < other.terms.len() {
            let (wa, ca) = self.terms[i];
            let (wb, cb) = other.terms[j];
            match wa.cmp(&wb) {
                std::cmp::Ordering::Less => {
                    terms.push((wa, ca));
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    terms.push((wb, cb));
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    let sum = ca + cb;
                    if !sum.is_zero() {
                        terms.push((wa, sum));
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        terms.extend_from_slice(&self.terms[i..]);
        terms.extend_from_slice(&other.terms[j..]);
        Self { terms }
    }

    pub fn neg(&self) -> Self {
        self.scale(-F::one())
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Splits the combination into its known value and the still-unknown internal wires.
    fn partial_eval(&self, values: &WireValues<F>) -> (F, Vec<(u32, F)>) {
        let mut known = F::zero();
        let mut unknown = Vec::new();
        for (wire, coeff) in &self.terms {
            match values.get(*wire) {
                Some(v) => known += *coeff * v,
                None => {
                    if let Wire::Internal(i) = wire {
                        unknown.push((*i, *coeff));
                    }
                }
            }
        }
        (known, unknown)
    }

    fn evaluate(&self, values: &WireValues<F>) -> Option<F> {
        self.terms
            .iter()
            .try_fold(F::zero(), |acc, (w, c)| Some(acc + *c * values.get(*w)?))
    }
}

impl<F: PrimeField> fmt::Display for LinearCombination<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, (w, c)) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            match (w, c.is_one()) {
                (Wire::One, _) => write!(f, "{c}")?,
                (_, true) => write!(f, "{w}")?,
                _ => write!(f, "{c}·{w}")?,
            }
        }
        Ok(())
    }
}

/// Deferred hint invocation: the outputs are internal wires filled when the call is reached.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct HintCall<F: PrimeField> {
    pub id: HintId,
    pub inputs: Vec<LinearCombination<F>>,
    pub outputs: Vec<u32>,
}

/// One step of the solving schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Index into the constraint (or gate) list.
    Constraint(u32),
    /// Index into the hint call list.
    Hint(u32),
}

impl CanonicalSerialize for Instruction {
    fn serialize_with_mode<W: Write>(
        &self,
        mut writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        let (tag, index) = match *self {
            Instruction::Constraint(i) => (0u8, i),
            Instruction::Hint(i) => (1u8, i),
        };
        tag.serialize_with_mode(&mut writer, compress)?;
        index.serialize_with_mode(&mut writer, compress)
    }

    fn serialized_size(&self, compress: Compress) -> usize {
        0u8.serialized_size(compress) + 0u32.serialized_size(compress)
    }
}

impl Valid for Instruction {
    fn check(&self) -> Result<(), SerializationError> {
        Ok(())
    }
}

impl CanonicalDeserialize for Instruction {
    fn deserialize_with_mode<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        let tag = u8::deserialize_with_mode(&mut reader, compress, validate)?;
        let index = u32::deserialize_with_mode(&mut reader, compress, validate)?;
        match tag {
            0 => Ok(Instruction::Constraint(index)),
            1 => Ok(Instruction::Hint(index)),
            _ => Err(SerializationError::InvalidData),
        }
    }
}

/// Errors from solving a constraint system against a witness.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    /// The witness does not match the system's input layout
    #[error("witness has {actual} {kind} values, expected {expected}")]
    WitnessSize {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A hint used by the system is missing from the solver configuration
    #[error("hint {id} not found in solver configuration")]
    HintNotFound { id: HintId },

    /// A hint function returned an error
    #[error("hint {name} ({id}) failed: {source}")]
    Hint {
        id: HintId,
        name: &'static str,
        #[source]
        source: HintError,
    },

    /// A constraint does not hold for the witness
    #[error("constraint #{index} is not satisfied: {detail}")]
    Unsatisfied { index: usize, detail: String },

    /// A constraint was reached with more than one unknown, or a zero coefficient on its unknown
    #[error("constraint #{index} cannot be solved: {detail}")]
    Unsolvable { index: usize, detail: String },
}

/// Wire assignment being built during a solve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireValues<F: PrimeField> {
    public: Vec<F>,
    secret: Vec<F>,
    internal: Vec<Option<F>>,
}

impl<F: PrimeField> WireValues<F> {
    fn new(witness: &Witness<F>, schema: &Schema, nb_internal: usize) -> Result<Self, SolveError> {
        if witness.public().len() != schema.nb_public() {
            return Err(SolveError::WitnessSize {
                kind: "public",
                expected: schema.nb_public(),
                actual: witness.public().len(),
            });
        }
        if witness.secret().len() != schema.nb_secret() {
            return Err(SolveError::WitnessSize {
                kind: "secret",
                expected: schema.nb_secret(),
                actual: witness.secret().len(),
            });
        }
        Ok(Self {
            public: witness.public().to_vec(),
            secret: witness.secret().to_vec(),
            internal: vec![None; nb_internal],
        })
    }

    pub fn get(&self, wire: Wire) -> Option<F> {
        match wire {
            Wire::One => Some(F::one()),
            Wire::Public(i) => self.public.get(i as usize).copied(),
            Wire::Secret(i) => self.secret.get(i as usize).copied(),
            Wire::Internal(i) => self.internal.get(i as usize).copied().flatten(),
        }
    }

    fn set_internal(&mut self, index: u32, value: F) {
        self.internal[index as usize] = Some(value);
    }

    fn into_solution(self, rng: Option<&mut dyn RngCore>) -> Result<Solution<F>, SolveError> {
        let mut rng = rng;
        let mut internal = Vec::with_capacity(self.internal.len());
        for (i, v) in self.internal.into_iter().enumerate() {
            match (v, rng.as_deref_mut()) {
                (Some(v), _) => internal.push(v),
                (None, Some(rng)) => internal.push(F::rand(rng)),
                (None, None) => {
                    return Err(SolveError::Unsolvable {
                        index: i,
                        detail: format!("internal wire w{i} was never solved"),
                    })
                }
            }
        }
        Ok(Solution {
            public: self.public,
            secret: self.secret,
            internal,
        })
    }
}

/// Fully solved wire assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution<F: PrimeField> {
    pub public: Vec<F>,
    pub secret: Vec<F>,
    pub internal: Vec<F>,
}

impl<F: PrimeField> Solution<F> {
    pub fn value(&self, wire: Wire) -> F {
        match wire {
            Wire::One => F::one(),
            Wire::Public(i) => self.public[i as usize],
            Wire::Secret(i) => self.secret[i as usize],
            Wire::Internal(i) => self.internal[i as usize],
        }
    }

    pub fn evaluate(&self, lc: &LinearCombination<F>) -> F {
        lc.terms()
            .iter()
            .map(|(w, c)| *c * self.value(*w))
            .sum()
    }
}

/// Solving interface shared by the compiled representations.
pub trait ConstraintSystem<F: PrimeField> {
    fn schema(&self) -> &Schema;

    fn nb_constraints(&self) -> usize;

    fn nb_internal(&self) -> usize;

    /// Solves every wire, invoking hints from `config` as they are reached.
    fn solve(&self, witness: &Witness<F>, config: &SolverConfig) -> Result<Solution<F>, SolveError>;

    /// Like [`Self::solve`] but never fails on the witness: missing hints, failing hints and
    /// violated constraints are skipped and unsolved wires are filled from `rng`. The result is
    /// only useful for measuring prover cost.
    fn solve_unchecked(
        &self,
        witness: &Witness<F>,
        config: &SolverConfig,
        rng: &mut dyn RngCore,
    ) -> Result<Solution<F>, SolveError>;

    fn is_solved(&self, witness: &Witness<F>, config: &SolverConfig) -> Result<(), SolveError> {
        self.solve(witness, config).map(|_| ())
    }
}

/// Runs one hint call, writing its outputs into `values`.
fn run_hint<F: PrimeField>(
    call: &HintCall<F>,
    values: &mut WireValues<F>,
    config: &SolverConfig,
    index: usize,
) -> Result<(), SolveError> {
    let hint = config
        .hint(call.id)
        .ok_or(SolveError::HintNotFound { id: call.id })?;
    let inputs = call
        .inputs
        .iter()
        .map(|lc| lc.evaluate(values).map(|v| field_to_biguint(&v)))
        .collect::<Option<Vec<BigUint>>>()
        .ok_or_else(|| SolveError::Unsolvable {
            index,
            detail: format!("hint {} reached with unsolved inputs", hint.name),
        })?;
    let mut outputs = vec![BigUint::default(); call.outputs.len()];
    (hint.func)(&modulus::<F>(), &inputs, &mut outputs).map_err(|source| SolveError::Hint {
        id: call.id,
        name: hint.name,
        source,
    })?;
    for (wire, value) in call.outputs.iter().zip(&outputs) {
        values.set_internal(*wire, biguint_to_field(value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    fn lc(terms: &[(Wire, u64)]) -> LinearCombination<Fr> {
        terms
            .iter()
            .fold(LinearCombination::zero(), |acc, (w, c)| {
                acc.add(&LinearCombination::term(*w, Fr::from(*c)))
            })
    }

    #[test]
    fn combinations_stay_normalized() {
        let a = lc(&[(Wire::Secret(1), 2), (Wire::One, 3), (Wire::Public(0), 1)]);
        let wires: Vec<Wire> = a.terms().iter().map(|(w, _)| *w).collect();
        assert_eq!(wires, vec![Wire::One, Wire::Public(0), Wire::Secret(1)]);

        let cancelled = a.sub(&lc(&[(Wire::Secret(1), 2)]));
        assert_eq!(cancelled, lc(&[(Wire::One, 3), (Wire::Public(0), 1)]));
        assert_eq!(a.sub(&a), LinearCombination::zero());
    }

    #[test]
    fn constant_detection() {
        assert_eq!(LinearCombination::<Fr>::zero().constant_value(), Some(Fr::from(0u64)));
        assert_eq!(lc(&[(Wire::One, 5)]).constant_value(), Some(Fr::from(5u64)));
        assert_eq!(lc(&[(Wire::Internal(0), 5)]).constant_value(), None);
        assert_eq!(lc(&[(Wire::One, 5)]).scale(Fr::from(0u64)), LinearCombination::zero());
    }

    #[test]
    fn wire_serialization() {
        let lc = lc(&[(Wire::Internal(7), 3), (Wire::Secret(2), 1)]);
        let mut bytes = Vec::new();
        lc.serialize_compressed(&mut bytes).unwrap();
        let back = LinearCombination::<Fr>::deserialize_compressed(bytes.as_slice()).unwrap();
        assert_eq!(back, lc);

        let mut bad = Vec::new();
        9u8.serialize_compressed(&mut bad).unwrap();
        0u32.serialize_compressed(&mut bad).unwrap();
        assert!(Wire::deserialize_compressed(bad.as_slice()).is_err());
    }
}
