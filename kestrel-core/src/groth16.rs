//! Groth16 over [`R1cs`] systems, delegating to `ark-groth16`.
//!
//! Public wires become instance variables in declaration order, followed by secret and
//! internal wires as witness variables. Solving happens before synthesis so that hint
//! failures and unsatisfied constraints surface as [`SolveError`]s rather than opaque
//! synthesis errors.
//!
//! Force mode synthesizes the arbitrary assignment into constraint matrices and runs the
//! QAP reduction on them directly, so no satisfiability check is involved.

use ark_ec::pairing::Pairing;
use ark_ff::UniformRand;
use ark_groth16::Groth16;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem as ArkConstraintSystem, ConstraintSystemRef,
    LinearCombination as ArkLc, OptimizationGoal, SynthesisError, Variable,
};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use ark_std::rand::RngCore;
use rand::rngs::OsRng;

use crate::constraint::{ConstraintSystem, LinearCombination, R1cs, Solution, SolveError, Wire};
use crate::solver::SolverConfig;
use crate::witness::Witness;

pub use ark_groth16::{Proof, ProvingKey, VerifyingKey};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Groth16Error {
    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("expected {expected} public inputs, got {actual}")]
    PublicInputCount { expected: usize, actual: usize },

    #[error("pairing check failed")]
    VerificationFailed,
}

impl From<SynthesisError> for Groth16Error {
    fn from(err: SynthesisError) -> Self {
        Groth16Error::Synthesis(err.to_string())
    }
}

/// Feeds an [`R1cs`] and, when proving, its solution into an arkworks constraint system.
struct R1csSynthesizer<'a, F: ark_ff::PrimeField> {
    cs: &'a R1cs<F>,
    solution: Option<&'a Solution<F>>,
}

impl<F: ark_ff::PrimeField> R1csSynthesizer<'_, F> {
    fn assigned(&self, wire: Wire) -> Result<F, SynthesisError> {
        self.solution
            .map(|s| s.value(wire))
            .ok_or(SynthesisError::AssignmentMissing)
    }

    fn lower(lc: &LinearCombination<F>, variables: &Variables) -> ArkLc<F> {
        let mut out = ArkLc::zero();
        for (wire, coeff) in lc.terms() {
            out += (*coeff, variables.get(*wire));
        }
        out
    }
}

struct Variables {
    public: Vec<Variable>,
    secret: Vec<Variable>,
    internal: Vec<Variable>,
}

impl Variables {
    fn get(&self, wire: Wire) -> Variable {
        match wire {
            Wire::One => Variable::One,
            Wire::Public(i) => self.public[i as usize],
            Wire::Secret(i) => self.secret[i as usize],
            Wire::Internal(i) => self.internal[i as usize],
        }
    }
}

impl<F: ark_ff::PrimeField> ConstraintSynthesizer<F> for R1csSynthesizer<'_, F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let schema = self.cs.schema();
        let public = (0..schema.nb_public() as u32)
            .map(|i| cs.new_input_variable(|| self.assigned(Wire::Public(i))))
            .collect::<Result<Vec<_>, _>>()?;
        let secret = (0..schema.nb_secret() as u32)
            .map(|i| cs.new_witness_variable(|| self.assigned(Wire::Secret(i))))
            .collect::<Result<Vec<_>, _>>()?;
        let internal = (0..self.cs.nb_internal() as u32)
            .map(|i| cs.new_witness_variable(|| self.assigned(Wire::Internal(i))))
            .collect::<Result<Vec<_>, _>>()?;
        let variables = Variables {
            public,
            secret,
            internal,
        };

        for r1c in self.cs.constraints() {
            cs.enforce_constraint(
                Self::lower(&r1c.a, &variables),
                Self::lower(&r1c.b, &variables),
                Self::lower(&r1c.c, &variables),
            )?;
        }
        Ok(())
    }
}

/// Circuit-specific setup with fresh OS randomness.
#[tracing::instrument(skip_all, name = "groth16::setup", fields(nb_constraints = cs.nb_constraints()))]
pub fn setup<E: Pairing>(
    cs: &R1cs<E::ScalarField>,
) -> Result<(ProvingKey<E>, VerifyingKey<E>), Groth16Error> {
    let circuit = R1csSynthesizer {
        cs,
        solution: None,
    };
    Ok(Groth16::<E>::setup(circuit, &mut OsRng)?)
}

#[tracing::instrument(skip_all, name = "groth16::prove")]
pub fn prove<E: Pairing>(
    cs: &R1cs<E::ScalarField>,
    pk: &ProvingKey<E>,
    witness: &Witness<E::ScalarField>,
    config: &SolverConfig,
) -> Result<Proof<E>, Groth16Error> {
    let solution = cs.solve(witness, config)?;
    prove_solution(cs, pk, &solution)
}

/// Proves whatever assignment [`ConstraintSystem::solve_unchecked`] produces. The proof has
/// the right shape but does not verify unless the witness happens to be valid.
#[tracing::instrument(skip_all, name = "groth16::prove_unchecked")]
pub fn prove_unchecked<E: Pairing>(
    cs: &R1cs<E::ScalarField>,
    pk: &ProvingKey<E>,
    witness: &Witness<E::ScalarField>,
    config: &SolverConfig,
    rng: &mut dyn RngCore,
) -> Result<Proof<E>, Groth16Error> {
    let solution = cs.solve_unchecked(witness, config, rng)?;
    let circuit = R1csSynthesizer {
        cs,
        solution: Some(&solution),
    };
    let ark_cs = ArkConstraintSystem::<E::ScalarField>::new_ref();
    ark_cs.set_optimization_goal(OptimizationGoal::Constraints);
    circuit.generate_constraints(ark_cs.clone())?;
    ark_cs.finalize();

    let matrices = ark_cs.to_matrices().ok_or(SynthesisError::MissingCS)?;
    let num_inputs = ark_cs.num_instance_variables();
    let num_constraints = ark_cs.num_constraints();
    let full_assignment = {
        let inner = ark_cs.borrow().ok_or(SynthesisError::MissingCS)?;
        let mut assignment = inner.instance_assignment.clone();
        assignment.extend_from_slice(&inner.witness_assignment);
        assignment
    };
    let r = E::ScalarField::rand(rng);
    let s = E::ScalarField::rand(rng);
    Ok(Groth16::<E>::create_proof_with_reduction_and_matrices(
        pk,
        r,
        s,
        &matrices,
        num_inputs,
        num_constraints,
        &full_assignment,
    )?)
}

fn prove_solution<E: Pairing>(
    cs: &R1cs<E::ScalarField>,
    pk: &ProvingKey<E>,
    solution: &Solution<E::ScalarField>,
) -> Result<Proof<E>, Groth16Error> {
    let circuit = R1csSynthesizer {
        cs,
        solution: Some(solution),
    };
    Ok(Groth16::<E>::prove(pk, circuit, &mut OsRng)?)
}

/// Checks `proof` against the public part of a witness.
#[tracing::instrument(skip_all, name = "groth16::verify")]
pub fn verify<E: Pairing>(
    vk: &VerifyingKey<E>,
    proof: &Proof<E>,
    public: &[E::ScalarField],
) -> Result<(), Groth16Error> {
    let expected = vk.gamma_abc_g1.len().saturating_sub(1);
    if public.len() != expected {
        return Err(Groth16Error::PublicInputCount {
            expected,
            actual: public.len(),
        });
    }
    if Groth16::<E>::verify(vk, public, proof)? {
        Ok(())
    } else {
        Err(Groth16Error::VerificationFailed)
    }
}
