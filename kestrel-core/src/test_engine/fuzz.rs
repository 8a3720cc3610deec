//! Agreement fuzzing.
//!
//! Each sample assigns every input of the circuit and runs the reference evaluator twice: once
//! with the inputs as variables and once with them as constants. The two verdicts must match,
//! and every compiled system handed in must then reach the same verdict when solving the
//! sample. A gadget whose constant-folding branch disagrees with its constraint branch, or a
//! lowering that accepts what the reference rejects, is reported with the offending witness.

use std::sync::Arc;

use ark_ff::PrimeField;
use ark_std::rand::{rngs::StdRng, Rng, SeedableRng};
use num_bigint::{BigInt, RandBigInt};

use super::engine::{evaluate, InputMode};
use super::AssertError;
use crate::backend::{CompiledSystem, CurveWitness};
use crate::constraint::ConstraintSystem;
use crate::curve::CurveField;
use crate::frontend::{self, Assignment, Circuit, CircuitError, Schema};
use crate::solver::SolverConfig;
use crate::utils::math::modulus;
use crate::witness::Witness;

/// Ways of filling a sample, cycled through after the first all-zero sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filler {
    Zero,
    Binary,
    Small,
    Random,
}

impl Filler {
    fn for_sample(i: usize) -> Self {
        match i {
            0 => Filler::Zero,
            _ => [Filler::Binary, Filler::Small, Filler::Random][(i - 1) % 3],
        }
    }

    fn fill<F: PrimeField>(self, schema: &Schema, rng: &mut StdRng) -> Assignment {
        let p = modulus::<F>();
        schema
            .names()
            .map(|name| {
                let value: BigInt = match self {
                    Filler::Zero => 0.into(),
                    Filler::Binary => rng.gen_range(0u8..=1).into(),
                    Filler::Small => rng.gen_range(0u64..=256).into(),
                    Filler::Random => rng.gen_biguint_below(&p).into(),
                };
                (name.to_string(), value)
            })
            .collect()
    }
}

fn verdict<E: std::fmt::Display>(result: &Result<(), E>) -> String {
    match result {
        Ok(()) => "solved".to_string(),
        Err(err) => format!("failed ({err})"),
    }
}

/// Runs `samples` agreement checks over `F`: variable against constant evaluation, then the
/// reference verdict against solving each of `systems`.
#[tracing::instrument(skip_all, name = "fuzz", fields(curve = %F::CURVE, samples = samples))]
pub fn fuzz<F: CurveField, C: Circuit>(
    circuit: &C,
    samples: usize,
    config: &SolverConfig,
    systems: &[Arc<CompiledSystem>],
) -> Result<(), AssertError> {
    let schema = frontend::compile::<F, C>(circuit)
        .map_err(|source| AssertError::Compile {
            curve: F::CURVE,
            source,
        })?
        .schema()
        .clone();
    let mut rng = StdRng::seed_from_u64(samples as u64);

    for i in 0..samples {
        let filler = Filler::for_sample(i);
        let assignment = filler.fill::<F>(&schema, &mut rng);
        let variable = evaluate::<F, C>(circuit, &assignment, config, InputMode::Variable);
        let constant = evaluate::<F, C>(circuit, &assignment, config, InputMode::Constant);
        let mut disagreement = None;
        if variable.is_ok() != constant.is_ok() {
            disagreement = Some(("constant evaluation".to_string(), verdict(&constant)));
        } else {
            for ccs in systems {
                let solved = CurveWitness::from_assignment(F::CURVE, ccs.schema(), &assignment)
                    .map_err(|err| err.to_string())
                    .and_then(|witness| {
                        ccs.is_solved(&witness, config).map_err(|err| err.to_string())
                    });
                if solved.is_ok() != variable.is_ok() {
                    disagreement = Some((format!("{} solver", ccs.backend()), verdict(&solved)));
                    break;
                }
            }
        }
        let Some((other, other_verdict)) = disagreement else {
            continue;
        };

        let witness = Witness::<F>::from_assignment(&schema, &assignment)?.to_json_string(&schema)?;
        let reference = verdict(&variable);
        tracing::error!(
            sample = i,
            ?filler,
            %reference,
            %other,
            verdict = %other_verdict,
            %witness,
            "fuzzed witness got different verdicts"
        );
        return Err(AssertError::FuzzMismatch {
            curve: F::CURVE,
            reference,
            other,
            verdict: other_verdict,
            witness,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend;
    use crate::curve::{BackendId, CurveId};
    use crate::frontend::Api;
    use ark_bn254::Fr;

    /// Accepts any `x` whose inverse exists, checking it through `div`.
    struct DivByItself;

    impl Circuit for DivByItself {
        fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
            let x = api.secret_input("x")?;
            let y = api.public_input("y")?;
            let q = api.div(&x, &x)?;
            let one = api.constant(F::one());
            api.assert_is_equal(&q, &one)?;
            let b = api.is_zero(&y)?;
            api.assert_is_boolean(&b)
        }
    }

    /// Uses a constant shortcut that is stricter than its constraint counterpart.
    struct Inconsistent;

    impl Circuit for Inconsistent {
        fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
            let x = api.secret_input("x")?;
            if let Some(v) = api.constant_value(&x) {
                if v.is_zero() {
                    return Err(CircuitError::AssertionFailed("x is zero".into()));
                }
            }
            Ok(())
        }
    }

    /// Emits an extra constraint only when compiled, the way a miscompiling gadget would.
    struct Miscompiled;

    impl Circuit for Miscompiled {
        fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
            let x = api.secret_input("x")?;
            if std::any::type_name::<A>().contains("Builder") {
                let c = api.constant(F::from(12345u64));
                api.assert_is_equal(&x, &c)?;
            }
            Ok(())
        }
    }

    fn systems<C: Circuit>(circuit: &C) -> Vec<Arc<CompiledSystem>> {
        [BackendId::Groth16, BackendId::Plonk]
            .into_iter()
            .map(|b| Arc::new(backend::compile(CurveId::Bn254, b, circuit).unwrap()))
            .collect()
    }

    #[test]
    fn fillers_cover_every_input() {
        let cs = frontend::compile::<Fr, _>(&DivByItself).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        for i in 0..4 {
            let assignment = Filler::for_sample(i).fill::<Fr>(cs.schema(), &mut rng);
            assert_eq!(assignment.iter().count(), 2);
        }
        let zero = Filler::Zero.fill::<Fr>(cs.schema(), &mut rng);
        assert!(zero.iter().all(|(_, v)| *v == BigInt::from(0)));
    }

    #[test]
    fn consistent_circuit_passes() {
        let config = SolverConfig::default();
        fuzz::<Fr, _>(&DivByItself, 12, &config, &systems(&DivByItself)).unwrap();
    }

    #[test]
    fn divergence_is_reported_with_the_witness() {
        let err = fuzz::<Fr, _>(&Inconsistent, 4, &SolverConfig::default(), &[]).unwrap_err();
        match err {
            AssertError::FuzzMismatch {
                reference,
                other,
                verdict,
                witness,
                ..
            } => {
                assert_eq!(reference, "solved");
                assert_eq!(other, "constant evaluation");
                assert!(verdict.starts_with("failed"));
                assert_eq!(witness, r#"{"x":"0"}"#);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn solver_disagreeing_with_reference_is_reported() {
        let config = SolverConfig::default();
        // the reference accepts every sample, so without systems there is nothing to catch
        fuzz::<Fr, _>(&Miscompiled, 4, &config, &[]).unwrap();

        let err = fuzz::<Fr, _>(&Miscompiled, 4, &config, &systems(&Miscompiled)).unwrap_err();
        match err {
            AssertError::FuzzMismatch {
                curve,
                reference,
                other,
                verdict,
                witness,
            } => {
                assert_eq!(curve, CurveId::Bn254);
                assert_eq!(reference, "solved");
                assert_eq!(other, "groth16 solver");
                assert!(verdict.starts_with("failed"), "{verdict}");
                assert_eq!(witness, r#"{"x":"0"}"#);
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
