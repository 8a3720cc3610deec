use ark_bn254::Fr;
use ark_ff::PrimeField;
use kestrel_core::constraint::{ConstraintSystem, SolveError, SparseR1cs};
use kestrel_core::frontend::{self, Api, Assignment, Circuit, CircuitError};
use kestrel_core::hint::builtin::{INVERSE, N_BITS};
use kestrel_core::hint::{HintError, HintId, NamedHint};
use kestrel_core::solver::{SolverConfig, SolverOption};
use kestrel_core::test_engine::Assert;
use kestrel_core::witness::Witness;
use kestrel_core::CurveId;
use num_bigint::BigUint;

const CUBE_ROOT: HintId = HintId::from_name("test_cube_root_of_eight");

/// Always answers 2.
fn cube_root_of_eight(_: &BigUint, _: &[BigUint], out: &mut [BigUint]) -> Result<(), HintError> {
    out[0] = BigUint::from(2u32);
    Ok(())
}

/// `inv · x == 1` and `bits(x)` over 8 bits.
struct InverseAndBits;

impl Circuit for InverseAndBits {
    fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
        let x = api.secret_input("x")?;
        let expected = api.public_input("inv")?;
        let inv = api.inverse(&x)?;
        api.assert_is_equal(&inv, &expected)?;
        api.to_binary(&x, 8)?;
        Ok(())
    }
}

/// Takes a hint output on faith and then checks it: `r³ == 8`.
struct CubeRoot;

impl Circuit for CubeRoot {
    fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
        let seed = api.secret_input("seed")?;
        let r = api.new_hint(CUBE_ROOT, 1, &[seed])?.remove(0);
        let r2 = api.mul(&r, &r);
        let r3 = api.mul(&r2, &r);
        let eight = api.constant(F::from(8u64));
        api.assert_is_equal(&r3, &eight)
    }
}

fn inverse_witness<F: PrimeField>(cs: &impl ConstraintSystem<F>, x: u64) -> Witness<F> {
    let inv: BigUint = F::from(x).inverse().unwrap().into();
    let assignment = Assignment::new().with("x", x).with("inv", inv);
    Witness::from_assignment(cs.schema(), &assignment).unwrap()
}

fn off_by_one_inverse(p: &BigUint, inputs: &[BigUint], out: &mut [BigUint]) -> Result<(), HintError> {
    kestrel_core::hint::builtin::inverse(p, inputs, out)?;
    out[0] = (&out[0] + 1u32) % p;
    Ok(())
}

fn flip_low_bit(p: &BigUint, inputs: &[BigUint], out: &mut [BigUint]) -> Result<(), HintError> {
    kestrel_core::hint::builtin::n_bits(p, inputs, out)?;
    out[0] = BigUint::from(1u32) - &out[0];
    Ok(())
}

#[test]
fn honest_hints_solve() {
    let r1cs = frontend::compile::<Fr, _>(&InverseAndBits).unwrap();
    let sparse = SparseR1cs::from(&r1cs);
    let config = SolverConfig::default();
    r1cs.is_solved(&inverse_witness(&r1cs, 37), &config).unwrap();
    sparse.is_solved(&inverse_witness(&sparse, 37), &config).unwrap();
}

#[test]
fn corrupted_hint_outputs_are_rejected() {
    let r1cs = frontend::compile::<Fr, _>(&InverseAndBits).unwrap();
    let sparse = SparseR1cs::from(&r1cs);
    for corrupt in [
        SolverOption::OverrideHint(INVERSE, off_by_one_inverse),
        SolverOption::OverrideHint(N_BITS, flip_low_bit),
    ] {
        let config = SolverConfig::new([corrupt]);
        let err = r1cs.is_solved(&inverse_witness(&r1cs, 37), &config).unwrap_err();
        assert!(matches!(err, SolveError::Unsatisfied { .. }), "{err}");
        let err = sparse.is_solved(&inverse_witness(&sparse, 37), &config).unwrap_err();
        assert!(matches!(err, SolveError::Unsatisfied { .. }), "{err}");
    }
}

#[test]
fn overrides_do_not_leak_into_the_registry() {
    let r1cs = frontend::compile::<Fr, _>(&InverseAndBits).unwrap();
    let _corrupted = SolverConfig::new([SolverOption::OverrideHint(INVERSE, off_by_one_inverse)]);
    r1cs.is_solved(&inverse_witness(&r1cs, 5), &SolverConfig::default()).unwrap();
}

#[test]
fn unregistered_hint_is_a_configuration_error() {
    let r1cs = frontend::compile::<Fr, _>(&CubeRoot).unwrap();
    let witness = Witness::from_assignment(r1cs.schema(), &Assignment::new().with("seed", 1)).unwrap();

    let err = r1cs.is_solved(&witness, &SolverConfig::default()).unwrap_err();
    assert_eq!(err, SolveError::HintNotFound { id: CUBE_ROOT });

    let config = SolverConfig::new([SolverOption::WithHints(vec![NamedHint::new(
        "test_cube_root_of_eight",
        cube_root_of_eight,
    )])]);
    r1cs.is_solved(&witness, &config).unwrap();
}

#[test]
fn test_engine_uses_solver_options() {
    let with_hint = Assert::new()
        .with_curves([CurveId::Bn254])
        .with_solver_options([SolverOption::WithHints(vec![NamedHint::new(
            "test_cube_root_of_eight",
            cube_root_of_eight,
        )])]);
    with_hint.prover_succeeded(&CubeRoot, &Assignment::new().with("seed", 3));

    let without = Assert::new().with_curves([CurveId::Bn254]).no_prover_checks();
    assert!(without
        .check_solving_succeeded(&CubeRoot, &Assignment::new().with("seed", 3))
        .is_err());
}
