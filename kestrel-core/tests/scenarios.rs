use ark_ff::PrimeField;
use kestrel_core::constraint::SolveError;
use kestrel_core::frontend::{Api, Assignment, Circuit, CircuitError};
use kestrel_core::test_engine::Assert;
use kestrel_core::{backend, BackendId, CurveId, CurveWitness, ProverOptions};

/// `a · a == 36` for a secret `a`.
struct SquareIs36;

impl Circuit for SquareIs36 {
    fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
        let a = api.secret_input("a")?;
        let square = api.mul(&a, &a);
        let expected = api.constant(F::from(36u64));
        api.assert_is_equal(&square, &expected)
    }
}

/// `x · y == z` with `z` public.
struct Product;

impl Circuit for Product {
    fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
        let z = api.public_input("z")?;
        let x = api.secret_input("x")?;
        let y = api.secret_input("y")?;
        api.assert_product(&x, &y, &z)
    }
}

#[test]
fn square_root_of_36_proves_everywhere() {
    let assert = Assert::new();
    assert.prover_succeeded(&SquareIs36, &Assignment::new().with("a", 6));
    assert.prover_succeeded(&SquareIs36, &Assignment::new().with("a", -6));
    assert.prover_failed(&SquareIs36, &Assignment::new().with("a", 5));
}

#[test]
fn wrong_root_fails_while_solving() {
    for backend_id in [BackendId::Groth16, BackendId::Plonk] {
        let ccs = backend::compile(CurveId::Bn254, backend_id, &SquareIs36).unwrap();
        let (pk, _) = backend::setup(&ccs).unwrap();
        let assignment = Assignment::new().with("a", 5);
        let witness = CurveWitness::from_assignment(CurveId::Bn254, ccs.schema(), &assignment).unwrap();

        let err = backend::prove(&ccs, &pk, &witness, &ProverOptions::new()).unwrap_err();
        assert!(
            matches!(err.solve_error(), Some(SolveError::Unsatisfied { .. })),
            "{backend_id}: {err}"
        );
    }
}

#[test]
fn proofs_bind_public_inputs() {
    for backend_id in [BackendId::Groth16, BackendId::Plonk] {
        let ccs = backend::compile(CurveId::Bls12_381, backend_id, &Product).unwrap();
        let (pk, vk) = backend::setup(&ccs).unwrap();
        let witness = |z: i64| {
            let assignment = Assignment::new().with("z", z).with("x", 3).with("y", 7);
            CurveWitness::from_assignment(CurveId::Bls12_381, ccs.schema(), &assignment).unwrap()
        };
        let proof = backend::prove(&ccs, &pk, &witness(21), &ProverOptions::new()).unwrap();
        backend::verify(&proof, &vk, &witness(21).public_only()).unwrap();
        assert!(backend::verify(&proof, &vk, &witness(22).public_only()).is_err());
        assert_eq!(vk.nb_public_witness(), 1);
    }
}

#[test]
fn forced_proofs_do_not_verify() {
    for backend_id in [BackendId::Groth16, BackendId::Plonk] {
        let ccs = backend::compile(CurveId::Bn254, backend_id, &Product).unwrap();
        let (pk, vk) = backend::setup(&ccs).unwrap();
        let assignment = Assignment::new().with("z", 22).with("x", 3).with("y", 7);
        let witness =
            CurveWitness::from_assignment(CurveId::Bn254, ccs.schema(), &assignment).unwrap();
        let options = ProverOptions::new();

        assert!(backend::prove(&ccs, &pk, &witness, &options).is_err());
        let mut rng = ark_std::test_rng();
        let proof = backend::prove_unchecked(&ccs, &pk, &witness, &options, &mut rng).unwrap();
        assert_eq!(proof.backend(), backend_id);
        assert!(
            backend::verify(&proof, &vk, &witness.public_only()).is_err(),
            "{backend_id}"
        );
    }
}

#[test]
fn grumpkin_solves_without_proving() {
    Assert::new()
        .with_curves([CurveId::Grumpkin])
        .solving_succeeded(&SquareIs36, &Assignment::new().with("a", 6));
}

#[test]
#[should_panic(expected = "no groth16 implementation for curve grumpkin")]
fn groth16_setup_on_grumpkin_aborts() {
    let ccs = backend::compile(CurveId::Grumpkin, BackendId::Groth16, &SquareIs36).unwrap();
    let _ = backend::setup(&ccs);
}

#[test]
#[should_panic(expected = "no plonk implementation for curve grumpkin")]
fn plonk_setup_on_grumpkin_aborts() {
    let ccs = backend::compile(CurveId::Grumpkin, BackendId::Plonk, &SquareIs36).unwrap();
    let _ = backend::setup(&ccs);
}
