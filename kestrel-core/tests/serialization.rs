use ark_ff::PrimeField;
use kestrel_core::frontend::{Api, Assignment, Circuit, CircuitError};
use kestrel_core::{
    backend, BackendId, CompiledSystem, CurveId, CurveWitness, Proof, ProverOptions, ProvingKey,
    VerifyingKey,
};

/// `c == a·b + 1` with `c` public.
struct MulPlusOne;

impl Circuit for MulPlusOne {
    fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
        let c = api.public_input("c")?;
        let a = api.secret_input("a")?;
        let b = api.secret_input("b")?;
        let ab = api.mul(&a, &b);
        let one = api.constant(F::one());
        let sum = api.add(&ab, &one);
        api.assert_is_equal(&sum, &c)
    }
}

fn round_trip(curve: CurveId, backend_id: BackendId) {
    let ccs = backend::compile(curve, backend_id, &MulPlusOne).unwrap();
    let mut bytes = Vec::new();
    let written = ccs.write_to(&mut bytes).unwrap();
    assert_eq!(written as usize, bytes.len());
    let (ccs, read) = CompiledSystem::read_from(curve, backend_id, bytes.as_slice()).unwrap();
    assert_eq!(read, written);

    let (pk, vk) = backend::setup(&ccs).unwrap();

    let mut bytes = Vec::new();
    pk.write_to(&mut bytes).unwrap();
    let (pk2, _) = ProvingKey::read_from(curve, backend_id, bytes.as_slice()).unwrap();
    assert_eq!(pk, pk2);

    let mut bytes = Vec::new();
    let written = vk.write_to(&mut bytes).unwrap();
    let (vk2, read) = VerifyingKey::read_from(curve, backend_id, bytes.as_slice()).unwrap();
    assert_eq!((vk.clone(), written), (vk2.clone(), read));

    let assignment = Assignment::new().with("c", 43).with("a", 6).with("b", 7);
    let witness = CurveWitness::from_assignment(curve, ccs.schema(), &assignment).unwrap();
    let proof = backend::prove(&ccs, &pk2, &witness, &ProverOptions::new()).unwrap();

    let mut bytes = Vec::new();
    proof.write_to(&mut bytes).unwrap();
    let (proof2, _) = Proof::read_from(curve, backend_id, bytes.as_slice()).unwrap();
    assert_eq!(proof, proof2);

    let public = witness.public_only();
    let (public2, _) = CurveWitness::read_from(curve, public.to_bytes().unwrap().as_slice()).unwrap();
    assert_eq!(public, public2);
    backend::verify(&proof2, &vk2, &public2).unwrap();
}

#[test]
fn groth16_objects_round_trip() {
    round_trip(CurveId::Bn254, BackendId::Groth16);
}

#[test]
fn plonk_objects_round_trip() {
    round_trip(CurveId::Bls12_381, BackendId::Plonk);
}

#[test]
fn reading_for_the_wrong_pair_fails_or_mismatches() {
    let ccs = backend::compile(CurveId::Bn254, BackendId::Groth16, &MulPlusOne).unwrap();
    let (_, vk) = backend::setup(&ccs).unwrap();
    let mut bytes = Vec::new();
    vk.write_to(&mut bytes).unwrap();

    // BLS12-381 points are wider, so the read runs out of bytes
    assert!(VerifyingKey::read_from(CurveId::Bls12_381, BackendId::Groth16, bytes.as_slice()).is_err());
    assert!(VerifyingKey::read_from(CurveId::Bn254, BackendId::Plonk, bytes.as_slice()).is_err());
}

#[test]
fn witness_json_uses_input_names() {
    let ccs = backend::compile(CurveId::Bn254, BackendId::Groth16, &MulPlusOne).unwrap();
    let assignment = Assignment::new().with("c", 43).with("a", 6).with("b", 7);
    let witness = CurveWitness::from_assignment(CurveId::Bn254, ccs.schema(), &assignment).unwrap();

    let json = witness.to_json(ccs.schema()).unwrap();
    assert_eq!(json["c"], "43");
    assert_eq!(json["a"], "6");
    let back = CurveWitness::from_json(CurveId::Bn254, ccs.schema(), &json).unwrap();
    assert_eq!(back, witness);
    assert_eq!(witness.len(), 3);
    assert_eq!(witness.public_only().len(), 1);
}
