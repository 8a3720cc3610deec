//! Runtime dispatch over the supported (curve, backend) pairs.
//!
//! Every compiled system, key, proof and witness is a closed enum tagged with its curve (and
//! backend). Operations match on the tags of their arguments and hand off to the concrete
//! [`crate::groth16`] or [`crate::plonk`] implementation. Asking for a pair no implementation
//! exists for (any pairing-based backend on Grumpkin) is a contract violation and panics;
//! arguments that are individually supported but belong to different pairs are reported as
//! [`BackendError::Mismatch`].

use std::io::{Read, Write};

use ark_bls12_377::Bls12_377;
use ark_bls12_381::Bls12_381;
use ark_bn254::Bn254;
use ark_ec::pairing::Pairing;
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use ark_std::rand::RngCore;
use serde_json::Value;

use crate::constraint::{ConstraintSystem, R1cs, SolveError, SparseR1cs};
use crate::curve::{BackendId, CurveId};
use crate::frontend::{self, Assignment, Circuit, CircuitError, Schema};
use crate::groth16::{self, Groth16Error};
use crate::plonk::{self, PlonkError};
use crate::solver::{SolverConfig, SolverOption};
use crate::srs::{self, KzgSrs, Srs, SrsError};
use crate::utils::io::{CountingReader, CountingWriter};
use crate::witness::{Witness, WitnessError};

type Bn254Fr = ark_bn254::Fr;
type Bls12_381Fr = ark_bls12_381::Fr;
type Bls12_377Fr = ark_bls12_377::Fr;
type GrumpkinFr = ark_grumpkin::Fr;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error(transparent)]
    Groth16(#[from] Groth16Error),

    #[error(transparent)]
    Plonk(#[from] PlonkError),

    #[error(transparent)]
    Srs(#[from] SrsError),

    #[error(transparent)]
    Witness(#[from] WitnessError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Arguments belong to different curves or backends
    #[error("{what} is for {found}, expected {expected}")]
    Mismatch {
        what: &'static str,
        expected: String,
        found: String,
    },
}

impl BackendError {
    /// The solver error behind this error, if solving is what failed.
    pub fn solve_error(&self) -> Option<&SolveError> {
        match self {
            BackendError::Solve(err)
            | BackendError::Groth16(Groth16Error::Solve(err))
            | BackendError::Plonk(PlonkError::Solve(err)) => Some(err),
            _ => None,
        }
    }
}

/// Aborts on a (curve, backend) pair no implementation exists for.
#[track_caller]
fn unsupported(curve: CurveId, backend: BackendId) -> ! {
    panic!("no {backend} implementation for curve {curve}")
}

fn mismatch(what: &'static str, expected: impl ToString, found: impl ToString) -> BackendError {
    BackendError::Mismatch {
        what,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn pair_name((curve, backend): (CurveId, BackendId)) -> String {
    format!("{backend}/{curve}")
}

/// Options for [`prove`].
#[derive(Clone, Debug, Default)]
pub struct ProverOptions {
    pub solver: Vec<SolverOption>,
}

impl ProverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver_option(mut self, option: SolverOption) -> Self {
        self.solver.push(option);
        self
    }

    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig::new(self.solver.iter().cloned())
    }
}

/// A compiled constraint system for one (curve, backend) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompiledSystem {
    Groth16Bn254(R1cs<Bn254Fr>),
    Groth16Bls12_381(R1cs<Bls12_381Fr>),
    Groth16Bls12_377(R1cs<Bls12_377Fr>),
    Groth16Grumpkin(R1cs<GrumpkinFr>),
    PlonkBn254(SparseR1cs<Bn254Fr>),
    PlonkBls12_381(SparseR1cs<Bls12_381Fr>),
    PlonkBls12_377(SparseR1cs<Bls12_377Fr>),
    PlonkGrumpkin(SparseR1cs<GrumpkinFr>),
}

macro_rules! with_system {
    ($value:expr, $cs:ident => $body:expr) => {
        match $value {
            CompiledSystem::Groth16Bn254($cs) => $body,
            CompiledSystem::Groth16Bls12_381($cs) => $body,
            CompiledSystem::Groth16Bls12_377($cs) => $body,
            CompiledSystem::Groth16Grumpkin($cs) => $body,
            CompiledSystem::PlonkBn254($cs) => $body,
            CompiledSystem::PlonkBls12_381($cs) => $body,
            CompiledSystem::PlonkBls12_377($cs) => $body,
            CompiledSystem::PlonkGrumpkin($cs) => $body,
        }
    };
}

/// Compiles `circuit` over the scalar field of `curve` into the representation `backend` uses.
#[tracing::instrument(skip_all, name = "backend::compile", fields(%curve, %backend))]
pub fn compile<C: Circuit>(
    curve: CurveId,
    backend: BackendId,
    circuit: &C,
) -> Result<CompiledSystem, CircuitError> {
    use CompiledSystem::*;
    Ok(match (backend, curve) {
        (BackendId::Groth16, CurveId::Bn254) => Groth16Bn254(frontend::compile(circuit)?),
        (BackendId::Groth16, CurveId::Bls12_381) => Groth16Bls12_381(frontend::compile(circuit)?),
        (BackendId::Groth16, CurveId::Bls12_377) => Groth16Bls12_377(frontend::compile(circuit)?),
        (BackendId::Groth16, CurveId::Grumpkin) => Groth16Grumpkin(frontend::compile(circuit)?),
        (BackendId::Plonk, CurveId::Bn254) => PlonkBn254(sparse(circuit)?),
        (BackendId::Plonk, CurveId::Bls12_381) => PlonkBls12_381(sparse(circuit)?),
        (BackendId::Plonk, CurveId::Bls12_377) => PlonkBls12_377(sparse(circuit)?),
        (BackendId::Plonk, CurveId::Grumpkin) => PlonkGrumpkin(sparse(circuit)?),
    })
}

fn sparse<F: PrimeField, C: Circuit>(circuit: &C) -> Result<SparseR1cs<F>, CircuitError> {
    Ok(SparseR1cs::from(&frontend::compile::<F, C>(circuit)?))
}

impl CompiledSystem {
    pub fn curve(&self) -> CurveId {
        use CompiledSystem::*;
        match self {
            Groth16Bn254(_) | PlonkBn254(_) => CurveId::Bn254,
            Groth16Bls12_381(_) | PlonkBls12_381(_) => CurveId::Bls12_381,
            Groth16Bls12_377(_) | PlonkBls12_377(_) => CurveId::Bls12_377,
            Groth16Grumpkin(_) | PlonkGrumpkin(_) => CurveId::Grumpkin,
        }
    }

    pub fn backend(&self) -> BackendId {
        use CompiledSystem::*;
        match self {
            Groth16Bn254(_) | Groth16Bls12_381(_) | Groth16Bls12_377(_) | Groth16Grumpkin(_) => {
                BackendId::Groth16
            }
            PlonkBn254(_) | PlonkBls12_381(_) | PlonkBls12_377(_) | PlonkGrumpkin(_) => {
                BackendId::Plonk
            }
        }
    }

    pub fn schema(&self) -> &Schema {
        with_system!(self, cs => cs.schema())
    }

    pub fn nb_constraints(&self) -> usize {
        with_system!(self, cs => cs.nb_constraints())
    }

    pub fn nb_public(&self) -> usize {
        self.schema().nb_public()
    }

    /// Solves the system against `witness`, discarding the solution.
    pub fn is_solved(&self, witness: &CurveWitness, config: &SolverConfig) -> Result<(), BackendError> {
        use CompiledSystem::*;
        match (self, witness) {
            (Groth16Bn254(cs), CurveWitness::Bn254(w)) => cs.is_solved(w, config)?,
            (Groth16Bls12_381(cs), CurveWitness::Bls12_381(w)) => cs.is_solved(w, config)?,
            (Groth16Bls12_377(cs), CurveWitness::Bls12_377(w)) => cs.is_solved(w, config)?,
            (Groth16Grumpkin(cs), CurveWitness::Grumpkin(w)) => cs.is_solved(w, config)?,
            (PlonkBn254(cs), CurveWitness::Bn254(w)) => cs.is_solved(w, config)?,
            (PlonkBls12_381(cs), CurveWitness::Bls12_381(w)) => cs.is_solved(w, config)?,
            (PlonkBls12_377(cs), CurveWitness::Bls12_377(w)) => cs.is_solved(w, config)?,
            (PlonkGrumpkin(cs), CurveWitness::Grumpkin(w)) => cs.is_solved(w, config)?,
            _ => return Err(mismatch("witness", self.curve(), witness.curve())),
        }
        Ok(())
    }

    /// Writes the system in compressed canonical form and returns the number of bytes written.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<u64, BackendError> {
        let mut writer = CountingWriter::new(writer);
        with_system!(self, cs => cs.serialize_compressed(&mut writer)?);
        Ok(writer.bytes_written())
    }

    /// Reads a system written by [`Self::write_to`] for the given pair.
    pub fn read_from<R: Read>(
        curve: CurveId,
        backend: BackendId,
        reader: R,
    ) -> Result<(Self, u64), BackendError> {
        use CompiledSystem::*;
        let mut reader = CountingReader::new(reader);
        let r = &mut reader;
        let cs = match (backend, curve) {
            (BackendId::Groth16, CurveId::Bn254) => Groth16Bn254(read(r)?),
            (BackendId::Groth16, CurveId::Bls12_381) => Groth16Bls12_381(read(r)?),
            (BackendId::Groth16, CurveId::Bls12_377) => Groth16Bls12_377(read(r)?),
            (BackendId::Groth16, CurveId::Grumpkin) => Groth16Grumpkin(read(r)?),
            (BackendId::Plonk, CurveId::Bn254) => PlonkBn254(read(r)?),
            (BackendId::Plonk, CurveId::Bls12_381) => PlonkBls12_381(read(r)?),
            (BackendId::Plonk, CurveId::Bls12_377) => PlonkBls12_377(read(r)?),
            (BackendId::Plonk, CurveId::Grumpkin) => PlonkGrumpkin(read(r)?),
        };
        Ok((cs, reader.bytes_read()))
    }
}

fn read<T: CanonicalDeserialize, R: Read>(reader: R) -> Result<T, SerializationError> {
    T::deserialize_compressed(reader)
}

/// A witness over the scalar field of one curve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CurveWitness {
    Bn254(Witness<Bn254Fr>),
    Bls12_381(Witness<Bls12_381Fr>),
    Bls12_377(Witness<Bls12_377Fr>),
    Grumpkin(Witness<GrumpkinFr>),
}

macro_rules! with_witness {
    ($value:expr, $w:ident => $body:expr) => {
        match $value {
            CurveWitness::Bn254($w) => $body,
            CurveWitness::Bls12_381($w) => $body,
            CurveWitness::Bls12_377($w) => $body,
            CurveWitness::Grumpkin($w) => $body,
        }
    };
}

macro_rules! for_curve {
    ($curve:expr, $body:expr) => {
        match $curve {
            CurveId::Bn254 => CurveWitness::Bn254($body),
            CurveId::Bls12_381 => CurveWitness::Bls12_381($body),
            CurveId::Bls12_377 => CurveWitness::Bls12_377($body),
            CurveId::Grumpkin => CurveWitness::Grumpkin($body),
        }
    };
}

impl CurveWitness {
    pub fn from_assignment(
        curve: CurveId,
        schema: &Schema,
        assignment: &Assignment,
    ) -> Result<Self, WitnessError> {
        Ok(for_curve!(curve, Witness::from_assignment(schema, assignment)?))
    }

    pub fn curve(&self) -> CurveId {
        match self {
            CurveWitness::Bn254(_) => CurveId::Bn254,
            CurveWitness::Bls12_381(_) => CurveId::Bls12_381,
            CurveWitness::Bls12_377(_) => CurveId::Bls12_377,
            CurveWitness::Grumpkin(_) => CurveId::Grumpkin,
        }
    }

    pub fn public_only(&self) -> Self {
        match self {
            CurveWitness::Bn254(w) => CurveWitness::Bn254(w.public_only()),
            CurveWitness::Bls12_381(w) => CurveWitness::Bls12_381(w.public_only()),
            CurveWitness::Bls12_377(w) => CurveWitness::Bls12_377(w.public_only()),
            CurveWitness::Grumpkin(w) => CurveWitness::Grumpkin(w.public_only()),
        }
    }

    pub fn len(&self) -> usize {
        with_witness!(self, w => w.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<u64, WitnessError> {
        with_witness!(self, w => w.write_to(writer))
    }

    pub fn read_from<R: Read>(curve: CurveId, reader: R) -> Result<(Self, u64), WitnessError> {
        Ok(match curve {
            CurveId::Bn254 => Witness::read_from(reader).map(|(w, n)| (CurveWitness::Bn254(w), n))?,
            CurveId::Bls12_381 => {
                Witness::read_from(reader).map(|(w, n)| (CurveWitness::Bls12_381(w), n))?
            }
            CurveId::Bls12_377 => {
                Witness::read_from(reader).map(|(w, n)| (CurveWitness::Bls12_377(w), n))?
            }
            CurveId::Grumpkin => {
                Witness::read_from(reader).map(|(w, n)| (CurveWitness::Grumpkin(w), n))?
            }
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WitnessError> {
        with_witness!(self, w => w.to_bytes())
    }

    pub fn to_json(&self, schema: &Schema) -> Result<Value, WitnessError> {
        with_witness!(self, w => w.to_json(schema))
    }

    pub fn from_json(curve: CurveId, schema: &Schema, json: &Value) -> Result<Self, WitnessError> {
        Ok(for_curve!(curve, Witness::from_json(schema, json)?))
    }
}

/// A proving key for one supported (curve, backend) pair.
#[derive(Clone, Debug, PartialEq)]
pub enum ProvingKey {
    Groth16Bn254(groth16::ProvingKey<Bn254>),
    Groth16Bls12_381(groth16::ProvingKey<Bls12_381>),
    Groth16Bls12_377(groth16::ProvingKey<Bls12_377>),
    PlonkBn254(plonk::ProvingKey<Bn254>),
    PlonkBls12_381(plonk::ProvingKey<Bls12_381>),
    PlonkBls12_377(plonk::ProvingKey<Bls12_377>),
}

/// A verifying key for one supported (curve, backend) pair.
#[derive(Clone, Debug, PartialEq)]
pub enum VerifyingKey {
    Groth16Bn254(groth16::VerifyingKey<Bn254>),
    Groth16Bls12_381(groth16::VerifyingKey<Bls12_381>),
    Groth16Bls12_377(groth16::VerifyingKey<Bls12_377>),
    PlonkBn254(plonk::VerifyingKey<Bn254>),
    PlonkBls12_381(plonk::VerifyingKey<Bls12_381>),
    PlonkBls12_377(plonk::VerifyingKey<Bls12_377>),
}

/// A proof for one supported (curve, backend) pair.
#[derive(Clone, Debug, PartialEq)]
pub enum Proof {
    Groth16Bn254(groth16::Proof<Bn254>),
    Groth16Bls12_381(groth16::Proof<Bls12_381>),
    Groth16Bls12_377(groth16::Proof<Bls12_377>),
    PlonkBn254(plonk::Proof<Bn254>),
    PlonkBls12_381(plonk::Proof<Bls12_381>),
    PlonkBls12_377(plonk::Proof<Bls12_377>),
}

/// Tagging, serialization and typed deserialization shared by keys and proofs.
macro_rules! pairing_object {
    ($ty:ident, $what:literal) => {
        impl $ty {
            pub fn curve(&self) -> CurveId {
                self.id().0
            }

            pub fn backend(&self) -> BackendId {
                self.id().1
            }

            fn id(&self) -> (CurveId, BackendId) {
                match self {
                    $ty::Groth16Bn254(_) => (CurveId::Bn254, BackendId::Groth16),
                    $ty::Groth16Bls12_381(_) => (CurveId::Bls12_381, BackendId::Groth16),
                    $ty::Groth16Bls12_377(_) => (CurveId::Bls12_377, BackendId::Groth16),
                    $ty::PlonkBn254(_) => (CurveId::Bn254, BackendId::Plonk),
                    $ty::PlonkBls12_381(_) => (CurveId::Bls12_381, BackendId::Plonk),
                    $ty::PlonkBls12_377(_) => (CurveId::Bls12_377, BackendId::Plonk),
                }
            }

            /// Writes the compressed canonical form and returns the number of bytes written.
            pub fn write_to<W: Write>(&self, writer: W) -> Result<u64, BackendError> {
                let mut writer = CountingWriter::new(writer);
                match self {
                    $ty::Groth16Bn254(v) => v.serialize_compressed(&mut writer)?,
                    $ty::Groth16Bls12_381(v) => v.serialize_compressed(&mut writer)?,
                    $ty::Groth16Bls12_377(v) => v.serialize_compressed(&mut writer)?,
                    $ty::PlonkBn254(v) => v.serialize_compressed(&mut writer)?,
                    $ty::PlonkBls12_381(v) => v.serialize_compressed(&mut writer)?,
                    $ty::PlonkBls12_377(v) => v.serialize_compressed(&mut writer)?,
                }
                Ok(writer.bytes_written())
            }

            #[doc = concat!("Reads a ", $what, " written by `write_to` for the given pair.")]
            ///
            /// # Panics
            /// Panics if no implementation exists for the pair.
            pub fn read_from<R: Read>(
                curve: CurveId,
                backend: BackendId,
                reader: R,
            ) -> Result<(Self, u64), BackendError> {
                let mut reader = CountingReader::new(reader);
                let r = &mut reader;
                let value = match (backend, curve) {
                    (BackendId::Groth16, CurveId::Bn254) => $ty::Groth16Bn254(read(r)?),
                    (BackendId::Groth16, CurveId::Bls12_381) => $ty::Groth16Bls12_381(read(r)?),
                    (BackendId::Groth16, CurveId::Bls12_377) => $ty::Groth16Bls12_377(read(r)?),
                    (BackendId::Plonk, CurveId::Bn254) => $ty::PlonkBn254(read(r)?),
                    (BackendId::Plonk, CurveId::Bls12_381) => $ty::PlonkBls12_381(read(r)?),
                    (BackendId::Plonk, CurveId::Bls12_377) => $ty::PlonkBls12_377(read(r)?),
                    (backend, curve @ CurveId::Grumpkin) => unsupported(curve, backend),
                };
                Ok((value, reader.bytes_read()))
            }
        }
    };
}

pairing_object!(ProvingKey, "proving key");
pairing_object!(VerifyingKey, "verifying key");
pairing_object!(Proof, "proof");

impl VerifyingKey {
    /// Number of public inputs a verifier must supply.
    pub fn nb_public_witness(&self) -> usize {
        match self {
            VerifyingKey::Groth16Bn254(vk) => vk.gamma_abc_g1.len() - 1,
            VerifyingKey::Groth16Bls12_381(vk) => vk.gamma_abc_g1.len() - 1,
            VerifyingKey::Groth16Bls12_377(vk) => vk.gamma_abc_g1.len() - 1,
            VerifyingKey::PlonkBn254(vk) => vk.nb_public_witness(),
            VerifyingKey::PlonkBls12_381(vk) => vk.nb_public_witness(),
            VerifyingKey::PlonkBls12_377(vk) => vk.nb_public_witness(),
        }
    }

    /// Replaces the KZG verifier parameters of a PLONK key.
    pub fn set_kzg_srs(&mut self, srs: &Srs) -> Result<(), BackendError> {
        match (&mut *self, srs) {
            (VerifyingKey::PlonkBn254(vk), Srs::Bn254(s)) => vk.set_kzg_srs(s),
            (VerifyingKey::PlonkBls12_381(vk), Srs::Bls12_381(s)) => vk.set_kzg_srs(s),
            (VerifyingKey::PlonkBls12_377(vk), Srs::Bls12_377(s)) => vk.set_kzg_srs(s),
            (vk, srs) => {
                return Err(mismatch(
                    "reference string",
                    pair_name(vk.id()),
                    format!("kzg/{}", srs.curve()),
                ))
            }
        }
        Ok(())
    }
}

/// Generates keys for `ccs`. PLONK systems draw their reference string from the process-wide
/// cache (see [`srs::acquire`]).
///
/// # Panics
/// Panics if no implementation exists for the system's (curve, backend) pair.
#[tracing::instrument(skip_all, name = "backend::setup", fields(curve = %ccs.curve(), backend = %ccs.backend()))]
pub fn setup(ccs: &CompiledSystem) -> Result<(ProvingKey, VerifyingKey), BackendError> {
    if !ccs.curve().has_pairing() {
        unsupported(ccs.curve(), ccs.backend());
    }
    match ccs.backend() {
        BackendId::Groth16 => setup_groth16(ccs),
        BackendId::Plonk => {
            let srs = srs::acquire(ccs.nb_constraints(), ccs.nb_public(), ccs.curve())?;
            setup_with_srs(ccs, &srs)
        }
    }
}

/// Like [`setup`] but with a caller-provided reference string. Groth16 has a
/// circuit-specific setup and ignores `srs`.
///
/// # Panics
/// Panics if no implementation exists for the system's (curve, backend) pair.
pub fn setup_with_srs(
    ccs: &CompiledSystem,
    srs: &Srs,
) -> Result<(ProvingKey, VerifyingKey), BackendError> {
    use CompiledSystem::*;
    match (ccs, srs) {
        (PlonkBn254(cs), Srs::Bn254(s)) => Ok(plonk_keys(
            cs,
            s,
            ProvingKey::PlonkBn254,
            VerifyingKey::PlonkBn254,
        )?),
        (PlonkBls12_381(cs), Srs::Bls12_381(s)) => Ok(plonk_keys(
            cs,
            s,
            ProvingKey::PlonkBls12_381,
            VerifyingKey::PlonkBls12_381,
        )?),
        (PlonkBls12_377(cs), Srs::Bls12_377(s)) => Ok(plonk_keys(
            cs,
            s,
            ProvingKey::PlonkBls12_377,
            VerifyingKey::PlonkBls12_377,
        )?),
        (Groth16Grumpkin(_) | PlonkGrumpkin(_), _) => unsupported(ccs.curve(), ccs.backend()),
        (Groth16Bn254(_) | Groth16Bls12_381(_) | Groth16Bls12_377(_), _) => setup_groth16(ccs),
        (_, srs) => Err(mismatch("reference string", ccs.curve(), srs.curve())),
    }
}

fn plonk_keys<E: Pairing>(
    cs: &SparseR1cs<E::ScalarField>,
    srs: &KzgSrs<E>,
    wrap_pk: fn(plonk::ProvingKey<E>) -> ProvingKey,
    wrap_vk: fn(plonk::VerifyingKey<E>) -> VerifyingKey,
) -> Result<(ProvingKey, VerifyingKey), PlonkError> {
    let (pk, vk) = plonk::setup(cs, srs)?;
    Ok((wrap_pk(pk), wrap_vk(vk)))
}

fn setup_groth16(ccs: &CompiledSystem) -> Result<(ProvingKey, VerifyingKey), BackendError> {
    use CompiledSystem::*;
    Ok(match ccs {
        Groth16Bn254(cs) => {
            let (pk, vk) = groth16::setup::<Bn254>(cs)?;
            (ProvingKey::Groth16Bn254(pk), VerifyingKey::Groth16Bn254(vk))
        }
        Groth16Bls12_381(cs) => {
            let (pk, vk) = groth16::setup::<Bls12_381>(cs)?;
            (ProvingKey::Groth16Bls12_381(pk), VerifyingKey::Groth16Bls12_381(vk))
        }
        Groth16Bls12_377(cs) => {
            let (pk, vk) = groth16::setup::<Bls12_377>(cs)?;
            (ProvingKey::Groth16Bls12_377(pk), VerifyingKey::Groth16Bls12_377(vk))
        }
        _ => unsupported(ccs.curve(), ccs.backend()),
    })
}

/// Solves `ccs` against `witness` and proves the solution.
///
/// # Panics
/// Panics if no implementation exists for the system's (curve, backend) pair.
#[tracing::instrument(skip_all, name = "backend::prove", fields(curve = %ccs.curve(), backend = %ccs.backend()))]
pub fn prove(
    ccs: &CompiledSystem,
    pk: &ProvingKey,
    witness: &CurveWitness,
    options: &ProverOptions,
) -> Result<Proof, BackendError> {
    prove_with(ccs, pk, witness, options, None)
}

/// Force mode for benchmarking: constraints that do not hold, hints that are missing or fail
/// are skipped and unsolved wires are filled from `rng`. The resulting proof has the right
/// shape but does not verify unless the witness was valid to begin with.
///
/// # Panics
/// Panics if no implementation exists for the system's (curve, backend) pair.
#[tracing::instrument(skip_all, name = "backend::prove_unchecked", fields(curve = %ccs.curve(), backend = %ccs.backend()))]
pub fn prove_unchecked(
    ccs: &CompiledSystem,
    pk: &ProvingKey,
    witness: &CurveWitness,
    options: &ProverOptions,
    rng: &mut dyn RngCore,
) -> Result<Proof, BackendError> {
    tracing::warn!("proving without checking the witness, the proof will not verify");
    prove_with(ccs, pk, witness, options, Some(rng))
}

fn prove_with(
    ccs: &CompiledSystem,
    pk: &ProvingKey,
    witness: &CurveWitness,
    options: &ProverOptions,
    rng: Option<&mut dyn RngCore>,
) -> Result<Proof, BackendError> {
    use CompiledSystem as Cs;
    use CurveWitness as W;
    use ProvingKey as Pk;

    let config = options.solver_config();
    let proof = match (ccs, pk, witness) {
        (Cs::Groth16Bn254(cs), Pk::Groth16Bn254(pk), W::Bn254(w)) => {
            Proof::Groth16Bn254(groth16_prove(cs, pk, w, &config, rng)?)
        }
        (Cs::Groth16Bls12_381(cs), Pk::Groth16Bls12_381(pk), W::Bls12_381(w)) => {
            Proof::Groth16Bls12_381(groth16_prove(cs, pk, w, &config, rng)?)
        }
        (Cs::Groth16Bls12_377(cs), Pk::Groth16Bls12_377(pk), W::Bls12_377(w)) => {
            Proof::Groth16Bls12_377(groth16_prove(cs, pk, w, &config, rng)?)
        }
        (Cs::PlonkBn254(cs), Pk::PlonkBn254(pk), W::Bn254(w)) => {
            Proof::PlonkBn254(plonk_prove(cs, pk, w, &config, rng)?)
        }
        (Cs::PlonkBls12_381(cs), Pk::PlonkBls12_381(pk), W::Bls12_381(w)) => {
            Proof::PlonkBls12_381(plonk_prove(cs, pk, w, &config, rng)?)
        }
        (Cs::PlonkBls12_377(cs), Pk::PlonkBls12_377(pk), W::Bls12_377(w)) => {
            Proof::PlonkBls12_377(plonk_prove(cs, pk, w, &config, rng)?)
        }
        (Cs::Groth16Grumpkin(_) | Cs::PlonkGrumpkin(_), _, _) => {
            unsupported(ccs.curve(), ccs.backend())
        }
        _ if witness.curve() != ccs.curve() => {
            return Err(mismatch("witness", ccs.curve(), witness.curve()))
        }
        _ => {
            return Err(mismatch(
                "proving key",
                pair_name((ccs.curve(), ccs.backend())),
                pair_name(pk.id()),
            ))
        }
    };
    tracing::info!("proof generated");
    Ok(proof)
}

fn groth16_prove<E: Pairing>(
    cs: &R1cs<E::ScalarField>,
    pk: &groth16::ProvingKey<E>,
    witness: &Witness<E::ScalarField>,
    config: &SolverConfig,
    rng: Option<&mut dyn RngCore>,
) -> Result<groth16::Proof<E>, Groth16Error> {
    match rng {
        Some(rng) => groth16::prove_unchecked(cs, pk, witness, config, rng),
        None => groth16::prove(cs, pk, witness, config),
    }
}

fn plonk_prove<E: Pairing>(
    cs: &SparseR1cs<E::ScalarField>,
    pk: &plonk::ProvingKey<E>,
    witness: &Witness<E::ScalarField>,
    config: &SolverConfig,
    rng: Option<&mut dyn RngCore>,
) -> Result<plonk::Proof<E>, PlonkError> {
    match rng {
        Some(rng) => plonk::prove_unchecked(cs, pk, witness, config, rng),
        None => plonk::prove(cs, pk, witness, config),
    }
}

/// Checks `proof` under `vk` for the given public witness. Only the public part of
/// `public_witness` is read.
#[tracing::instrument(skip_all, name = "backend::verify", fields(curve = %vk.curve(), backend = %vk.backend()))]
pub fn verify(
    proof: &Proof,
    vk: &VerifyingKey,
    public_witness: &CurveWitness,
) -> Result<(), BackendError> {
    use CurveWitness as W;
    use VerifyingKey as Vk;

    match (proof, vk, public_witness) {
        (Proof::Groth16Bn254(p), Vk::Groth16Bn254(vk), W::Bn254(w)) => {
            groth16::verify(vk, p, w.public())?
        }
        (Proof::Groth16Bls12_381(p), Vk::Groth16Bls12_381(vk), W::Bls12_381(w)) => {
            groth16::verify(vk, p, w.public())?
        }
        (Proof::Groth16Bls12_377(p), Vk::Groth16Bls12_377(vk), W::Bls12_377(w)) => {
            groth16::verify(vk, p, w.public())?
        }
        (Proof::PlonkBn254(p), Vk::PlonkBn254(vk), W::Bn254(w)) => plonk::verify(vk, p, w.public())?,
        (Proof::PlonkBls12_381(p), Vk::PlonkBls12_381(vk), W::Bls12_381(w)) => {
            plonk::verify(vk, p, w.public())?
        }
        (Proof::PlonkBls12_377(p), Vk::PlonkBls12_377(vk), W::Bls12_377(w)) => {
            plonk::verify(vk, p, w.public())?
        }
        _ if public_witness.curve() != vk.curve() => {
            return Err(mismatch("witness", vk.curve(), public_witness.curve()))
        }
        _ => {
            return Err(mismatch(
                "proof",
                pair_name(vk.id()),
                pair_name(proof.id()),
            ))
        }
    }
    tracing::info!("proof verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Api;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    /// `out` public, `a, b` secret, `out == a·b + a`.
    struct MulAdd;

    impl Circuit for MulAdd {
        fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
            let out = api.public_input("out")?;
            let a = api.secret_input("a")?;
            let b = api.secret_input("b")?;
            let ab = api.mul(&a, &b);
            let sum = api.add(&ab, &a);
            api.assert_is_equal(&sum, &out)
        }
    }

    fn witness(ccs: &CompiledSystem, out: i64, a: i64, b: i64) -> CurveWitness {
        let assignment = Assignment::new().with("out", out).with("a", a).with("b", b);
        CurveWitness::from_assignment(ccs.curve(), ccs.schema(), &assignment).unwrap()
    }

    #[test]
    fn plonk_round_trip_on_bls12_377() {
        let ccs = compile(CurveId::Bls12_377, BackendId::Plonk, &MulAdd).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let srs = Srs::generate(CurveId::Bls12_377, 64, &mut rng).unwrap();
        let (pk, vk) = setup_with_srs(&ccs, &srs).unwrap();
        let w = witness(&ccs, 12, 3, 3);
        let proof = prove(&ccs, &pk, &w, &ProverOptions::new()).unwrap();
        verify(&proof, &vk, &w.public_only()).unwrap();
        assert_eq!(vk.nb_public_witness(), 1);

        let mut injected = vk.clone();
        injected.set_kzg_srs(&srs).unwrap();
        verify(&proof, &injected, &w.public_only()).unwrap();
        let fresh = Srs::generate(CurveId::Bls12_377, 64, &mut rng).unwrap();
        injected.set_kzg_srs(&fresh).unwrap();
        assert!(verify(&proof, &injected, &w.public_only()).is_err());

        let other = witness(&ccs, 13, 3, 3).public_only();
        assert!(matches!(
            verify(&proof, &vk, &other),
            Err(BackendError::Plonk(_))
        ));
    }

    #[test]
    fn mismatched_arguments_are_errors() {
        let g16 = compile(CurveId::Bn254, BackendId::Groth16, &MulAdd).unwrap();
        let (pk, vk) = setup(&g16).unwrap();
        let w = witness(&g16, 12, 3, 3);

        let other_curve = compile(CurveId::Bls12_381, BackendId::Groth16, &MulAdd).unwrap();
        let err = prove(&g16, &pk, &witness(&other_curve, 12, 3, 3), &ProverOptions::new())
            .unwrap_err();
        assert!(matches!(err, BackendError::Mismatch { what: "witness", .. }));

        let proof = prove(&g16, &pk, &w, &ProverOptions::new()).unwrap();
        verify(&proof, &vk, &w).unwrap();
        let mut vk = vk;
        let srs = Srs::generate(CurveId::Bn254, 8, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(vk.set_kzg_srs(&srs).is_err());
    }

    #[test]
    fn solve_failure_is_reported() {
        let ccs = compile(CurveId::Bn254, BackendId::Groth16, &MulAdd).unwrap();
        let (pk, _) = setup(&ccs).unwrap();
        let err = prove(&ccs, &pk, &witness(&ccs, 13, 3, 3), &ProverOptions::new()).unwrap_err();
        assert!(matches!(
            err.solve_error(),
            Some(SolveError::Unsatisfied { .. })
        ));
    }

    #[test]
    fn systems_survive_serialization() {
        for backend in [BackendId::Groth16, BackendId::Plonk] {
            let ccs = compile(CurveId::Grumpkin, backend, &MulAdd).unwrap();
            let mut bytes = Vec::new();
            let written = ccs.write_to(&mut bytes).unwrap();
            let (read, n) = CompiledSystem::read_from(CurveId::Grumpkin, backend, &bytes[..]).unwrap();
            assert_eq!(written, n);
            assert_eq!(read, ccs);
        }
    }

    #[test]
    #[should_panic(expected = "no groth16 implementation for curve grumpkin")]
    fn grumpkin_keys_cannot_be_read() {
        let _ = Proof::read_from(CurveId::Grumpkin, BackendId::Groth16, &[][..]);
    }
}
