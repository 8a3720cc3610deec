//! PLONK over KZG for [`SparseR1cs`] systems.
//!
//! Rows `0..nb_public` bind the public inputs (`qL = 1`, public-input polynomial `PI(ωⁱ) = -xᵢ`);
//! the gates follow, and the trace is zero-padded to a power of two `n`. Copy constraints use
//! the coset shifts `1, k₁ = g, k₂ = g²` where `g` is the multiplicative generator of the field.
//!
//! The prover does not blind its polynomials, so proofs are sound but not zero-knowledge.
//! Every committed polynomial is opened at `ζ` (and `z` at `ζω`); the verifier recomputes the
//! full gate, permutation and boundary identity from the openings instead of linearizing.

pub mod kzg;
mod prover;
mod setup;
mod verifier;

use ark_ec::pairing::Pairing;
use ark_ff::{FftField, Field, PrimeField};
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::constraint::{ConstraintSystem, SolveError, SparseR1cs, Wire};
use crate::srs::SrsError;

pub use kzg::KzgVerifierKey;
pub use prover::{prove, prove_unchecked};
pub use setup::setup;
pub use verifier::verify;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlonkError {
    /// The witness does not satisfy the constraint system
    #[error(transparent)]
    Solve(#[from] SolveError),

    /// Reference string generation failed
    #[error(transparent)]
    Srs(#[from] SrsError),

    /// The reference string has fewer powers than the polynomial degree requires
    #[error("reference string too small: need {needed} powers, have {available}")]
    SrsTooSmall { needed: usize, available: usize },

    /// No FFT domain of the required size exists in the scalar field
    #[error("no evaluation domain of size {0}")]
    Domain(usize),

    /// The public witness does not match the verifying key
    #[error("expected {expected} public inputs, got {actual}")]
    PublicInputCount { expected: usize, actual: usize },

    /// The proving key was produced for a different constraint system
    #[error("proving key does not match the constraint system")]
    KeyMismatch,

    /// The gate, permutation or boundary identity does not hold at ζ
    #[error("quotient identity does not hold")]
    IdentityFailed,

    /// The batched KZG openings do not verify
    #[error("opening proof does not verify")]
    OpeningFailed,
}

#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct VerifyingKey<E: Pairing> {
    pub domain_size: u64,
    pub nb_public: u64,
    pub k1: E::ScalarField,
    pub k2: E::ScalarField,
    /// `[qL], [qR], [qO], [qM], [qC]`
    pub selectors: [E::G1Affine; 5],
    /// `[S₁], [S₂], [S₃]`
    pub sigmas: [E::G1Affine; 3],
    pub kzg: KzgVerifierKey<E>,
}

impl<E: Pairing> VerifyingKey<E> {
    pub fn nb_public_witness(&self) -> usize {
        self.nb_public as usize
    }

    /// Replaces the KZG verifier parameters, e.g. with ones loaded from a ceremony transcript.
    pub fn set_kzg_srs(&mut self, srs: &crate::srs::KzgSrs<E>) {
        self.kzg = KzgVerifierKey::from(srs);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct ProvingKey<E: Pairing> {
    pub vk: VerifyingKey<E>,
    /// Coefficients of `qL, qR, qO, qM, qC`.
    pub selectors: [Vec<E::ScalarField>; 5],
    /// Coefficients of `S₁, S₂, S₃`.
    pub sigmas: [Vec<E::ScalarField>; 3],
    /// Evaluations of `S₁, S₂, S₃` over the trace domain.
    pub sigma_evals: [Vec<E::ScalarField>; 3],
    pub powers: Vec<E::G1Affine>,
}

/// Openings at ζ, in the order they are batched.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Evaluations<F: PrimeField> {
    pub a: F,
    pub b: F,
    pub c: F,
    pub z: F,
    pub t_lo: F,
    pub t_mid: F,
    pub t_hi: F,
    pub ql: F,
    pub qr: F,
    pub qo: F,
    pub qm: F,
    pub qc: F,
    pub s1: F,
    pub s2: F,
    pub s3: F,
}

impl<F: PrimeField> Evaluations<F> {
    fn to_vec(&self) -> Vec<F> {
        vec![
            self.a, self.b, self.c, self.z, self.t_lo, self.t_mid, self.t_hi, self.ql, self.qr,
            self.qo, self.qm, self.qc, self.s1, self.s2, self.s3,
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Proof<E: Pairing> {
    /// `[a], [b], [c]`
    pub wires: [E::G1Affine; 3],
    pub z: E::G1Affine,
    /// `[t_lo], [t_mid], [t_hi]`
    pub t: [E::G1Affine; 3],
    pub evals: Evaluations<E::ScalarField>,
    pub z_omega: E::ScalarField,
    pub w_zeta: E::G1Affine,
    pub w_zeta_omega: E::G1Affine,
}

/// Wires of each trace row: public-input rows first, then one row per gate.
pub(crate) fn trace_rows<F: PrimeField>(cs: &SparseR1cs<F>) -> Vec<[Option<Wire>; 3]> {
    let nb_public = cs.schema().nb_public() as u32;
    (0..nb_public)
        .map(|i| [Some(Wire::Public(i)), None, None])
        .chain(cs.gates().iter().map(|g| g.wires))
        .collect()
}

pub(crate) fn domain_size<F: PrimeField>(cs: &SparseR1cs<F>) -> usize {
    crate::utils::math::next_power_of_two(cs.schema().nb_public() + cs.nb_constraints())
}

pub(crate) fn evaluation_domain<F: FftField>(
    size: usize,
) -> Result<Radix2EvaluationDomain<F>, PlonkError> {
    Radix2EvaluationDomain::new(size).ok_or(PlonkError::Domain(size))
}

/// Coset shifts for the second and third wire columns.
pub(crate) fn coset_shifts<F: FftField>() -> (F, F) {
    let k1 = F::GENERATOR;
    (k1, k1.square())
}

/// Evaluations of `coeffs` over `g·D` for the multiplicative generator `g`.
pub(crate) fn coset_fft<F: FftField>(domain: &Radix2EvaluationDomain<F>, coeffs: &[F]) -> Vec<F> {
    let mut shifted = coeffs.to_vec();
    let mut power = F::one();
    for c in shifted.iter_mut() {
        *c *= power;
        power *= F::GENERATOR;
    }
    domain.fft(&shifted)
}

/// Inverse of [`coset_fft`].
pub(crate) fn coset_ifft<F: FftField>(domain: &Radix2EvaluationDomain<F>, evals: &[F]) -> Vec<F> {
    let mut coeffs = domain.ifft(evals);
    let g_inv = F::GENERATOR.inverse().unwrap_or_default();
    let mut power = F::one();
    for c in coeffs.iter_mut() {
        *c *= power;
        power *= g_inv;
    }
    coeffs
}

/// Coefficients of the public-input polynomial `PI(ωⁱ) = -xᵢ`.
pub(crate) fn public_input_poly<F: FftField>(
    domain: &Radix2EvaluationDomain<F>,
    public: &[F],
) -> Vec<F> {
    let mut evals = vec![F::zero(); domain.size()];
    for (e, x) in evals.iter_mut().zip(public) {
        *e = -*x;
    }
    domain.ifft(&evals)
}

/// Transcript bound to the verifying key and the public inputs.
pub(crate) fn new_transcript<E: Pairing>(
    vk: &VerifyingKey<E>,
    public: &[E::ScalarField],
) -> crate::transcript::Transcript {
    let mut transcript = crate::transcript::Transcript::new(b"kestrel-plonk");
    transcript.append_serializable(b"vk", vk);
    transcript.append_fields(b"public", public);
    transcript
}
