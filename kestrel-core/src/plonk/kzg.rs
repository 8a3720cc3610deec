//! KZG commitments over coefficient-form polynomials, with batched opening.

use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::Field;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use super::PlonkError;
use crate::srs::KzgSrs;

/// The part of the reference string a verifier needs.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct KzgVerifierKey<E: Pairing> {
    pub g1: E::G1Affine,
    pub g2: E::G2Affine,
    pub tau_g2: E::G2Affine,
}

impl<E: Pairing> From<&KzgSrs<E>> for KzgVerifierKey<E> {
    fn from(srs: &KzgSrs<E>) -> Self {
        Self {
            g1: srs.g1_powers.first().copied().unwrap_or_else(E::G1Affine::generator),
            g2: srs.g2,
            tau_g2: srs.tau_g2,
        }
    }
}

pub fn commit<E: Pairing>(powers: &[E::G1Affine], coeffs: &[E::ScalarField]) -> Result<E::G1Affine, PlonkError> {
    if coeffs.len() > powers.len() {
        return Err(PlonkError::SrsTooSmall {
            needed: coeffs.len(),
            available: powers.len(),
        });
    }
    let commitment = E::G1::msm(&powers[..coeffs.len()], coeffs).map_err(|_| PlonkError::SrsTooSmall {
        needed: coeffs.len(),
        available: powers.len(),
    })?;
    Ok(commitment.into_affine())
}

/// Horner evaluation.
pub fn evaluate<F: Field>(coeffs: &[F], x: F) -> F {
    coeffs.iter().rev().fold(F::zero(), |acc, c| acc * x + c)
}

/// Quotient of `p(X) - p(z)` by `X - z`.
pub fn divide_by_linear<F: Field>(coeffs: &[F], z: F) -> Vec<F> {
    if coeffs.len() < 2 {
        return Vec::new();
    }
    let mut quotient = vec![F::zero(); coeffs.len() - 1];
    let mut carry = F::zero();
    for i in (1..coeffs.len()).rev() {
        carry = coeffs[i] + carry * z;
        quotient[i - 1] = carry;
    }
    quotient
}

/// Σ scaleⁱ·polysᵢ
pub fn linear_combination<F: Field>(polys: &[&[F]], scale: F) -> Vec<F> {
    let len = polys.iter().map(|p| p.len()).max().unwrap_or(0);
    let mut out = vec![F::zero(); len];
    let mut power = F::one();
    for poly in polys {
        for (o, c) in out.iter_mut().zip(poly.iter()) {
            *o += power * c;
        }
        power *= scale;
    }
    out
}

/// Commitment to the quotient of the `v`-combination of `polys` opened at `point`.
pub fn open_batch<E: Pairing>(
    powers: &[E::G1Affine],
    polys: &[&[E::ScalarField]],
    point: E::ScalarField,
    v: E::ScalarField,
) -> Result<E::G1Affine, PlonkError> {
    let combined = linear_combination(polys, v);
    commit::<E>(powers, &divide_by_linear(&combined, point))
}

/// Checks two batched openings at once:
/// `e(W₁ + u·W₂, [τ]₂) == e(z₁·W₁ + u·z₂·W₂ + (C₁ - y₁·G) + u·(C₂ - y₂·G), [1]₂)`.
#[allow(clippy::too_many_arguments)]
pub fn verify_pair<E: Pairing>(
    vk: &KzgVerifierKey<E>,
    c1: E::G1,
    y1: E::ScalarField,
    z1: E::ScalarField,
    w1: E::G1Affine,
    c2: E::G1,
    y2: E::ScalarField,
    z2: E::ScalarField,
    w2: E::G1Affine,
    u: E::ScalarField,
) -> bool {
    let g1 = vk.g1.into_group();
    let lhs = w1.into_group() + w2 * u;
    let rhs = w1 * z1 + w2 * (u * z2) + (c1 - g1 * y1) + (c2 - g1 * y2) * u;
    E::pairing(lhs.into_affine(), vk.tau_g2) == E::pairing(rhs.into_affine(), vk.g2)
}
