//! KZG structured reference strings and the process-wide cache.
//!
//! A reference string holds `[τⁱ]₁` for `i < size` and `[1]₂, [τ]₂`. Everything here draws τ
//! from local randomness, which means whoever ran the generation knows the trapdoor. That is
//! fine for tests and benchmarks; a production deployment must load parameters produced by a
//! multi-party ceremony instead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::RngCore;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rayon::prelude::*;

use crate::curve::CurveId;
use crate::utils::math::next_power_of_two;

/// Size of the cached reference string for each curve.
pub const SRS_CACHED_SIZE: usize = (1 << 14) + 3;

/// Errors from reference string generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SrsError {
    /// The randomness source failed; no reference string was produced
    #[error("failed to draw toxic waste: {0}")]
    Randomness(String),

    /// Requested size is zero
    #[error("reference string size must be positive")]
    EmptySize,
}

#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct KzgSrs<E: Pairing> {
    pub g1_powers: Vec<E::G1Affine>,
    pub g2: E::G2Affine,
    pub tau_g2: E::G2Affine,
}

impl<E: Pairing> KzgSrs<E> {
    /// Generates a reference string with `size` G1 powers from a freshly drawn τ.
    #[tracing::instrument(skip_all, name = "KzgSrs::generate", fields(size = size))]
    pub fn generate<R: RngCore + ?Sized>(size: usize, rng: &mut R) -> Result<Self, SrsError> {
        if size == 0 {
            return Err(SrsError::EmptySize);
        }
        tracing::warn!(size, "generating KZG reference string from local randomness, not for production use");
        let tau = draw_scalar::<E::ScalarField, R>(rng)?;

        let mut powers = Vec::with_capacity(size);
        let mut acc = E::ScalarField::ONE;
        for _ in 0..size {
            powers.push(acc);
            acc *= tau;
        }
        let g1 = E::G1Affine::generator();
        let projective: Vec<E::G1> = powers.par_iter().map(|p| g1 * *p).collect();
        let g1_powers = E::G1::normalize_batch(&projective);

        let g2 = E::G2Affine::generator();
        Ok(Self {
            g1_powers,
            g2,
            tau_g2: (g2 * tau).into_affine(),
        })
    }

    pub fn size(&self) -> usize {
        self.g1_powers.len()
    }
}

/// Draws a uniform scalar from 512 random bits. A failing source is reported, never replaced.
pub fn draw_scalar<F: PrimeField, R: RngCore + ?Sized>(rng: &mut R) -> Result<F, SrsError> {
    let mut bytes = [0u8; 64];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| SrsError::Randomness(e.to_string()))?;
    let scalar = F::from_le_bytes_mod_order(&bytes);
    if scalar.is_zero() {
        return Err(SrsError::Randomness("drew a zero scalar".to_string()));
    }
    Ok(scalar)
}

/// A reference string for one of the pairing-friendly curves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Srs {
    Bn254(KzgSrs<ark_bn254::Bn254>),
    Bls12_381(KzgSrs<ark_bls12_381::Bls12_381>),
    Bls12_377(KzgSrs<ark_bls12_377::Bls12_377>),
}

impl Srs {
    /// # Panics
    /// Panics if `curve` has no pairing.
    pub fn generate<R: RngCore + ?Sized>(
        curve: CurveId,
        size: usize,
        rng: &mut R,
    ) -> Result<Self, SrsError> {
        Ok(match curve {
            CurveId::Bn254 => Srs::Bn254(KzgSrs::generate(size, rng)?),
            CurveId::Bls12_381 => Srs::Bls12_381(KzgSrs::generate(size, rng)?),
            CurveId::Bls12_377 => Srs::Bls12_377(KzgSrs::generate(size, rng)?),
            CurveId::Grumpkin => panic!("no KZG reference string for {curve}: curve has no pairing"),
        })
    }

    pub fn curve(&self) -> CurveId {
        match self {
            Srs::Bn254(_) => CurveId::Bn254,
            Srs::Bls12_381(_) => CurveId::Bls12_381,
            Srs::Bls12_377(_) => CurveId::Bls12_377,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Srs::Bn254(srs) => srs.size(),
            Srs::Bls12_381(srs) => srs.size(),
            Srs::Bls12_377(srs) => srs.size(),
        }
    }
}

/// Reference string size for a system with the given number of constraints and public inputs.
pub fn kzg_size(nb_constraints: usize, nb_public: usize) -> usize {
    next_power_of_two(nb_constraints + nb_public) + 3
}

/// Memoizes one reference string of [`SRS_CACHED_SIZE`] per curve.
///
/// A single mutex covers the lookup, the generation on a miss and the insertion, so concurrent
/// callers for the same curve share one generation. Requests larger than the cached size are
/// generated on every call, outside the lock.
#[derive(Debug, Default)]
pub struct SrsCache {
    entries: Mutex<HashMap<CurveId, Arc<Srs>>>,
}

impl SrsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(
        &self,
        nb_constraints: usize,
        nb_public: usize,
        curve: CurveId,
    ) -> Result<Arc<Srs>, SrsError> {
        self.acquire_with_rng(nb_constraints, nb_public, curve, &mut OsRng)
    }

    pub fn acquire_with_rng<R: RngCore + ?Sized>(
        &self,
        nb_constraints: usize,
        nb_public: usize,
        curve: CurveId,
        rng: &mut R,
    ) -> Result<Arc<Srs>, SrsError> {
        let size = kzg_size(nb_constraints, nb_public);
        if size > SRS_CACHED_SIZE {
            tracing::debug!(%curve, size, "reference string above cache threshold");
            return Srs::generate(curve, size, rng).map(Arc::new);
        }

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(srs) = entries.get(&curve) {
            tracing::debug!(%curve, size, "reference string cache hit");
            return Ok(Arc::clone(srs));
        }
        let srs = Arc::new(Srs::generate(curve, SRS_CACHED_SIZE, rng)?);
        entries.insert(curve, Arc::clone(&srs));
        Ok(srs)
    }

    pub fn cached(&self, curve: CurveId) -> Option<Arc<Srs>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&curve)
            .cloned()
    }
}

static GLOBAL_CACHE: Lazy<SrsCache> = Lazy::new(SrsCache::new);

/// Reference string for a system of `nb_constraints` constraints and `nb_public` public
/// inputs, served from the process-wide cache when it fits.
pub fn acquire(nb_constraints: usize, nb_public: usize, curve: CurveId) -> Result<Arc<Srs>, SrsError> {
    GLOBAL_CACHE.acquire(nb_constraints, nb_public, curve)
}
