//! Identifiers for the supported scalar fields and proving backends.

use ark_ff::PrimeField;
use num_bigint::BigUint;
use strum::{Display, EnumIter, EnumString};

use crate::utils::math::modulus;

/// Curve whose scalar field a constraint system is defined over.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString,
)]
pub enum CurveId {
    #[strum(serialize = "bn254")]
    Bn254,
    #[strum(serialize = "bls12_381")]
    Bls12_381,
    #[strum(serialize = "bls12_377")]
    Bls12_377,
    /// Cycle partner of BN254. Circuits compile and solve over its scalar field, but the curve
    /// has no pairing, so no pairing-based backend can be set up on it.
    #[strum(serialize = "grumpkin")]
    Grumpkin,
}

impl CurveId {
    pub fn scalar_modulus(&self) -> BigUint {
        match self {
            CurveId::Bn254 => modulus::<ark_bn254::Fr>(),
            CurveId::Bls12_381 => modulus::<ark_bls12_381::Fr>(),
            CurveId::Bls12_377 => modulus::<ark_bls12_377::Fr>(),
            CurveId::Grumpkin => modulus::<ark_grumpkin::Fr>(),
        }
    }

    pub fn has_pairing(&self) -> bool {
        !matches!(self, CurveId::Grumpkin)
    }
}

/// Proving scheme a constraint system is compiled for.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString,
)]
pub enum BackendId {
    /// Pairing-based, circuit-specific setup over rank-1 constraints.
    #[strum(serialize = "groth16")]
    Groth16,
    /// Pairing-based with a universal KZG reference string over sparse (PLONK) gates.
    #[strum(serialize = "plonk")]
    Plonk,
}

/// Ties a scalar field type to the curve identifier it belongs to.
pub trait CurveField: PrimeField {
    const CURVE: CurveId;
}

impl CurveField for ark_bn254::Fr {
    const CURVE: CurveId = CurveId::Bn254;
}

impl CurveField for ark_bls12_381::Fr {
    const CURVE: CurveId = CurveId::Bls12_381;
}

impl CurveField for ark_bls12_377::Fr {
    const CURVE: CurveId = CurveId::Bls12_377;
}

impl CurveField for ark_grumpkin::Fr {
    const CURVE: CurveId = CurveId::Grumpkin;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn names_round_trip() {
        for curve in CurveId::iter() {
            assert_eq!(CurveId::from_str(&curve.to_string()).unwrap(), curve);
        }
        for backend in BackendId::iter() {
            assert_eq!(BackendId::from_str(&backend.to_string()).unwrap(), backend);
        }
    }

    #[test]
    fn grumpkin_scalar_field_is_bn254_base_field() {
        assert_eq!(
            CurveId::Grumpkin.scalar_modulus(),
            modulus::<ark_bn254::Fq>()
        );
        assert_ne!(CurveId::Grumpkin.scalar_modulus(), CurveId::Bn254.scalar_modulus());
    }
}
