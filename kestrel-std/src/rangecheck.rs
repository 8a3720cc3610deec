//! Range checks by limb decomposition.

use ark_ff::{BigInteger, PrimeField};
use kestrel_core::frontend::{Api, CircuitError};

use crate::hints::DECOMPOSE;
use crate::register_hints;

/// Limb width used by [`check`].
pub const LIMB_BITS: usize = 16;

/// Little-endian limbs of `limb_bits` bits covering `nb_bits`; the top limb is narrowed to the
/// remaining width. Each limb is bit-decomposed, so the limbs together prove `a < 2^nb_bits`.
pub fn decompose<F: PrimeField, A: Api<F>>(
    api: &mut A,
    a: &A::Var,
    nb_bits: usize,
    limb_bits: usize,
) -> Result<Vec<A::Var>, CircuitError> {
    if limb_bits == 0 || nb_bits >= F::MODULUS_BIT_SIZE as usize {
        return Err(CircuitError::AssertionFailed(format!(
            "cannot range check {nb_bits} bits with {limb_bits}-bit limbs"
        )));
    }
    register_hints();
    let nb_limbs = nb_bits.div_ceil(limb_bits);
    let width = api.constant(F::from(limb_bits as u64));
    let limbs = api.new_hint(DECOMPOSE, nb_limbs, &[a.clone(), width])?;

    let mut terms = Vec::with_capacity(nb_limbs);
    let mut shift = F::one();
    let base = F::from(2u64).pow([limb_bits as u64]);
    for (i, limb) in limbs.iter().enumerate() {
        let bits = if i + 1 == nb_limbs {
            nb_bits - limb_bits * i
        } else {
            limb_bits
        };
        api.to_binary(limb, bits)?;
        let c = api.constant(shift);
        terms.push(api.mul(limb, &c));
        shift *= base;
    }
    let recomposed = api.sum(&terms);
    api.assert_is_equal(&recomposed, a)?;
    Ok(limbs)
}

/// Asserts `a < 2^nb_bits`. Every field element fits in `F::MODULUS_BIT_SIZE` bits, so wider
/// checks hold trivially and emit no constraints.
pub fn check<F: PrimeField, A: Api<F>>(
    api: &mut A,
    a: &A::Var,
    nb_bits: usize,
) -> Result<(), CircuitError> {
    if nb_bits >= F::MODULUS_BIT_SIZE as usize {
        return Ok(());
    }
    if let Some(v) = api.constant_value(a) {
        return if v.into_bigint().num_bits() as usize <= nb_bits {
            Ok(())
        } else {
            Err(CircuitError::AssertionFailed(format!("{v} does not fit in {nb_bits} bits")))
        };
    }
    decompose(api, a, nb_bits, LIMB_BITS).map(|_| ())
}
