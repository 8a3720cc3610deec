//! Hints the frontend gadgets depend on.

use std::sync::Once;

use num_bigint::BigUint;
use num_traits::Zero;

use super::{check_arity, register_hint, HintError, HintId, NamedHint};
use crate::utils::math::mod_inverse;

pub const N_BITS: HintId = HintId::from_name("n_bits");
pub const INVERSE: HintId = HintId::from_name("inverse");
pub const DIV: HintId = HintId::from_name("div");
pub const INVERSE_OR_ZERO: HintId = HintId::from_name("inverse_or_zero");

/// Little-endian binary decomposition of the single input into `outputs.len()` bits.
/// Bits above the output width are dropped; the circuit's recomposition check catches that.
pub fn n_bits(_: &BigUint, inputs: &[BigUint], outputs: &mut [BigUint]) -> Result<(), HintError> {
    check_arity(inputs, outputs, 1, outputs.len())?;
    for (i, out) in outputs.iter_mut().enumerate() {
        *out = BigUint::from(inputs[0].bit(i as u64) as u8);
    }
    Ok(())
}

pub fn inverse(modulus: &BigUint, inputs: &[BigUint], outputs: &mut [BigUint]) -> Result<(), HintError> {
    check_arity(inputs, outputs, 1, 1)?;
    outputs[0] = mod_inverse(&inputs[0], modulus).ok_or(HintError::DivisionByZero)?;
    Ok(())
}

pub fn div(modulus: &BigUint, inputs: &[BigUint], outputs: &mut [BigUint]) -> Result<(), HintError> {
    check_arity(inputs, outputs, 2, 1)?;
    let inv = mod_inverse(&inputs[1], modulus).ok_or(HintError::DivisionByZero)?;
    outputs[0] = (&inputs[0] * inv) % modulus;
    Ok(())
}

/// Inverse of the input, or zero when the input is zero. Backs `is_zero`.
pub fn inverse_or_zero(
    modulus: &BigUint,
    inputs: &[BigUint],
    outputs: &mut [BigUint],
) -> Result<(), HintError> {
    check_arity(inputs, outputs, 1, 1)?;
    outputs[0] = mod_inverse(&inputs[0], modulus).unwrap_or_else(BigUint::zero);
    Ok(())
}

pub fn builtin_hints() -> [NamedHint; 4] {
    [
        NamedHint::new("n_bits", n_bits),
        NamedHint::new("inverse", inverse),
        NamedHint::new("div", div),
        NamedHint::new("inverse_or_zero", inverse_or_zero),
    ]
}

static REGISTER: Once = Once::new();

/// Registers the built-in hints in the process-wide registry. Idempotent.
pub fn register_builtin_hints() {
    REGISTER.call_once(|| {
        for hint in builtin_hints() {
            register_hint(hint);
        }
        tracing::debug!("registered built-in hints");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hint::registered_hint;

    fn p() -> BigUint {
        BigUint::from(97u32)
    }

    #[test]
    fn bits_of_small_value() {
        let mut out = vec![BigUint::zero(); 4];
        n_bits(&p(), &[BigUint::from(0b1011u32)], &mut out).unwrap();
        let bits: Vec<u32> = out.iter().map(|b| b.try_into().unwrap()).collect();
        assert_eq!(bits, vec![1, 1, 0, 1]);
    }

    #[test]
    fn division_hints() {
        let mut out = vec![BigUint::zero()];
        div(&p(), &[BigUint::from(10u32), BigUint::from(5u32)], &mut out).unwrap();
        assert_eq!(out[0], BigUint::from(2u32));

        assert_eq!(
            inverse(&p(), &[BigUint::zero()], &mut out),
            Err(HintError::DivisionByZero)
        );
        inverse_or_zero(&p(), &[BigUint::zero()], &mut out).unwrap();
        assert!(out[0].is_zero());
        inverse_or_zero(&p(), &[BigUint::from(2u32)], &mut out).unwrap();
        assert_eq!(out[0], BigUint::from(49u32));
    }

    #[test]
    fn arity_is_checked() {
        let mut out = vec![BigUint::zero(); 2];
        assert_eq!(
            inverse(&p(), &[BigUint::from(3u32)], &mut out),
            Err(HintError::OutputCount {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn registration_is_idempotent() {
        register_builtin_hints();
        register_builtin_hints();
        assert_eq!(registered_hint(N_BITS).unwrap().name, "n_bits");
        assert_eq!(registered_hint(DIV).unwrap().name, "div");
    }
}
