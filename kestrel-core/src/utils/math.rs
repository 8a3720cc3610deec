//! Conversions between arkworks field elements and `num-bigint` integers, plus the small
//! modular helpers the solver and hints share.

use ark_ff::{BigInteger, PrimeField};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

/// Smallest power of two greater than or equal to `n` (and at least 1).
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// The modulus of `F` as an arbitrary-precision integer.
pub fn modulus<F: PrimeField>() -> BigUint {
    BigUint::from_bytes_le(&F::MODULUS.to_bytes_le())
}

/// Canonical (non-Montgomery) integer representative of `x`.
pub fn field_to_biguint<F: PrimeField>(x: &F) -> BigUint {
    BigUint::from_bytes_le(&x.into_bigint().to_bytes_le())
}

/// Reduces `x` modulo the field order.
pub fn biguint_to_field<F: PrimeField>(x: &BigUint) -> F {
    F::from_le_bytes_mod_order(&x.to_bytes_le())
}

/// Reduces a signed integer into the field, mapping negative values to `p - |x|`.
pub fn bigint_to_field<F: PrimeField>(x: &BigInt) -> F {
    let (sign, magnitude) = x.clone().into_parts();
    let value = biguint_to_field::<F>(&magnitude);
    match sign {
        Sign::Minus => -value,
        _ => value,
    }
}

/// Reduces a signed integer into `[0, modulus)`.
pub fn reduce_bigint(x: &BigInt, modulus: &BigUint) -> BigUint {
    let m = BigInt::from(modulus.clone());
    let r = ((x % &m) + &m) % &m;
    r.to_biguint().unwrap_or_default()
}

/// Modular inverse by Fermat's little theorem; `None` for zero.
pub fn mod_inverse(x: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    let x = x % modulus;
    if x.is_zero() {
        return None;
    }
    Some(x.modpow(&(modulus - 2u32), modulus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_ff::{Field, One};
    use num_traits::Zero;

    #[test]
    fn next_power_of_two_rounds_up() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(16), 16);
    }

    #[test]
    fn field_biguint_conversion() {
        let x = Fr::from(123456789u64);
        assert_eq!(field_to_biguint(&x), BigUint::from(123456789u64));
        assert_eq!(biguint_to_field::<Fr>(&BigUint::from(123456789u64)), x);
        let wrapped = modulus::<Fr>() + 5u32;
        assert_eq!(biguint_to_field::<Fr>(&wrapped), Fr::from(5u64));
    }

    #[test]
    fn negative_integers_wrap() {
        assert_eq!(bigint_to_field::<Fr>(&BigInt::from(-1)), -Fr::one());
        let p = modulus::<Fr>();
        assert_eq!(reduce_bigint(&BigInt::from(-1), &p), &p - 1u32);
    }

    #[test]
    fn inverse_matches_field() {
        let p = modulus::<Fr>();
        let inv = mod_inverse(&BigUint::from(7u32), &p).unwrap();
        assert_eq!(
            biguint_to_field::<Fr>(&inv),
            Fr::from(7u64).inverse().unwrap()
        );
        assert!(mod_inverse(&BigUint::zero(), &p).is_none());
    }
}
