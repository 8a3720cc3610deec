//! Digit decompositions beyond the built-in binary one: per-bit extraction, base 3, and
//! non-adjacent form. Also occurrence counting.

use ark_ff::PrimeField;
use kestrel_core::frontend::{Api, CircuitError};

use crate::hints::{COUNT, ITH_BIT, NNAF, N_TRITS};
use crate::register_hints;

fn single<V>(mut outputs: Vec<V>) -> V {
    debug_assert_eq!(outputs.len(), 1);
    outputs.swap_remove(0)
}

/// Asserts `Σ digitsᵢ·baseⁱ == a`.
fn assert_recomposes<F: PrimeField, A: Api<F>>(
    api: &mut A,
    digits: &[A::Var],
    base: u64,
    a: &A::Var,
) -> Result<(), CircuitError> {
    let mut terms = Vec::with_capacity(digits.len());
    let mut coeff = F::one();
    for digit in digits {
        let c = api.constant(coeff);
        terms.push(api.mul(digit, &c));
        coeff *= F::from(base);
    }
    let sum = api.sum(&terms);
    api.assert_is_equal(&sum, a)
}

/// Little-endian binary decomposition with one single-output hint per bit.
pub fn to_binary_per_bit<F: PrimeField, A: Api<F>>(
    api: &mut A,
    a: &A::Var,
    nb_bits: usize,
) -> Result<Vec<A::Var>, CircuitError> {
    register_hints();
    let mut bits = Vec::with_capacity(nb_bits);
    for i in 0..nb_bits {
        let index = api.constant(F::from(i as u64));
        let bit = single(api.new_hint(ITH_BIT, 1, &[a.clone(), index])?);
        api.assert_is_boolean(&bit)?;
        bits.push(bit);
    }
    assert_recomposes(api, &bits, 2, a)?;
    Ok(bits)
}

/// Bit `i` of `a`, where `a` is constrained to fit in `nb_bits` bits.
pub fn ith_bit<F: PrimeField, A: Api<F>>(
    api: &mut A,
    a: &A::Var,
    i: usize,
    nb_bits: usize,
) -> Result<A::Var, CircuitError> {
    if i >= nb_bits {
        return Err(CircuitError::AssertionFailed(format!(
            "bit {i} out of range for a {nb_bits}-bit value"
        )));
    }
    Ok(to_binary_per_bit(api, a, nb_bits)?.swap_remove(i))
}

/// Little-endian base-3 digits of `a`, each constrained to `{0, 1, 2}`.
pub fn to_ternary<F: PrimeField, A: Api<F>>(
    api: &mut A,
    a: &A::Var,
    nb_digits: usize,
) -> Result<Vec<A::Var>, CircuitError> {
    register_hints();
    let trits = api.new_hint(N_TRITS, nb_digits, std::slice::from_ref(a))?;
    let one = api.constant(F::one());
    let two = api.constant(F::from(2u64));
    let zero = api.constant(F::zero());
    for t in &trits {
        // t·(t−1)·(t−2) == 0
        let t1 = api.sub(t, &one);
        let t2 = api.sub(t, &two);
        let prod = api.mul(t, &t1);
        api.assert_product(&prod, &t2, &zero)?;
    }
    assert_recomposes(api, &trits, 3, a)?;
    Ok(trits)
}

/// Non-adjacent form of `a`: little-endian digits in `{−1, 0, 1}` with no two consecutive
/// non-zero digits. `nb_digits` must be one more than the bit length of `a`.
pub fn to_naf<F: PrimeField, A: Api<F>>(
    api: &mut A,
    a: &A::Var,
    nb_digits: usize,
) -> Result<Vec<A::Var>, CircuitError> {
    register_hints();
    let digits = api.new_hint(NNAF, nb_digits, std::slice::from_ref(a))?;
    for d in &digits {
        let square = api.mul(d, d);
        api.assert_product(&square, d, d)?;
    }
    let zero = api.constant(F::zero());
    for pair in digits.windows(2) {
        api.assert_product(&pair[0], &pair[1], &zero)?;
    }
    assert_recomposes(api, &digits, 2, a)?;
    Ok(digits)
}

/// Number of entries of `haystack` equal to `needle`.
pub fn count<F: PrimeField, A: Api<F>>(
    api: &mut A,
    needle: &A::Var,
    haystack: &[A::Var],
) -> Result<A::Var, CircuitError> {
    register_hints();
    let mut inputs = Vec::with_capacity(haystack.len() + 1);
    inputs.push(needle.clone());
    inputs.extend_from_slice(haystack);
    let claimed = single(api.new_hint(COUNT, 1, &inputs)?);

    let mut matches = Vec::with_capacity(haystack.len());
    for h in haystack {
        let diff = api.sub(needle, h);
        matches.push(api.is_zero(&diff)?);
    }
    let actual = api.sum(&matches);
    api.assert_is_equal(&claimed, &actual)?;
    Ok(claimed)
}
