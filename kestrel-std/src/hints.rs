//! Hints behind the gadgets of this crate.
//!
//! Same contract as the built-in hints: `(modulus, inputs, outputs)`, canonical integers in and
//! out, and nothing returned here is trusted by the gadgets that call them.

use kestrel_core::hint::{check_arity, HintError, HintId, NamedHint};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

pub const ITH_BIT: HintId = HintId::from_name("std_ith_bit");
pub const N_TRITS: HintId = HintId::from_name("std_n_trits");
pub const NNAF: HintId = HintId::from_name("std_nnaf");
pub const DECOMPOSE: HintId = HintId::from_name("std_decompose");
pub const COUNT: HintId = HintId::from_name("std_count");

pub fn std_hints() -> [NamedHint; 5] {
    [
        NamedHint::new("std_ith_bit", ith_bit),
        NamedHint::new("std_n_trits", n_trits),
        NamedHint::new("std_nnaf", nnaf),
        NamedHint::new("std_decompose", decompose),
        NamedHint::new("std_count", count),
    ]
}

fn small(value: &BigUint, what: &str) -> Result<u64, HintError> {
    value
        .to_u64()
        .ok_or_else(|| HintError::InvalidInput(format!("{what} {value} does not fit in 64 bits")))
}

/// Inputs `(a, i)`: bit `i` of `a`.
pub fn ith_bit(_: &BigUint, inputs: &[BigUint], outputs: &mut [BigUint]) -> Result<(), HintError> {
    check_arity(inputs, outputs, 2, 1)?;
    let i = small(&inputs[1], "bit index")?;
    outputs[0] = BigUint::from(inputs[0].bit(i) as u8);
    Ok(())
}

/// Little-endian base-3 digits of the single input, one per output.
pub fn n_trits(_: &BigUint, inputs: &[BigUint], outputs: &mut [BigUint]) -> Result<(), HintError> {
    check_arity(inputs, outputs, 1, outputs.len())?;
    let three = BigUint::from(3u32);
    let mut rest = inputs[0].clone();
    for out in outputs.iter_mut() {
        let (q, r) = rest.div_rem(&three);
        *out = r;
        rest = q;
    }
    Ok(())
}

/// Non-adjacent form of the single input, little-endian, one signed digit per output. A digit of
/// −1 is written as `modulus − 1`.
pub fn nnaf(modulus: &BigUint, inputs: &[BigUint], outputs: &mut [BigUint]) -> Result<(), HintError> {
    check_arity(inputs, outputs, 1, outputs.len())?;
    let four = BigUint::from(4u32);
    let mut rest = inputs[0].clone();
    for out in outputs.iter_mut() {
        if rest.is_odd() {
            if (&rest % &four) == BigUint::from(3u32) {
                *out = modulus - 1u32;
                rest += 1u32;
            } else {
                *out = BigUint::one();
                rest -= 1u32;
            }
        } else {
            *out = BigUint::zero();
        }
        rest >>= 1;
    }
    Ok(())
}

/// Inputs `(a, limb_bits)`: little-endian limbs of `limb_bits` bits, one per output.
pub fn decompose(_: &BigUint, inputs: &[BigUint], outputs: &mut [BigUint]) -> Result<(), HintError> {
    check_arity(inputs, outputs, 2, outputs.len())?;
    let limb_bits = small(&inputs[1], "limb width")?;
    if limb_bits == 0 {
        return Err(HintError::InvalidInput("limb width must be positive".to_string()));
    }
    let mask = (BigUint::one() << limb_bits) - 1u32;
    let mut rest = inputs[0].clone();
    for out in outputs.iter_mut() {
        *out = &rest & &mask;
        rest >>= limb_bits;
    }
    Ok(())
}

/// Inputs `(needle, haystack...)`: how many haystack entries equal the needle.
pub fn count(_: &BigUint, inputs: &[BigUint], outputs: &mut [BigUint]) -> Result<(), HintError> {
    if inputs.is_empty() {
        return Err(HintError::InputCount {
            expected: 1,
            actual: 0,
        });
    }
    check_arity(inputs, outputs, inputs.len(), 1)?;
    let needle = &inputs[0];
    outputs[0] = BigUint::from(inputs[1..].iter().filter(|h| *h == needle).count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> BigUint {
        BigUint::from(101u32)
    }

    fn run(f: kestrel_core::hint::HintFn, inputs: &[u32], nb_outputs: usize) -> Vec<u32> {
        let inputs: Vec<_> = inputs.iter().map(|&v| BigUint::from(v)).collect();
        let mut outputs = vec![BigUint::zero(); nb_outputs];
        f(&p(), &inputs, &mut outputs).unwrap();
        outputs.iter().map(|v| v.to_u32().unwrap()).collect()
    }

    #[test]
    fn single_bits() {
        assert_eq!(run(ith_bit, &[0b1010, 1], 1), vec![1]);
        assert_eq!(run(ith_bit, &[0b1010, 2], 1), vec![0]);
        assert_eq!(run(ith_bit, &[0b1010, 200], 1), vec![0]);
    }

    #[test]
    fn ternary_digits() {
        // 46 = 1 + 0·3 + 2·9 + 1·27
        assert_eq!(run(n_trits, &[46], 5), vec![1, 0, 2, 1, 0]);
    }

    #[test]
    fn naf_digits() {
        // 7 = −1 + 0·2 + 0·4 + 1·8
        assert_eq!(run(nnaf, &[7], 5), vec![100, 0, 0, 1, 0]);
        // 6 = 0 − 2 + 0 + 8
        assert_eq!(run(nnaf, &[6], 5), vec![0, 100, 0, 1, 0]);
    }

    #[test]
    fn limbs() {
        assert_eq!(run(decompose, &[0xabcd, 4], 4), vec![0xd, 0xc, 0xb, 0xa]);
        let mut outputs = vec![BigUint::zero(); 2];
        let err = decompose(&p(), &[BigUint::from(3u32), BigUint::zero()], &mut outputs);
        assert!(matches!(err, Err(HintError::InvalidInput(_))));
    }

    #[test]
    fn occurrences() {
        assert_eq!(run(count, &[5, 1, 5, 2, 5], 1), vec![2]);
        assert_eq!(run(count, &[9, 1, 5], 1), vec![0]);
        let mut outputs = vec![BigUint::zero(); 1];
        assert!(count(&p(), &[], &mut outputs).is_err());
    }
}
