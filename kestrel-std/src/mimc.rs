//! MiMC hash over the circuit field in Miyaguchi–Preneel mode.
//!
//! The round function is `x ↦ (x + k + cᵢ)^e` with the smallest odd exponent `e` coprime to
//! `p − 1`, repeated `⌈log_e p⌉` times. Round constants are a Blake2b hash chain seeded with
//! [`SEED`]. The native and in-circuit versions compute the same function.

use ark_ff::PrimeField;
use blake2::Blake2b512;
use digest::Digest;
use kestrel_core::frontend::Api;
use kestrel_core::utils::math::modulus;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;

pub const SEED: &[u8] = b"kestrel_mimc_seed";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MimcParams<F: PrimeField> {
    exponent: u64,
    constants: Vec<F>,
}

impl<F: PrimeField> Default for MimcParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: PrimeField> MimcParams<F> {
    pub fn new() -> Self {
        let exponent = exponent::<F>();
        let nb_rounds = (F::MODULUS_BIT_SIZE as f64 / (exponent as f64).log2()).ceil() as usize;
        Self {
            exponent,
            constants: round_constants(nb_rounds),
        }
    }

    pub fn exponent(&self) -> u64 {
        self.exponent
    }

    pub fn nb_rounds(&self) -> usize {
        self.constants.len()
    }

    /// The keyed permutation `E_k(m)`.
    pub fn encrypt(&self, key: F, message: F) -> F {
        let mut x = message;
        for c in &self.constants {
            x = (x + key + c).pow([self.exponent]);
        }
        x + key
    }

    pub fn hash(&self, data: &[F]) -> F {
        data.iter().fold(F::zero(), |h, m| self.encrypt(h, *m) + h + m)
    }
}

fn exponent<F: PrimeField>() -> u64 {
    let order = modulus::<F>() - 1u32;
    let mut e = 3u64;
    while !order.gcd(&BigUint::from(e)).is_one() {
        e += 2;
    }
    e
}

fn round_constants<F: PrimeField>(nb_rounds: usize) -> Vec<F> {
    let mut state = Blake2b512::digest(SEED);
    (0..nb_rounds)
        .map(|_| {
            state = Blake2b512::digest(&state);
            F::from_le_bytes_mod_order(&state)
        })
        .collect()
}

/// `x^e` by square-and-multiply.
fn pow<F: PrimeField, A: Api<F>>(api: &mut A, x: &A::Var, e: u64) -> A::Var {
    let mut acc = x.clone();
    for i in (0..63 - e.leading_zeros()).rev() {
        acc = api.mul(&acc, &acc);
        if (e >> i) & 1 == 1 {
            acc = api.mul(&acc, x);
        }
    }
    acc
}

fn encrypt<F: PrimeField, A: Api<F>>(
    api: &mut A,
    params: &MimcParams<F>,
    key: &A::Var,
    message: &A::Var,
) -> A::Var {
    let mut x = message.clone();
    for c in &params.constants {
        let c = api.constant(*c);
        let keyed = api.add(&x, key);
        let t = api.add(&keyed, &c);
        x = pow(api, &t, params.exponent);
    }
    api.add(&x, key)
}

/// In-circuit [`MimcParams::hash`].
pub fn hash<F: PrimeField, A: Api<F>>(api: &mut A, params: &MimcParams<F>, data: &[A::Var]) -> A::Var {
    let mut h = api.constant(F::zero());
    for m in data {
        let e = encrypt(api, params, &h, m);
        let eh = api.add(&e, &h);
        h = api.add(&eh, m);
    }
    h
}
