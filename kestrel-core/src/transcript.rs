//! Blake2b-based Fiat-Shamir transcript

use ark_ff::{BigInteger, PrimeField};
use ark_serialize::CanonicalSerialize;
use blake2::Blake2b512;
use digest::{Digest, Output};

#[derive(Clone)]
pub struct Transcript {
    hasher: Blake2b512,
}

impl Transcript {
    pub fn new(domain_label: &[u8]) -> Self {
        let mut hasher = Blake2b512::default();
        hasher.update(domain_label);
        Self { hasher }
    }

    pub fn append_bytes(&mut self, label: &[u8], bytes: &[u8]) {
        self.hasher.update(label);
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    pub fn append_field<F: PrimeField>(&mut self, label: &[u8], x: &F) {
        self.append_bytes(label, &x.into_bigint().to_bytes_le());
    }

    pub fn append_fields<F: PrimeField>(&mut self, label: &[u8], xs: &[F]) {
        self.append_bytes(label, &(xs.len() as u64).to_le_bytes());
        for x in xs {
            self.append_field(label, x);
        }
    }

    pub fn append_serializable<S: CanonicalSerialize>(&mut self, label: &[u8], s: &S) {
        let mut bytes = Vec::with_capacity(s.compressed_size());
        // writing into a Vec cannot fail
        let _ = s.serialize_compressed(&mut bytes);
        self.append_bytes(label, &bytes);
    }

    /// Squeezes a non-zero challenge.
    pub fn challenge_scalar<F: PrimeField>(&mut self, label: &[u8]) -> F {
        self.hasher.update(label);
        loop {
            let digest: Output<Blake2b512> = self.hasher.clone().finalize();
            let repr = digest.to_vec();
            self.hasher.update(&repr);
            let fe = F::from_le_bytes_mod_order(&repr);
            if !fe.is_zero() {
                return fe;
            }
        }
    }
}
