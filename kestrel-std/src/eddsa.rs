//! EdDSA over a twisted Edwards curve whose base field is the circuit field, with MiMC as the
//! challenge hash.
//!
//! A signature `(R, s)` on `msg` under `A` is valid when `cofactor · (R − (s·G − h·A))` is the
//! identity, where `h = MiMC(R.x, R.y, A.x, A.y, msg)`. The native signer and verifier below
//! produce and check the same signatures.

use ark_ec::twisted_edwards::{Affine, TECurveConfig};
use ark_ec::CurveGroup;
use ark_ff::{BigInteger, PrimeField, UniformRand};
use ark_std::rand::Rng;
use kestrel_core::frontend::{Api, Assignment, Circuit, CircuitError};
use kestrel_core::utils::math::field_to_biguint;

use crate::mimc::{self, MimcParams};
use crate::twistededwards::{self as te, coordinates, EdwardsParams, Point};

pub struct PublicKey<V> {
    pub a: Point<V>,
}

pub struct Signature<V> {
    pub r: Point<V>,
    pub s: V,
}

/// Asserts that `sig` signs `msg` under `pk`.
#[tracing::instrument(skip_all, name = "eddsa::verify")]
pub fn verify<F: PrimeField, A: Api<F>>(
    api: &mut A,
    params: &EdwardsParams,
    hash: &MimcParams<F>,
    sig: &Signature<A::Var>,
    msg: &A::Var,
    pk: &PublicKey<A::Var>,
) -> Result<(), CircuitError> {
    let data = [
        sig.r.x.clone(),
        sig.r.y.clone(),
        pk.a.x.clone(),
        pk.a.y.clone(),
        msg.clone(),
    ];
    let h = mimc::hash(api, hash, &data);

    // Q = s·G − h·A
    let g = te::base(api, params);
    let neg_a = te::neg(api, &pk.a);
    let q = te::double_base_scalar_mul(api, params, &g, &sig.s, &neg_a, &h)?;
    te::assert_on_curve(api, params, &q)?;

    let neg_q = te::neg(api, &q);
    let diff = te::add(api, params, &sig.r, &neg_q)?;
    let cleared = te::clear_cofactor(api, params, &diff)?;
    let identity = te::identity(api);
    te::assert_is_equal(api, &cleared, &identity)
}

/// Verification of one signature. Public inputs `msg`, `pk_x`, `pk_y`; secret inputs `r_x`,
/// `r_y`, `s`.
#[derive(Clone, Debug)]
pub struct VerifyCircuit {
    pub params: EdwardsParams,
}

impl VerifyCircuit {
    pub fn new<P: TECurveConfig>() -> Self
    where
        P::BaseField: PrimeField,
    {
        Self {
            params: EdwardsParams::from_config::<P>(),
        }
    }

    pub fn assignment<P: TECurveConfig>(
        pk: &Affine<P>,
        msg: P::BaseField,
        sig: &NativeSignature<P>,
    ) -> Assignment
    where
        P::BaseField: PrimeField,
    {
        let a = coordinates(pk);
        let r = coordinates(&sig.r);
        Assignment::new()
            .with("msg", field_to_biguint(&msg))
            .with("pk_x", a.x)
            .with("pk_y", a.y)
            .with("r_x", r.x)
            .with("r_y", r.y)
            .with("s", field_to_biguint(&sig.s))
    }
}

impl Circuit for VerifyCircuit {
    fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
        let msg = api.public_input("msg")?;
        let pk = PublicKey {
            a: Point::new(api.public_input("pk_x")?, api.public_input("pk_y")?),
        };
        let sig = Signature {
            r: Point::new(api.secret_input("r_x")?, api.secret_input("r_y")?),
            s: api.secret_input("s")?,
        };
        verify(api, &self.params, &MimcParams::new(), &sig, &msg, &pk)
    }
}

pub struct NativeSignature<P: TECurveConfig> {
    pub r: Affine<P>,
    pub s: P::ScalarField,
}

pub struct SecretKey<P: TECurveConfig> {
    scalar: P::ScalarField,
    public: Affine<P>,
}

impl<P: TECurveConfig> SecretKey<P>
where
    P::BaseField: PrimeField,
{
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let scalar = P::ScalarField::rand(rng);
        Self {
            scalar,
            public: (P::GENERATOR * scalar).into_affine(),
        }
    }

    pub fn public_key(&self) -> Affine<P> {
        self.public
    }

    pub fn sign<R: Rng + ?Sized>(&self, msg: P::BaseField, rng: &mut R) -> NativeSignature<P> {
        let nonce = P::ScalarField::rand(rng);
        let r = (P::GENERATOR * nonce).into_affine();
        let h = challenge(&r, &self.public, msg);
        NativeSignature {
            r,
            s: nonce + h * self.scalar,
        }
    }
}

/// Native counterpart of [`verify`].
pub fn verify_native<P: TECurveConfig>(pk: &Affine<P>, msg: P::BaseField, sig: &NativeSignature<P>) -> bool
where
    P::BaseField: PrimeField,
{
    let h = challenge(&sig.r, pk, msg);
    let lhs = P::GENERATOR * sig.s;
    let rhs = *pk * h + sig.r;
    lhs == rhs
}

/// `MiMC(R, A, msg)` reduced into the scalar field.
fn challenge<P: TECurveConfig>(r: &Affine<P>, a: &Affine<P>, msg: P::BaseField) -> P::ScalarField
where
    P::BaseField: PrimeField,
{
    let h = MimcParams::<P::BaseField>::new().hash(&[r.x, r.y, a.x, a.y, msg]);
    P::ScalarField::from_le_bytes_mod_order(&h.into_bigint().to_bytes_le())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ed_on_bls12_377::EdwardsConfig;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    type Fq = <EdwardsConfig as ark_ec::CurveConfig>::BaseField;

    #[test]
    fn native_signatures_verify() {
        let mut rng = StdRng::seed_from_u64(3);
        let sk = SecretKey::<EdwardsConfig>::generate(&mut rng);
        let msg = Fq::from(1234u64);
        let sig = sk.sign(msg, &mut rng);
        assert!(verify_native(&sk.public_key(), msg, &sig));
        assert!(!verify_native(&sk.public_key(), msg + Fq::from(1u64), &sig));

        let other = SecretKey::<EdwardsConfig>::generate(&mut rng);
        assert!(!verify_native(&other.public_key(), msg, &sig));
    }
}
