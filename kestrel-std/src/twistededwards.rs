//! Twisted Edwards arithmetic in-circuit: points on `a·x² + y² = 1 + d·x²·y²` whose base field
//! is the circuit field.
//!
//! Curve parameters are carried as integers so one [`EdwardsParams`] can be used by circuits
//! that are generic over the field; they are built from an arkworks [`TECurveConfig`]. The
//! addition law is the complete one, which holds for every pair of points when `a` is a square
//! and `d` is not, as for the curves used here.

use ark_ec::twisted_edwards::{Affine, TECurveConfig};
use ark_ff::PrimeField;
use kestrel_core::frontend::{Api, CircuitError};
use kestrel_core::utils::math::{biguint_to_field, field_to_biguint, modulus};
use num_bigint::BigUint;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdwardsParams {
    pub a: BigUint,
    pub d: BigUint,
    pub cofactor: u64,
    /// Order of the prime-order subgroup generated by `base`.
    pub order: BigUint,
    pub base: (BigUint, BigUint),
}

impl EdwardsParams {
    pub fn from_config<P: TECurveConfig>() -> Self
    where
        P::BaseField: PrimeField,
    {
        let base = P::GENERATOR;
        Self {
            a: field_to_biguint(&P::COEFF_A),
            d: field_to_biguint(&P::COEFF_D),
            cofactor: P::COFACTOR.first().copied().unwrap_or(1),
            order: modulus::<P::ScalarField>(),
            base: (field_to_biguint(&base.x), field_to_biguint(&base.y)),
        }
    }
}

/// Affine coordinates of a circuit point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point<V> {
    pub x: V,
    pub y: V,
}

impl<V> Point<V> {
    pub fn new(x: V, y: V) -> Self {
        Self { x, y }
    }
}

/// Coordinates of a native point as integers, e.g. for building an assignment.
pub fn coordinates<P: TECurveConfig>(p: &Affine<P>) -> Point<BigUint>
where
    P::BaseField: PrimeField,
{
    Point::new(field_to_biguint(&p.x), field_to_biguint(&p.y))
}

pub fn identity<F: PrimeField, A: Api<F>>(api: &mut A) -> Point<A::Var> {
    Point::new(api.constant(F::zero()), api.constant(F::one()))
}

/// The subgroup generator of `params`.
pub fn base<F: PrimeField, A: Api<F>>(api: &mut A, params: &EdwardsParams) -> Point<A::Var> {
    Point::new(
        api.constant(biguint_to_field(&params.base.0)),
        api.constant(biguint_to_field(&params.base.1)),
    )
}

pub fn neg<F: PrimeField, A: Api<F>>(api: &mut A, p: &Point<A::Var>) -> Point<A::Var> {
    Point::new(api.neg(&p.x), p.y.clone())
}

/// `p + q`.
pub fn add<F: PrimeField, A: Api<F>>(
    api: &mut A,
    params: &EdwardsParams,
    p: &Point<A::Var>,
    q: &Point<A::Var>,
) -> Result<Point<A::Var>, CircuitError> {
    let a = api.constant(biguint_to_field(&params.a));
    let d = api.constant(biguint_to_field(&params.d));
    let one = api.constant(F::one());

    let x1y2 = api.mul(&p.x, &q.y);
    let y1x2 = api.mul(&p.y, &q.x);
    let x1x2 = api.mul(&p.x, &q.x);
    let y1y2 = api.mul(&p.y, &q.y);
    let xy = api.mul(&x1x2, &y1y2);
    let dxy = api.mul(&d, &xy);

    // x₃ = (x₁y₂ + y₁x₂) / (1 + d·x₁x₂y₁y₂)
    let num_x = api.add(&x1y2, &y1x2);
    let den_x = api.add(&one, &dxy);
    let x = api.div(&num_x, &den_x)?;

    // y₃ = (y₁y₂ − a·x₁x₂) / (1 − d·x₁x₂y₁y₂)
    let ax1x2 = api.mul(&a, &x1x2);
    let num_y = api.sub(&y1y2, &ax1x2);
    let den_y = api.sub(&one, &dxy);
    let y = api.div(&num_y, &den_y)?;

    Ok(Point::new(x, y))
}

pub fn double<F: PrimeField, A: Api<F>>(
    api: &mut A,
    params: &EdwardsParams,
    p: &Point<A::Var>,
) -> Result<Point<A::Var>, CircuitError> {
    add(api, params, p, p)
}

pub fn assert_on_curve<F: PrimeField, A: Api<F>>(
    api: &mut A,
    params: &EdwardsParams,
    p: &Point<A::Var>,
) -> Result<(), CircuitError> {
    let a = api.constant(biguint_to_field(&params.a));
    let d = api.constant(biguint_to_field(&params.d));
    let one = api.constant(F::one());

    let xx = api.mul(&p.x, &p.x);
    let yy = api.mul(&p.y, &p.y);
    let axx = api.mul(&a, &xx);
    let lhs = api.add(&axx, &yy);
    let xxyy = api.mul(&xx, &yy);
    let dxxyy = api.mul(&d, &xxyy);
    let rhs = api.add(&one, &dxxyy);
    api.assert_is_equal(&lhs, &rhs)
}

pub fn assert_is_equal<F: PrimeField, A: Api<F>>(
    api: &mut A,
    p: &Point<A::Var>,
    q: &Point<A::Var>,
) -> Result<(), CircuitError> {
    api.assert_is_equal(&p.x, &q.x)?;
    api.assert_is_equal(&p.y, &q.y)
}

fn lookup2<F: PrimeField, A: Api<F>>(
    api: &mut A,
    b0: &A::Var,
    b1: &A::Var,
    table: [&Point<A::Var>; 4],
) -> Result<Point<A::Var>, CircuitError> {
    let x = api.lookup2(b0, b1, table.map(|p| &p.x))?;
    let y = api.lookup2(b0, b1, table.map(|p| &p.y))?;
    Ok(Point::new(x, y))
}

/// `s·p`, MSB-first double-and-add over the bits of `s`.
///
/// The decomposition spans `F::MODULUS_BIT_SIZE` bits without a canonicity check, so a prover
/// may supply the bits of `s + p` instead of `s` when that sum still fits. Both patterns
/// describe the same field element but not the same multiple of a point whose order does not
/// divide `p`.
pub fn scalar_mul<F: PrimeField, A: Api<F>>(
    api: &mut A,
    params: &EdwardsParams,
    p: &Point<A::Var>,
    s: &A::Var,
) -> Result<Point<A::Var>, CircuitError> {
    let bits = api.to_binary(s, F::MODULUS_BIT_SIZE as usize)?;
    let mut acc = identity(api);
    for bit in bits.iter().rev() {
        acc = double(api, params, &acc)?;
        let with_p = add(api, params, &acc, p)?;
        acc = Point::new(
            api.select(bit, &with_p.x, &acc.x)?,
            api.select(bit, &with_p.y, &acc.y)?,
        );
    }
    Ok(acc)
}

/// `s₁·p₁ + s₂·p₂` with one shared doubling chain and a four-entry table. The scalars are
/// decomposed like in [`scalar_mul`], non-canonical bit patterns included.
pub fn double_base_scalar_mul<F: PrimeField, A: Api<F>>(
    api: &mut A,
    params: &EdwardsParams,
    p1: &Point<A::Var>,
    s1: &A::Var,
    p2: &Point<A::Var>,
    s2: &A::Var,
) -> Result<Point<A::Var>, CircuitError> {
    let nb_bits = F::MODULUS_BIT_SIZE as usize;
    let bits1 = api.to_binary(s1, nb_bits)?;
    let bits2 = api.to_binary(s2, nb_bits)?;

    let zero = identity(api);
    let sum = add(api, params, p1, p2)?;
    let table = [&zero, p1, p2, &sum];

    let mut acc = identity(api);
    for (b1, b2) in bits1.iter().zip(&bits2).rev() {
        acc = double(api, params, &acc)?;
        let t = lookup2(api, b1, b2, table)?;
        acc = add(api, params, &acc, &t)?;
    }
    Ok(acc)
}

/// Multiplies `p` by the cofactor, which must be 4 or 8.
///
/// # Panics
/// Panics for any other cofactor.
pub fn clear_cofactor<F: PrimeField, A: Api<F>>(
    api: &mut A,
    params: &EdwardsParams,
    p: &Point<A::Var>,
) -> Result<Point<A::Var>, CircuitError> {
    let doublings = match params.cofactor {
        4 => 2,
        8 => 3,
        other => panic!("unsupported cofactor {other}: only 4 and 8 can be cleared"),
    };
    let mut acc = p.clone();
    for _ in 0..doublings {
        acc = double(api, params, &acc)?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_377::Fr;
    use ark_ec::CurveGroup;
    use ark_ed_on_bls12_377::{EdwardsAffine, EdwardsConfig, Fr as Scalar};
    use kestrel_core::constraint::{ConstraintSystem, SolveError};
    use kestrel_core::frontend::{Assignment, Circuit};
    use kestrel_core::hint::builtin::N_BITS;
    use kestrel_core::hint::HintError;
    use kestrel_core::test_engine::engine::{evaluate, InputMode};
    use kestrel_core::witness::Witness;
    use kestrel_core::{SolverConfig, SolverOption};

    /// Checks `p + q`, `2·p`, `s·p` and `s·p + t·q` against public expectations.
    struct Arithmetic {
        params: EdwardsParams,
    }

    fn input_point<F: PrimeField, A: Api<F>>(
        api: &mut A,
        name: &str,
        public: bool,
    ) -> Result<Point<A::Var>, CircuitError> {
        let (x, y) = (format!("{name}_x"), format!("{name}_y"));
        Ok(if public {
            Point::new(api.public_input(&x)?, api.public_input(&y)?)
        } else {
            Point::new(api.secret_input(&x)?, api.secret_input(&y)?)
        })
    }

    impl Circuit for Arithmetic {
        fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
            let params = &self.params;
            let p = input_point(api, "p", false)?;
            let q = input_point(api, "q", false)?;
            let s = api.secret_input("s")?;
            let t = api.secret_input("t")?;
            let sum = input_point(api, "sum", true)?;
            let dbl = input_point(api, "dbl", true)?;
            let sp = input_point(api, "sp", true)?;
            let combined = input_point(api, "combined", true)?;

            assert_on_curve(api, params, &p)?;
            let got = add(api, params, &p, &q)?;
            assert_is_equal(api, &got, &sum)?;
            let got = double(api, params, &p)?;
            assert_is_equal(api, &got, &dbl)?;
            let got = scalar_mul(api, params, &p, &s)?;
            assert_is_equal(api, &got, &sp)?;
            let got = double_base_scalar_mul(api, params, &p, &s, &q, &t)?;
            assert_is_equal(api, &got, &combined)
        }
    }

    fn with_point(assignment: Assignment, name: &str, p: &EdwardsAffine) -> Assignment {
        let c = coordinates(p);
        assignment
            .with(format!("{name}_x"), c.x)
            .with(format!("{name}_y"), c.y)
    }

    fn arithmetic_assignment(s: u64, t: u64, tamper: bool) -> Assignment {
        let g = EdwardsConfig::GENERATOR;
        let p = (g * Scalar::from(5u64)).into_affine();
        let q = (g * Scalar::from(11u64)).into_affine();
        let sum = (p + q).into_affine();
        let dbl = (p + p).into_affine();
        let sp = (p * Scalar::from(s)).into_affine();
        let mut combined = p * Scalar::from(s) + q * Scalar::from(t);
        if tamper {
            combined += g;
        }

        let assignment = Assignment::new().with("s", s).with("t", t);
        let assignment = with_point(assignment, "p", &p);
        let assignment = with_point(assignment, "q", &q);
        let assignment = with_point(assignment, "sum", &sum);
        let assignment = with_point(assignment, "dbl", &dbl);
        let assignment = with_point(assignment, "sp", &sp);
        with_point(assignment, "combined", &combined.into_affine())
    }

    #[test]
    fn parameters_come_from_the_curve_config() {
        let params = EdwardsParams::from_config::<EdwardsConfig>();
        assert_eq!(params.cofactor, 4);
        assert_eq!(params.order, modulus::<Scalar>());
        let babyjubjub = EdwardsParams::from_config::<ark_ed_on_bn254::EdwardsConfig>();
        assert_eq!(babyjubjub.cofactor, 8);
    }

    #[test]
    fn matches_native_arithmetic() {
        let circuit = Arithmetic {
            params: EdwardsParams::from_config::<EdwardsConfig>(),
        };
        let config = SolverConfig::default();
        for mode in [InputMode::Variable, InputMode::Constant] {
            let valid = arithmetic_assignment(1234567, 89, false);
            evaluate::<Fr, _>(&circuit, &valid, &config, mode).unwrap();
            let tampered = arithmetic_assignment(1234567, 89, true);
            assert!(evaluate::<Fr, _>(&circuit, &tampered, &config, mode).is_err());
        }
    }

    /// `cofactor · p == identity` for a secret `p`.
    struct SmallOrder {
        params: EdwardsParams,
    }

    impl Circuit for SmallOrder {
        fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
            let p = input_point(api, "p", false)?;
            assert_on_curve(api, &self.params, &p)?;
            let cleared = clear_cofactor(api, &self.params, &p)?;
            let id = identity(api);
            assert_is_equal(api, &cleared, &id)
        }
    }

    #[test]
    fn cofactor_clearing_kills_small_order_points() {
        let circuit = SmallOrder {
            params: EdwardsParams::from_config::<EdwardsConfig>(),
        };
        let config = SolverConfig::default();
        let mode = InputMode::Variable;
        // (0, −1) has order 2
        let p = Fr::from(-1i64);
        let order_two = Assignment::new()
            .with("p_x", 0)
            .with("p_y", field_to_biguint(&p));
        evaluate::<Fr, _>(&circuit, &order_two, &config, mode).unwrap();

        let g = coordinates(&EdwardsConfig::GENERATOR);
        let generator = Assignment::new().with("p_x", g.x).with("p_y", g.y);
        assert!(evaluate::<Fr, _>(&circuit, &generator, &config, mode).is_err());
    }

    #[test]
    #[should_panic(expected = "unsupported cofactor 2")]
    fn other_cofactors_are_rejected() {
        let mut params = EdwardsParams::from_config::<EdwardsConfig>();
        params.cofactor = 2;
        let _ = kestrel_core::frontend::compile::<Fr, _>(&SmallOrder { params });
    }

    /// `s·G == sp` for a secret `s`.
    struct ScaledBase {
        params: EdwardsParams,
    }

    impl Circuit for ScaledBase {
        fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
            let s = api.secret_input("s")?;
            let sp = input_point(api, "sp", true)?;
            let g = base(api, &self.params);
            let got = scalar_mul(api, &self.params, &g, &s)?;
            assert_is_equal(api, &got, &sp)
        }
    }

    /// Bits of `a + p` rather than `a`.
    fn shifted_bits(
        modulus: &BigUint,
        inputs: &[BigUint],
        outputs: &mut [BigUint],
    ) -> Result<(), HintError> {
        let shifted = &inputs[0] + modulus;
        for (i, out) in outputs.iter_mut().enumerate() {
            *out = BigUint::from(shifted.bit(i as u64) as u8);
        }
        Ok(())
    }

    #[test]
    fn non_canonical_scalar_bits_change_the_multiple() {
        let circuit = ScaledBase {
            params: EdwardsParams::from_config::<EdwardsConfig>(),
        };
        let r1cs = kestrel_core::frontend::compile::<Fr, _>(&circuit).unwrap();
        let assignment = Assignment::new().with("s", 0).with("sp_x", 0).with("sp_y", 1);
        let witness = Witness::from_assignment(r1cs.schema(), &assignment).unwrap();
        r1cs.is_solved(&witness, &SolverConfig::default()).unwrap();

        // p still fits in MODULUS_BIT_SIZE bits and recomposes to 0, but p·G is not the identity
        let config = SolverConfig::new([SolverOption::OverrideHint(N_BITS, shifted_bits)]);
        let err = r1cs.is_solved(&witness, &config).unwrap_err();
        assert!(matches!(err, SolveError::Unsatisfied { .. }), "{err}");
    }
}
