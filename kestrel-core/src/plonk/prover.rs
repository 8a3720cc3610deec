use ark_ec::pairing::Pairing;
use ark_ec::AffineRepr;
use ark_ff::{batch_inversion, AdditiveGroup, FftField, Field};
use ark_poly::EvaluationDomain;
use ark_std::rand::RngCore;
use rayon::prelude::*;

use super::kzg::{commit, evaluate, open_batch};
use super::{
    coset_fft, coset_ifft, domain_size, evaluation_domain, new_transcript, public_input_poly,
    trace_rows, Evaluations, PlonkError, Proof, ProvingKey,
};
use crate::constraint::{ConstraintSystem, Solution, SparseR1cs};
use crate::solver::SolverConfig;
use crate::witness::Witness;

/// Solves `cs` against `witness` and proves the resulting assignment.
#[tracing::instrument(skip_all, name = "plonk::prove")]
pub fn prove<E: Pairing>(
    cs: &SparseR1cs<E::ScalarField>,
    pk: &ProvingKey<E>,
    witness: &Witness<E::ScalarField>,
    config: &SolverConfig,
) -> Result<Proof<E>, PlonkError> {
    let solution = cs.solve(witness, config)?;
    prove_solution(cs, pk, &solution)
}

/// Proves whatever assignment [`ConstraintSystem::solve_unchecked`] produces. The proof is
/// well-formed but does not verify unless the witness happens to be valid; use it to measure
/// prover cost only.
#[tracing::instrument(skip_all, name = "plonk::prove_unchecked")]
pub fn prove_unchecked<E: Pairing>(
    cs: &SparseR1cs<E::ScalarField>,
    pk: &ProvingKey<E>,
    witness: &Witness<E::ScalarField>,
    config: &SolverConfig,
    rng: &mut dyn RngCore,
) -> Result<Proof<E>, PlonkError> {
    let solution = cs.solve_unchecked(witness, config, rng)?;
    prove_solution(cs, pk, &solution)
}

fn prove_solution<E: Pairing>(
    cs: &SparseR1cs<E::ScalarField>,
    pk: &ProvingKey<E>,
    solution: &Solution<E::ScalarField>,
) -> Result<Proof<E>, PlonkError> {
    let n = pk.vk.domain_size as usize;
    if domain_size(cs) != n || cs.schema().nb_public() != pk.vk.nb_public_witness() {
        return Err(PlonkError::KeyMismatch);
    }
    let domain = evaluation_domain::<E::ScalarField>(n)?;
    let big = evaluation_domain::<E::ScalarField>(4 * n)?;
    let powers = &pk.powers;
    let one = E::ScalarField::ONE;

    // round 1: wire polynomials
    let mut wire_evals: [Vec<E::ScalarField>; 3] =
        std::array::from_fn(|_| vec![E::ScalarField::ZERO; n]);
    for (row, wires) in trace_rows(cs).iter().enumerate() {
        for (column, wire) in wires.iter().enumerate() {
            if let Some(wire) = wire {
                wire_evals[column][row] = solution.value(*wire);
            }
        }
    }
    let wire_polys = wire_evals.clone().map(|evals| domain.ifft(&evals[..]));
    let mut wire_commitments = [E::G1Affine::zero(); 3];
    for (commitment, poly) in wire_commitments.iter_mut().zip(&wire_polys) {
        *commitment = commit::<E>(powers, poly)?;
    }

    let public = &solution.public;
    let mut transcript = new_transcript(&pk.vk, public);
    transcript.append_serializable(b"wires", &wire_commitments);
    let beta: E::ScalarField = transcript.challenge_scalar(b"beta");
    let gamma: E::ScalarField = transcript.challenge_scalar(b"gamma");

    // round 2: permutation accumulator
    let (k1, k2) = (pk.vk.k1, pk.vk.k2);
    let omega = domain.group_gen();
    let [a, b, c] = &wire_evals;
    let [s1, s2, s3] = &pk.sigma_evals;
    let mut numerators = Vec::with_capacity(n);
    let mut denominators = Vec::with_capacity(n);
    let mut x = one;
    for i in 0..n {
        numerators.push(
            (a[i] + beta * x + gamma) * (b[i] + beta * k1 * x + gamma) * (c[i] + beta * k2 * x + gamma),
        );
        denominators.push(
            (a[i] + beta * s1[i] + gamma) * (b[i] + beta * s2[i] + gamma) * (c[i] + beta * s3[i] + gamma),
        );
        x *= omega;
    }
    batch_inversion(&mut denominators);
    let mut z_evals = Vec::with_capacity(n);
    let mut acc = one;
    for (num, den_inv) in numerators.iter().zip(&denominators) {
        z_evals.push(acc);
        acc *= *num * den_inv;
    }
    let z_poly = domain.ifft(&z_evals);
    let z_commitment = commit::<E>(powers, &z_poly)?;
    transcript.append_serializable(b"z", &z_commitment);
    let alpha: E::ScalarField = transcript.challenge_scalar(b"alpha");

    // round 3: quotient over the coset g·D₄ₙ
    let m = 4 * n;
    let on_coset = |poly: &[E::ScalarField]| coset_fft(&big, poly);
    let [a_c, b_c, c_c] = wire_polys.each_ref().map(|p| on_coset(p));
    let [ql, qr, qo, qm, qc] = pk.selectors.each_ref().map(|p| on_coset(p));
    let [s1_c, s2_c, s3_c] = pk.sigmas.each_ref().map(|p| on_coset(p));
    let pi_c = on_coset(&public_input_poly(&domain, public));
    let z_c = on_coset(&z_poly);
    let mut l1_evals = vec![E::ScalarField::ZERO; n];
    l1_evals[0] = one;
    let l1_c = on_coset(&domain.ifft(&l1_evals));

    let g = E::ScalarField::GENERATOR;
    let omega_big = big.group_gen();
    let mut xs = Vec::with_capacity(m);
    let mut x = g;
    for _ in 0..m {
        xs.push(x);
        x *= omega_big;
    }
    // Xⁿ - 1 takes four values on the coset
    let gn = g.pow([n as u64]);
    let root4 = omega_big.pow([n as u64]);
    let mut vanishing_inv: Vec<E::ScalarField> =
        (0..4u64).map(|i| gn * root4.pow([i]) - one).collect();
    batch_inversion(&mut vanishing_inv);

    let alpha_sq = alpha.square();
    let t_evals: Vec<E::ScalarField> = (0..m)
        .into_par_iter()
        .map(|i| {
            let x = xs[i];
            let gate = ql[i] * a_c[i] + qr[i] * b_c[i] + qo[i] * c_c[i] + qm[i] * a_c[i] * b_c[i]
                + qc[i]
                + pi_c[i];
            let perm_id = z_c[i]
                * (a_c[i] + beta * x + gamma)
                * (b_c[i] + beta * k1 * x + gamma)
                * (c_c[i] + beta * k2 * x + gamma);
            let perm_sigma = z_c[(i + 4) % m]
                * (a_c[i] + beta * s1_c[i] + gamma)
                * (b_c[i] + beta * s2_c[i] + gamma)
                * (c_c[i] + beta * s3_c[i] + gamma);
            let boundary = l1_c[i] * (z_c[i] - one);
            (gate + alpha * (perm_id - perm_sigma) + alpha_sq * boundary) * vanishing_inv[i % 4]
        })
        .collect();
    let t_poly = coset_ifft(&big, &t_evals);
    let t_parts: [Vec<E::ScalarField>; 3] = std::array::from_fn(|k| t_poly[k * n..(k + 1) * n].to_vec());
    let mut t_commitments = [E::G1Affine::zero(); 3];
    for (commitment, poly) in t_commitments.iter_mut().zip(&t_parts) {
        *commitment = commit::<E>(powers, poly)?;
    }
    transcript.append_serializable(b"t", &t_commitments);
    let zeta: E::ScalarField = transcript.challenge_scalar(b"zeta");

    // round 4: openings
    let [a_p, b_p, c_p] = &wire_polys;
    let [t_lo, t_mid, t_hi] = &t_parts;
    let [ql_p, qr_p, qo_p, qm_p, qc_p] = &pk.selectors;
    let [s1_p, s2_p, s3_p] = &pk.sigmas;
    let polys: [&[E::ScalarField]; 15] = [
        a_p, b_p, c_p, &z_poly, t_lo, t_mid, t_hi, ql_p, qr_p, qo_p, qm_p, qc_p, s1_p, s2_p, s3_p,
    ];
    let at = |p: &[E::ScalarField]| evaluate(p, zeta);
    let evals = Evaluations {
        a: at(a_p),
        b: at(b_p),
        c: at(c_p),
        z: at(&z_poly),
        t_lo: at(t_lo),
        t_mid: at(t_mid),
        t_hi: at(t_hi),
        ql: at(ql_p),
        qr: at(qr_p),
        qo: at(qo_p),
        qm: at(qm_p),
        qc: at(qc_p),
        s1: at(s1_p),
        s2: at(s2_p),
        s3: at(s3_p),
    };
    let zeta_omega = zeta * omega;
    let z_omega = evaluate(&z_poly, zeta_omega);
    transcript.append_serializable(b"evals", &evals);
    transcript.append_field(b"z_omega", &z_omega);
    let v: E::ScalarField = transcript.challenge_scalar(b"v");

    let w_zeta = open_batch::<E>(powers, &polys, zeta, v)?;
    let w_zeta_omega = open_batch::<E>(powers, &[z_poly.as_slice()], zeta_omega, v)?;

    Ok(Proof {
        wires: wire_commitments,
        z: z_commitment,
        t: t_commitments,
        evals,
        z_omega,
        w_zeta,
        w_zeta_omega,
    })
}
