use ark_ec::pairing::Pairing;
use ark_ff::{batch_inversion, Field, Zero};
use ark_poly::EvaluationDomain;

use super::kzg::verify_pair;
use super::{evaluation_domain, new_transcript, PlonkError, Proof, VerifyingKey};

#[tracing::instrument(skip_all, name = "plonk::verify")]
pub fn verify<E: Pairing>(
    vk: &VerifyingKey<E>,
    proof: &Proof<E>,
    public: &[E::ScalarField],
) -> Result<(), PlonkError> {
    if public.len() != vk.nb_public_witness() {
        return Err(PlonkError::PublicInputCount {
            expected: vk.nb_public_witness(),
            actual: public.len(),
        });
    }
    let n = vk.domain_size as usize;
    let domain = evaluation_domain::<E::ScalarField>(n)?;
    let one = E::ScalarField::ONE;

    let mut transcript = new_transcript(vk, public);
    transcript.append_serializable(b"wires", &proof.wires);
    let beta: E::ScalarField = transcript.challenge_scalar(b"beta");
    let gamma: E::ScalarField = transcript.challenge_scalar(b"gamma");
    transcript.append_serializable(b"z", &proof.z);
    let alpha: E::ScalarField = transcript.challenge_scalar(b"alpha");
    transcript.append_serializable(b"t", &proof.t);
    let zeta: E::ScalarField = transcript.challenge_scalar(b"zeta");
    transcript.append_serializable(b"evals", &proof.evals);
    transcript.append_field(b"z_omega", &proof.z_omega);
    let v: E::ScalarField = transcript.challenge_scalar(b"v");
    transcript.append_serializable(b"w", &[proof.w_zeta, proof.w_zeta_omega]);
    let u: E::ScalarField = transcript.challenge_scalar(b"u");

    let zeta_n = zeta.pow([n as u64]);
    let vanishing = zeta_n - one;
    if vanishing.is_zero() {
        return Err(PlonkError::IdentityFailed);
    }

    // Lᵢ(ζ) = ωⁱ·(ζⁿ - 1) / (n·(ζ - ωⁱ)) for the first max(1, nb_public) rows
    let omega = domain.group_gen();
    let nb_lagrange = public.len().max(1);
    let mut omegas = Vec::with_capacity(nb_lagrange);
    let mut acc = one;
    for _ in 0..nb_lagrange {
        omegas.push(acc);
        acc *= omega;
    }
    let mut denominators: Vec<E::ScalarField> = omegas
        .iter()
        .map(|w| E::ScalarField::from(n as u64) * (zeta - w))
        .collect();
    batch_inversion(&mut denominators);
    let lagrange: Vec<E::ScalarField> = omegas
        .iter()
        .zip(&denominators)
        .map(|(w, d)| *w * vanishing * d)
        .collect();
    let pi: E::ScalarField = public
        .iter()
        .zip(&lagrange)
        .map(|(x, l)| -*x * l)
        .sum();

    let e = &proof.evals;
    let (k1, k2) = (vk.k1, vk.k2);
    let gate = e.ql * e.a + e.qr * e.b + e.qo * e.c + e.qm * e.a * e.b + e.qc + pi;
    let perm_id = e.z
        * (e.a + beta * zeta + gamma)
        * (e.b + beta * k1 * zeta + gamma)
        * (e.c + beta * k2 * zeta + gamma);
    let perm_sigma = proof.z_omega
        * (e.a + beta * e.s1 + gamma)
        * (e.b + beta * e.s2 + gamma)
        * (e.c + beta * e.s3 + gamma);
    let boundary = lagrange[0] * (e.z - one);
    let t = e.t_lo + zeta_n * e.t_mid + zeta_n.square() * e.t_hi;
    if gate + alpha * (perm_id - perm_sigma) + alpha.square() * boundary != t * vanishing {
        tracing::debug!("plonk quotient identity failed");
        return Err(PlonkError::IdentityFailed);
    }

    let commitments = proof
        .wires
        .iter()
        .chain([&proof.z])
        .chain(&proof.t)
        .chain(&vk.selectors)
        .chain(&vk.sigmas);
    let mut combined = E::G1::zero();
    let mut combined_eval = E::ScalarField::zero();
    let mut power = one;
    for (commitment, eval) in commitments.zip(e.to_vec()) {
        combined += *commitment * power;
        combined_eval += power * eval;
        power *= v;
    }

    let ok = verify_pair(
        &vk.kzg,
        combined,
        combined_eval,
        zeta,
        proof.w_zeta,
        proof.z.into(),
        proof.z_omega,
        zeta * omega,
        proof.w_zeta_omega,
        u,
    );
    if !ok {
        return Err(PlonkError::OpeningFailed);
    }
    Ok(())
}
