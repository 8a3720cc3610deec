use std::collections::BTreeMap;

use ark_ec::pairing::Pairing;
use ark_ec::AffineRepr;
use ark_ff::{AdditiveGroup, FftField, Field};
use ark_poly::EvaluationDomain;

use super::kzg::{commit, KzgVerifierKey};
use super::{
    coset_shifts, domain_size, evaluation_domain, trace_rows, PlonkError, ProvingKey, VerifyingKey,
};
use crate::constraint::{ConstraintSystem, SparseR1cs, Wire};
use crate::srs::KzgSrs;

/// Preprocesses `cs` into proving and verifying keys using the first `n` powers of `srs`.
#[tracing::instrument(skip_all, name = "plonk::setup")]
pub fn setup<E: Pairing>(
    cs: &SparseR1cs<E::ScalarField>,
    srs: &KzgSrs<E>,
) -> Result<(ProvingKey<E>, VerifyingKey<E>), PlonkError> {
    let n = domain_size(cs);
    if srs.size() < n {
        return Err(PlonkError::SrsTooSmall {
            needed: n,
            available: srs.size(),
        });
    }
    let domain = evaluation_domain::<E::ScalarField>(n)?;
    let nb_public = cs.schema().nb_public();

    let mut selector_evals: [Vec<E::ScalarField>; 5] =
        std::array::from_fn(|_| vec![E::ScalarField::ZERO; n]);
    for row in selector_evals[0].iter_mut().take(nb_public) {
        *row = E::ScalarField::ONE;
    }
    for (i, gate) in cs.gates().iter().enumerate() {
        let row = nb_public + i;
        for (column, q) in [gate.ql, gate.qr, gate.qo, gate.qm, gate.qc].into_iter().enumerate() {
            selector_evals[column][row] = q;
        }
    }
    let sigma_evals = permutation::<E::ScalarField>(&trace_rows(cs), n, domain.group_gen());

    let selectors = selector_evals.map(|evals| domain.ifft(&evals[..]));
    let sigmas = sigma_evals.clone().map(|evals| domain.ifft(&evals[..]));

    let powers = srs.g1_powers[..n].to_vec();
    let mut selector_commitments = [E::G1Affine::zero(); 5];
    for (commitment, poly) in selector_commitments.iter_mut().zip(&selectors) {
        *commitment = commit::<E>(&powers, poly)?;
    }
    let mut sigma_commitments = [E::G1Affine::zero(); 3];
    for (commitment, poly) in sigma_commitments.iter_mut().zip(&sigmas) {
        *commitment = commit::<E>(&powers, poly)?;
    }

    let (k1, k2) = coset_shifts();
    let vk = VerifyingKey {
        domain_size: n as u64,
        nb_public: nb_public as u64,
        k1,
        k2,
        selectors: selector_commitments,
        sigmas: sigma_commitments,
        kzg: KzgVerifierKey::from(srs),
    };
    let pk = ProvingKey {
        vk: vk.clone(),
        selectors,
        sigmas,
        sigma_evals,
        powers,
    };
    tracing::info!(domain_size = n, nb_gates = cs.gates().len(), "plonk setup done");
    Ok((pk, vk))
}

/// Evaluations of `S₁, S₂, S₃` over the trace domain. Slot `(column, row)` has identity
/// `k_column·ωʳᵒʷ`; the slots of each wire are linked into one cycle and empty slots map to
/// themselves.
fn permutation<F: FftField>(rows: &[[Option<Wire>; 3]], n: usize, omega: F) -> [Vec<F>; 3] {
    let mut cycles: BTreeMap<Wire, Vec<usize>> = BTreeMap::new();
    for (row, wires) in rows.iter().enumerate() {
        for (column, wire) in wires.iter().enumerate() {
            if let Some(wire) = wire {
                cycles.entry(*wire).or_default().push(column * n + row);
            }
        }
    }
    let mut sigma: Vec<usize> = (0..3 * n).collect();
    for slots in cycles.values() {
        for (i, slot) in slots.iter().enumerate() {
            sigma[*slot] = slots[(i + 1) % slots.len()];
        }
    }

    let mut omegas = Vec::with_capacity(n);
    let mut acc = F::ONE;
    for _ in 0..n {
        omegas.push(acc);
        acc *= omega;
    }
    let (k1, k2) = coset_shifts::<F>();
    let shifts = [F::ONE, k1, k2];
    std::array::from_fn(|column| {
        (0..n)
            .map(|row| {
                let target = sigma[column * n + row];
                shifts[target / n] * omegas[target % n]
            })
            .collect()
    })
}
