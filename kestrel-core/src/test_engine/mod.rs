//! Consistency checks for circuits: the compiled and solved path, the proving backends and an
//! independent reference evaluator must all agree.
//!
//! ```ignore
//! let assert = Assert::new();
//! assert.prover_succeeded(&circuit, &valid);
//! assert.prover_failed(&circuit, &invalid);
//! ```
//!
//! Compiled systems are memoized per `(curve, backend, circuit type, circuit address)`. The
//! cache belongs to the [`Assert`] value and is guarded by a mutex, so one `Assert` can be
//! shared between threads. Two different circuit values of the same type that happen to live
//! at the same address share an entry; keep such values alive for the duration of the checks.

pub mod engine;
pub mod fuzz;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::backend::{self, BackendError, CompiledSystem, CurveWitness, ProverOptions};
use crate::curve::{BackendId, CurveId};
use crate::frontend::{Assignment, Circuit, CircuitError, Schema};
use crate::solver::{SolverConfig, SolverOption};
use crate::witness::WitnessError;
use engine::{evaluate, InputMode};

/// When set, [`Assert::new`] only checks BN254.
pub const SHORT_ENV: &str = "KESTREL_TEST_SHORT";

pub const DEFAULT_FUZZ_SAMPLES: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum AssertError {
    #[error("compiling for {curve}: {source}")]
    Compile {
        curve: CurveId,
        #[source]
        source: CircuitError,
    },

    /// Two compilations of the same circuit differ
    #[error("compiling twice for {backend}/{curve} produced different constraint systems")]
    NonDeterministicCompilation { curve: CurveId, backend: BackendId },

    #[error("reference evaluator rejected a valid witness on {curve}: {source}")]
    ReferenceRejected {
        curve: CurveId,
        #[source]
        source: CircuitError,
    },

    #[error("reference evaluator accepted an invalid witness on {curve}")]
    ReferenceAccepted { curve: CurveId },

    #[error("{stage} failed for {backend}/{curve}: {source}")]
    Backend {
        curve: CurveId,
        backend: BackendId,
        stage: &'static str,
        #[source]
        source: BackendError,
    },

    #[error("{stage} succeeded for {backend}/{curve} on an invalid witness")]
    UnexpectedSuccess {
        curve: CurveId,
        backend: BackendId,
        stage: &'static str,
    },

    #[error("{encoding} round trip changed the witness on {curve}")]
    RoundTrip {
        curve: CurveId,
        encoding: &'static str,
    },

    /// A generated witness got a different verdict from `other` than from variable-mode
    /// reference evaluation
    #[error("reference evaluation and {other} disagree on {curve}: reference {reference}, {other} {verdict}, witness {witness}")]
    FuzzMismatch {
        curve: CurveId,
        reference: String,
        other: String,
        verdict: String,
        witness: String,
    },

    #[error(transparent)]
    Witness(#[from] WitnessError),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    curve: CurveId,
    backend: BackendId,
    circuit: &'static str,
    address: usize,
}

/// Circuit checker over a set of curves and backends.
#[derive(Debug)]
pub struct Assert {
    curves: Vec<CurveId>,
    backends: Vec<BackendId>,
    fuzz_samples: Option<usize>,
    witness_serialization: bool,
    prover_checks: bool,
    solver_options: Vec<SolverOption>,
    cache: Mutex<HashMap<CacheKey, Arc<CompiledSystem>>>,
}

impl Default for Assert {
    fn default() -> Self {
        Self::new()
    }
}

impl Assert {
    /// Every pairing-friendly curve (BN254 only in short mode), both backends, fuzzing and
    /// witness serialization checks enabled.
    pub fn new() -> Self {
        let curves = if std::env::var_os(SHORT_ENV).is_some() {
            vec![CurveId::Bn254]
        } else {
            vec![CurveId::Bn254, CurveId::Bls12_381, CurveId::Bls12_377]
        };
        Self {
            curves,
            backends: vec![BackendId::Groth16, BackendId::Plonk],
            fuzz_samples: Some(DEFAULT_FUZZ_SAMPLES),
            witness_serialization: true,
            prover_checks: true,
            solver_options: Vec::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Curves without a pairing are only solved, never set up or proved.
    pub fn with_curves(mut self, curves: impl IntoIterator<Item = CurveId>) -> Self {
        self.curves = curves.into_iter().collect();
        self
    }

    pub fn with_backends(mut self, backends: impl IntoIterator<Item = BackendId>) -> Self {
        self.backends = backends.into_iter().collect();
        self
    }

    pub fn with_fuzz_count(mut self, samples: usize) -> Self {
        self.fuzz_samples = Some(samples);
        self
    }

    pub fn no_fuzzing(mut self) -> Self {
        self.fuzz_samples = None;
        self
    }

    pub fn with_witness_serialization(mut self, enabled: bool) -> Self {
        self.witness_serialization = enabled;
        self
    }

    pub fn with_solver_options(mut self, options: impl IntoIterator<Item = SolverOption>) -> Self {
        self.solver_options.extend(options);
        self
    }

    /// Stops after solving: no setup, proving or verification.
    pub fn no_prover_checks(mut self) -> Self {
        self.prover_checks = false;
        self
    }

    pub fn curves(&self) -> &[CurveId] {
        &self.curves
    }

    fn solver_config(&self) -> SolverConfig {
        SolverConfig::new(self.solver_options.iter().cloned())
    }

    fn prover_options(&self) -> ProverOptions {
        ProverOptions {
            solver: self.solver_options.clone(),
        }
    }

    /// The compiled system for `(curve, backend, circuit)`, compiling (twice, to check
    /// determinism) on first use.
    pub fn compiled<C: Circuit>(
        &self,
        curve: CurveId,
        backend: BackendId,
        circuit: &C,
    ) -> Result<Arc<CompiledSystem>, AssertError> {
        let key = CacheKey {
            curve,
            backend,
            circuit: std::any::type_name::<C>(),
            address: circuit as *const C as usize,
        };
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ccs) = cache.get(&key) {
            return Ok(Arc::clone(ccs));
        }
        let ccs = Arc::new(compile_deterministic(curve, backend, circuit)?);
        cache.insert(key, Arc::clone(&ccs));
        Ok(ccs)
    }

    #[tracing::instrument(skip_all, name = "Assert::prover_succeeded", fields(circuit = std::any::type_name::<C>()))]
    pub fn check_prover_succeeded<C: Circuit>(
        &self,
        circuit: &C,
        assignment: &Assignment,
    ) -> Result<(), AssertError> {
        self.check_succeeded(circuit, assignment, self.prover_checks)
    }

    #[tracing::instrument(skip_all, name = "Assert::solving_succeeded", fields(circuit = std::any::type_name::<C>()))]
    pub fn check_solving_succeeded<C: Circuit>(
        &self,
        circuit: &C,
        assignment: &Assignment,
    ) -> Result<(), AssertError> {
        self.check_succeeded(circuit, assignment, false)
    }

    #[tracing::instrument(skip_all, name = "Assert::prover_failed", fields(circuit = std::any::type_name::<C>()))]
    pub fn check_prover_failed<C: Circuit>(
        &self,
        circuit: &C,
        assignment: &Assignment,
    ) -> Result<(), AssertError> {
        self.check_failed(circuit, assignment, self.prover_checks)
    }

    #[tracing::instrument(skip_all, name = "Assert::solving_failed", fields(circuit = std::any::type_name::<C>()))]
    pub fn check_solving_failed<C: Circuit>(
        &self,
        circuit: &C,
        assignment: &Assignment,
    ) -> Result<(), AssertError> {
        self.check_failed(circuit, assignment, false)
    }

    /// Agreement of constant evaluation, variable evaluation and solving with every configured
    /// backend on `samples` generated witnesses, per configured curve.
    pub fn check_fuzz<C: Circuit>(&self, circuit: &C, samples: usize) -> Result<(), AssertError> {
        let config = self.solver_config();
        for &curve in &self.curves {
            self.run_fuzz(curve, circuit, samples, &config)?;
        }
        Ok(())
    }

    fn run_fuzz<C: Circuit>(
        &self,
        curve: CurveId,
        circuit: &C,
        samples: usize,
        config: &SolverConfig,
    ) -> Result<(), AssertError> {
        let systems = self
            .backends
            .iter()
            .map(|&backend| self.compiled(curve, backend, circuit))
            .collect::<Result<Vec<_>, _>>()?;
        match curve {
            CurveId::Bn254 => fuzz::fuzz::<ark_bn254::Fr, C>(circuit, samples, config, &systems),
            CurveId::Bls12_381 => {
                fuzz::fuzz::<ark_bls12_381::Fr, C>(circuit, samples, config, &systems)
            }
            CurveId::Bls12_377 => {
                fuzz::fuzz::<ark_bls12_377::Fr, C>(circuit, samples, config, &systems)
            }
            CurveId::Grumpkin => {
                fuzz::fuzz::<ark_grumpkin::Fr, C>(circuit, samples, config, &systems)
            }
        }
    }

    /// Checks that `assignment` is accepted everywhere and, with prover checks, that proofs
    /// verify.
    ///
    /// # Panics
    /// Panics with the failing check.
    #[track_caller]
    pub fn prover_succeeded<C: Circuit>(&self, circuit: &C, assignment: &Assignment) {
        if let Err(err) = self.check_prover_succeeded(circuit, assignment) {
            panic!("prover_succeeded: {err}");
        }
    }

    /// Checks that `assignment` is rejected everywhere.
    ///
    /// # Panics
    /// Panics if anything accepts it.
    #[track_caller]
    pub fn prover_failed<C: Circuit>(&self, circuit: &C, assignment: &Assignment) {
        if let Err(err) = self.check_prover_failed(circuit, assignment) {
            panic!("prover_failed: {err}");
        }
    }

    #[track_caller]
    pub fn solving_succeeded<C: Circuit>(&self, circuit: &C, assignment: &Assignment) {
        if let Err(err) = self.check_solving_succeeded(circuit, assignment) {
            panic!("solving_succeeded: {err}");
        }
    }

    #[track_caller]
    pub fn solving_failed<C: Circuit>(&self, circuit: &C, assignment: &Assignment) {
        if let Err(err) = self.check_solving_failed(circuit, assignment) {
            panic!("solving_failed: {err}");
        }
    }

    #[track_caller]
    pub fn fuzz<C: Circuit>(&self, circuit: &C, samples: usize) {
        if let Err(err) = self.check_fuzz(circuit, samples) {
            panic!("fuzz: {err}");
        }
    }

    fn check_succeeded<C: Circuit>(
        &self,
        circuit: &C,
        assignment: &Assignment,
        prove: bool,
    ) -> Result<(), AssertError> {
        let config = self.solver_config();
        for &curve in &self.curves {
            reference(curve, circuit, assignment, &config)
                .map_err(|source| AssertError::ReferenceRejected { curve, source })?;

            for &backend in &self.backends {
                let ccs = self.compiled(curve, backend, circuit)?;
                let witness = CurveWitness::from_assignment(curve, ccs.schema(), assignment)?;
                if self.witness_serialization {
                    check_round_trip(ccs.schema(), &witness)?;
                }
                if prove && curve.has_pairing() {
                    let (pk, vk) = backend::setup(&ccs).map_err(failed(&ccs, "setup"))?;
                    let proof = backend::prove(&ccs, &pk, &witness, &self.prover_options())
                        .map_err(failed(&ccs, "prove"))?;
                    backend::verify(&proof, &vk, &witness.public_only())
                        .map_err(failed(&ccs, "verify"))?;
                } else {
                    ccs.is_solved(&witness, &config)
                        .map_err(failed(&ccs, "solve"))?;
                }
                tracing::debug!(%curve, %backend, "accepted");
            }

            if let Some(samples) = self.fuzz_samples {
                self.run_fuzz(curve, circuit, samples, &config)?;
            }
        }
        Ok(())
    }

    fn check_failed<C: Circuit>(
        &self,
        circuit: &C,
        assignment: &Assignment,
        prove: bool,
    ) -> Result<(), AssertError> {
        let config = self.solver_config();
        for &curve in &self.curves {
            if reference(curve, circuit, assignment, &config).is_ok() {
                return Err(AssertError::ReferenceAccepted { curve });
            }

            for &backend in &self.backends {
                let ccs = self.compiled(curve, backend, circuit)?;
                let witness = match CurveWitness::from_assignment(curve, ccs.schema(), assignment) {
                    Ok(witness) => witness,
                    Err(err) => {
                        tracing::debug!(%curve, %backend, %err, "witness rejected while encoding");
                        continue;
                    }
                };
                if ccs.is_solved(&witness, &config).is_ok() {
                    return Err(unexpected(&ccs, "solve"));
                }
                if prove && curve.has_pairing() {
                    let (pk, _) = backend::setup(&ccs).map_err(failed(&ccs, "setup"))?;
                    if backend::prove(&ccs, &pk, &witness, &self.prover_options()).is_ok() {
                        return Err(unexpected(&ccs, "prove"));
                    }
                }
                tracing::debug!(%curve, %backend, "rejected");
            }

            if let Some(samples) = self.fuzz_samples {
                self.run_fuzz(curve, circuit, samples, &config)?;
            }
        }
        Ok(())
    }
}

fn failed(ccs: &CompiledSystem, stage: &'static str) -> impl FnOnce(BackendError) -> AssertError {
    let (curve, backend) = (ccs.curve(), ccs.backend());
    move |source| AssertError::Backend {
        curve,
        backend,
        stage,
        source,
    }
}

fn unexpected(ccs: &CompiledSystem, stage: &'static str) -> AssertError {
    AssertError::UnexpectedSuccess {
        curve: ccs.curve(),
        backend: ccs.backend(),
        stage,
    }
}

/// Compiles `circuit` twice and checks both results are identical.
pub fn compile_deterministic<C: Circuit>(
    curve: CurveId,
    backend: BackendId,
    circuit: &C,
) -> Result<CompiledSystem, AssertError> {
    let compile = || {
        backend::compile(curve, backend, circuit)
            .map_err(|source| AssertError::Compile { curve, source })
    };
    let first = compile()?;
    if compile()? != first {
        return Err(AssertError::NonDeterministicCompilation { curve, backend });
    }
    Ok(first)
}

/// Runs the reference evaluator in variable mode over the scalar field of `curve`.
pub fn reference<C: Circuit>(
    curve: CurveId,
    circuit: &C,
    assignment: &Assignment,
    config: &SolverConfig,
) -> Result<(), CircuitError> {
    let mode = InputMode::Variable;
    match curve {
        CurveId::Bn254 => evaluate::<ark_bn254::Fr, C>(circuit, assignment, config, mode),
        CurveId::Bls12_381 => evaluate::<ark_bls12_381::Fr, C>(circuit, assignment, config, mode),
        CurveId::Bls12_377 => evaluate::<ark_bls12_377::Fr, C>(circuit, assignment, config, mode),
        CurveId::Grumpkin => evaluate::<ark_grumpkin::Fr, C>(circuit, assignment, config, mode),
    }
}

/// Binary and JSON round trips of the full and the public witness.
fn check_round_trip(schema: &Schema, witness: &CurveWitness) -> Result<(), AssertError> {
    let curve = witness.curve();
    for w in [witness.clone(), witness.public_only()] {
        let bytes = w.to_bytes()?;
        let (decoded, read) = CurveWitness::read_from(curve, bytes.as_slice())?;
        if decoded != w || read != bytes.len() as u64 {
            return Err(AssertError::RoundTrip {
                curve,
                encoding: "binary",
            });
        }
        let json = w.to_json(schema)?;
        if CurveWitness::from_json(curve, schema, &json)? != w {
            return Err(AssertError::RoundTrip {
                curve,
                encoding: "json",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Api;
    use ark_ff::PrimeField;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// `x` public, `x == 3·y` for a secret `y`.
    struct Triple;

    impl Circuit for Triple {
        fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
            let x = api.public_input("x")?;
            let y = api.secret_input("y")?;
            let three = api.constant(3u64.into());
            let y3 = api.mul(&y, &three);
            api.assert_is_equal(&x, &y3)
        }
    }

    fn solving_only() -> Assert {
        Assert::new()
            .with_curves([CurveId::Bn254, CurveId::Grumpkin])
            .no_prover_checks()
    }

    #[test]
    fn compilation_is_memoized() {
        let assert = solving_only();
        let circuit = Triple;
        let a = assert.compiled(CurveId::Bn254, BackendId::Plonk, &circuit).unwrap();
        let b = assert.compiled(CurveId::Bn254, BackendId::Plonk, &circuit).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let c = assert.compiled(CurveId::Bn254, BackendId::Groth16, &circuit).unwrap();
        assert_eq!(c.backend(), BackendId::Groth16);
    }

    #[test]
    fn solving_checks() {
        let assert = solving_only();
        assert.solving_succeeded(&Triple, &Assignment::new().with("x", 12).with("y", 4));
        assert.solving_failed(&Triple, &Assignment::new().with("x", 12).with("y", 5));
        // a missing value is an invalid witness too
        assert.solving_failed(&Triple, &Assignment::new().with("x", 12));
    }

    #[test]
    fn wrong_verdicts_are_errors() {
        let assert = solving_only();
        let err = assert
            .check_solving_failed(&Triple, &Assignment::new().with("x", 12).with("y", 4))
            .unwrap_err();
        assert!(matches!(err, AssertError::ReferenceAccepted { curve: CurveId::Bn254 }));

        let err = assert
            .check_solving_succeeded(&Triple, &Assignment::new().with("x", 12).with("y", 5))
            .unwrap_err();
        assert!(matches!(err, AssertError::ReferenceRejected { .. }));
    }

    #[test]
    #[should_panic(expected = "solving_succeeded")]
    fn panicking_wrapper() {
        solving_only().solving_succeeded(&Triple, &Assignment::new().with("x", 1).with("y", 1));
    }

    #[test]
    fn deterministic_compilation() {
        for backend in [BackendId::Groth16, BackendId::Plonk] {
            compile_deterministic(CurveId::Bls12_377, backend, &Triple).unwrap();
        }
    }

    /// Adds a constraint on every other compilation.
    struct Flaky(AtomicUsize);

    impl Circuit for Flaky {
        fn define<F: PrimeField, A: Api<F>>(&self, api: &mut A) -> Result<(), CircuitError> {
            let x = api.secret_input("x")?;
            let y = api.public_input("y")?;
            api.assert_is_equal(&x, &y)?;
            if self.0.fetch_add(1, Ordering::Relaxed) % 2 == 1 {
                api.assert_is_equal(&y, &x)?;
            }
            Ok(())
        }
    }

    #[test]
    fn nondeterministic_compilation_is_reported() {
        for backend in [BackendId::Groth16, BackendId::Plonk] {
            let circuit = Flaky(AtomicUsize::new(0));
            let err = compile_deterministic(CurveId::Bn254, backend, &circuit).unwrap_err();
            assert!(matches!(
                err,
                AssertError::NonDeterministicCompilation { curve: CurveId::Bn254, backend: b }
                    if b == backend
            ));

            let err = solving_only()
                .compiled(CurveId::Bn254, backend, &circuit)
                .unwrap_err();
            assert!(matches!(err, AssertError::NonDeterministicCompilation { .. }));
        }
    }
}
