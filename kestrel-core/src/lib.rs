//! Circuit compilation, hint-driven witness solving and Groth16/PLONK proving over several
//! pairing-friendly curves.
//!
//! A [`frontend::Circuit`] is compiled into a constraint system for a (curve, backend) pair,
//! solved against a [`witness::Witness`] (hints fill the values constraints cannot solve for)
//! and proved through the [`backend`] dispatch layer. [`test_engine`] checks circuits against an
//! independent reference evaluator.

pub mod backend;
pub mod constraint;
pub mod curve;
pub mod frontend;
pub mod groth16;
pub mod hint;
pub mod plonk;
pub mod solver;
pub mod srs;
pub mod test_engine;
pub mod transcript;
pub mod utils;
pub mod witness;

pub use backend::{
    compile, prove, prove_unchecked, setup, setup_with_srs, verify, BackendError, CompiledSystem,
    CurveWitness, Proof, ProverOptions, ProvingKey, VerifyingKey,
};
pub use curve::{BackendId, CurveId};
pub use frontend::{Api, Assignment, Circuit, CircuitError};
pub use solver::{SolverConfig, SolverOption};
