//! Hints: out-of-band computation of auxiliary witness values.
//!
//! A hint receives the field modulus and the canonical integer values of its inputs and fills
//! its outputs. Nothing a hint returns is trusted: every circuit that declares a hint must also
//! constrain the outputs, so a wrong hint can only make solving fail.
//!
//! Hints are looked up by [`HintId`], a stable hash of the hint's name. The process-wide
//! registry is populated once (see [`builtin::register_builtin_hints`]) and then only read;
//! per-solve additions and overrides go through [`crate::solver::SolverConfig`].

pub mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use num_bigint::BigUint;
use once_cell::sync::Lazy;

/// Signature of every hint: `(modulus, inputs, outputs)`.
pub type HintFn = fn(&BigUint, &[BigUint], &mut [BigUint]) -> Result<(), HintError>;

/// Errors reported by hint functions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HintError {
    /// Wrong number of inputs
    #[error("expected {expected} inputs, got {actual}")]
    InputCount { expected: usize, actual: usize },

    /// Wrong number of outputs for the given inputs
    #[error("expected {expected} outputs, got {actual}")]
    OutputCount { expected: usize, actual: usize },

    /// Division or inversion of zero
    #[error("division by zero")]
    DivisionByZero,

    /// An input does not satisfy the hint's precondition
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Stable identifier of a hint (32-bit FNV-1a of its name).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    CanonicalSerialize,
    CanonicalDeserialize,
)]
pub struct HintId(pub u32);

impl HintId {
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u32 = 0x811c_9dc5;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(0x0100_0193);
            i += 1;
        }
        HintId(hash)
    }
}

impl fmt::Display for HintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A hint function together with its name and derived identifier.
#[derive(Clone, Copy, Debug)]
pub struct NamedHint {
    pub id: HintId,
    pub name: &'static str,
    pub func: HintFn,
}

impl NamedHint {
    pub const fn new(name: &'static str, func: HintFn) -> Self {
        Self {
            id: HintId::from_name(name),
            name,
            func,
        }
    }
}

static REGISTRY: Lazy<RwLock<BTreeMap<HintId, NamedHint>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

/// Adds `hint` to the process-wide registry.
///
/// Registering an id that is already present is not an error: the first registration is kept
/// and `false` is returned.
pub fn register_hint(hint: NamedHint) -> bool {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = registry.get(&hint.id) {
        tracing::debug!(
            name = hint.name,
            existing = existing.name,
            id = %hint.id,
            "hint already registered"
        );
        return false;
    }
    registry.insert(hint.id, hint);
    true
}

/// Replaces (or inserts) a registry entry. Intended for tests that need to corrupt a hint
/// globally; solver-level overrides should use [`crate::solver::SolverOption::OverrideHint`].
pub fn replace_registered_hint(hint: NamedHint) -> Option<NamedHint> {
    REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(hint.id, hint)
}

pub fn registered_hint(id: HintId) -> Option<NamedHint> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied()
}

/// Snapshot of the registry, ordered by id.
pub fn registered_hints() -> Vec<NamedHint> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .copied()
        .collect()
}

/// Checks the input and output arity of a hint invocation.
pub fn check_arity(
    inputs: &[BigUint],
    outputs: &[BigUint],
    nb_inputs: usize,
    nb_outputs: usize,
) -> Result<(), HintError> {
    if inputs.len() != nb_inputs {
        return Err(HintError::InputCount {
            expected: nb_inputs,
            actual: inputs.len(),
        });
    }
    if outputs.len() != nb_outputs {
        return Err(HintError::OutputCount {
            expected: nb_outputs,
            actual: outputs.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn zero_hint(_: &BigUint, _: &[BigUint], outputs: &mut [BigUint]) -> Result<(), HintError> {
        outputs.iter_mut().for_each(|o| *o = BigUint::default());
        Ok(())
    }

    fn one_hint(_: &BigUint, _: &[BigUint], outputs: &mut [BigUint]) -> Result<(), HintError> {
        outputs.iter_mut().for_each(|o| *o = BigUint::from(1u32));
        Ok(())
    }

    #[test]
    fn ids_are_stable_and_distinct() {
        assert_eq!(HintId::from_name("n_bits"), HintId::from_name("n_bits"));
        assert_ne!(HintId::from_name("n_bits"), HintId::from_name("n_trits"));
        // FNV-1a reference value for the empty string
        assert_eq!(HintId::from_name(""), HintId(0x811c_9dc5));
    }

    #[test]
    #[serial]
    fn duplicate_registration_keeps_first() {
        let first = NamedHint::new("registry_test_duplicate", zero_hint);
        let second = NamedHint {
            func: one_hint,
            ..first
        };
        register_hint(first);
        assert!(!register_hint(second));

        let stored = registered_hint(first.id).unwrap();
        let mut out = [BigUint::from(7u32)];
        (stored.func)(&BigUint::from(11u32), &[], &mut out).unwrap();
        assert_eq!(out[0], BigUint::default());
        assert!(registered_hints().iter().any(|h| h.id == first.id));
    }
}
