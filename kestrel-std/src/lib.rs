//! Standard gadgets for kestrel circuits.
//!
//! Gadgets are free functions over any [`kestrel_core::Api`], so they compile to constraints and
//! run under the reference evaluator alike. Those that rely on the hints in [`hints`] register
//! them on first use; call [`register_hints`] before building a
//! [`kestrel_core::SolverConfig`] if a circuit is solved in a process that has not described it
//! yet.

pub mod bits;
pub mod eddsa;
pub mod hints;
pub mod mimc;
pub mod rangecheck;
pub mod twistededwards;

use std::sync::Once;

use kestrel_core::hint::register_hint;

static REGISTER: Once = Once::new();

/// Adds the hints of this crate to the process-wide registry. Idempotent.
pub fn register_hints() {
    REGISTER.call_once(|| {
        for hint in hints::std_hints() {
            register_hint(hint);
        }
        tracing::debug!("registered standard gadget hints");
    });
}
