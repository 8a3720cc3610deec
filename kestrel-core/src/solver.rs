//! Per-solve configuration: the hint table and the diagnostics span.

use std::collections::BTreeMap;

use tracing::Span;

use crate::hint::builtin::register_builtin_hints;
use crate::hint::{registered_hints, HintFn, HintId, NamedHint};

/// Option applied, in order, on top of a copy of the hint registry.
#[derive(Clone, Debug)]
pub enum SolverOption {
    /// Adds hints. An id that is already present is kept and a warning is logged.
    WithHints(Vec<NamedHint>),
    /// Replaces the function behind `id`, whether or not it was present.
    OverrideHint(HintId, HintFn),
    /// Span the solver runs in; its fields and level decide where diagnostics go.
    WithLogger(Span),
}

/// Snapshot of the hint table plus the diagnostics span, built fresh for each solve.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    hints: BTreeMap<HintId, NamedHint>,
    logger: Span,
}

impl SolverConfig {
    pub fn new(options: impl IntoIterator<Item = SolverOption>) -> Self {
        register_builtin_hints();
        let mut config = Self {
            hints: registered_hints().into_iter().map(|h| (h.id, h)).collect(),
            logger: tracing::info_span!("solver"),
        };
        for option in options {
            config.apply(option);
        }
        config
    }

    fn apply(&mut self, option: SolverOption) {
        match option {
            SolverOption::WithHints(hints) => {
                for hint in hints {
                    if let Some(existing) = self.hints.get(&hint.id) {
                        tracing::warn!(
                            parent: &self.logger,
                            name = hint.name,
                            existing = existing.name,
                            id = %hint.id,
                            "duplicate hint, keeping the existing entry"
                        );
                        continue;
                    }
                    self.hints.insert(hint.id, hint);
                }
            }
            SolverOption::OverrideHint(id, func) => {
                let name = self.hints.get(&id).map_or("override", |h| h.name);
                self.hints.insert(id, NamedHint { id, name, func });
            }
            SolverOption::WithLogger(span) => self.logger = span,
        }
    }

    pub fn hint(&self, id: HintId) -> Option<&NamedHint> {
        self.hints.get(&id)
    }

    pub fn hints(&self) -> impl Iterator<Item = &NamedHint> {
        self.hints.values()
    }

    pub fn logger(&self) -> &Span {
        &self.logger
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::new([])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hint::builtin::{N_BITS, INVERSE};
    use crate::hint::HintError;
    use num_bigint::BigUint;

    fn constant_seven(
        _: &BigUint,
        _: &[BigUint],
        outputs: &mut [BigUint],
    ) -> Result<(), HintError> {
        outputs.iter_mut().for_each(|o| *o = BigUint::from(7u32));
        Ok(())
    }

    fn eval(config: &SolverConfig, id: HintId) -> BigUint {
        let mut out = [BigUint::default()];
        (config.hint(id).unwrap().func)(&BigUint::from(97u32), &[BigUint::from(2u32)], &mut out)
            .unwrap();
        out[0].clone()
    }

    #[test]
    fn starts_from_the_registry() {
        let config = SolverConfig::default();
        assert!(config.hint(N_BITS).is_some());
        assert!(config.hint(INVERSE).is_some());
    }

    #[test]
    fn with_hints_keeps_existing_entry() {
        let clash = NamedHint {
            id: INVERSE,
            name: "inverse_clash",
            func: constant_seven,
        };
        let config = SolverConfig::new([SolverOption::WithHints(vec![clash])]);
        assert_eq!(config.hint(INVERSE).unwrap().name, "inverse");
        assert_eq!(eval(&config, INVERSE), BigUint::from(49u32));
    }

    #[test]
    fn with_hints_adds_new_entry() {
        let fresh = NamedHint::new("solver_test_seven", constant_seven);
        let config = SolverConfig::new([SolverOption::WithHints(vec![fresh])]);
        assert_eq!(eval(&config, fresh.id), BigUint::from(7u32));
        // the registry itself is untouched
        assert!(crate::hint::registered_hint(fresh.id).is_none());
    }

    #[test]
    fn override_replaces_unconditionally_in_order() {
        let config = SolverConfig::new([
            SolverOption::OverrideHint(INVERSE, constant_seven),
            SolverOption::OverrideHint(INVERSE, crate::hint::builtin::inverse),
        ]);
        assert_eq!(eval(&config, INVERSE), BigUint::from(49u32));

        let config = SolverConfig::new([SolverOption::OverrideHint(INVERSE, constant_seven)]);
        assert_eq!(eval(&config, INVERSE), BigUint::from(7u32));
        assert_eq!(config.hint(INVERSE).unwrap().name, "inverse");
    }

    #[test]
    fn logger_option_sets_span() {
        let span = tracing::debug_span!("custom");
        let config = SolverConfig::new([SolverOption::WithLogger(span.clone())]);
        assert_eq!(config.logger().id(), span.id());
    }
}
