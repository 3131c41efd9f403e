//! VERDICT Test Utilities
//!
//! Centralized test infrastructure for the VERDICT workspace:
//! - A recording listener capturing test-lifecycle notifications
//! - Fixtures for values that are awkward to build inline (cyclic
//!   containers, mutually-referential maps)
//! - Proptest generators for values, tolerances and outcome kinds

// Re-export the types tests reach for most often.
pub use verdict_constraints::{Constraint, ConstraintResult, Has, Is, Text};
pub use verdict_context::{ExecutionContext, TestListener};
pub use verdict_core::{
    EqualityComparer, OutcomeKind, OutcomeRecord, Tolerance, Value, VerdictError, VerdictResult,
};

use std::sync::{Arc, Mutex};

// ============================================================================
// RECORDING LISTENER
// ============================================================================

/// One captured listener notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    Started { name: String },
    Finished { name: String, outcome: OutcomeRecord },
}

/// Listener that records every notification for later inspection.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Names of tests that finished with the given outcome kind.
    pub fn finished_with(&self, kind: OutcomeKind) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ListenerEvent::Finished { name, outcome } if outcome.kind == kind => Some(name),
                _ => None,
            })
            .collect()
    }
}

impl TestListener for RecordingListener {
    fn test_started(&self, name: &str) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ListenerEvent::Started { name: name.into() });
    }

    fn test_finished(&self, name: &str, outcome: &OutcomeRecord) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ListenerEvent::Finished {
                name: name.into(),
                outcome: outcome.clone(),
            });
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A list that contains itself as its last element.
pub fn self_referential_list() -> Value {
    let list = verdict_core::ListHandle::new(vec![Value::Int(1)]);
    list.push(Value::List(list.clone()));
    Value::List(list)
}

/// Two maps that reference each other under the key "peer".
pub fn mutually_referential_maps() -> (Value, Value) {
    let a = verdict_core::MapHandle::new(Default::default());
    let b = verdict_core::MapHandle::new(Default::default());
    a.insert("peer", Value::Map(b.clone()));
    b.insert("peer", Value::Map(a.clone()));
    (Value::Map(a), Value::Map(b))
}

/// A context with a recording listener already installed.
pub fn recording_context() -> (ExecutionContext, Arc<RecordingListener>) {
    let ctx = ExecutionContext::root();
    let listener = RecordingListener::new();
    ctx.set_listener(listener.clone());
    (ctx, listener)
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    /// Scalar values only - no containers, no custom equality.
    pub fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            // Finite floats keep equality properties decidable.
            (-1e12f64..1e12).prop_map(Value::Float),
            "[a-z]{0,12}".prop_map(Value::Str),
            (0u64..1_000_000).prop_map(|ms| Value::Duration(Duration::from_millis(ms))),
        ]
    }

    /// Arbitrary values including nested (acyclic) containers.
    pub fn arb_value() -> impl Strategy<Value = Value> {
        arb_scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Tuple),
                prop::collection::vec(inner.clone(), 0..4)
                    .prop_map(|items| Value::List(verdict_core::ListHandle::new(items))),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|entries| Value::Map(verdict_core::MapHandle::new(entries))),
            ]
        })
    }

    pub fn arb_outcome_kind() -> impl Strategy<Value = OutcomeKind> {
        prop_oneof![
            Just(OutcomeKind::Pass),
            Just(OutcomeKind::Fail),
            Just(OutcomeKind::Warn),
            Just(OutcomeKind::Ignore),
            Just(OutcomeKind::Inconclusive),
        ]
    }

    pub fn arb_tolerance() -> impl Strategy<Value = Tolerance> {
        prop_oneof![
            Just(Tolerance::exact()),
            (0.0f64..100.0).prop_map(Tolerance::linear),
            (0.0f64..50.0).prop_map(Tolerance::percent),
            (0u32..64).prop_map(Tolerance::ulps),
        ]
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_recording_listener_captures_lifecycle() {
        let (ctx, listener) = recording_context();
        ctx.notify_test_started("alpha");
        ctx.notify_test_finished("alpha", &OutcomeRecord::new(OutcomeKind::Pass, "ok"));
        ctx.notify_test_started("beta");
        ctx.notify_test_finished("beta", &OutcomeRecord::new(OutcomeKind::Fail, "bad"));

        assert_eq!(listener.events().len(), 4);
        assert_eq!(listener.finished_with(OutcomeKind::Pass), vec!["alpha"]);
        assert_eq!(listener.finished_with(OutcomeKind::Fail), vec!["beta"]);
    }

    #[test]
    fn test_self_referential_list_compares_equal_to_itself() {
        let value = self_referential_list();
        let comparer = EqualityComparer::new();
        assert!(comparer
            .are_equal(&value, &value, &Tolerance::exact())
            .unwrap());
    }

    #[test]
    fn test_mutually_referential_maps_terminate() {
        let (a, b) = mutually_referential_maps();
        let comparer = EqualityComparer::new();
        // Structurally symmetric cycles compare equal rather than recursing.
        assert!(comparer.are_equal(&a, &b, &Tolerance::exact()).unwrap());
    }

    proptest! {
        #[test]
        fn test_generated_values_are_self_equal(value in generators::arb_value()) {
            let comparer = EqualityComparer::new();
            prop_assert!(comparer.are_equal(&value, &value, &Tolerance::exact()).unwrap());
        }

        #[test]
        fn test_generated_tolerances_are_well_formed(
            tolerance in generators::arb_tolerance(),
            expected in -1e9f64..1e9,
        ) {
            // Applying any generated tolerance to a finite float either
            // yields a window containing the expected value or a typed error.
            match tolerance.apply(&Value::Float(expected)) {
                Ok(bounds) => prop_assert!(bounds.contains(&Value::Float(expected))),
                Err(err) => {
                    let is_incompatible = matches!(
                        err,
                        verdict_core::ToleranceError::Incompatible { .. }
                    );
                    prop_assert!(is_incompatible);
                }
            }
        }
    }
}
