//! The constraint contract
//!
//! Every node in a constraint tree answers `apply_to(actual)` with a
//! `ConstraintResult`. Mismatches are values, never errors; `Err` is reserved
//! for configuration problems (malformed constraints, tolerance misuse).

use std::fmt;
use verdict_core::{display_value, AssertionFailure, Value, VerdictResult};

/// A composable predicate with a human-readable description.
pub trait Constraint: fmt::Debug + Send + Sync {
    /// Evaluate against one actual value.
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult>;

    /// The "Expected: ..." phrase. Leaf implementations compute this lazily
    /// and cache it, since it may be expensive string formatting.
    fn description(&self) -> String;
}

impl Constraint for Box<dyn Constraint> {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        (**self).apply_to(actual)
    }

    fn description(&self) -> String {
        (**self).description()
    }
}

/// The outcome of evaluating one constraint node against an actual value.
#[derive(Debug, Clone)]
pub struct ConstraintResult {
    success: bool,
    actual: Value,
    description: String,
}

impl ConstraintResult {
    pub fn new(success: bool, actual: Value, description: impl Into<String>) -> Self {
        Self {
            success,
            actual,
            description: description.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn actual(&self) -> &Value {
        &self.actual
    }

    /// Description of the branch that decided this result. For combinators
    /// this is the failing branch's detail, not the whole tree.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Convert a failed result into its failure payload, rendering the actual
    /// value with the supplied formatter (or the default one).
    pub fn to_failure(&self, format: Option<&dyn Fn(&Value) -> String>) -> AssertionFailure {
        let actual = match format {
            Some(f) => f(&self.actual),
            None => display_value(&self.actual),
        };
        AssertionFailure::new(self.description.clone(), actual)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_carries_actual_and_description() {
        let result = ConstraintResult::new(false, Value::Int(4), "3");
        assert!(!result.is_success());
        assert_eq!(result.description(), "3");
        let failure = result.to_failure(None);
        assert_eq!(failure.actual, "4");
        assert_eq!(failure.description, "3");
    }

    #[test]
    fn test_to_failure_uses_custom_formatter() {
        let result = ConstraintResult::new(false, Value::Int(4), "3");
        let upper = |v: &Value| format!("<<{}>>", display_value(v));
        let formatter: &dyn Fn(&Value) -> String = &upper;
        let failure = result.to_failure(Some(formatter));
        assert_eq!(failure.actual, "<<4>>");
    }
}
