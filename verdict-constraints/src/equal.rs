//! Equality constraint

use crate::constraint::{Constraint, ConstraintResult};
use once_cell::sync::OnceCell;
use verdict_core::{display_value, EqualityComparer, Tolerance, Value, VerdictResult};

/// Deep structural equality against an expected value, optionally relaxed by
/// a tolerance and/or compared as an unordered set.
#[derive(Debug)]
pub struct EqualConstraint {
    expected: Value,
    tolerance: Tolerance,
    unordered: bool,
    description: OnceCell<String>,
}

impl EqualConstraint {
    pub fn new(expected: impl Into<Value>) -> Self {
        Self {
            expected: expected.into(),
            tolerance: Tolerance::exact(),
            unordered: false,
            description: OnceCell::new(),
        }
    }

    /// Relax equality by the given tolerance window.
    pub fn within(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Compare collections as unordered sets.
    pub fn as_set(mut self) -> Self {
        self.unordered = true;
        self
    }

    pub fn tolerance(&self) -> &Tolerance {
        &self.tolerance
    }
}

impl Constraint for EqualConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let comparer = if self.unordered {
            EqualityComparer::new().unordered()
        } else {
            EqualityComparer::new()
        };
        let equal = comparer.are_equal(actual, &self.expected, &self.tolerance)?;
        Ok(ConstraintResult::new(equal, actual.clone(), self.description()))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| {
                let mut text = display_value(&self.expected);
                if !self.tolerance.is_exact() {
                    text.push_str(&format!(" within {:?}", self.tolerance.mode()));
                }
                if self.unordered {
                    text.push_str(" (as set)");
                }
                text
            })
            .clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::VerdictError;

    #[test]
    fn test_equal_constraint_passes_and_fails() {
        let constraint = EqualConstraint::new(3);
        assert!(constraint.apply_to(&Value::Int(3)).unwrap().is_success());
        assert!(!constraint.apply_to(&Value::Int(4)).unwrap().is_success());
    }

    #[test]
    fn test_within_relaxes_equality() {
        let constraint = EqualConstraint::new(2.0).within(Tolerance::linear(0.5));
        assert!(constraint.apply_to(&Value::Float(2.4)).unwrap().is_success());
        assert!(!constraint.apply_to(&Value::Float(2.6)).unwrap().is_success());
    }

    #[test]
    fn test_as_set_ignores_order() {
        let constraint = EqualConstraint::new(Value::list([1, 2, 3])).as_set();
        assert!(constraint
            .apply_to(&Value::list([3, 2, 1]))
            .unwrap()
            .is_success());
        assert!(!constraint
            .apply_to(&Value::list([1, 2]))
            .unwrap()
            .is_success());
    }

    #[test]
    fn test_description_is_cached() {
        let constraint = EqualConstraint::new("abc");
        let first = constraint.description();
        let second = constraint.description();
        assert_eq!(first, second);
        assert_eq!(first, "\"abc\"");
    }

    #[test]
    fn test_tolerance_misuse_is_a_config_error() {
        let constraint = EqualConstraint::new("abc").within(Tolerance::linear(1.0));
        let err = constraint.apply_to(&Value::Str("abc".into())).unwrap_err();
        assert!(matches!(err, VerdictError::Config(_)));
    }

    #[test]
    fn test_mismatch_is_a_result_not_an_error() {
        let constraint = EqualConstraint::new(Value::list([1, 2]));
        let result = constraint.apply_to(&Value::Int(5)).unwrap();
        assert!(!result.is_success());
    }
}
