//! Ordering constraints (greater/less, with optional tolerance)

use crate::constraint::{Constraint, ConstraintResult};
use once_cell::sync::OnceCell;
use std::cmp::Ordering;
use verdict_core::{
    display_value, Bounds, ConfigError, Tolerance, Value, VerdictResult,
};

/// Which ordering relation must hold between actual and expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingOp {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl OrderingOp {
    fn phrase(&self) -> &'static str {
        match self {
            OrderingOp::Greater => "greater than ",
            OrderingOp::GreaterOrEqual => "greater than or equal to ",
            OrderingOp::Less => "less than ",
            OrderingOp::LessOrEqual => "less than or equal to ",
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            OrderingOp::Greater => ordering == Ordering::Greater,
            OrderingOp::GreaterOrEqual => ordering != Ordering::Less,
            OrderingOp::Less => ordering == Ordering::Less,
            OrderingOp::LessOrEqual => ordering != Ordering::Greater,
        }
    }
}

/// Compares actual against expected under an ordering relation. A tolerance
/// shifts the expected side before comparing: `greater than 5 within 0.1`
/// accepts anything above 4.9.
#[derive(Debug)]
pub struct ComparisonConstraint {
    expected: Value,
    op: OrderingOp,
    tolerance: Tolerance,
    description: OnceCell<String>,
}

impl ComparisonConstraint {
    pub fn new(expected: impl Into<Value>, op: OrderingOp) -> Self {
        Self {
            expected: expected.into(),
            op,
            tolerance: Tolerance::exact(),
            description: OnceCell::new(),
        }
    }

    pub fn within(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The expected operand after the tolerance shift. Relaxing `Greater`
    /// moves the threshold down to the window's lower bound; relaxing `Less`
    /// moves it up to the upper bound.
    fn threshold_f64(&self) -> VerdictResult<f64> {
        if self.tolerance.is_exact() {
            return self
                .expected
                .as_f64()
                .ok_or_else(|| self.not_comparable("numeric"));
        }
        match self.tolerance.apply(&self.expected)? {
            Bounds::Numeric { lower, upper } => Ok(match self.op {
                OrderingOp::Greater | OrderingOp::GreaterOrEqual => lower,
                OrderingOp::Less | OrderingOp::LessOrEqual => upper,
            }),
            Bounds::Duration { .. } | Bounds::Exact(_) => Err(self.not_comparable("numeric")),
        }
    }

    fn not_comparable(&self, wanted: &str) -> verdict_core::VerdictError {
        ConfigError::InvalidConstraint {
            constraint: format!("{}{}", self.op.phrase(), display_value(&self.expected)),
            reason: format!("expected a {} operand", wanted),
        }
        .into()
    }

    fn ordering_against(&self, actual: &Value) -> VerdictResult<Option<Ordering>> {
        match (actual, &self.expected) {
            _ if actual.is_numeric() && self.expected.is_numeric() => {
                let threshold = self.threshold_f64()?;
                // as_f64 is Some: is_numeric was checked.
                Ok(actual.as_f64().and_then(|a| a.partial_cmp(&threshold)))
            }
            (Value::Str(a), Value::Str(e)) => {
                if !self.tolerance.is_exact() {
                    return Err(ConfigError::InvalidConstraint {
                        constraint: format!("{}{:?}", self.op.phrase(), e),
                        reason: "tolerance cannot be applied to string ordering".into(),
                    }
                    .into());
                }
                Ok(Some(a.as_str().cmp(e.as_str())))
            }
            (Value::Duration(a), Value::Duration(_)) => {
                let bounds = self.tolerance.apply(&self.expected)?;
                match bounds {
                    Bounds::Duration { lower, upper } => {
                        let threshold = match self.op {
                            OrderingOp::Greater | OrderingOp::GreaterOrEqual => lower,
                            OrderingOp::Less | OrderingOp::LessOrEqual => upper,
                        };
                        Ok(Some(a.cmp(&threshold)))
                    }
                    Bounds::Numeric { .. } | Bounds::Exact(_) => {
                        Err(self.not_comparable("duration"))
                    }
                }
            }
            _ => Err(ConfigError::InvalidConstraint {
                constraint: format!("{}{}", self.op.phrase(), display_value(&self.expected)),
                reason: format!(
                    "cannot order a {} value against a {} value",
                    actual.kind(),
                    self.expected.kind()
                ),
            }
            .into()),
        }
    }
}

impl Constraint for ComparisonConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let success = match self.ordering_against(actual)? {
            Some(ordering) => self.op.holds(ordering),
            // NaN orders against nothing: the relation simply does not hold.
            None => false,
        };
        Ok(ConstraintResult::new(
            success,
            actual.clone(),
            self.description(),
        ))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| {
                let mut text = format!("{}{}", self.op.phrase(), display_value(&self.expected));
                if !self.tolerance.is_exact() {
                    text.push_str(&format!(" within {:?}", self.tolerance.mode()));
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
    use std::time::Duration;
    use verdict_core::VerdictError;

    #[test]
    fn test_greater_than() {
        let constraint = ComparisonConstraint::new(5, OrderingOp::Greater);
        assert!(constraint.apply_to(&Value::Int(6)).unwrap().is_success());
        assert!(!constraint.apply_to(&Value::Int(5)).unwrap().is_success());
        assert!(!constraint.apply_to(&Value::Int(4)).unwrap().is_success());
    }

    #[test]
    fn test_boundary_inclusive_variants() {
        let ge = ComparisonConstraint::new(5, OrderingOp::GreaterOrEqual);
        let le = ComparisonConstraint::new(5, OrderingOp::LessOrEqual);
        assert!(ge.apply_to(&Value::Int(5)).unwrap().is_success());
        assert!(le.apply_to(&Value::Int(5)).unwrap().is_success());
    }

    #[test]
    fn test_tolerance_shifts_the_expected_side() {
        let constraint =
            ComparisonConstraint::new(5.0, OrderingOp::Greater).within(Tolerance::linear(0.1));
        assert!(constraint
            .apply_to(&Value::Float(4.95))
            .unwrap()
            .is_success());
        assert!(!constraint
            .apply_to(&Value::Float(4.85))
            .unwrap()
            .is_success());

        let constraint =
            ComparisonConstraint::new(5.0, OrderingOp::Less).within(Tolerance::linear(0.1));
        assert!(constraint
            .apply_to(&Value::Float(5.05))
            .unwrap()
            .is_success());
    }

    #[test]
    fn test_string_ordering_is_lexicographic() {
        let constraint = ComparisonConstraint::new("banana", OrderingOp::Less);
        assert!(constraint
            .apply_to(&Value::Str("apple".into()))
            .unwrap()
            .is_success());
        assert!(!constraint
            .apply_to(&Value::Str("cherry".into()))
            .unwrap()
            .is_success());
    }

    #[test]
    fn test_duration_ordering_with_slack() {
        let constraint = ComparisonConstraint::new(
            Value::Duration(Duration::from_millis(100)),
            OrderingOp::Less,
        )
        .within(Tolerance::duration(Duration::from_millis(20)));
        assert!(constraint
            .apply_to(&Value::Duration(Duration::from_millis(115)))
            .unwrap()
            .is_success());
        assert!(!constraint
            .apply_to(&Value::Duration(Duration::from_millis(125)))
            .unwrap()
            .is_success());
    }

    #[test]
    fn test_kind_mismatch_is_a_config_error() {
        let constraint = ComparisonConstraint::new(5, OrderingOp::Greater);
        let err = constraint.apply_to(&Value::Str("6".into())).unwrap_err();
        assert!(matches!(err, VerdictError::Config(_)));
    }

    #[test]
    fn test_nan_fails_rather_than_errors() {
        let constraint = ComparisonConstraint::new(5.0, OrderingOp::Greater);
        let result = constraint.apply_to(&Value::Float(f64::NAN)).unwrap();
        assert!(!result.is_success());
    }

    #[test]
    fn test_description_phrase() {
        let constraint = ComparisonConstraint::new(5, OrderingOp::Greater);
        assert_eq!(constraint.description(), "greater than 5");
    }
}
