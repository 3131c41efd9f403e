//! Constraint combinators
//!
//! AND and OR short-circuit left to right; a combinator's failure result
//! carries the detail of the branch that decided it, so failure messages point
//! at the relevant leaf rather than the whole tree.

use crate::constraint::{Constraint, ConstraintResult};
use once_cell::sync::OnceCell;
use verdict_core::{ConfigError, Value, VerdictResult};

/// Both branches must succeed. The right branch is not evaluated when the
/// left fails.
#[derive(Debug)]
pub struct AndConstraint {
    left: Box<dyn Constraint>,
    right: Box<dyn Constraint>,
    description: OnceCell<String>,
}

impl AndConstraint {
    pub fn new(left: Box<dyn Constraint>, right: Box<dyn Constraint>) -> Self {
        Self {
            left,
            right,
            description: OnceCell::new(),
        }
    }
}

impl Constraint for AndConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let left = self.left.apply_to(actual)?;
        if !left.is_success() {
            // Carry the failing branch's detail.
            return Ok(ConstraintResult::new(
                false,
                actual.clone(),
                left.description(),
            ));
        }
        let right = self.right.apply_to(actual)?;
        if !right.is_success() {
            return Ok(ConstraintResult::new(
                false,
                actual.clone(),
                right.description(),
            ));
        }
        Ok(ConstraintResult::new(true, actual.clone(), self.description()))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| {
                format!("{} and {}", self.left.description(), self.right.description())
            })
            .clone()
    }
}

/// Either branch may succeed. The right branch is not evaluated when the left
/// succeeds. A failure mentions both branches, left first.
#[derive(Debug)]
pub struct OrConstraint {
    left: Box<dyn Constraint>,
    right: Box<dyn Constraint>,
    description: OnceCell<String>,
}

impl OrConstraint {
    pub fn new(left: Box<dyn Constraint>, right: Box<dyn Constraint>) -> Self {
        Self {
            left,
            right,
            description: OnceCell::new(),
        }
    }
}

impl Constraint for OrConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let left = self.left.apply_to(actual)?;
        if left.is_success() {
            return Ok(ConstraintResult::new(true, actual.clone(), self.description()));
        }
        let right = self.right.apply_to(actual)?;
        if right.is_success() {
            return Ok(ConstraintResult::new(true, actual.clone(), self.description()));
        }
        Ok(ConstraintResult::new(
            false,
            actual.clone(),
            format!("{} or {}", left.description(), right.description()),
        ))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| {
                format!("{} or {}", self.left.description(), self.right.description())
            })
            .clone()
    }
}

/// Inverts the base constraint's success and negates its phrasing.
#[derive(Debug)]
pub struct NotConstraint {
    base: Box<dyn Constraint>,
    description: OnceCell<String>,
}

impl NotConstraint {
    pub fn new(base: Box<dyn Constraint>) -> Self {
        Self {
            base,
            description: OnceCell::new(),
        }
    }
}

impl Constraint for NotConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let inner = self.base.apply_to(actual)?;
        Ok(ConstraintResult::new(
            !inner.is_success(),
            actual.clone(),
            self.description(),
        ))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| format!("not {}", self.base.description()))
            .clone()
    }
}

/// Every element of the actual collection must satisfy the base constraint.
/// A non-collection actual fails; an empty collection succeeds vacuously.
#[derive(Debug)]
pub struct AllItemsConstraint {
    base: Box<dyn Constraint>,
    description: OnceCell<String>,
}

impl AllItemsConstraint {
    pub fn new(base: Box<dyn Constraint>) -> Self {
        Self {
            base,
            description: OnceCell::new(),
        }
    }
}

impl Constraint for AllItemsConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let items = match actual {
            Value::List(handle) => handle.snapshot(),
            Value::Tuple(slots) => slots.clone(),
            _ => {
                return Ok(ConstraintResult::new(
                    false,
                    actual.clone(),
                    self.description(),
                ))
            }
        };
        for item in &items {
            let inner = self.base.apply_to(item)?;
            if !inner.is_success() {
                return Ok(ConstraintResult::new(
                    false,
                    // Point at the offending element.
                    item.clone(),
                    self.description(),
                ));
            }
        }
        Ok(ConstraintResult::new(true, actual.clone(), self.description()))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| format!("all items {}", self.base.description()))
            .clone()
    }
}

/// Looks up a named field on a record or map actual and applies the base
/// constraint to its value. A missing field or non-record actual fails.
/// An empty property name is rejected at construction.
#[derive(Debug)]
pub struct PropertyConstraint {
    name: String,
    base: Box<dyn Constraint>,
    description: OnceCell<String>,
}

impl PropertyConstraint {
    pub fn new(name: impl Into<String>, base: Box<dyn Constraint>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::InvalidConstraint {
                constraint: "property".into(),
                reason: "property name must not be empty".into(),
            });
        }
        Ok(Self {
            name,
            base,
            description: OnceCell::new(),
        })
    }
}

impl Constraint for PropertyConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let field = match actual {
            Value::Record(handle) => handle.get(&self.name),
            Value::Map(handle) => handle.get(&self.name),
            _ => None,
        };
        match field {
            Some(value) => {
                let inner = self.base.apply_to(&value)?;
                Ok(ConstraintResult::new(
                    inner.is_success(),
                    value,
                    self.description(),
                ))
            }
            None => Ok(ConstraintResult::new(
                false,
                actual.clone(),
                self.description(),
            )),
        }
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| format!("property {:?} {}", self.name, self.base.description()))
            .clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equal::EqualConstraint;
    use crate::ordering::{ComparisonConstraint, OrderingOp};
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    /// Counts evaluations so short-circuiting is observable.
    #[derive(Debug)]
    struct Counting {
        result: bool,
        hits: Arc<AtomicUsize>,
    }

    impl Constraint for Counting {
        fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
            self.hits.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(ConstraintResult::new(self.result, actual.clone(), "counting"))
        }

        fn description(&self) -> String {
            "counting".to_string()
        }
    }

    fn counting(result: bool) -> (Box<dyn Constraint>, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Counting {
                result,
                hits: hits.clone(),
            }),
            hits,
        )
    }

    #[test]
    fn test_and_requires_both() {
        let gt = Box::new(ComparisonConstraint::new(1, OrderingOp::Greater));
        let lt = Box::new(ComparisonConstraint::new(10, OrderingOp::Less));
        let both = AndConstraint::new(gt, lt);
        assert!(both.apply_to(&Value::Int(5)).unwrap().is_success());
        assert!(!both.apply_to(&Value::Int(11)).unwrap().is_success());
    }

    #[test]
    fn test_and_short_circuits_on_left_failure() {
        let (left, _) = counting(false);
        let (right, right_hits) = counting(true);
        let both = AndConstraint::new(left, right);
        assert!(!both.apply_to(&Value::Int(0)).unwrap().is_success());
        assert_eq!(right_hits.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn test_and_failure_carries_failing_branch_detail() {
        let left = Box::new(EqualConstraint::new(3));
        let right = Box::new(EqualConstraint::new(4));
        let both = AndConstraint::new(left, right);
        let result = both.apply_to(&Value::Int(4)).unwrap();
        assert!(!result.is_success());
        assert_eq!(result.description(), "3");
    }

    #[test]
    fn test_or_short_circuits_on_left_success() {
        let (left, _) = counting(true);
        let (right, right_hits) = counting(false);
        let either = OrConstraint::new(left, right);
        assert!(either.apply_to(&Value::Int(0)).unwrap().is_success());
        assert_eq!(right_hits.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn test_or_failure_mentions_both_branches_left_first() {
        let left = Box::new(EqualConstraint::new(3));
        let right = Box::new(EqualConstraint::new(4));
        let either = OrConstraint::new(left, right);
        let result = either.apply_to(&Value::Int(5)).unwrap();
        assert!(!result.is_success());
        assert_eq!(result.description(), "3 or 4");
    }

    #[test]
    fn test_not_inverts_and_negates_description() {
        let negated = NotConstraint::new(Box::new(EqualConstraint::new(3)));
        assert!(negated.apply_to(&Value::Int(4)).unwrap().is_success());
        assert!(!negated.apply_to(&Value::Int(3)).unwrap().is_success());
        assert_eq!(negated.description(), "not 3");
    }

    #[test]
    fn test_all_items() {
        let all = AllItemsConstraint::new(Box::new(ComparisonConstraint::new(
            0,
            OrderingOp::Greater,
        )));
        assert!(all.apply_to(&Value::list([1, 2, 3])).unwrap().is_success());
        let result = all.apply_to(&Value::list([1, -2, 3])).unwrap();
        assert!(!result.is_success());
        assert_eq!(all.description(), "all items greater than 0");
    }

    #[test]
    fn test_all_items_vacuous_on_empty() {
        let all = AllItemsConstraint::new(Box::new(EqualConstraint::new(1)));
        assert!(all
            .apply_to(&Value::list(Vec::<i64>::new()))
            .unwrap()
            .is_success());
    }

    #[test]
    fn test_property_lookup() {
        let prop =
            PropertyConstraint::new("age", Box::new(ComparisonConstraint::new(18, OrderingOp::GreaterOrEqual)))
                .unwrap();
        let adult = Value::record([("age", 36)]);
        let minor = Value::record([("age", 12)]);
        let nameless = Value::record([("name", 1)]);
        assert!(prop.apply_to(&adult).unwrap().is_success());
        assert!(!prop.apply_to(&minor).unwrap().is_success());
        assert!(!prop.apply_to(&nameless).unwrap().is_success());
        assert!(!prop.apply_to(&Value::Int(1)).unwrap().is_success());
    }

    #[test]
    fn test_empty_property_name_is_rejected_at_construction() {
        let err = PropertyConstraint::new("", Box::new(EqualConstraint::new(1))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConstraint { .. }));
    }
}
