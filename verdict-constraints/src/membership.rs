//! Membership and emptiness constraints

use crate::constraint::{Constraint, ConstraintResult};
use once_cell::sync::OnceCell;
use verdict_core::{
    display_value, EqualityComparer, Tolerance, Value, VerdictResult,
};

fn elements_of(actual: &Value) -> Option<Vec<Value>> {
    match actual {
        Value::List(handle) => Some(handle.snapshot()),
        Value::Tuple(slots) => Some(slots.clone()),
        _ => None,
    }
}

/// The actual collection must contain an element equal to the expected value
/// (equality runs through the comparer chain). A non-collection actual fails.
#[derive(Debug)]
pub struct MemberConstraint {
    expected: Value,
    tolerance: Tolerance,
    description: OnceCell<String>,
}

impl MemberConstraint {
    pub fn new(expected: impl Into<Value>) -> Self {
        Self {
            expected: expected.into(),
            tolerance: Tolerance::exact(),
            description: OnceCell::new(),
        }
    }

    pub fn within(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl Constraint for MemberConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let comparer = EqualityComparer::new();
        let success = match elements_of(actual) {
            Some(items) => {
                let mut found = false;
                for item in &items {
                    if comparer.are_equal(item, &self.expected, &self.tolerance)? {
                        found = true;
                        break;
                    }
                }
                found
            }
            None => false,
        };
        Ok(ConstraintResult::new(success, actual.clone(), self.description()))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| format!("collection containing {}", display_value(&self.expected)))
            .clone()
    }
}

/// The actual value must equal one of the expected choices.
#[derive(Debug)]
pub struct AnyOfConstraint {
    choices: Vec<Value>,
    description: OnceCell<String>,
}

impl AnyOfConstraint {
    pub fn new<I, T>(choices: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
            description: OnceCell::new(),
        }
    }
}

impl Constraint for AnyOfConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let comparer = EqualityComparer::new();
        let mut success = false;
        for choice in &self.choices {
            if comparer.are_equal(actual, choice, &Tolerance::exact())? {
                success = true;
                break;
            }
        }
        Ok(ConstraintResult::new(success, actual.clone(), self.description()))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| {
                let rendered: Vec<String> = self.choices.iter().map(display_value).collect();
                format!("any of [{}]", rendered.join(", "))
            })
            .clone()
    }
}

/// Empty string, list, tuple, map or record.
#[derive(Debug, Default)]
pub struct EmptyConstraint;

impl EmptyConstraint {
    pub fn new() -> Self {
        Self
    }
}

impl Constraint for EmptyConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let success = match actual {
            Value::Str(s) => s.is_empty(),
            Value::List(handle) => handle.is_empty(),
            Value::Tuple(slots) => slots.is_empty(),
            Value::Map(handle) => handle.is_empty(),
            Value::Record(handle) => handle.snapshot().is_empty(),
            _ => false,
        };
        Ok(ConstraintResult::new(success, actual.clone(), self.description()))
    }

    fn description(&self) -> String {
        "<empty>".to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================
