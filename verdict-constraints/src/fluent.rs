//! Fluent constraint construction surface
//!
//! The entry points callers reach for: `Is::equal_to(5).within(...)`,
//! `Has::property("len", ...)`, `Text::starts_with("ab")`. Each returns a
//! concrete constraint (or an expression via `ConstraintExt`), so modifier
//! methods stay available until the constraint is handed to the facade.

use crate::combinators::{AllItemsConstraint, NotConstraint, PropertyConstraint};
use crate::constraint::Constraint;
use crate::equal::EqualConstraint;
use crate::membership::{AnyOfConstraint, EmptyConstraint, MemberConstraint};
use crate::ordering::{ComparisonConstraint, OrderingOp};
use crate::path::SamePathConstraint;
use crate::string::{
    EndsWithConstraint, RegexConstraint, StartsWithConstraint, SubstringConstraint,
};
use verdict_core::{ConfigError, Value};

/// Constraints phrased as "Is ...".
pub struct Is;

impl Is {
    pub fn equal_to(expected: impl Into<Value>) -> EqualConstraint {
        EqualConstraint::new(expected)
    }

    pub fn not_equal_to(expected: impl Into<Value>) -> NotConstraint {
        NotConstraint::new(Box::new(EqualConstraint::new(expected)))
    }

    pub fn greater_than(expected: impl Into<Value>) -> ComparisonConstraint {
        ComparisonConstraint::new(expected, OrderingOp::Greater)
    }

    pub fn greater_or_equal(expected: impl Into<Value>) -> ComparisonConstraint {
        ComparisonConstraint::new(expected, OrderingOp::GreaterOrEqual)
    }

    pub fn less_than(expected: impl Into<Value>) -> ComparisonConstraint {
        ComparisonConstraint::new(expected, OrderingOp::Less)
    }

    pub fn less_or_equal(expected: impl Into<Value>) -> ComparisonConstraint {
        ComparisonConstraint::new(expected, OrderingOp::LessOrEqual)
    }

    pub fn any_of<I, T>(choices: I) -> AnyOfConstraint
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        AnyOfConstraint::new(choices)
    }

    pub fn same_path(expected: impl Into<String>) -> SamePathConstraint {
        SamePathConstraint::new(expected)
    }

    pub fn empty() -> EmptyConstraint {
        EmptyConstraint::new()
    }

    pub fn not(base: impl Constraint + 'static) -> NotConstraint {
        NotConstraint::new(Box::new(base))
    }
}

/// Constraints phrased as "Has ...".
pub struct Has;

impl Has {
    pub fn member(expected: impl Into<Value>) -> MemberConstraint {
        MemberConstraint::new(expected)
    }

    /// Fails fast at construction when the property name is empty.
    pub fn property(
        name: impl Into<String>,
        base: impl Constraint + 'static,
    ) -> Result<PropertyConstraint, ConfigError> {
        PropertyConstraint::new(name, Box::new(base))
    }

    pub fn all_items(base: impl Constraint + 'static) -> AllItemsConstraint {
        AllItemsConstraint::new(Box::new(base))
    }
}

/// String matching constraints.
pub struct Text;

impl Text {
    pub fn starts_with(expected: impl Into<String>) -> StartsWithConstraint {
        StartsWithConstraint::new(expected)
    }

    pub fn ends_with(expected: impl Into<String>) -> EndsWithConstraint {
        EndsWithConstraint::new(expected)
    }

    pub fn contains(expected: impl Into<String>) -> SubstringConstraint {
        SubstringConstraint::new(expected)
    }

    /// Fails fast at construction on an invalid pattern.
    pub fn matches(pattern: &str) -> Result<RegexConstraint, ConfigError> {
        RegexConstraint::new(pattern)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ConstraintExt;
    use verdict_core::Tolerance;

    #[test]
    fn test_is_surface() {
        assert!(Is::equal_to(3)
            .apply_to(&Value::Int(3))
            .unwrap()
            .is_success());
        assert!(Is::not_equal_to(3)
            .apply_to(&Value::Int(4))
            .unwrap()
            .is_success());
        assert!(Is::greater_than(3)
            .apply_to(&Value::Int(4))
            .unwrap()
            .is_success());
        assert!(Is::any_of([1, 2, 3])
            .apply_to(&Value::Int(2))
            .unwrap()
            .is_success());
    }

    #[test]
    fn test_modifiers_stay_available() {
        let constraint = Is::equal_to(2.0).within(Tolerance::linear(0.25));
        assert!(constraint
            .apply_to(&Value::Float(2.2))
            .unwrap()
            .is_success());
    }

    #[test]
    fn test_fluent_composition_reads_naturally() {
        let in_range = Is::greater_than(0).and(Is::less_than(10));
        let tree = in_range.or(Is::equal_to(42)).resolve().unwrap();
        assert!(tree.apply_to(&Value::Int(42)).unwrap().is_success());
        assert!(!tree.apply_to(&Value::Int(-1)).unwrap().is_success());
    }

    #[test]
    fn test_has_surface() {
        let members = Value::list([1, 2, 3]);
        assert!(Has::member(2).apply_to(&members).unwrap().is_success());
        assert!(Has::all_items(Is::greater_than(0))
            .apply_to(&members)
            .unwrap()
            .is_success());
        let record = Value::record([("len", 3)]);
        assert!(Has::property("len", Is::equal_to(3))
            .unwrap()
            .apply_to(&record)
            .unwrap()
            .is_success());
    }

    #[test]
    fn test_text_surface() {
        let hello = Value::Str("Hello".into());
        assert!(Text::starts_with("He").apply_to(&hello).unwrap().is_success());
        assert!(Text::ends_with("lo").apply_to(&hello).unwrap().is_success());
        assert!(Text::contains("ell").apply_to(&hello).unwrap().is_success());
        assert!(Text::matches("^H.*o$")
            .unwrap()
            .apply_to(&hello)
            .unwrap()
            .is_success());
    }

    #[test]
    fn test_malformed_construction_fails_fast() {
        assert!(Text::matches("(").is_err());
        assert!(Has::property("", Is::equal_to(1)).is_err());
    }
}
