//! String matching constraints

use crate::constraint::{Constraint, ConstraintResult};
use once_cell::sync::OnceCell;
use regex::Regex;
use verdict_core::{ConfigError, Value, VerdictResult};

fn actual_str(actual: &Value) -> Option<&str> {
    match actual {
        Value::Str(s) => Some(s.as_str()),
        _ => None,
    }
}

/// "String starting with ...". A non-string actual fails; it is not an error.
#[derive(Debug)]
pub struct StartsWithConstraint {
    expected: String,
    ignore_case: bool,
    description: OnceCell<String>,
}

impl StartsWithConstraint {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            ignore_case: false,
            description: OnceCell::new(),
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }
}

impl Constraint for StartsWithConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let success = match actual_str(actual) {
            Some(s) if self.ignore_case => s
                .to_lowercase()
                .starts_with(&self.expected.to_lowercase()),
            Some(s) => s.starts_with(&self.expected),
            None => false,
        };
        Ok(ConstraintResult::new(success, actual.clone(), self.description()))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| {
                let mut text = format!("String starting with {:?}", self.expected);
                if self.ignore_case {
                    text.push_str(", ignoring case");
                }
                text
            })
            .clone()
    }
}

/// "String ending with ...".
#[derive(Debug)]
pub struct EndsWithConstraint {
    expected: String,
    ignore_case: bool,
    description: OnceCell<String>,
}

impl EndsWithConstraint {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            ignore_case: false,
            description: OnceCell::new(),
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }
}

impl Constraint for EndsWithConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let success = match actual_str(actual) {
            Some(s) if self.ignore_case => {
                s.to_lowercase().ends_with(&self.expected.to_lowercase())
            }
            Some(s) => s.ends_with(&self.expected),
            None => false,
        };
        Ok(ConstraintResult::new(success, actual.clone(), self.description()))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| {
                let mut text = format!("String ending with {:?}", self.expected);
                if self.ignore_case {
                    text.push_str(", ignoring case");
                }
                text
            })
            .clone()
    }
}

/// "String containing ...".
#[derive(Debug)]
pub struct SubstringConstraint {
    expected: String,
    ignore_case: bool,
    description: OnceCell<String>,
}

impl SubstringConstraint {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            ignore_case: false,
            description: OnceCell::new(),
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }
}

impl Constraint for SubstringConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let success = match actual_str(actual) {
            Some(s) if self.ignore_case => {
                s.to_lowercase().contains(&self.expected.to_lowercase())
            }
            Some(s) => s.contains(&self.expected),
            None => false,
        };
        Ok(ConstraintResult::new(success, actual.clone(), self.description()))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| {
                let mut text = format!("String containing {:?}", self.expected);
                if self.ignore_case {
                    text.push_str(", ignoring case");
                }
                text
            })
            .clone()
    }
}

/// "String matching ...". An invalid pattern is a construction-time
/// configuration error, never an evaluation-time surprise.
#[derive(Debug)]
pub struct RegexConstraint {
    pattern: String,
    regex: Regex,
    description: OnceCell<String>,
}

impl RegexConstraint {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            description: OnceCell::new(),
        })
    }

    pub fn from_regex(regex: Regex) -> Self {
        Self {
            pattern: regex.as_str().to_string(),
            regex,
            description: OnceCell::new(),
        }
    }
}

impl Constraint for RegexConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let success = match actual_str(actual) {
            Some(s) => self.regex.is_match(s),
            None => false,
        };
        Ok(ConstraintResult::new(success, actual.clone(), self.description()))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| format!("String matching {:?}", self.pattern))
            .clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn check(constraint: &dyn Constraint, actual: &str) -> bool {
        constraint
            .apply_to(&Value::Str(actual.into()))
            .unwrap()
            .is_success()
    }

    #[test]
    fn test_starts_with() {
        let constraint = StartsWithConstraint::new("He");
        assert!(check(&constraint, "Hello"));
        assert!(!check(&constraint, "hello"));
        assert!(!check(&constraint, "World"));
    }

    #[test]
    fn test_starts_with_ignoring_case() {
        let constraint = StartsWithConstraint::new("HE").ignore_case();
        assert!(check(&constraint, "hello"));
        assert!(constraint
            .description()
            .contains("ignoring case"));
    }

    #[test]
    fn test_ends_with() {
        let constraint = EndsWithConstraint::new("lo");
        assert!(check(&constraint, "Hello"));
        assert!(!check(&constraint, "Hold"));
        assert_eq!(constraint.description(), "String ending with \"lo\"");
    }

    #[test]
    fn test_contains() {
        let constraint = SubstringConstraint::new("ell");
        assert!(check(&constraint, "Hello"));
        assert!(!check(&constraint, "Halo"));
    }

    #[test]
    fn test_non_string_actual_fails_without_error() {
        let constraint = StartsWithConstraint::new("1");
        let result = constraint.apply_to(&Value::Int(12)).unwrap();
        assert!(!result.is_success());
    }

    #[test]
    fn test_regex_match() {
        let constraint = RegexConstraint::new(r"^\d{3}-\d{4}$").unwrap();
        assert!(check(&constraint, "555-0123"));
        assert!(!check(&constraint, "5550123"));
    }

    #[test]
    fn test_invalid_regex_fails_at_construction() {
        let err = RegexConstraint::new("(unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
