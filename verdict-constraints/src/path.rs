//! Filesystem path equality

use crate::constraint::{Constraint, ConstraintResult};
use once_cell::sync::OnceCell;
use verdict_core::{Value, VerdictResult};

/// Canonicalize a path textually: unify separators, collapse empty and "."
/// segments, resolve ".." where possible. Purely lexical - the filesystem is
/// never consulted.
fn canonical(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(&s) if s != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            s => segments.push(s),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Two paths are equal when their canonical forms match, regardless of
/// separator style or trailing slashes.
#[derive(Debug)]
pub struct SamePathConstraint {
    expected: String,
    case_sensitive: bool,
    description: OnceCell<String>,
}

impl SamePathConstraint {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            case_sensitive: true,
            description: OnceCell::new(),
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.case_sensitive = false;
        self
    }
}

impl Constraint for SamePathConstraint {
    fn apply_to(&self, actual: &Value) -> VerdictResult<ConstraintResult> {
        let success = match actual {
            Value::Str(s) => {
                let left = canonical(s);
                let right = canonical(&self.expected);
                if self.case_sensitive {
                    left == right
                } else {
                    left.eq_ignore_ascii_case(&right)
                }
            }
            _ => false,
        };
        Ok(ConstraintResult::new(success, actual.clone(), self.description()))
    }

    fn description(&self) -> String {
        self.description
            .get_or_init(|| format!("Path matching {:?}", self.expected))
            .clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn check(constraint: &SamePathConstraint, actual: &str) -> bool {
        constraint
            .apply_to(&Value::Str(actual.into()))
            .unwrap()
            .is_success()
    }

    #[test]
    fn test_separator_styles_are_equivalent() {
        let constraint = SamePathConstraint::new("/usr/local/bin");
        assert!(check(&constraint, "\\usr\\local\\bin"));
        assert!(check(&constraint, "/usr/local/bin/"));
        assert!(check(&constraint, "/usr//local/./bin"));
    }

    #[test]
    fn test_parent_segments_resolve() {
        let constraint = SamePathConstraint::new("/usr/bin");
        assert!(check(&constraint, "/usr/local/../bin"));
        assert!(!check(&constraint, "/usr/local/bin"));
    }

    #[test]
    fn test_case_sensitivity_is_opt_out() {
        let sensitive = SamePathConstraint::new("/Data/File.txt");
        assert!(!check(&sensitive, "/data/file.txt"));
        let insensitive = SamePathConstraint::new("/Data/File.txt").ignore_case();
        assert!(check(&insensitive, "/data/file.txt"));
    }

    #[test]
    fn test_relative_paths_keep_leading_parents() {
        let constraint = SamePathConstraint::new("../shared/cfg");
        assert!(check(&constraint, "../shared/extra/../cfg"));
    }

    #[test]
    fn test_non_string_actual_fails() {
        let constraint = SamePathConstraint::new("/tmp");
        assert!(!constraint.apply_to(&Value::Int(1)).unwrap().is_success());
    }
}
