//! Error taxonomy for VERDICT operations
//!
//! Ordinary mismatches are never errors - constraint evaluation returns result
//! values. The error types here cover the remaining taxonomy: configuration
//! errors (malformed constraints, tolerance misuse), assertion failures raised
//! at the facade boundary, and the outcome signals used by Pass/Ignore/
//! Inconclusive to short-circuit a test body.

use crate::tolerance::ToleranceMode;
use crate::value::ValueKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Tolerance misuse errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToleranceError {
    #[error("Tolerance amount must be non-negative, got {amount}")]
    NegativeAmount { amount: f64 },

    #[error("Tolerance mode {mode:?} cannot be applied to a {kind} value")]
    Incompatible { mode: ToleranceMode, kind: ValueKind },
}

/// Constraint configuration errors. Distinct from assertion failures: these
/// fail immediately and are never deferred, even inside a Multiple block.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid constraint {constraint}: {reason}")]
    InvalidConstraint { constraint: String, reason: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unresolved constraint expression: {reason}")]
    UnresolvedExpression { reason: String },

    #[error("Tolerance misuse: {0}")]
    Tolerance(#[from] ToleranceError),
}

/// The distinct outcome kinds a test body can signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    Pass,
    Fail,
    Warn,
    Ignore,
    Inconclusive,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutcomeKind::Pass => "Pass",
            OutcomeKind::Fail => "Fail",
            OutcomeKind::Warn => "Warn",
            OutcomeKind::Ignore => "Ignore",
            OutcomeKind::Inconclusive => "Inconclusive",
        };
        write!(f, "{}", name)
    }
}

/// One recorded outcome, as captured inside a Multiple block or forwarded to
/// a listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub kind: OutcomeKind,
    pub message: String,
}

impl OutcomeRecord {
    pub fn new(kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.kind == OutcomeKind::Fail
    }
}

impl fmt::Display for OutcomeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// A single failed assertion: the constraint's description of what was
/// expected, the formatted actual value, and an optional caller message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionFailure {
    pub message: Option<String>,
    pub description: String,
    pub actual: String,
}

impl AssertionFailure {
    pub fn new(description: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            message: None,
            description: description.into(),
            actual: actual.into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = &self.message {
            writeln!(f, "{}", msg)?;
        }
        write!(f, "Expected: {}\n  But was: {}", self.description, self.actual)
    }
}

/// Aggregate of every outcome deferred inside a Multiple block, in original
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleFailure {
    pub entries: Vec<OutcomeRecord>,
}

impl MultipleFailure {
    pub fn failure_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_failure()).count()
    }
}

impl fmt::Display for MultipleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} failure(s) in multiple-assert block:",
            self.failure_count()
        )?;
        for entry in &self.entries {
            writeln!(f, "  {}", entry)?;
        }
        Ok(())
    }
}

/// Master error type for all VERDICT operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VerdictError {
    #[error("Assertion failed:\n{0}")]
    Assertion(AssertionFailure),

    #[error("{0}")]
    Multiple(MultipleFailure),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pass/Ignore/Inconclusive raised outside a Multiple block: an unwind
    /// signal that ends the remaining test body, not a defect.
    #[error("Test signalled {kind}: {message}")]
    Signal { kind: OutcomeKind, message: String },
}

impl VerdictError {
    /// Outcome kind this error maps to when recorded.
    pub fn outcome_kind(&self) -> OutcomeKind {
        match self {
            VerdictError::Assertion(_) | VerdictError::Multiple(_) => OutcomeKind::Fail,
            VerdictError::Config(_) => OutcomeKind::Fail,
            VerdictError::Signal { kind, .. } => *kind,
        }
    }
}

impl From<ToleranceError> for VerdictError {
    fn from(err: ToleranceError) -> Self {
        VerdictError::Config(ConfigError::Tolerance(err))
    }
}

/// Result type alias for VERDICT operations.
pub type VerdictResult<T> = Result<T, VerdictError>;

// =============================================================================
// TESTS
// =============================================================================
