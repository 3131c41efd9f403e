//! VERDICT Core - Equality Engine
//!
//! The comparison core of the VERDICT assertion framework:
//! - Dynamic value model with shared, identity-comparable containers
//! - Numeric/time tolerance windows
//! - Cycle-safe recursive structural equality via an ordered comparer chain
//! - Error taxonomy shared by the whole workspace
//!
//! This crate contains no assertion or context logic - it only answers
//! "are these two values equal, and how do we print them".

pub mod compare;
pub mod error;
pub mod format;
pub mod state;
pub mod tolerance;
pub mod value;

pub use compare::{ChainComparer, Comparison, EqualityComparer};
pub use error::{
    AssertionFailure, ConfigError, MultipleFailure, OutcomeKind, OutcomeRecord, ToleranceError,
    VerdictError, VerdictResult,
};
pub use format::{default_formatter, display_value, ValueFormatter};
pub use state::ComparisonState;
pub use tolerance::{Bounds, Tolerance, ToleranceMode};
pub use value::{Equatable, ListHandle, MapHandle, RecordHandle, Value, ValueKind};
