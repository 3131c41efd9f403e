//! VERDICT Constraints - Composable Predicate Model
//!
//! Constraint trees for the VERDICT assertion framework:
//! - Leaf constraints (equality, ordering, string matching, membership, paths)
//! - Combinators (AND, OR, NOT, prefix wrappers)
//! - An operator-precedence builder assembling trees from fluent expressions
//! - The `Is` / `Has` / `Text` construction surface
//!
//! Ordinary mismatches produce `ConstraintResult` values; only malformed
//! construction and tolerance misuse surface as errors.

pub mod builder;
pub mod combinators;
pub mod constraint;
pub mod equal;
pub mod fluent;
pub mod membership;
pub mod ordering;
pub mod path;
pub mod string;

pub use builder::{ConstraintBuilder, ConstraintExpression, ConstraintExt, IntoConstraint, Operator};
pub use combinators::{
    AllItemsConstraint, AndConstraint, NotConstraint, OrConstraint, PropertyConstraint,
};
pub use constraint::{Constraint, ConstraintResult};
pub use equal::EqualConstraint;
pub use fluent::{Has, Is, Text};
pub use membership::{AnyOfConstraint, EmptyConstraint, MemberConstraint};
pub use ordering::{ComparisonConstraint, OrderingOp};
pub use path::SamePathConstraint;
pub use string::{EndsWithConstraint, RegexConstraint, StartsWithConstraint, SubstringConstraint};
