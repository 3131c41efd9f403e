//! Operator-precedence constraint builder
//!
//! Fluent expressions are a left-to-right stream of constraints and
//! operators. The builder keeps an operator stack and a constraint stack and
//! resolves pending operators by precedence, so `a and b or c` groups as
//! `(a and b) or c` rather than left-folding.

use crate::combinators::{AndConstraint, NotConstraint, OrConstraint};
use crate::constraint::Constraint;
use verdict_core::{ConfigError, VerdictResult};

/// A parse-time operator. Smaller precedence numbers bind tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Prefix negation.
    Not,
    And,
    Or,
}

impl Operator {
    pub fn left_precedence(&self) -> u8 {
        match self {
            Operator::Not => 1,
            Operator::And => 2,
            Operator::Or => 3,
        }
    }

    pub fn right_precedence(&self) -> u8 {
        self.left_precedence()
    }
}

/// Assembles a constraint tree from a token stream of constraints and
/// operators.
#[derive(Debug, Default)]
pub struct ConstraintBuilder {
    operators: Vec<Operator>,
    terms: Vec<Box<dyn Constraint>>,
    // First structural error in the stream; reported at resolve().
    failed: Option<ConfigError>,
}

impl ConstraintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_constraint(&mut self, constraint: Box<dyn Constraint>) {
        self.terms.push(constraint);
    }

    pub fn push_operator(&mut self, op: Operator) {
        if self.failed.is_some() {
            return;
        }
        // Resolve every pending operator that binds at least as tightly as
        // the incoming one. Equal precedence stacks, which keeps evaluation
        // order left to right either way.
        while let Some(&top) = self.operators.last() {
            if top.right_precedence() < op.left_precedence() {
                self.operators.pop();
                if let Err(err) = self.reduce(top) {
                    self.failed = Some(err);
                    return;
                }
            } else {
                break;
            }
        }
        self.operators.push(op);
    }

    fn reduce(&mut self, op: Operator) -> Result<(), ConfigError> {
        match op {
            Operator::Not => {
                let base = self.pop_term("not")?;
                self.terms.push(Box::new(NotConstraint::new(base)));
            }
            Operator::And => {
                let right = self.pop_term("and")?;
                let left = self.pop_term("and")?;
                self.terms.push(Box::new(AndConstraint::new(left, right)));
            }
            Operator::Or => {
                let right = self.pop_term("or")?;
                let left = self.pop_term("or")?;
                self.terms.push(Box::new(OrConstraint::new(left, right)));
            }
        }
        Ok(())
    }

    fn pop_term(&mut self, op_name: &str) -> Result<Box<dyn Constraint>, ConfigError> {
        self.terms
            .pop()
            .ok_or_else(|| ConfigError::UnresolvedExpression {
                reason: format!("operator '{}' is missing an operand", op_name),
            })
    }

    /// Resolve the stream into a single constraint tree.
    pub fn resolve(mut self) -> VerdictResult<Box<dyn Constraint>> {
        if let Some(err) = self.failed.take() {
            return Err(err.into());
        }
        while let Some(op) = self.operators.pop() {
            self.reduce(op)?;
        }
        match self.terms.len() {
            1 => Ok(self.terms.pop().expect("len checked")),
            0 => Err(ConfigError::UnresolvedExpression {
                reason: "expression is empty".into(),
            }
            .into()),
            n => Err(ConfigError::UnresolvedExpression {
                reason: format!("{} constraints left without a joining operator", n),
            }
            .into()),
        }
    }
}

/// Fluent wrapper over `ConstraintBuilder`: each call appends one token to
/// the stream.
#[derive(Debug)]
pub struct ConstraintExpression {
    builder: ConstraintBuilder,
}

impl ConstraintExpression {
    /// Start an expression from its first constraint.
    pub fn of(constraint: impl Constraint + 'static) -> Self {
        let mut builder = ConstraintBuilder::new();
        builder.push_constraint(Box::new(constraint));
        Self { builder }
    }

    /// Start an expression with a prefix negation.
    pub fn not(constraint: impl Constraint + 'static) -> Self {
        let mut builder = ConstraintBuilder::new();
        builder.push_operator(Operator::Not);
        builder.push_constraint(Box::new(constraint));
        Self { builder }
    }

    pub fn and(mut self, constraint: impl Constraint + 'static) -> Self {
        self.builder.push_operator(Operator::And);
        self.builder.push_constraint(Box::new(constraint));
        self
    }

    pub fn or(mut self, constraint: impl Constraint + 'static) -> Self {
        self.builder.push_operator(Operator::Or);
        self.builder.push_constraint(Box::new(constraint));
        self
    }

    pub fn and_not(mut self, constraint: impl Constraint + 'static) -> Self {
        self.builder.push_operator(Operator::And);
        self.builder.push_operator(Operator::Not);
        self.builder.push_constraint(Box::new(constraint));
        self
    }

    pub fn or_not(mut self, constraint: impl Constraint + 'static) -> Self {
        self.builder.push_operator(Operator::Or);
        self.builder.push_operator(Operator::Not);
        self.builder.push_constraint(Box::new(constraint));
        self
    }

    pub fn resolve(self) -> VerdictResult<Box<dyn Constraint>> {
        self.builder.resolve()
    }
}

/// Lets any constraint start a fluent expression directly:
/// `a.and(b).or(c)`.
pub trait ConstraintExt: Constraint + Sized + 'static {
    fn and(self, rhs: impl Constraint + 'static) -> ConstraintExpression {
        ConstraintExpression::of(self).and(rhs)
    }

    fn or(self, rhs: impl Constraint + 'static) -> ConstraintExpression {
        ConstraintExpression::of(self).or(rhs)
    }

    fn negate(self) -> NotConstraint {
        NotConstraint::new(Box::new(self))
    }
}

impl<C: Constraint + Sized + 'static> ConstraintExt for C {}

/// Anything the assert facade accepts as a constraint: a finished tree or an
/// expression still to be resolved.
pub trait IntoConstraint {
    fn into_constraint(self) -> VerdictResult<Box<dyn Constraint>>;
}

impl<C: Constraint + 'static> IntoConstraint for C {
    fn into_constraint(self) -> VerdictResult<Box<dyn Constraint>> {
        Ok(Box::new(self))
    }
}

impl IntoConstraint for ConstraintExpression {
    fn into_constraint(self) -> VerdictResult<Box<dyn Constraint>> {
        self.resolve()
    }
}

// =============================================================================
// TESTS
// =============================================================================
