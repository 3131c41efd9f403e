//! VERDICT Assert - Assertion Facade
//!
//! The surface callers write against:
//! - `Assert::that(actual, constraint)` evaluates a constraint tree against a
//!   value and reports the outcome through the bound execution context
//! - `multiple` / `multiple_async` run a body in which failed assertions are
//!   deferred and reported together at the end of the block
//! - `pass` / `fail` / `warn` / `ignore` / `inconclusive` signal an outcome
//!   directly
//!
//! Failures flow as `Result` values, never panics. Inside a Multiple block
//! every outcome kind is deferred; only configuration errors (malformed
//! constraints, tolerance misuse) propagate immediately and abort the block.

use std::future::Future;
use tracing::warn;
use verdict_constraints::IntoConstraint;
use verdict_context::ExecutionContext;
use verdict_core::{AssertionFailure, OutcomeKind, OutcomeRecord, Value, VerdictError, VerdictResult};

/// The assertion facade, bound to one execution context. Cheap to clone;
/// clones share the context.
#[derive(Debug, Clone)]
pub struct Assert {
    ctx: ExecutionContext,
}

impl Assert {
    /// A facade bound to the flow's ambient context.
    pub fn current() -> Self {
        Self {
            ctx: ExecutionContext::current(),
        }
    }

    /// A facade bound to an explicit context.
    pub fn with_context(ctx: ExecutionContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    // -- Constraint assertions ------------------------------------------------

    /// Assert that `actual` satisfies `constraint`. Inside a Multiple block a
    /// failure is deferred and `Ok(())` returned; otherwise it is the error.
    pub fn that(
        &self,
        actual: impl Into<Value>,
        constraint: impl IntoConstraint,
    ) -> VerdictResult<()> {
        self.evaluate(actual.into(), constraint, None)
    }

    /// Shorthand for the most common assertion: equality under the context's
    /// default tolerance (exact unless reconfigured). An explicit
    /// `Is::equal_to(..).within(..)` always takes precedence over the
    /// default.
    pub fn equals(
        &self,
        actual: impl Into<Value>,
        expected: impl Into<Value>,
    ) -> VerdictResult<()> {
        self.that(
            actual,
            verdict_constraints::Is::equal_to(expected).within(self.ctx.default_tolerance()),
        )
    }

    /// Like [`Assert::that`] with a caller message prepended to any failure.
    pub fn that_with(
        &self,
        actual: impl Into<Value>,
        constraint: impl IntoConstraint,
        message: impl Into<String>,
    ) -> VerdictResult<()> {
        self.evaluate(actual.into(), constraint, Some(message.into()))
    }

    fn evaluate(
        &self,
        actual: Value,
        constraint: impl IntoConstraint,
        message: Option<String>,
    ) -> VerdictResult<()> {
        // Malformed constraints abort immediately, deferred or not.
        let constraint = constraint.into_constraint()?;
        self.ctx.increment_assert_count();
        let result = constraint.apply_to(&actual)?;
        if result.is_success() {
            return Ok(());
        }
        let rendered = self.ctx.format_value(result.actual());
        let mut failure = AssertionFailure::new(result.description(), rendered);
        if let Some(message) = message {
            failure = failure.with_message(message);
        }
        self.report_failure(failure)
    }

    fn report_failure(&self, failure: AssertionFailure) -> VerdictResult<()> {
        if self.ctx.in_multiple() {
            self.ctx
                .defer(OutcomeRecord::new(OutcomeKind::Fail, failure.to_string()));
            Ok(())
        } else {
            Err(VerdictError::Assertion(failure))
        }
    }

    // -- Direct outcome signals -----------------------------------------------

    /// End the test body early with a passing outcome. Inside a Multiple
    /// block the outcome is deferred like any other report instead of
    /// unwinding.
    pub fn pass(&self, message: impl Into<String>) -> VerdictResult<()> {
        self.signal(OutcomeKind::Pass, message.into())
    }

    /// Fail unconditionally. Deferred inside a Multiple block like any other
    /// assertion failure.
    pub fn fail(&self, message: impl Into<String>) -> VerdictResult<()> {
        self.ctx.increment_assert_count();
        let message = message.into();
        if self.ctx.in_multiple() {
            self.ctx.defer(OutcomeRecord::new(OutcomeKind::Fail, message));
            Ok(())
        } else {
            Err(VerdictError::Signal {
                kind: OutcomeKind::Fail,
                message,
            })
        }
    }

    /// Record a warning without failing. Inside a Multiple block the warning
    /// joins the deferred record; it never turns the aggregate into a
    /// failure on its own.
    pub fn warn(&self, message: impl Into<String>) -> VerdictResult<()> {
        let message = message.into();
        if self.ctx.in_multiple() {
            self.ctx.defer(OutcomeRecord::new(OutcomeKind::Warn, message));
        } else {
            warn!(message = %message, "assertion warning");
        }
        Ok(())
    }

    /// End the test body early, marking it ignored. Deferred inside a
    /// Multiple block.
    pub fn ignore(&self, message: impl Into<String>) -> VerdictResult<()> {
        self.signal(OutcomeKind::Ignore, message.into())
    }

    /// End the test body early with an inconclusive outcome. Deferred inside
    /// a Multiple block.
    pub fn inconclusive(&self, message: impl Into<String>) -> VerdictResult<()> {
        self.signal(OutcomeKind::Inconclusive, message.into())
    }

    fn signal(&self, kind: OutcomeKind, message: String) -> VerdictResult<()> {
        if self.ctx.in_multiple() {
            self.ctx.defer(OutcomeRecord::new(kind, message));
            return Ok(());
        }
        Err(VerdictError::Signal { kind, message })
    }

    // -- Multiple-assert blocks -----------------------------------------------

    /// Run `body` with assertion failures and outcome signals deferred. At
    /// the end of the block the deferred outcomes are flushed: any failure
    /// produces one aggregated error preserving original order. Only a
    /// configuration error returned by the body aborts the block and
    /// discards the deferred outcomes; any other escaped error is recorded
    /// with the block's outcomes and flushed with them.
    pub fn multiple<F>(&self, body: F) -> VerdictResult<()>
    where
        F: FnOnce(&Assert) -> VerdictResult<()>,
    {
        let guard = self.ctx.enter_multiple();
        self.leave_multiple(guard, body(self))
    }

    /// Async form of [`Assert::multiple`]. The block is not left until the
    /// future has completed, so assertions after an `.await` still defer.
    pub async fn multiple_async<F, Fut>(&self, body: F) -> VerdictResult<()>
    where
        F: FnOnce(Assert) -> Fut,
        Fut: Future<Output = VerdictResult<()>>,
    {
        let guard = self.ctx.enter_multiple();
        let result = body(self.clone()).await;
        self.leave_multiple(guard, result)
    }

    fn leave_multiple(
        &self,
        guard: verdict_context::MultipleGuard,
        result: VerdictResult<()>,
    ) -> VerdictResult<()> {
        match result {
            Ok(()) => guard.finish(),
            Err(err @ VerdictError::Config(_)) => {
                guard.abandon();
                Err(err)
            }
            Err(err) => {
                // An error the body let escape still belongs to the block:
                // record it alongside what was already deferred.
                self.ctx
                    .defer(OutcomeRecord::new(err.outcome_kind(), err.to_string()));
                guard.finish()
            }
        }
    }
}

/// Assert against the ambient context: `that(actual, Is::equal_to(3))`.
pub fn that(actual: impl Into<Value>, constraint: impl IntoConstraint) -> VerdictResult<()> {
    Assert::current().that(actual, constraint)
}

/// [`that`] with a caller message prepended to any failure.
pub fn that_with(
    actual: impl Into<Value>,
    constraint: impl IntoConstraint,
    message: impl Into<String>,
) -> VerdictResult<()> {
    Assert::current().that_with(actual, constraint, message)
}

/// Run a Multiple block against the ambient context.
pub fn multiple<F>(body: F) -> VerdictResult<()>
where
    F: FnOnce(&Assert) -> VerdictResult<()>,
{
    Assert::current().multiple(body)
}

// =============================================================================
// TESTS
// =============================================================================
