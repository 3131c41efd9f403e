//! VERDICT Context - Execution State
//!
//! The per-flow execution context for the VERDICT assertion framework:
//! - Assertion counter (atomic, shared by reference across isolated children)
//! - Multiple-assert nesting with an ordered deferred-outcome accumulator
//! - Swappable value formatter and default tolerance
//! - Listener notifications (test started/finished)
//! - Ambient propagation: thread-local for sync flows, a tokio task-local for
//!   async flows, so continuations resuming on another worker still see their
//!   own flow's context
//!
//! Every public entry point of the framework takes an explicit context
//! handle; the ambient lookup exists only at the outermost boundary
//! (`ExecutionContext::current`).

use std::cell::RefCell;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use verdict_core::{
    default_formatter, MultipleFailure, OutcomeRecord, Tolerance, Value, ValueFormatter,
    VerdictError, VerdictResult,
};

// ============================================================================
// LISTENER
// ============================================================================

/// Collaborator notified as tests start and finish. The runner supplies one;
/// `NullListener` is the default.
pub trait TestListener: Send + Sync {
    fn test_started(&self, name: &str);
    fn test_finished(&self, name: &str, outcome: &OutcomeRecord);
}

/// Listener that discards every notification.
#[derive(Debug, Default)]
pub struct NullListener;

impl TestListener for NullListener {
    fn test_started(&self, _name: &str) {}
    fn test_finished(&self, _name: &str, _outcome: &OutcomeRecord) {}
}

// ============================================================================
// EXECUTION CONTEXT
// ============================================================================

fn poison_free<'a, T>(lock: &'a RwLock<T>) -> std::sync::RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct ContextInner {
    /// Shared by reference across isolated children: the counter is a
    /// property of the logical test, not of one scope.
    assert_count: Arc<AtomicUsize>,
    /// Nonzero while inside one or more Multiple blocks. Scoped by value:
    /// isolated children start at zero.
    multiple_depth: AtomicUsize,
    /// Outcomes deferred while inside a Multiple block, in original order.
    deferred: Mutex<Vec<OutcomeRecord>>,
    formatter: RwLock<ValueFormatter>,
    default_tolerance: RwLock<Tolerance>,
    listener: RwLock<Arc<dyn TestListener>>,
}

/// A snapshot of execution state owned by one logical flow of control.
/// Cloning shares the snapshot (contexts compare by identity, see `ptr_eq`).
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("assert_count", &self.assert_count())
            .field("multiple_depth", &self.multiple_depth())
            .finish()
    }
}

thread_local! {
    // Explicit overrides installed by establish().
    static CURRENT: RefCell<Option<ExecutionContext>> = const { RefCell::new(None) };
    // Ad-hoc root created on first ambient lookup. Kept separate from
    // CURRENT so it never shadows a later task-local scope on this thread.
    static AD_HOC: RefCell<Option<ExecutionContext>> = const { RefCell::new(None) };
}

tokio::task_local! {
    static TASK_CURRENT: ExecutionContext;
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::root()
    }
}

impl ExecutionContext {
    /// A fresh root context with default settings.
    pub fn root() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                assert_count: Arc::new(AtomicUsize::new(0)),
                multiple_depth: AtomicUsize::new(0),
                deferred: Mutex::new(Vec::new()),
                formatter: RwLock::new(default_formatter()),
                default_tolerance: RwLock::new(Tolerance::exact()),
                listener: RwLock::new(Arc::new(NullListener)),
            }),
        }
    }

    /// The ambient context for this flow: the thread-current override if one
    /// is established, else the enclosing task-local scope, else an ad-hoc
    /// root created (and installed thread-locally) on first use.
    pub fn current() -> Self {
        if let Some(ctx) = CURRENT.with(|c| c.borrow().clone()) {
            return ctx;
        }
        if let Ok(ctx) = TASK_CURRENT.try_with(|c| c.clone()) {
            return ctx;
        }
        if let Some(ctx) = AD_HOC.with(|c| c.borrow().clone()) {
            return ctx;
        }
        let ctx = Self::root();
        tracing::debug!("creating ad-hoc execution context");
        AD_HOC.with(|c| *c.borrow_mut() = Some(ctx.clone()));
        ctx
    }

    /// An isolated child: settings copied from this context, assertion
    /// counter shared by reference, multiple-assert state fresh.
    pub fn isolated(&self) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                assert_count: self.inner.assert_count.clone(),
                multiple_depth: AtomicUsize::new(0),
                deferred: Mutex::new(Vec::new()),
                formatter: RwLock::new(poison_free(&self.inner.formatter).clone()),
                default_tolerance: RwLock::new(*poison_free(&self.inner.default_tolerance)),
                listener: RwLock::new(poison_free(&self.inner.listener).clone()),
            }),
        }
    }

    /// Identity comparison: two handles to the same snapshot.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    // -- Ambient establishment ------------------------------------------------

    /// Make this context the thread-current one until the returned guard is
    /// dropped. The prior context is restored on every exit path, including
    /// panics. Scopes nest LIFO.
    ///
    /// For async flows use [`ExecutionContext::scope`] instead; holding a
    /// `ContextScope` across an `.await` would leave the override on
    /// whichever worker thread resumes the task.
    pub fn establish(&self) -> ContextScope {
        let prior = CURRENT.with(|c| c.borrow_mut().replace(self.clone()));
        tracing::debug!("established execution context");
        ContextScope { prior }
    }

    /// Run a future with this context as the flow's ambient context. The
    /// binding follows the task across suspension points and workers.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        TASK_CURRENT.scope(self, fut).await
    }

    // -- Assertion counter ----------------------------------------------------

    pub fn increment_assert_count(&self) -> usize {
        self.inner.assert_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn assert_count(&self) -> usize {
        self.inner.assert_count.load(Ordering::SeqCst)
    }

    // -- Settings -------------------------------------------------------------

    pub fn format_value(&self, value: &Value) -> String {
        let formatter = poison_free(&self.inner.formatter);
        (formatter.as_ref())(value)
    }

    pub fn set_formatter(&self, formatter: ValueFormatter) {
        *self
            .inner
            .formatter
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = formatter;
    }

    pub fn default_tolerance(&self) -> Tolerance {
        *poison_free(&self.inner.default_tolerance)
    }

    pub fn set_default_tolerance(&self, tolerance: Tolerance) {
        *self
            .inner
            .default_tolerance
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = tolerance;
    }

    pub fn set_listener(&self, listener: Arc<dyn TestListener>) {
        *self
            .inner
            .listener
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = listener;
    }

    // -- Listener forwarding --------------------------------------------------

    pub fn notify_test_started(&self, name: &str) {
        tracing::debug!(test = name, "test started");
        poison_free(&self.inner.listener).test_started(name);
    }

    pub fn notify_test_finished(&self, name: &str, outcome: &OutcomeRecord) {
        tracing::debug!(test = name, kind = %outcome.kind, "test finished");
        poison_free(&self.inner.listener).test_finished(name, outcome);
    }

    // -- Multiple-assert mode -------------------------------------------------

    /// Enter a Multiple block. While the returned guard (or any nested one)
    /// is alive, outcomes are deferred instead of unwinding.
    pub fn enter_multiple(&self) -> MultipleGuard {
        let depth = self.inner.multiple_depth.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(depth, "entered multiple-assert block");
        MultipleGuard {
            ctx: self.clone(),
            armed: true,
        }
    }

    pub fn in_multiple(&self) -> bool {
        self.multiple_depth() > 0
    }

    pub fn multiple_depth(&self) -> usize {
        self.inner.multiple_depth.load(Ordering::SeqCst)
    }

    /// Record a deferred outcome, preserving order.
    pub fn defer(&self, record: OutcomeRecord) {
        tracing::trace!(kind = %record.kind, "deferred outcome");
        self.inner
            .deferred
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    fn take_deferred(&self) -> Vec<OutcomeRecord> {
        std::mem::take(
            &mut *self
                .inner
                .deferred
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

// ============================================================================
// SCOPE GUARDS
// ============================================================================

/// Guard returned by [`ExecutionContext::establish`]. Restores the prior
/// thread-current context when dropped.
#[must_use = "dropping the scope immediately restores the prior context"]
pub struct ContextScope {
    prior: Option<ExecutionContext>,
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        let prior = self.prior.take();
        CURRENT.with(|c| *c.borrow_mut() = prior);
    }
}

/// Guard for one Multiple block level. The depth decrement is tied to drop,
/// so it happens after the guarded body - sync or awaited - has completed on
/// every exit path.
#[must_use = "dropping the guard leaves the block without flushing deferred outcomes"]
pub struct MultipleGuard {
    ctx: ExecutionContext,
    armed: bool,
}

impl MultipleGuard {
    /// Leave the block. On the outermost exit, flush the deferred outcomes:
    /// any deferred failure raises one aggregated `MultipleFailure`
    /// preserving original order; otherwise the block completes silently.
    pub fn finish(mut self) -> VerdictResult<()> {
        self.disarm();
        if self.ctx.in_multiple() {
            // Still nested: the outermost guard owns the flush.
            return Ok(());
        }
        let entries = self.ctx.take_deferred();
        if entries.iter().any(|e| e.is_failure()) {
            return Err(VerdictError::Multiple(MultipleFailure { entries }));
        }
        Ok(())
    }

    /// Leave the block discarding deferred outcomes (used when a
    /// configuration error aborts the block).
    pub fn abandon(mut self) {
        self.disarm();
        if !self.ctx.in_multiple() {
            self.ctx.take_deferred();
        }
    }

    fn disarm(&mut self) {
        if self.armed {
            self.armed = false;
            let depth = self.ctx.inner.multiple_depth.fetch_sub(1, Ordering::SeqCst) - 1;
            tracing::trace!(depth, "left multiple-assert block");
        }
    }
}

impl Drop for MultipleGuard {
    fn drop(&mut self) {
        self.disarm();
    }
}

// =============================================================================
// TESTS
// =============================================================================
