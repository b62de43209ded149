//! The in-flight execution of one task on the execution pool.
//!
//! An [`Execution`] is shared by three parties: the worker running the body,
//! the dispatcher unit supervising it under a timeout, and the caller's
//! handle (for cancellation). Every state change happens under one mutex and
//! is broadcast on a condition variable, so cancelling, finishing and
//! abandoning are idempotent and race-free: only the first one that finds the
//! execution still pending or running takes effect.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::core::error::{Interrupted, TaskFailure};
use crate::core::task::{TaskBody, TaskContext};

/// Cooperative interruption flag observed by task bodies.
///
/// Raised when an execution is cancelled with interruption. Bodies see it
/// through [`TaskContext`]; a sleeping body is woken immediately.
#[derive(Debug, Default)]
pub(crate) struct InterruptSignal {
    raised: Mutex<bool>,
    wake: Condvar,
}

impl InterruptSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn raise(&self) {
        let mut raised = self.raised.lock();
        *raised = true;
        self.wake.notify_all();
    }

    pub(crate) fn is_raised(&self) -> bool {
        *self.raised.lock()
    }

    /// Sleep for `duration` unless interrupted first.
    pub(crate) fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let mut raised = self.raised.lock();
        if !*raised {
            self.wake.wait_while_for(&mut raised, |raised| !*raised, duration);
        }
        if *raised {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecutionState {
    /// Handed to the pool, not yet picked up by a worker.
    Pending,
    /// A worker is running the body.
    Running,
    /// The body returned; the outcome is stored.
    Finished,
    /// Cancelled before the body returned.
    Cancelled,
    /// The job was dropped without ever running (pool closed).
    Abandoned,
}

impl ExecutionState {
    const fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

struct ExecutionInner<T> {
    state: ExecutionState,
    outcome: Option<Result<T, TaskFailure>>,
}

/// What the supervising wait observed.
#[derive(Debug)]
pub(crate) enum ExecutionWait<T> {
    /// The body returned or failed.
    Finished(Result<T, TaskFailure>),
    /// The execution was cancelled.
    Cancelled,
    /// The job was dropped without running.
    Abandoned,
    /// The bound expired while the body was still pending or running.
    TimedOut,
}

/// Future-like record of one execution attempt.
pub(crate) struct Execution<T> {
    inner: Mutex<ExecutionInner<T>>,
    changed: Condvar,
    interrupt: Arc<InterruptSignal>,
}

impl<T> Execution<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(ExecutionInner {
                state: ExecutionState::Pending,
                outcome: None,
            }),
            changed: Condvar::new(),
            interrupt: Arc::new(InterruptSignal::new()),
        })
    }

    pub(crate) fn interrupt_signal(&self) -> Arc<InterruptSignal> {
        Arc::clone(&self.interrupt)
    }

    /// Worker side: claim the execution. `false` if it was cancelled first.
    fn begin(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != ExecutionState::Pending {
            return false;
        }
        inner.state = ExecutionState::Running;
        drop(inner);
        self.changed.notify_all();
        true
    }

    /// Worker side: store the outcome. Discarded if cancelled meanwhile.
    fn finish(&self, outcome: Result<T, TaskFailure>) {
        let mut inner = self.inner.lock();
        if inner.state != ExecutionState::Running {
            return;
        }
        inner.state = ExecutionState::Finished;
        inner.outcome = Some(outcome);
        drop(inner);
        self.changed.notify_all();
    }

    fn abandon(&self) {
        let mut inner = self.inner.lock();
        if !inner.state.is_live() {
            return;
        }
        inner.state = ExecutionState::Abandoned;
        drop(inner);
        self.changed.notify_all();
    }

    /// Request cancellation, interrupting the body if asked to.
    ///
    /// Returns `false` when the execution already finished, was cancelled or
    /// was abandoned, so repeated or concurrent calls are harmless.
    pub(crate) fn cancel(&self, interrupt: bool) -> bool {
        let mut inner = self.inner.lock();
        if !inner.state.is_live() {
            return false;
        }
        inner.state = ExecutionState::Cancelled;
        drop(inner);
        if interrupt {
            self.interrupt.raise();
        }
        self.changed.notify_all();
        true
    }

    /// Whether the execution reached any final state.
    pub(crate) fn is_done(&self) -> bool {
        !self.inner.lock().state.is_live()
    }

    #[cfg(test)]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.inner.lock().state == ExecutionState::Cancelled
    }

    /// Supervisor side: wait for a final state, bounded by `timeout`.
    ///
    /// A timed-out execution is left running; only the caller's view changes.
    pub(crate) fn wait(&self, timeout: Duration) -> ExecutionWait<T> {
        let mut inner = self.inner.lock();
        self.changed
            .wait_while_for(&mut inner, |inner| inner.state.is_live(), timeout);
        match inner.state {
            ExecutionState::Finished => inner
                .outcome
                .take()
                .map_or(ExecutionWait::Abandoned, ExecutionWait::Finished),
            ExecutionState::Cancelled => ExecutionWait::Cancelled,
            ExecutionState::Abandoned => ExecutionWait::Abandoned,
            ExecutionState::Pending | ExecutionState::Running => ExecutionWait::TimedOut,
        }
    }
}

impl<T> fmt::Debug for Execution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("state", &self.inner.lock().state)
            .finish_non_exhaustive()
    }
}

/// The unit of work handed to the execution pool.
///
/// Dropping it without running marks the execution abandoned, so a
/// supervisor never waits on a job that the pool discarded.
pub(crate) struct ExecutionJob<T> {
    execution: Arc<Execution<T>>,
    body: Option<TaskBody<T>>,
    ctx: TaskContext,
}

impl<T> ExecutionJob<T> {
    pub(crate) fn new(
        execution: Arc<Execution<T>>,
        body: TaskBody<T>,
        ctx: TaskContext,
    ) -> Self {
        Self {
            execution,
            body: Some(body),
            ctx,
        }
    }

    pub(crate) fn run(mut self) {
        let Some(body) = self.body.take() else {
            return;
        };
        if !self.execution.begin() {
            tracing::debug!(
                task_id = %self.ctx.task_id(),
                "execution cancelled before a worker picked it up"
            );
            return;
        }
        let outcome = body.run(&self.ctx);
        self.execution.finish(outcome);
    }
}

impl<T> Drop for ExecutionJob<T> {
    fn drop(&mut self) {
        if self.body.is_some() {
            self.execution.abandon();
        }
    }
}
