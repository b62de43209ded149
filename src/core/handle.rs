//! Caller-facing handle for one submitted task.
//!
//! The handle is shared between the caller and the dispatch machinery. All of
//! its mutable state lives behind one mutex paired with a condition variable,
//! so waiters sleep until a transition happens instead of polling.
//!
//! Lock order: the handle lock may be held while the execution lock is taken,
//! never the other way around.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::core::execution::Execution;
use crate::core::status::TaskStatus;

struct HandleState<T> {
    status: TaskStatus,
    result: Option<T>,
    execution: Option<Arc<Execution<T>>>,
    cancel_requested: bool,
}

struct HandleShared<T> {
    task_id: String,
    timeout: Option<Duration>,
    state: Mutex<HandleState<T>>,
    changed: Condvar,
}

/// Proxy for one submitted task: identity, status, cancellation and result.
///
/// Cloning is cheap; every clone observes the same task.
pub struct TaskHandle<T> {
    shared: Arc<HandleShared<T>>,
}

impl<T> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        Self {
            shared: Arc::new(HandleShared {
                task_id: Uuid::new_v4().simple().to_string(),
                timeout,
                state: Mutex::new(HandleState {
                    status: TaskStatus::Waiting,
                    result: None,
                    execution: None,
                    cancel_requested: false,
                }),
                changed: Condvar::new(),
            }),
        }
    }

    /// Unique identifier: 32 lowercase hex characters.
    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.shared.task_id
    }

    /// Per-task timeout, if one overrides the executor default.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.shared.timeout
    }

    /// Current status snapshot.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.shared.state.lock().status
    }

    /// Whether the status is terminal.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status().is_terminal()
    }

    /// Whether the status is [`TaskStatus::Canceled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.status() == TaskStatus::Canceled
    }

    /// Request cancellation, interrupting the body if `interrupt_if_running`.
    ///
    /// - A task still waiting in the queue is cancelled in place: it becomes
    ///   `CANCELED` right away and is skipped by the dispatch loop. Returns `true`.
    /// - An executing task is cancelled through its execution. If that
    ///   succeeds the handle becomes `CANCELED` and `true` is returned;
    ///   `false` means the body already finished and its real outcome stands.
    /// - A terminal handle keeps its status. If its body is still running
    ///   (e.g. after a timeout) the request is forwarded to it and the
    ///   result of that is returned.
    ///
    /// Repeated or concurrent calls are safe; only the first one takes effect.
    pub fn cancel(&self, interrupt_if_running: bool) -> bool {
        let mut state = self.shared.state.lock();
        match state.status {
            TaskStatus::Waiting => {
                state.cancel_requested = true;
                state.status = TaskStatus::Canceled;
                drop(state);
                self.shared.changed.notify_all();
                debug!(task_id = %self.shared.task_id, "task cancelled before dispatch");
                true
            }
            TaskStatus::Executing => {
                let cancelled = state
                    .execution
                    .as_ref()
                    .is_some_and(|execution| execution.cancel(interrupt_if_running));
                if cancelled {
                    state.cancel_requested = true;
                    state.status = TaskStatus::Canceled;
                    drop(state);
                    self.shared.changed.notify_all();
                    debug!(
                        task_id = %self.shared.task_id,
                        interrupt = interrupt_if_running,
                        "task cancelled while executing"
                    );
                }
                cancelled
            }
            _ => state
                .execution
                .as_ref()
                .is_some_and(|execution| execution.cancel(interrupt_if_running)),
        }
    }

    /// Wait at most `timeout` for a terminal status.
    ///
    /// Returns `true` iff a terminal status was observed in time; inspect
    /// [`status`](Self::status) to learn which one. On a local timeout an
    /// execution that is still running is cancelled with interruption.
    pub fn wait_for_timeout(&self, timeout: Duration) -> bool {
        let mut state = self.shared.state.lock();
        self.shared
            .changed
            .wait_while_for(&mut state, |state| !state.status.is_terminal(), timeout);
        if state.status.is_terminal() {
            return true;
        }
        if let Some(execution) = state.execution.as_ref() {
            if execution.cancel(true) {
                debug!(
                    task_id = %self.shared.task_id,
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "local wait timed out, execution cancelled"
                );
            }
        }
        false
    }

    pub(crate) fn transition(&self, next: TaskStatus) -> bool {
        let mut state = self.shared.state.lock();
        if !state.status.can_advance_to(next) {
            return false;
        }
        state.status = next;
        drop(state);
        self.shared.changed.notify_all();
        debug!(task_id = %self.shared.task_id, status = %next, "task status changed");
        true
    }

    /// Move WAITING to EXECUTING and attach the execution in one step.
    ///
    /// `false` if the task left WAITING first (cancelled in the queue).
    pub(crate) fn begin_execution(&self, execution: Arc<Execution<T>>) -> bool {
        let mut state = self.shared.state.lock();
        if state.status != TaskStatus::Waiting {
            return false;
        }
        state.status = TaskStatus::Executing;
        state.execution = Some(execution);
        drop(state);
        self.shared.changed.notify_all();
        debug!(task_id = %self.shared.task_id, "task executing");
        true
    }

    /// Store the result and move to COMPLETED atomically.
    pub(crate) fn complete(&self, value: T) -> bool {
        let mut state = self.shared.state.lock();
        if !state.status.can_advance_to(TaskStatus::Completed) {
            return false;
        }
        state.result = Some(value);
        state.status = TaskStatus::Completed;
        drop(state);
        self.shared.changed.notify_all();
        debug!(task_id = %self.shared.task_id, "task completed");
        true
    }
}

impl<T: Clone> TaskHandle<T> {
    /// Block until the task reaches a terminal status or is cancelled.
    ///
    /// On return an execution that is still running (e.g. after a timeout)
    /// is cancelled with interruption. Returns the result, which is present
    /// only when the status is [`TaskStatus::Completed`].
    pub fn wait_for(&self) -> Option<T> {
        let mut state = self.shared.state.lock();
        self.shared.changed.wait_while(&mut state, |state| {
            !state.status.is_terminal() && !state.cancel_requested
        });
        if let Some(execution) = state.execution.as_ref() {
            if !execution.is_done() {
                execution.cancel(true);
            }
        }
        state.result.clone()
    }

    /// The stored result, without waiting. Present only once COMPLETED.
    #[must_use]
    pub fn exit_value(&self) -> Option<T> {
        self.shared.state.lock().result.clone()
    }
}

#[cfg(feature = "tokio-runtime")]
impl<T: Clone + Send + 'static> TaskHandle<T> {
    /// [`wait_for`](Self::wait_for) on tokio's blocking pool.
    pub async fn wait_async(&self) -> Option<T> {
        let handle = self.clone();
        tokio::task::spawn_blocking(move || handle.wait_for())
            .await
            .ok()
            .flatten()
    }

    /// [`wait_for_timeout`](Self::wait_for_timeout) on tokio's blocking pool.
    pub async fn wait_for_timeout_async(&self, timeout: Duration) -> bool {
        let handle = self.clone();
        tokio::task::spawn_blocking(move || handle.wait_for_timeout(timeout))
            .await
            .unwrap_or(false)
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("task_id", &self.shared.task_id)
            .field("status", &self.status())
            .field("timeout", &self.shared.timeout)
            .finish()
    }
}
