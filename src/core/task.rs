//! Task capability set: plain tasks, tasks with hooks, and their context.
//!
//! A plain task only provides [`SimpleTask::execute`]. A task that also wants
//! to run code immediately before and after the main operation implements
//! [`Task`] and is submitted as [`TaskBody::Hooked`]. The executor picks the
//! variant from the tag, never by inspecting the value at runtime.
//!
//! ```rust
//! use queue_task_executor::core::{TaskBody, TaskContext};
//! use std::time::Duration;
//!
//! let body: TaskBody<String> = TaskBody::from_fn(|ctx: &TaskContext| {
//!     ctx.sleep(Duration::from_millis(1))?;
//!     Ok(format!("done {}", ctx.task_id()))
//! });
//! assert!(!body.has_hooks());
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::core::error::{AppResult, Interrupted, TaskFailure, TaskPhase};
use crate::core::execution::InterruptSignal;

/// A unit of work producing a `T`.
///
/// Closures of the shape `FnMut(&TaskContext) -> AppResult<T>` implement this
/// trait directly.
pub trait SimpleTask<T>: Send {
    /// Run the main operation.
    ///
    /// # Errors
    ///
    /// Any error marks the task as failed.
    fn execute(&mut self, ctx: &TaskContext) -> AppResult<T>;
}

impl<T, F> SimpleTask<T> for F
where
    F: FnMut(&TaskContext) -> AppResult<T> + Send,
{
    fn execute(&mut self, ctx: &TaskContext) -> AppResult<T> {
        self(ctx)
    }
}

/// A task with `before`/`after` hooks around the main operation.
///
/// All three run on the same worker in one failure scope: a failure in any
/// of them marks the task as failed.
pub trait Task<T>: SimpleTask<T> {
    /// Runs immediately before [`SimpleTask::execute`].
    ///
    /// # Errors
    ///
    /// An error skips the main operation and fails the task.
    fn before(&mut self, ctx: &TaskContext) -> AppResult<()>;

    /// Runs immediately after [`SimpleTask::execute`] with its output.
    ///
    /// # Errors
    ///
    /// An error fails the task even though the main operation succeeded.
    fn after(&mut self, ctx: &TaskContext, output: &T) -> AppResult<()>;
}

/// A submitted task body, tagged by capability.
pub enum TaskBody<T> {
    /// Main operation only.
    Simple(Box<dyn SimpleTask<T>>),
    /// Main operation wrapped by `before` and `after` hooks.
    Hooked(Box<dyn Task<T>>),
}

impl<T> TaskBody<T> {
    /// Wrap a plain task.
    pub fn simple(task: impl SimpleTask<T> + 'static) -> Self {
        Self::Simple(Box::new(task))
    }

    /// Wrap a task that carries hooks.
    pub fn hooked(task: impl Task<T> + 'static) -> Self {
        Self::Hooked(Box::new(task))
    }

    /// Wrap a closure as a plain task.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(&TaskContext) -> AppResult<T> + Send + 'static,
    {
        Self::simple(f)
    }

    /// Whether the body carries `before`/`after` hooks.
    #[must_use]
    pub const fn has_hooks(&self) -> bool {
        matches!(self, Self::Hooked(_))
    }

    /// Run every phase of the body once, catching errors and panics.
    pub(crate) fn run(self, ctx: &TaskContext) -> Result<T, TaskFailure> {
        match self {
            Self::Simple(mut task) => guarded(TaskPhase::Execute, || task.execute(ctx)),
            Self::Hooked(mut task) => {
                guarded(TaskPhase::Before, || task.before(ctx))?;
                let output = guarded(TaskPhase::Execute, || task.execute(ctx))?;
                guarded(TaskPhase::After, || task.after(ctx, &output))?;
                Ok(output)
            }
        }
    }
}

impl<T> fmt::Debug for TaskBody<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.has_hooks() { "Hooked" } else { "Simple" };
        f.debug_tuple("TaskBody").field(&kind).finish()
    }
}

fn guarded<R>(phase: TaskPhase, f: impl FnOnce() -> AppResult<R>) -> Result<R, TaskFailure> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(TaskFailure {
            phase,
            message: format!("{err:#}"),
            panicked: false,
        }),
        Err(payload) => Err(TaskFailure {
            phase,
            message: panic_message(payload.as_ref()),
            panicked: true,
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Context handed to every phase of a running task.
///
/// Cancellation is cooperative: a body that wants to stop early when its
/// handle is cancelled with interruption checks [`is_interrupted`] or sleeps
/// through [`sleep`], which returns as soon as the interruption arrives.
///
/// [`is_interrupted`]: TaskContext::is_interrupted
/// [`sleep`]: TaskContext::sleep
#[derive(Clone)]
pub struct TaskContext {
    task_id: Arc<str>,
    interrupt: Arc<InterruptSignal>,
}

impl TaskContext {
    pub(crate) fn bound(task_id: String, interrupt: Arc<InterruptSignal>) -> Self {
        Self {
            task_id: task_id.into(),
            interrupt,
        }
    }

    /// A context not attached to any execution; it is never interrupted.
    ///
    /// Useful for driving a task body directly, e.g. in tests.
    #[must_use]
    pub fn detached(task_id: impl Into<String>) -> Self {
        Self::bound(task_id.into(), Arc::new(InterruptSignal::new()))
    }

    /// Identifier of the task being run.
    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Whether cancellation with interruption has been requested.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_raised()
    }

    /// Fail fast if interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] once the execution was cancelled with interruption.
    pub fn check_interrupted(&self) -> Result<(), Interrupted> {
        if self.is_interrupted() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration`, waking early on interruption.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] if interrupted before or during the sleep.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        self.interrupt.sleep(duration)
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("task_id", &self.task_id)
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}
