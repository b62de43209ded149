//! Error types for executor and task operations.

use std::fmt;

use thiserror::Error;

/// Errors produced while building or starting an executor.
///
/// Task outcomes never surface here; they are reported through
/// [`TaskStatus`](crate::core::TaskStatus) on the handle.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An OS thread could not be spawned.
    #[error("failed to spawn {what} thread: {source}")]
    Spawn {
        /// Which thread role failed.
        what: &'static str,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// The executor has already been shut down.
    #[error("executor has been shut down")]
    ShutDown,
}

/// Application-facing result using anyhow for higher-level contexts.
///
/// Task bodies and hooks return this so they can propagate any error with `?`.
pub type AppResult<T> = Result<T, anyhow::Error>;

/// Phase of an execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    /// The `before` hook.
    Before,
    /// The main operation.
    Execute,
    /// The `after` hook.
    After,
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Before => "before hook",
            Self::Execute => "execution",
            Self::After => "after hook",
        };
        f.write_str(name)
    }
}

/// A failure raised by a task body, tagged with the phase that raised it.
///
/// All phases collapse to [`TaskStatus::Error`](crate::core::TaskStatus::Error);
/// the phase only feeds diagnostics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("task failed during {phase}: {message}")]
pub struct TaskFailure {
    /// Phase that failed.
    pub phase: TaskPhase,
    /// Error message or panic payload.
    pub message: String,
    /// Whether the failure was a panic rather than a returned error.
    pub panicked: bool,
}

/// Returned by cooperative checks when the execution has been interrupted.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("task interrupted")]
pub struct Interrupted;
