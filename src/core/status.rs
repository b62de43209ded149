//! Lifecycle status of a submitted task.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a task handle, ordered by "done-ness".
///
/// `Waiting` is assigned at submission, `Executing` once the dispatch loop
/// claims the task. Every other variant is terminal: the task will not run
/// (again). Terminal variants compare greater than or equal to `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Queued, waiting for dispatch.
    Waiting = 0,
    /// Claimed by the dispatch loop and handed to the execution pool.
    Executing = 1,
    /// Finished normally; the result is available.
    Completed = 2,
    /// A hook or the main operation failed.
    Error = 3,
    /// Cancelled by the caller.
    Canceled = 4,
    /// The supervising wait exceeded the task timeout.
    Timeout = 5,
    /// Submission or supervision was interrupted.
    Interrupted = 6,
}

impl TaskStatus {
    /// Numeric ordinal of the status.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Whether the status is terminal (ordinal at or above `Completed`).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.ordinal() >= Self::Completed.ordinal()
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    ///
    /// Terminal states accept nothing; otherwise the target must be strictly
    /// further along.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        !self.is_terminal() && next.ordinal() > self.ordinal()
    }

    /// Upper-case name, as used in logs and serialized forms.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Executing => "EXECUTING",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
            Self::Canceled => "CANCELED",
            Self::Timeout => "TIMEOUT",
            Self::Interrupted => "INTERRUPTED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
