//! Core executor abstractions: task status, admission, handles and dispatch.

pub mod error;
pub mod executor;
pub mod handle;
pub mod latch;
pub mod stats;
pub mod status;
pub mod task;

pub(crate) mod execution;
pub(crate) mod worker_pool;

pub use error::{AppResult, ExecutorError, Interrupted, TaskFailure, TaskPhase};
pub use executor::QueueExecutor;
pub use handle::TaskHandle;
pub use latch::{AdmissionLatch, AdmissionSlot};
pub use stats::ExecutorStats;
pub use status::TaskStatus;
pub use task::{SimpleTask, Task, TaskBody, TaskContext};
