//! # Queue Task Executor
//!
//! A bounded-concurrency task queue executor: submit many units of work,
//! bound how many run at once, and get a handle per task.
//!
//! Submitted tasks enter a capacity-limited FIFO queue. A dispatch loop moves
//! them onto a fixed pool of worker threads, never letting more than
//! `worker_concurrency` of them be in flight, and supervises each under a
//! timeout. Every submission returns a [`TaskHandle`](core::TaskHandle) that
//! can be polled, waited on (with or without a bound), cancelled, and asked
//! for the result.
//!
//! ## Key Features
//!
//! - **True backpressure**: `submit` blocks while the queue is full
//! - **Admission latch**: a slot is held from dispatch until the outcome is known
//! - **Per-task timeouts**: the executor default or a per-submission override
//! - **Cooperative cancellation**: bodies observe interruption through
//!   [`TaskContext`](core::TaskContext)
//! - **Hooks**: tasks may run `before`/`after` code in the same failure scope
//! - **No polling waits**: handles wake waiters on every status change
//!
//! ## Example
//!
//! ```rust
//! use queue_task_executor::prelude::*;
//! use std::time::Duration;
//!
//! let executor = QueueExecutor::start(
//!     ExecutorConfig::new()
//!         .with_worker_concurrency(2)
//!         .with_queue_capacity(100)
//!         .with_default_timeout(Duration::from_secs(30)),
//! )?;
//!
//! let handles: Vec<_> = (0..5)
//!     .map(|i| {
//!         executor.submit(TaskBody::from_fn(move |ctx: &TaskContext| {
//!             ctx.sleep(Duration::from_millis(10))?;
//!             Ok(format!("task {i} -DONE-"))
//!         }))
//!     })
//!     .collect();
//!
//! for handle in &handles {
//!     assert!(handle.wait_for().is_some());
//!     assert_eq!(handle.status(), TaskStatus::Completed);
//! }
//! executor.stop();
//! # Ok::<(), queue_task_executor::core::ExecutorError>(())
//! ```
//!
//! For complete scenarios, see `tests/executor_test.rs` and `tests/handle_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core executor abstractions: status, admission, handles and dispatch.
pub mod core;
/// Configuration models for executors.
pub mod config;
/// Builders to construct executors from configuration.
pub mod builders;
/// Infrastructure adapters: the bounded submission queue.
pub mod infra;
/// Shared utilities.
pub mod util;

/// Everything needed to submit and observe tasks.
pub mod prelude {
    pub use crate::builders::{build_executors, ExecutorBuilder};
    pub use crate::config::{ExecutorConfig, ExecutorSetConfig};
    pub use crate::core::{
        AppResult, ExecutorError, ExecutorStats, Interrupted, QueueExecutor, SimpleTask, Task,
        TaskBody, TaskContext, TaskHandle, TaskStatus,
    };
}
