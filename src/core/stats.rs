//! Executor statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::core::status::TaskStatus;

/// Point-in-time view of an executor's load and outcome counts.
///
/// Outcomes classified by the dispatcher are counted before the handle shows
/// them. A cancel made through a handle is counted once its dispatcher unit
/// (or the dispatch loop, for a task still queued) has seen it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorStats {
    /// Configured queue capacity.
    pub queue_capacity: usize,

    /// Configured worker concurrency (admission latch capacity).
    pub worker_concurrency: usize,

    /// Tasks waiting in the queue.
    pub queued: usize,

    /// Dispatches currently holding an admission slot.
    pub in_flight: usize,

    /// Worker threads currently running a task body.
    pub busy_workers: usize,

    /// Tasks accepted into the queue.
    pub submitted: u64,

    /// Tasks finished with `COMPLETED`.
    pub completed: u64,

    /// Tasks finished with `ERROR`.
    pub failed: u64,

    /// Tasks finished with `CANCELED`.
    pub cancelled: u64,

    /// Tasks finished with `TIMEOUT`.
    pub timed_out: u64,

    /// Tasks finished with `INTERRUPTED`, including interrupted submissions.
    pub interrupted: u64,
}

impl ExecutorStats {
    /// Tasks that reached a terminal status through the executor.
    #[must_use]
    pub const fn finished(&self) -> u64 {
        self.completed + self.failed + self.cancelled + self.timed_out + self.interrupted
    }
}

/// Lock-free counters behind [`ExecutorStats`].
#[derive(Debug, Default)]
pub(crate) struct ExecutorCounters {
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
    pub cancelled: AtomicU64,
    pub timed_out: AtomicU64,
    pub interrupted: AtomicU64,
}

impl ExecutorCounters {
    /// Count a task that ended with `status`. Non-terminal statuses are ignored.
    pub fn record(&self, status: TaskStatus) {
        let counter = match status {
            TaskStatus::Completed => &self.completed,
            TaskStatus::Error => &self.failed,
            TaskStatus::Canceled => &self.cancelled,
            TaskStatus::Timeout => &self.timed_out,
            TaskStatus::Interrupted => &self.interrupted,
            TaskStatus::Waiting | TaskStatus::Executing => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(
        &self,
        queue_capacity: usize,
        worker_concurrency: usize,
        queued: usize,
        in_flight: usize,
        busy_workers: usize,
    ) -> ExecutorStats {
        ExecutorStats {
            queue_capacity,
            worker_concurrency,
            queued,
            in_flight,
            busy_workers,
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            interrupted: self.interrupted.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = ExecutorStats::default();
        assert_eq!(stats.queued, 0);
        assert_eq!(stats.submitted, 0);
        assert_eq!(stats.finished(), 0);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = ExecutorCounters::default();
        counters.submitted.fetch_add(6, Ordering::Relaxed);
        counters.record(TaskStatus::Completed);
        counters.record(TaskStatus::Completed);
        counters.record(TaskStatus::Error);
        counters.record(TaskStatus::Timeout);
        counters.record(TaskStatus::Canceled);
        counters.record(TaskStatus::Interrupted);
        counters.record(TaskStatus::Executing);

        let stats = counters.snapshot(100, 2, 3, 1, 1);
        assert_eq!(stats.queue_capacity, 100);
        assert_eq!(stats.worker_concurrency, 2);
        assert_eq!(stats.queued, 3);
        assert_eq!(stats.in_flight, 1);
        assert_eq!(stats.busy_workers, 1);
        assert_eq!(stats.submitted, 6);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.finished(), 6);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = ExecutorStats {
            completed: 4,
            ..ExecutorStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["completed"], 4);
        assert_eq!(json["timed_out"], 0);
    }
}
