//! Fixed-size pool of OS worker threads. Executors run task bodies on one
//! pool and the dispatcher units supervising them on another.
//!
//! Workers block on a channel receive: no polling. Closing the pool drops the
//! sender; workers drain jobs already queued and then exit on their own.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::core::error::ExecutorError;

/// A unit of work for one worker.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Pool of exactly `worker_count` threads.
pub(crate) struct ExecutionPool {
    job_tx: Mutex<Option<Sender<Job>>>,
    busy: Arc<AtomicUsize>,
    worker_count: usize,
    name: String,
}

impl ExecutionPool {
    /// Spawn `worker_count` threads named `{name}-worker-{id}`.
    pub(crate) fn new(name: &str, worker_count: usize) -> Result<Self, ExecutorError> {
        let (job_tx, job_rx) = unbounded::<Job>();
        let busy = Arc::new(AtomicUsize::new(0));

        for worker_id in 0..worker_count {
            spawn_worker(name, worker_id, job_rx.clone(), Arc::clone(&busy))?;
        }

        info!(pool = name, worker_count, "worker pool started");

        Ok(Self {
            job_tx: Mutex::new(Some(job_tx)),
            busy,
            worker_count,
            name: name.to_string(),
        })
    }

    /// Queue a job for the next idle worker. Gives the job back once closed.
    pub(crate) fn execute(&self, job: Job) -> Result<(), Job> {
        let job_tx = self.job_tx.lock();
        let Some(job_tx) = job_tx.as_ref() else {
            return Err(job);
        };
        job_tx.send(job).map_err(|err| err.into_inner())
    }

    /// Workers currently running a job.
    pub(crate) fn busy(&self) -> usize {
        self.busy.load(Ordering::Acquire)
    }

    pub(crate) const fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Stop accepting jobs. Idempotent; runs on drop.
    pub(crate) fn close(&self) {
        if self.job_tx.lock().take().is_some() {
            debug!(pool = %self.name, "worker pool closed");
        }
    }
}

impl Drop for ExecutionPool {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_worker(
    name: &str,
    worker_id: usize,
    job_rx: Receiver<Job>,
    busy: Arc<AtomicUsize>,
) -> Result<(), ExecutorError> {
    thread::Builder::new()
        .name(format!("{name}-worker-{worker_id}"))
        .spawn(move || {
            debug!(worker_id, "worker thread started");
            // recv fails only once the sender is gone and the channel is drained
            while let Ok(job) = job_rx.recv() {
                busy.fetch_add(1, Ordering::AcqRel);
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    error!(worker_id, "job panicked outside task isolation");
                }
                busy.fetch_sub(1, Ordering::AcqRel);
            }
            debug!(worker_id, "worker thread exiting");
        })
        .map(|_detached| ())
        .map_err(|source| {
            error!(worker_id, error = %source, "failed to spawn worker thread");
            ExecutorError::Spawn {
                what: "worker",
                source,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_pool_runs_jobs_on_named_workers() {
        let pool = ExecutionPool::new("pool-test", 2).unwrap();
        assert_eq!(pool.worker_count(), 2);

        let (tx, rx) = mpsc::channel();
        for i in 0..4 {
            let tx = tx.clone();
            let job: Job = Box::new(move || {
                let name = thread::current().name().map(str::to_string);
                tx.send((i, name)).unwrap();
            });
            assert!(pool.execute(job).is_ok());
        }
        let mut seen = Vec::new();
        for _ in 0..4 {
            let (i, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert!(name.unwrap().starts_with("pool-test-worker-"));
            seen.push(i);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_worker_survives_panicking_job() {
        let pool = ExecutionPool::new("pool-panic", 1).unwrap();
        let boom: Job = Box::new(|| panic!("boom"));
        assert!(pool.execute(boom).is_ok());

        let (tx, rx) = mpsc::channel();
        let ok: Job = Box::new(move || tx.send(()).unwrap());
        assert!(pool.execute(ok).is_ok());
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_closed_pool_returns_job() {
        let pool = ExecutionPool::new("pool-closed", 1).unwrap();
        pool.close();
        pool.close();
        let job: Job = Box::new(|| {});
        assert!(pool.execute(job).is_err());
        assert_eq!(pool.busy(), 0);
    }
}
