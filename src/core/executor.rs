//! The queue executor: bounded submission, admission-limited dispatch and
//! per-task timeout supervision.
//!
//! ```text
//! submit ─► submission queue ─► dispatch loop ─► supervisor pool ─► execution pool
//!              (bounded)       (admission slot)  (timeout wait)    (fixed workers)
//! ```
//!
//! The dispatch loop takes an admission slot only when a task is queued, and
//! the slot is released when the dispatcher unit has classified the outcome.
//! At most `worker_concurrency` tasks are therefore between dispatch and
//! completion at any moment. The loop never blocks on the queue: with nothing
//! to do it parks, and submissions and released slots unpark it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, Thread};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::builders::ExecutorBuilder;
use crate::config::ExecutorConfig;
use crate::core::error::ExecutorError;
use crate::core::execution::{Execution, ExecutionJob, ExecutionWait};
use crate::core::handle::TaskHandle;
use crate::core::latch::{AdmissionLatch, AdmissionSlot};
use crate::core::stats::{ExecutorCounters, ExecutorStats};
use crate::core::status::TaskStatus;
use crate::core::task::{TaskBody, TaskContext};
use crate::core::worker_pool::ExecutionPool;
use crate::infra::queue::{submission_queue, Pop, QueueConsumer, QueueProducer};

/// A queued task: the handle shared with the caller plus the body to run.
struct QueuedTask<T> {
    handle: TaskHandle<T>,
    body: TaskBody<T>,
}

/// Bounded-concurrency task executor.
///
/// Each executor owns its queue, admission latch, execution pool and
/// counters; any number may coexist.
///
/// ```rust
/// use queue_task_executor::prelude::*;
/// use std::time::Duration;
///
/// let executor = QueueExecutor::<String>::builder()
///     .worker_concurrency(2)
///     .queue_capacity(16)
///     .start()?;
///
/// let handle = executor.submit(TaskBody::from_fn(|ctx: &TaskContext| {
///     ctx.sleep(Duration::from_millis(5))?;
///     Ok("-DONE-".to_string())
/// }));
/// assert_eq!(handle.wait_for().as_deref(), Some("-DONE-"));
/// assert_eq!(handle.status(), TaskStatus::Completed);
///
/// executor.stop();
/// # Ok::<(), queue_task_executor::core::ExecutorError>(())
/// ```
pub struct QueueExecutor<T: Send + 'static> {
    config: ExecutorConfig,
    producer: QueueProducer<QueuedTask<T>>,
    latch: Arc<AdmissionLatch>,
    pool: Arc<ExecutionPool>,
    supervisors: Arc<ExecutionPool>,
    counters: Arc<ExecutorCounters>,
    shutdown: Arc<AtomicBool>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    dispatcher_thread: Thread,
}

impl<T: Send + 'static> QueueExecutor<T> {
    /// Builder with default configuration.
    #[must_use]
    pub fn builder() -> ExecutorBuilder<T> {
        ExecutorBuilder::new()
    }

    /// Allocate the queue, latch and execution pool and start dispatching.
    ///
    /// # Errors
    ///
    /// [`ExecutorError::InvalidConfig`] if `config` fails validation,
    /// [`ExecutorError::Spawn`] if a thread cannot be created.
    pub fn start(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        config.validate().map_err(ExecutorError::InvalidConfig)?;

        let (producer, consumer) = submission_queue(config.queue_capacity);
        let latch = Arc::new(AdmissionLatch::new(config.worker_concurrency));
        let pool = Arc::new(ExecutionPool::new(&config.thread_name, config.worker_concurrency)?);
        // one supervisor thread per admission slot
        let supervisors = Arc::new(ExecutionPool::new(
            &format!("{}-supervisor", config.thread_name),
            config.worker_concurrency,
        )?);
        let counters = Arc::new(ExecutorCounters::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let dispatch = DispatchLoop {
            consumer,
            latch: Arc::clone(&latch),
            pool: Arc::clone(&pool),
            supervisors: Arc::clone(&supervisors),
            counters: Arc::clone(&counters),
            shutdown: Arc::clone(&shutdown),
            default_timeout: config.default_timeout(),
            tick: config.dispatch_tick(),
            name: config.thread_name.clone(),
        };
        let dispatcher = thread::Builder::new()
            .name(format!("{}-dispatch", config.thread_name))
            .spawn(move || dispatch.run())
            .map_err(|source| {
                error!(error = %source, "failed to spawn dispatch loop");
                ExecutorError::Spawn {
                    what: "dispatch loop",
                    source,
                }
            })?;
        let dispatcher_thread = dispatcher.thread().clone();

        info!(
            executor = %config.thread_name,
            queue_capacity = config.queue_capacity,
            worker_concurrency = config.worker_concurrency,
            default_timeout_ms = config.default_timeout_ms,
            "executor started"
        );

        Ok(Self {
            config,
            producer,
            latch,
            pool,
            supervisors,
            counters,
            shutdown,
            dispatcher: Mutex::new(Some(dispatcher)),
            dispatcher_thread,
        })
    }

    /// Submit a task under the executor's default timeout.
    ///
    /// Returns immediately unless the queue is full, in which case the caller
    /// blocks until space frees up. If the executor is stopped first, the
    /// returned handle is already `INTERRUPTED`.
    pub fn submit(&self, body: TaskBody<T>) -> TaskHandle<T> {
        self.enqueue(body, None)
    }

    /// Submit a task with its own timeout, overriding the default.
    pub fn submit_with_timeout(&self, body: TaskBody<T>, timeout: Duration) -> TaskHandle<T> {
        self.enqueue(body, Some(timeout))
    }

    /// Like [`submit`](Self::submit), but refuse outright once stopped.
    ///
    /// # Errors
    ///
    /// [`ExecutorError::ShutDown`] if [`stop`](Self::stop) was called.
    pub fn try_submit(&self, body: TaskBody<T>) -> Result<TaskHandle<T>, ExecutorError> {
        if self.is_shutdown() {
            return Err(ExecutorError::ShutDown);
        }
        Ok(self.enqueue(body, None))
    }

    fn enqueue(&self, body: TaskBody<T>, timeout: Option<Duration>) -> TaskHandle<T> {
        let handle = TaskHandle::new(timeout);
        if self.is_shutdown() {
            warn!(task_id = %handle.task_id(), "task submitted after shutdown");
            self.interrupt(&handle);
            return handle;
        }

        let has_hooks = body.has_hooks();
        let queued = QueuedTask {
            handle: handle.clone(),
            body,
        };
        match self
            .producer
            .push(queued, &self.shutdown, self.config.dispatch_tick())
        {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                self.dispatcher_thread.unpark();
                debug!(task_id = %handle.task_id(), has_hooks, "task queued");
            }
            Err(err) => {
                warn!(task_id = %handle.task_id(), error = %err, "task submission interrupted");
                self.interrupt(&handle);
            }
        }
        handle
    }

    fn interrupt(&self, handle: &TaskHandle<T>) {
        if handle.transition(TaskStatus::Interrupted) {
            self.counters.record(TaskStatus::Interrupted);
        }
    }

    /// Stop dispatching and wait for the dispatch loop to exit.
    ///
    /// In-flight tasks run on to their own completion or timeout. Tasks still
    /// queued are abandoned and their handles stay `WAITING`. A stopped
    /// executor cannot be restarted; repeated calls do nothing.
    pub fn stop(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(executor = %self.config.thread_name, "stopping executor");
        self.dispatcher_thread.unpark();
        if let Some(dispatcher) = self.dispatcher.lock().take() {
            if dispatcher.join().is_err() {
                error!(executor = %self.config.thread_name, "dispatch loop panicked");
            }
        }
        info!(
            executor = %self.config.thread_name,
            abandoned = self.producer.len(),
            in_flight = self.latch.occupancy(),
            "executor stopped"
        );
    }

    /// Whether [`stop`](Self::stop) was called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// The configuration this executor was started with.
    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> ExecutorStats {
        self.counters.snapshot(
            self.producer.capacity(),
            self.latch.capacity(),
            self.producer.len(),
            self.latch.occupancy(),
            self.pool.busy(),
        )
    }
}

impl<T: Send + 'static> Drop for QueueExecutor<T> {
    fn drop(&mut self) {
        // signal only; joining here could hang on a long-running task
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            self.dispatcher_thread.unpark();
            debug!(
                executor = %self.config.thread_name,
                "executor dropped without stop, threads detached"
            );
        }
    }
}

impl<T: Send + 'static> fmt::Debug for QueueExecutor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueExecutor")
            .field("config", &self.config)
            .field("workers", &self.pool.worker_count())
            .field("supervisors", &self.supervisors.worker_count())
            .field("latch", &self.latch)
            .field("shutdown", &self.is_shutdown())
            .finish_non_exhaustive()
    }
}

/// State owned by the dispatch loop thread.
struct DispatchLoop<T> {
    consumer: QueueConsumer<QueuedTask<T>>,
    latch: Arc<AdmissionLatch>,
    pool: Arc<ExecutionPool>,
    supervisors: Arc<ExecutionPool>,
    counters: Arc<ExecutorCounters>,
    shutdown: Arc<AtomicBool>,
    default_timeout: Duration,
    tick: Duration,
    name: String,
}

impl<T: Send + 'static> DispatchLoop<T> {
    fn run(self) {
        debug!(executor = %self.name, "dispatch loop started");
        let me = thread::current();
        while !self.shutdown.load(Ordering::Acquire) {
            // an unpark between the check and the park is kept as a token
            if self.consumer.is_empty() {
                thread::park_timeout(self.tick);
                continue;
            }
            let Some(slot) = self.latch.try_slot() else {
                thread::park_timeout(self.tick);
                continue;
            };
            match self.consumer.try_pop() {
                Pop::Item(task) => self.launch(task, slot, &me),
                Pop::Empty => drop(slot),
                Pop::Closed => break,
            }
        }
        debug!(
            executor = %self.name,
            abandoned = self.consumer.len(),
            "dispatch loop exited"
        );
    }

    fn launch(&self, task: QueuedTask<T>, slot: AdmissionSlot, me: &Thread) {
        let QueuedTask { handle, body } = task;
        let execution = Execution::new();
        if !handle.begin_execution(Arc::clone(&execution)) {
            debug!(
                task_id = %handle.task_id(),
                status = %handle.status(),
                "skipping task cancelled in queue"
            );
            self.counters.record(handle.status());
            return;
        }

        let unit = DispatchUnit {
            handle: handle.clone(),
            body,
            execution,
            pool: Arc::clone(&self.pool),
            counters: Arc::clone(&self.counters),
            timeout: handle.timeout().unwrap_or(self.default_timeout),
            dispatcher: me.clone(),
            slot,
        };
        // the pool closes only on drop, and this loop holds it open
        if self.supervisors.execute(Box::new(move || unit.run())).is_err() {
            error!(task_id = %handle.task_id(), "supervisor pool closed, task not dispatched");
            if handle.transition(TaskStatus::Interrupted) {
                self.counters.record(TaskStatus::Interrupted);
            }
        }
    }
}

/// Supervises one task from hand-off to the pool until its outcome is known.
struct DispatchUnit<T> {
    handle: TaskHandle<T>,
    body: TaskBody<T>,
    execution: Arc<Execution<T>>,
    pool: Arc<ExecutionPool>,
    counters: Arc<ExecutorCounters>,
    timeout: Duration,
    dispatcher: Thread,
    slot: AdmissionSlot,
}

impl<T: Send + 'static> DispatchUnit<T> {
    fn run(self) {
        let Self {
            handle,
            body,
            execution,
            pool,
            counters,
            timeout,
            dispatcher,
            slot,
        } = self;
        let task_id = handle.task_id();

        let ctx = TaskContext::bound(task_id.to_string(), execution.interrupt_signal());
        let job = ExecutionJob::new(Arc::clone(&execution), body, ctx);
        if pool.execute(Box::new(move || job.run())).is_err() {
            // the returned job is dropped here, which abandons the execution
            warn!(task_id, "execution pool closed before the task could run");
        }

        let (status, value) = match execution.wait(timeout) {
            ExecutionWait::Finished(Ok(value)) => (TaskStatus::Completed, Some(value)),
            ExecutionWait::Finished(Err(failure)) => {
                warn!(
                    task_id,
                    phase = %failure.phase,
                    panicked = failure.panicked,
                    error = %failure.message,
                    "task failed"
                );
                (TaskStatus::Error, None)
            }
            ExecutionWait::Cancelled => (TaskStatus::Canceled, None),
            // safety net: the execution pool outlives every unit holding it
            ExecutionWait::Abandoned => (TaskStatus::Interrupted, None),
            ExecutionWait::TimedOut => {
                warn!(
                    task_id,
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "task timed out, body left running"
                );
                (TaskStatus::Timeout, None)
            }
        };
        // counted before waiters can observe the new status
        counters.record(status);
        match value {
            Some(value) => handle.complete(value),
            None => handle.transition(status),
        };

        drop(slot);
        dispatcher.unpark();
    }
}
