//! Builders to construct executors from configuration.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Duration;

use crate::config::{ExecutorConfig, ExecutorSetConfig};
use crate::core::error::ExecutorError;
use crate::core::executor::QueueExecutor;

/// Fluent construction of a [`QueueExecutor`].
#[derive(Debug, Clone)]
pub struct ExecutorBuilder<T> {
    config: ExecutorConfig,
    _output: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> Default for ExecutorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> ExecutorBuilder<T> {
    /// Builder starting from the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(ExecutorConfig::default())
    }

    /// Builder starting from `config`.
    #[must_use]
    pub const fn from_config(config: ExecutorConfig) -> Self {
        Self {
            config,
            _output: PhantomData,
        }
    }

    /// Maximum queued tasks.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.with_queue_capacity(capacity);
        self
    }

    /// Worker threads and maximum tasks in flight.
    #[must_use]
    pub fn worker_concurrency(mut self, concurrency: usize) -> Self {
        self.config = self.config.with_worker_concurrency(concurrency);
        self
    }

    /// Timeout applied to tasks submitted without their own.
    #[must_use]
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_default_timeout(timeout);
        self
    }

    /// Shutdown recheck interval of the dispatch loop and blocked submitters.
    #[must_use]
    pub fn dispatch_tick(mut self, tick: Duration) -> Self {
        self.config = self.config.with_dispatch_tick(tick);
        self
    }

    /// Prefix for thread names.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_thread_name(name);
        self
    }

    /// The configuration built so far.
    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Validate the configuration and start the executor.
    ///
    /// # Errors
    ///
    /// See [`QueueExecutor::start`].
    pub fn start(self) -> Result<QueueExecutor<T>, ExecutorError> {
        QueueExecutor::start(self.config)
    }
}

/// Start one independent executor per named entry of `cfg`.
///
/// Either every executor starts or none is returned; executors started before
/// a failure are stopped again.
///
/// # Errors
///
/// [`ExecutorError::InvalidConfig`] naming the offending executor, or the
/// first start failure.
pub fn build_executors<T: Send + 'static>(
    cfg: &ExecutorSetConfig,
) -> Result<HashMap<String, QueueExecutor<T>>, ExecutorError> {
    cfg.validate().map_err(ExecutorError::InvalidConfig)?;

    let mut executors = HashMap::with_capacity(cfg.executors.len());
    for (name, executor_cfg) in &cfg.executors {
        match QueueExecutor::start(executor_cfg.clone()) {
            Ok(executor) => {
                executors.insert(name.clone(), executor);
            }
            Err(err) => {
                tracing::error!(executor = %name, error = %err, "failed to start executor");
                for started in executors.values() {
                    started.stop();
                }
                return Err(err);
            }
        }
    }
    Ok(executors)
}
