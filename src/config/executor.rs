//! Executor configuration structures.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::error::AppResult;

/// Environment variable overriding [`ExecutorConfig::queue_capacity`].
pub const ENV_QUEUE_CAPACITY: &str = "TASK_EXECUTOR_QUEUE_CAPACITY";
/// Environment variable overriding [`ExecutorConfig::worker_concurrency`].
pub const ENV_WORKER_CONCURRENCY: &str = "TASK_EXECUTOR_WORKER_CONCURRENCY";
/// Environment variable overriding [`ExecutorConfig::default_timeout_ms`].
pub const ENV_DEFAULT_TIMEOUT_MS: &str = "TASK_EXECUTOR_DEFAULT_TIMEOUT_MS";
/// Environment variable overriding [`ExecutorConfig::dispatch_tick_ms`].
pub const ENV_DISPATCH_TICK_MS: &str = "TASK_EXECUTOR_DISPATCH_TICK_MS";
/// Environment variable overriding [`ExecutorConfig::thread_name`].
pub const ENV_THREAD_NAME: &str = "TASK_EXECUTOR_THREAD_NAME";

/// Configuration of one executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum tasks waiting in the submission queue.
    pub queue_capacity: usize,
    /// Worker threads, and the maximum number of tasks in flight.
    pub worker_concurrency: usize,
    /// Timeout for tasks submitted without their own, in milliseconds.
    pub default_timeout_ms: u64,
    /// Upper bound on how long an idle dispatch loop parks, and how often a
    /// blocked submitter rechecks for shutdown, in milliseconds.
    pub dispatch_tick_ms: u64,
    /// Prefix for the names of the executor's threads.
    pub thread_name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            worker_concurrency: 4,
            default_timeout_ms: 60_000,
            dispatch_tick_ms: 10,
            thread_name: "task-executor".to_string(),
        }
    }
}

impl ExecutorConfig {
    /// Configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the queue capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the worker concurrency.
    #[must_use]
    pub const fn with_worker_concurrency(mut self, concurrency: usize) -> Self {
        self.worker_concurrency = concurrency;
        self
    }

    /// Set the default task timeout.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the dispatch tick.
    #[must_use]
    pub fn with_dispatch_tick(mut self, tick: Duration) -> Self {
        self.dispatch_tick_ms = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Default task timeout as a [`Duration`].
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Dispatch tick as a [`Duration`].
    #[must_use]
    pub const fn dispatch_tick(&self) -> Duration {
        Duration::from_millis(self.dispatch_tick_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".into());
        }
        if self.worker_concurrency == 0 {
            return Err("worker_concurrency must be greater than 0".into());
        }
        if self.default_timeout_ms == 0 {
            return Err("default_timeout_ms must be greater than 0".into());
        }
        if self.dispatch_tick_ms == 0 {
            return Err("dispatch_tick_ms must be greater than 0".into());
        }
        if self.thread_name.trim().is_empty() {
            return Err("thread_name must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate. Missing fields
    /// take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the environment, loading `.env` first if present.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails if a variable is set but malformed, or the result is invalid.
    pub fn from_env() -> AppResult<Self> {
        // a missing .env file is fine
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let cfg = Self {
            queue_capacity: env_or(ENV_QUEUE_CAPACITY, defaults.queue_capacity)?,
            worker_concurrency: env_or(ENV_WORKER_CONCURRENCY, defaults.worker_concurrency)?,
            default_timeout_ms: env_or(ENV_DEFAULT_TIMEOUT_MS, defaults.default_timeout_ms)?,
            dispatch_tick_ms: env_or(ENV_DISPATCH_TICK_MS, defaults.dispatch_tick_ms)?,
            thread_name: env::var(ENV_THREAD_NAME).unwrap_or(defaults.thread_name),
        };
        cfg.validate()
            .map_err(|e| anyhow::anyhow!("executor config from environment invalid: {e}"))?;
        Ok(cfg)
    }
}

fn env_or<V>(key: &str, default: V) -> AppResult<V>
where
    V: FromStr,
    V::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got `{raw}`")),
        Err(_) => Ok(default),
    }
}

/// Configuration for several independent, named executors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorSetConfig {
    /// Map of executor name to configuration.
    pub executors: HashMap<String, ExecutorConfig>,
}

impl ExecutorSetConfig {
    /// Validate all executors and ensure at least one exists.
    ///
    /// # Errors
    ///
    /// Returns a description naming the first invalid executor.
    pub fn validate(&self) -> Result<(), String> {
        if self.executors.is_empty() {
            return Err("at least one executor must be defined".into());
        }
        for (name, executor) in &self.executors {
            executor
                .validate()
                .map_err(|e| format!("executor `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse the set from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
