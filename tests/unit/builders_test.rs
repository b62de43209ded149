//! Tests for builder modules

use std::collections::HashMap;
use std::time::Duration;

use queue_task_executor::builders::{build_executors, ExecutorBuilder};
use queue_task_executor::config::{ExecutorConfig, ExecutorSetConfig};
use queue_task_executor::core::{ExecutorError, QueueExecutor, TaskBody, TaskContext, TaskStatus};

#[test]
fn test_executor_builder_defaults() {
    let builder = ExecutorBuilder::<u32>::new();
    assert_eq!(builder.config(), &ExecutorConfig::default());
}

#[test]
fn test_executor_builder_setters() {
    let builder = QueueExecutor::<u32>::builder()
        .queue_capacity(10)
        .worker_concurrency(3)
        .default_timeout(Duration::from_millis(1500))
        .dispatch_tick(Duration::from_millis(5))
        .thread_name("built");
    let cfg = builder.config();
    assert_eq!(cfg.queue_capacity, 10);
    assert_eq!(cfg.worker_concurrency, 3);
    assert_eq!(cfg.default_timeout_ms, 1500);
    assert_eq!(cfg.dispatch_tick_ms, 5);

    let executor = builder.start().unwrap();
    assert_eq!(executor.config().thread_name, "built");
    let stats = executor.stats();
    assert_eq!(stats.queue_capacity, 10);
    assert_eq!(stats.worker_concurrency, 3);
    executor.stop();
}

#[test]
fn test_executor_builder_rejects_invalid() {
    let err = ExecutorBuilder::<u32>::new().queue_capacity(0).start().unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidConfig(_)));
}

#[test]
fn test_build_executors_from_set() {
    let mut executors = HashMap::new();
    executors.insert(
        "fast".to_string(),
        ExecutorConfig::new().with_worker_concurrency(2).with_thread_name("fast"),
    );
    executors.insert(
        "slow".to_string(),
        ExecutorConfig::new().with_worker_concurrency(1).with_thread_name("slow"),
    );
    let built = build_executors::<String>(&ExecutorSetConfig { executors }).unwrap();
    assert_eq!(built.len(), 2);

    for (name, executor) in &built {
        let handle = executor.submit(TaskBody::from_fn(|_ctx: &TaskContext| {
            Ok(std::thread::current().name().unwrap_or_default().to_string())
        }));
        let worker = handle.wait_for().unwrap();
        assert_eq!(handle.status(), TaskStatus::Completed);
        assert!(worker.starts_with(&format!("{name}-worker-")), "{worker}");
    }
    for executor in built.values() {
        executor.stop();
    }
}

#[test]
fn test_build_executors_rejects_empty_set() {
    let err = build_executors::<u32>(&ExecutorSetConfig::default()).unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidConfig(_)));
}
