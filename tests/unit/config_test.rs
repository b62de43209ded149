//! Tests for configuration validation

use std::env;
use std::time::Duration;

use queue_task_executor::config::executor::{
    ENV_DEFAULT_TIMEOUT_MS, ENV_DISPATCH_TICK_MS, ENV_QUEUE_CAPACITY, ENV_THREAD_NAME,
    ENV_WORKER_CONCURRENCY,
};
use queue_task_executor::config::{ExecutorConfig, ExecutorSetConfig};

#[test]
fn test_executor_config_defaults() {
    let cfg = ExecutorConfig::default();
    assert_eq!(cfg.queue_capacity, 1000);
    assert_eq!(cfg.worker_concurrency, 4);
    assert_eq!(cfg.default_timeout_ms, 60_000);
    assert_eq!(cfg.thread_name, "task-executor");
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_executor_config_invalid_tick() {
    let invalid = ExecutorConfig::new().with_dispatch_tick(Duration::ZERO);
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("dispatch_tick_ms"));
}

#[test]
fn test_executor_config_json_round_trip() {
    let cfg = ExecutorConfig::new()
        .with_queue_capacity(100)
        .with_worker_concurrency(2)
        .with_default_timeout(Duration::from_secs(30));
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(ExecutorConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn test_executor_config_json_parse_error() {
    let err = ExecutorConfig::from_json_str("{not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_executor_set_from_json() {
    let json = r#"{
        "executors": {
            "crawl": { "queue_capacity": 100, "worker_concurrency": 2 },
            "render": { "worker_concurrency": 8, "thread_name": "render" }
        }
    }"#;
    let set = ExecutorSetConfig::from_json_str(json).unwrap();
    assert_eq!(set.executors.len(), 2);
    assert_eq!(set.executors["crawl"].queue_capacity, 100);
    assert_eq!(set.executors["render"].default_timeout_ms, 60_000);
    assert_eq!(set.executors["render"].thread_name, "render");
}

#[test]
fn test_executor_set_names_invalid_member() {
    let json = r#"{ "executors": { "broken": { "worker_concurrency": 0 } } }"#;
    let err = ExecutorSetConfig::from_json_str(json).unwrap_err();
    assert!(err.contains("`broken`"), "{err}");
}

#[test]
fn test_executor_config_from_env() {
    env::set_var(ENV_QUEUE_CAPACITY, "64");
    env::set_var(ENV_WORKER_CONCURRENCY, " 3 ");
    env::set_var(ENV_THREAD_NAME, "env-exec");
    env::remove_var(ENV_DEFAULT_TIMEOUT_MS);
    env::remove_var(ENV_DISPATCH_TICK_MS);

    let cfg = ExecutorConfig::from_env().unwrap();
    assert_eq!(cfg.queue_capacity, 64);
    assert_eq!(cfg.worker_concurrency, 3);
    assert_eq!(cfg.thread_name, "env-exec");
    assert_eq!(cfg.default_timeout_ms, 60_000);

    env::set_var(ENV_WORKER_CONCURRENCY, "many");
    let err = ExecutorConfig::from_env().unwrap_err();
    assert!(format!("{err:#}").contains(ENV_WORKER_CONCURRENCY));

    env::set_var(ENV_WORKER_CONCURRENCY, "0");
    assert!(ExecutorConfig::from_env().is_err());

    for key in [ENV_QUEUE_CAPACITY, ENV_WORKER_CONCURRENCY, ENV_THREAD_NAME] {
        env::remove_var(key);
    }
}
