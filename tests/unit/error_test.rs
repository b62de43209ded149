//! Tests for error types

use std::error::Error as _;
use std::io;

use queue_task_executor::core::{ExecutorError, Interrupted, TaskFailure, TaskPhase};

#[test]
fn test_invalid_config_error() {
    let err = ExecutorError::InvalidConfig("queue_capacity must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: queue_capacity must be greater than 0"
    );
}

#[test]
fn test_spawn_error_keeps_source() {
    let err = ExecutorError::Spawn {
        what: "worker",
        source: io::Error::new(io::ErrorKind::Other, "resource temporarily unavailable"),
    };
    assert_eq!(
        format!("{}", err),
        "failed to spawn worker thread: resource temporarily unavailable"
    );
    assert!(err.source().is_some());
}

#[test]
fn test_shut_down_error() {
    assert_eq!(format!("{}", ExecutorError::ShutDown), "executor has been shut down");
}

#[test]
fn test_task_failure_names_phase() {
    let failure = TaskFailure {
        phase: TaskPhase::Before,
        message: "lock busy".to_string(),
        panicked: false,
    };
    assert_eq!(format!("{}", failure), "task failed during before hook: lock busy");
    assert_eq!(TaskPhase::Execute.to_string(), "execution");
    assert_eq!(TaskPhase::After.to_string(), "after hook");
}

#[test]
fn test_interrupted_converts_to_anyhow() {
    let err: anyhow::Error = Interrupted.into();
    assert_eq!(err.to_string(), "task interrupted");
    assert!(err.downcast_ref::<Interrupted>().is_some());
}
