//! Tests for utility functions

use queue_task_executor::util::{init_tracing, init_tracing_with, DEFAULT_FILTER};

#[test]
fn test_tracing_init_is_idempotent() {
    init_tracing_with("queue_task_executor=trace");
    init_tracing();
    init_tracing();
    assert!(tracing::dispatcher::has_been_set());
}

#[test]
fn test_default_filter_targets_crate() {
    assert!(DEFAULT_FILTER.starts_with("queue_task_executor"));
}
