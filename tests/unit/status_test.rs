//! Tests for task status ordering

use queue_task_executor::core::TaskStatus;

const ALL: [TaskStatus; 7] = [
    TaskStatus::Waiting,
    TaskStatus::Executing,
    TaskStatus::Completed,
    TaskStatus::Error,
    TaskStatus::Canceled,
    TaskStatus::Timeout,
    TaskStatus::Interrupted,
];

#[test]
fn test_ordinals_are_dense() {
    for (expected, status) in (0_u8..).zip(ALL) {
        assert_eq!(status.ordinal(), expected, "{status}");
    }
}

#[test]
fn test_terminal_means_at_least_completed() {
    for status in ALL {
        assert_eq!(status.is_terminal(), status >= TaskStatus::Completed);
    }
}

#[test]
fn test_terminal_states_accept_nothing() {
    for from in ALL.into_iter().filter(|s| s.is_terminal()) {
        for to in ALL {
            assert!(!from.can_advance_to(to), "{from} -> {to}");
        }
    }
}

#[test]
fn test_status_json_names() {
    let json = serde_json::to_string(&ALL).unwrap();
    assert_eq!(
        json,
        r#"["WAITING","EXECUTING","COMPLETED","ERROR","CANCELED","TIMEOUT","INTERRUPTED"]"#
    );
}
