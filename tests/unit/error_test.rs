//! Tests for error types

use paced_queue::core::QueueError;

#[test]
fn test_invalid_task_error() {
    let err = QueueError::InvalidTask { found: "bool" };
    assert_eq!(format!("{}", err), "you must provide a task factory, not bool");
}

#[test]
fn test_invalid_config_error() {
    let err = QueueError::InvalidConfig("concurrent must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: concurrent must be greater than 0"
    );
}
