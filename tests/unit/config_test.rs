//! Tests for configuration validation

use std::time::Duration;

use paced_queue::config::QueueConfig;

#[test]
fn test_queue_config_validation() {
    let valid = QueueConfig {
        concurrent: 2,
        interval_ms: 100,
        start: true,
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_queue_config_invalid_concurrent() {
    let invalid = QueueConfig {
        concurrent: 0,
        interval_ms: 100,
        start: true,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_queue_config_zero_interval_is_valid() {
    let cfg = QueueConfig::new().with_interval(Duration::ZERO);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.interval(), Duration::ZERO);
}

#[test]
fn test_queue_config_from_json() {
    let json = r#"{ "concurrent": 3, "interval_ms": 250, "start": false }"#;

    let config = QueueConfig::from_json_str(json).expect("valid config");
    assert_eq!(config.concurrent, 3);
    assert_eq!(config.interval(), Duration::from_millis(250));
    assert!(!config.start);
}

#[test]
fn test_queue_config_from_json_aliases_and_defaults() {
    let config = QueueConfig::from_json_str(r#"{ "concurrency": 4, "interval": 50 }"#)
        .expect("valid config");
    assert_eq!(config.concurrent, 4);
    assert_eq!(config.interval_ms, 50);
    assert!(config.start);

    let empty = QueueConfig::from_json_str("{}").expect("defaults");
    assert_eq!(empty, QueueConfig::default());
}

#[test]
fn test_queue_config_coerces_numbers() {
    let config = QueueConfig::from_json_str(r#"{ "concurrent": "2", "interval_ms": 99.7 }"#)
        .expect("coerced config");
    assert_eq!(config.concurrent, 2);
    assert_eq!(config.interval_ms, 99);
}

#[test]
fn test_queue_config_rejects_bad_values() {
    assert!(QueueConfig::from_json_str(r#"{ "concurrent": 0 }"#).is_err());
    assert!(QueueConfig::from_json_str(r#"{ "concurrent": -1 }"#).is_err());
    assert!(QueueConfig::from_json_str(r#"{ "interval_ms": "soon" }"#).is_err());
    assert!(QueueConfig::from_json_str("not json").is_err());
}

#[test]
fn test_queue_config_builder_methods() {
    let config = QueueConfig::new()
        .with_concurrent(7)
        .with_interval(Duration::from_secs(2))
        .with_start(false);
    assert_eq!(config.concurrent, 7);
    assert_eq!(config.interval_ms, 2000);
    assert!(!config.start);
}

#[test]
fn test_queue_config_from_env() {
    use paced_queue::config::{ENV_CONCURRENT, ENV_INTERVAL_MS, ENV_START};

    std::env::set_var(ENV_CONCURRENT, "3");
    std::env::set_var(ENV_INTERVAL_MS, "40");
    std::env::set_var(ENV_START, "false");
    let config = QueueConfig::from_env().expect("env config");
    assert_eq!(config.concurrent, 3);
    assert_eq!(config.interval_ms, 40);
    assert!(!config.start);

    std::env::set_var(ENV_CONCURRENT, "many");
    let err = QueueConfig::from_env().unwrap_err();
    assert!(err.to_string().contains(ENV_CONCURRENT));

    std::env::remove_var(ENV_CONCURRENT);
    std::env::remove_var(ENV_INTERVAL_MS);
    std::env::remove_var(ENV_START);
}
