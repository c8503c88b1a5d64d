//! Tests for builder modules

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use paced_queue::builders::{build_queue, build_queue_from_json, QueueBuilder};
use paced_queue::config::QueueConfig;
use paced_queue::core::{task, EventKind, QueueEngine, QueueError, TaskFactory};
use paced_queue::runtime::TokioSpawner;
use tokio::sync::Notify;

#[test]
fn test_queue_builder_defaults() {
    let builder = QueueBuilder::<u32, String>::new();
    assert_eq!(builder.current_config(), &QueueConfig::default());
}

#[test]
fn test_queue_builder_settings() {
    let builder = QueueBuilder::<u32, String>::new()
        .concurrent(2)
        .interval(Duration::from_millis(20))
        .auto_start(false);

    let config = builder.current_config();
    assert_eq!(config.concurrent, 2);
    assert_eq!(config.interval_ms, 20);
    assert!(!config.start);
}

#[test]
fn test_queue_builder_rejects_zero_concurrency() {
    let result = QueueBuilder::<u32, String>::new().concurrent(0).build();
    assert!(matches!(result, Err(QueueError::InvalidConfig(_))));
}

#[test]
fn test_build_queue_with_spawner() {
    let cfg = QueueConfig::new().with_concurrent(3);
    let queue: QueueEngine<u32, String> =
        build_queue(&cfg, TokioSpawner::default()).expect("valid config");
    assert_eq!(queue.config().concurrent, 3);
    assert!(queue.is_empty());
}

#[test]
fn test_build_queue_from_json() {
    let queue: QueueEngine<u32, String> =
        build_queue_from_json(r#"{ "concurrency": 1, "interval": 10, "start": false }"#)
            .expect("valid config");
    assert_eq!(queue.config().concurrent, 1);
    assert!(!queue.config().start);

    let bad = build_queue_from_json::<u32, String>(r#"{ "concurrency": 0 }"#);
    assert!(matches!(bad, Err(QueueError::InvalidConfig(_))));
}

#[tokio::test(start_paused = true)]
async fn test_queue_builder_registers_listeners() {
    let resolved = Arc::new(AtomicUsize::new(0));
    let end = Arc::new(Notify::new());
    let counter = Arc::clone(&resolved);
    let signal = Arc::clone(&end);

    let queue = QueueBuilder::<u32, String>::new()
        .interval(Duration::from_millis(10))
        .on(EventKind::Resolve, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .on(EventKind::End, move |_| signal.notify_one())
        .build()
        .expect("valid config");

    let tasks: Vec<TaskFactory<u32, String>> =
        vec![task(|| async { Ok(1) }), task(|| async { Ok(2) })];
    queue.enqueue(tasks);
    tokio::time::timeout(Duration::from_secs(5), end.notified())
        .await
        .expect("queue drained");

    assert_eq!(resolved.load(Ordering::SeqCst), 2);
}
