//! Tests for tokio spawner utilities

use paced_queue::core::Spawn;
use paced_queue::runtime::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_default_spawner_uses_ambient_runtime() {
    let spawner = TokioSpawner::default();

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send("ran").unwrap();
    });

    assert_eq!(rx.await.expect("oneshot result"), "ran");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_current_spawner_targets_caller_runtime() {
    let spawner = TokioSpawner::current();

    // Spawning from a plain thread still lands on the captured runtime.
    let (tx, rx) = tokio::sync::oneshot::channel();
    std::thread::spawn(move || {
        spawner.spawn(async move {
            tx.send(7).unwrap();
        });
    })
    .join()
    .unwrap();

    assert_eq!(rx.await.expect("oneshot result"), 7);
}
