//! # Paced Queue
//!
//! An in-process async task queue that runs deferred work with a bounded
//! level of concurrency and a minimum spacing between dispatch cycles,
//! emitting lifecycle events as tasks settle.
//!
//! ## Core Problem Solved
//!
//! Calling rate-limited services or sharing a scarce resource needs two
//! throttles at once:
//!
//! - **Concurrency**: never more than `concurrent` tasks in flight
//! - **Pacing**: never two dispatch cycles closer than `interval` apart
//! - **Auto-restart**: new work restarts an idle queue unless it was stopped
//! - **Observability**: per-task `resolve`/`reject`/`dequeue` events and an
//!   `end` event once everything has settled
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use paced_queue::builders::QueueBuilder;
//! use paced_queue::core::{task, EventKind, QueueEvent};
//!
//! let queue = QueueBuilder::<String, String>::new()
//!     .concurrent(2)
//!     .interval(Duration::from_millis(100))
//!     .on(EventKind::Resolve, |event| {
//!         if let QueueEvent::Resolve(body) = event {
//!             tracing::info!("fetched {} bytes", body.len());
//!         }
//!     })
//!     .on(EventKind::Reject, |event| {
//!         if let QueueEvent::Reject(err) = event {
//!             tracing::warn!("fetch failed: {err}");
//!         }
//!     })
//!     .build()?;
//!
//! queue.enqueue(vec![
//!     task(|| async { Ok("first".to_string()) }),
//!     task(|| async { Err("second failed".to_string()) }),
//! ]);
//!
//! // Or pull cycles by hand on a queue built with `auto_start(false)`:
//! let outputs = queue.dequeue().await;
//! ```
//!
//! For complete examples, see `tests/queue_engine_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core queue abstractions: storage, tasks, events and the engine.
pub mod core;
/// Configuration models for queues.
pub mod config;
/// Builders to construct queues from configuration.
pub mod builders;
/// Runtime adapters used to launch queued work.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::config::QueueConfig;
pub use crate::core::{task, EventKind, QueueEngine, QueueError, QueueEvent, TaskFactory};
