//! Configuration models for queues.

pub mod queue;

pub use queue::{QueueConfig, ENV_CONCURRENT, ENV_INTERVAL_MS, ENV_START};
