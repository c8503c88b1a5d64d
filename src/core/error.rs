//! Error types for queue operations.

use thiserror::Error;

/// Errors produced at the queue's API surface.
///
/// A task's own failure is never one of these; it is delivered through the
/// `reject` event instead.
#[derive(Debug, Error)]
pub enum QueueError {
    /// A value that is not a task factory was handed to the queue.
    #[error("you must provide a task factory, not {found}")]
    InvalidTask {
        /// Runtime type name of the rejected value.
        found: &'static str,
    },
    /// Queue configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
