//! Core queue abstractions: storage, tasks, events and the engine.

pub mod engine;
pub mod error;
pub mod events;
pub mod store;
pub mod task;

pub use engine::{QueueEngine, QueueSnapshot, Spawn};
pub use error::{AppResult, QueueError};
pub use events::{EventKind, Listener, QueueEvent};
pub use store::{TaskEntry, TaskId, TaskStore};
pub use task::{task, Job, Submittable, TaskFactory, Tasks};
