//! Runtime adapters used to launch queued work.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
