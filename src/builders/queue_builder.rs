//! Builders to construct queues from configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::config::QueueConfig;
use crate::core::{EventKind, Listener, QueueEngine, QueueError, QueueEvent, Spawn};
use crate::runtime::TokioSpawner;

/// Build a queue from configuration using the provided spawner.
///
/// # Errors
///
/// Returns [`QueueError::InvalidConfig`] when `cfg` fails validation.
pub fn build_queue<T, E, S>(cfg: &QueueConfig, spawner: S) -> Result<QueueEngine<T, E, S>, QueueError> {
    QueueEngine::with_spawner(cfg.clone(), spawner)
}

/// Parse JSON configuration and build a queue on the ambient tokio runtime.
///
/// Accepts the `concurrency` and `interval` spellings as well as
/// `concurrent` and `interval_ms`.
///
/// # Errors
///
/// Returns [`QueueError::InvalidConfig`] when the input does not parse or
/// fails validation.
pub fn build_queue_from_json<T, E>(input: &str) -> Result<QueueEngine<T, E>, QueueError> {
    let cfg = QueueConfig::from_json_str(input).map_err(QueueError::InvalidConfig)?;
    QueueEngine::new(cfg)
}

/// Fluent builder that also registers listeners before the queue is shared.
pub struct QueueBuilder<T, E, S = TokioSpawner> {
    config: QueueConfig,
    spawner: S,
    listeners: Vec<(EventKind, Listener<T, E>)>,
}

impl<T, E> QueueBuilder<T, E, TokioSpawner> {
    /// Start from the default configuration and the ambient tokio runtime.
    pub fn new() -> Self {
        Self {
            config: QueueConfig::default(),
            spawner: TokioSpawner::default(),
            listeners: Vec::new(),
        }
    }
}

impl<T, E> Default for QueueBuilder<T, E, TokioSpawner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E, S> QueueBuilder<T, E, S>
where
    T: Send + 'static,
    E: Send + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the concurrency limit.
    #[must_use]
    pub fn concurrent(mut self, concurrent: usize) -> Self {
        self.config = self.config.with_concurrent(concurrent);
        self
    }

    /// Set the pacing interval.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_interval(interval);
        self
    }

    /// Set whether enqueueing auto-starts the queue.
    #[must_use]
    pub fn auto_start(mut self, start: bool) -> Self {
        self.config = self.config.with_start(start);
        self
    }

    /// Launch work through a different spawner.
    pub fn spawner<S2>(self, spawner: S2) -> QueueBuilder<T, E, S2> {
        QueueBuilder {
            config: self.config,
            spawner,
            listeners: self.listeners,
        }
    }

    /// Register a listener on the queue being built.
    #[must_use]
    pub fn on<F>(mut self, kind: EventKind, listener: F) -> Self
    where
        F: Fn(&QueueEvent<'_, T, E>) + Send + Sync + 'static,
    {
        self.listeners.push((kind, Arc::new(listener)));
        self
    }

    /// Configuration accumulated so far.
    pub const fn current_config(&self) -> &QueueConfig {
        &self.config
    }

    /// Validate the configuration and create the queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] when the configuration fails validation.
    pub fn build(self) -> Result<QueueEngine<T, E, S>, QueueError> {
        let queue = QueueEngine::with_spawner(self.config, self.spawner)?;
        for (kind, listener) in self.listeners {
            queue.add_listener(kind, listener);
        }
        Ok(queue)
    }
}
