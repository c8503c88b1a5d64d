//! Lifecycle events and the listener registry.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Names of the notifications a queue emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The queue entered the running state.
    Start,
    /// The queue left the running state, manually or after draining.
    Stop,
    /// Nothing is pending and nothing is in flight.
    End,
    /// A task settled, whatever its outcome.
    Dequeue,
    /// A task succeeded.
    Resolve,
    /// A task failed.
    Reject,
}

impl EventKind {
    /// Every event kind, in emission-table order.
    pub const ALL: [Self; 6] = [
        Self::Start,
        Self::Stop,
        Self::End,
        Self::Dequeue,
        Self::Resolve,
        Self::Reject,
    ];

    /// Lowercase event name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::End => "end",
            Self::Dequeue => "dequeue",
            Self::Resolve => "resolve",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification as seen by listeners. Payloads are borrowed from the
/// settled task for the duration of the call.
#[derive(Debug)]
pub enum QueueEvent<'a, T, E> {
    /// See [`EventKind::Start`].
    Start,
    /// See [`EventKind::Stop`].
    Stop,
    /// See [`EventKind::End`].
    End,
    /// See [`EventKind::Dequeue`].
    Dequeue,
    /// Success value of the settled task.
    Resolve(&'a T),
    /// Failure value of the settled task.
    Reject(&'a E),
}

impl<T, E> QueueEvent<'_, T, E> {
    /// Kind used for listener lookup.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Start => EventKind::Start,
            Self::Stop => EventKind::Stop,
            Self::End => EventKind::End,
            Self::Dequeue => EventKind::Dequeue,
            Self::Resolve(_) => EventKind::Resolve,
            Self::Reject(_) => EventKind::Reject,
        }
    }
}

/// Callback registered for one event kind.
pub type Listener<T, E> = Arc<dyn Fn(&QueueEvent<'_, T, E>) + Send + Sync>;

/// Listeners keyed by event kind, called in registration order.
pub(crate) struct Listeners<T, E> {
    by_kind: HashMap<EventKind, Vec<Listener<T, E>>>,
}

impl<T, E> Listeners<T, E> {
    pub(crate) fn new() -> Self {
        Self {
            by_kind: HashMap::new(),
        }
    }

    pub(crate) fn add(&mut self, kind: EventKind, listener: Listener<T, E>) {
        self.by_kind.entry(kind).or_default().push(listener);
    }

    pub(crate) fn remove_all(&mut self, kind: EventKind) -> usize {
        self.by_kind.remove(&kind).map_or(0, |list| list.len())
    }

    /// Clone out the listeners for `kind` so they can run without the lock.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<Listener<T, E>> {
        self.by_kind.get(&kind).cloned().unwrap_or_default()
    }
}

/// Call each listener in turn. A panicking listener is logged and skipped so
/// the rest of the chain and the queue's bookkeeping still run.
pub(crate) fn dispatch_event<T, E>(listeners: &[Listener<T, E>], event: &QueueEvent<'_, T, E>) {
    for listener in listeners {
        if catch_unwind(AssertUnwindSafe(|| (listener.as_ref())(event))).is_err() {
            tracing::error!("listener for `{}` panicked", event.kind());
        }
    }
}
