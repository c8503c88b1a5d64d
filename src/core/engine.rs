//! Queue engine: run-state machine, paced dispatch and lifecycle events.
//!
//! The engine owns a [`TaskStore`] of pending factories and launches them in
//! dispatch cycles. A cycle takes as many entries as there are free
//! concurrency slots and spawns each one without waiting for the others.
//! Cycles are self-paced: every cycle reserves a start slot at least
//! `interval` after the previous one, measured from the previous slot rather
//! than from when the previous cycle finished, so the cadence does not drift.
//!
//! # State machine
//!
//! - **Idle**: not started. Initial state, and the state after every drain.
//! - **Running**: a driver loop is armed and dispatches cycles.
//! - **Stopped**: [`QueueEngine::stop`] was called. Enqueueing no longer
//!   auto-starts the queue until [`QueueEngine::start`] is called again.
//!
//! A drain (nothing pending, nothing in flight) emits `end`, disarms the
//! driver and emits `stop` if the queue was running, but never sets the
//! stopped flag, so the next enqueue restarts the queue when `start` is
//! configured.
//!
//! # Example
//!
//! ```rust,ignore
//! use paced_queue::config::QueueConfig;
//! use paced_queue::core::{task, EventKind, QueueEngine, QueueEvent};
//!
//! let queue: QueueEngine<String, String> =
//!     QueueEngine::new(QueueConfig::new().with_concurrent(2))?;
//!
//! queue.on(EventKind::Resolve, |event| {
//!     if let QueueEvent::Resolve(value) = event {
//!         println!("done: {value}");
//!     }
//! });
//! queue.enqueue(task(|| async { Ok("hello".to_string()) }));
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, Notify};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::QueueConfig;
use crate::runtime::TokioSpawner;
use crate::util::clock::remaining_delay;

use super::events::{dispatch_event, Listener, Listeners};
use super::store::{TaskEntry, TaskId, TaskStore};
use super::task::{resolve_submission, Submittable, TaskFactory, Tasks};
use super::{EventKind, QueueError, QueueEvent};

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Identifies one armed driver loop. A loop whose token is no longer the
/// current one exits at its next check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DriverToken(u64);

/// Point-in-time view of a queue's run state and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// A driver loop is armed.
    pub started: bool,
    /// The queue was stopped explicitly.
    pub stopped: bool,
    /// Tasks waiting in the store.
    pub pending: usize,
    /// Tasks launched and not yet settled.
    pub in_flight: usize,
    /// Tasks ever enqueued.
    pub enqueued: u64,
    /// Tasks that succeeded.
    pub resolved: u64,
    /// Tasks that failed.
    pub rejected: u64,
    /// Tasks that panicked.
    pub panicked: u64,
}

struct RunState<T, E> {
    store: TaskStore<TaskFactory<T, E>>,
    started: bool,
    stopped: bool,
    in_flight: usize,
    /// Start slot of the most recently reserved cycle.
    last_ran: Option<Instant>,
    driver: Option<DriverToken>,
    next_token: u64,
    resolved: u64,
    rejected: u64,
    panicked: u64,
}

impl<T, E> RunState<T, E> {
    const fn new() -> Self {
        Self {
            store: TaskStore::new(),
            started: false,
            stopped: false,
            in_flight: 0,
            last_ran: None,
            driver: None,
            next_token: 0,
            resolved: 0,
            rejected: 0,
            panicked: 0,
        }
    }

    fn arm(&mut self) -> DriverToken {
        let token = DriverToken(self.next_token);
        self.next_token += 1;
        self.started = true;
        self.driver = Some(token);
        token
    }

    fn disarm(&mut self) {
        self.started = false;
        self.driver = None;
    }

    /// Claim the next cycle slot. Returns the slot and how long until it.
    fn reserve_slot(&mut self, interval: Duration) -> (Instant, Duration) {
        let now = Instant::now();
        let delay = remaining_delay(self.last_ran, interval, now);
        let slot = now + delay;
        self.last_ran = Some(slot);
        (slot, delay)
    }

    fn is_drained(&self) -> bool {
        self.in_flight == 0 && self.store.is_empty()
    }
}

struct Shared<T, E> {
    config: QueueConfig,
    state: Mutex<RunState<T, E>>,
    listeners: RwLock<Listeners<T, E>>,
    /// Broadcast on enqueue, on settle and on stop. Every driver loop,
    /// including a stale one, re-checks its token when woken.
    wake: Notify,
}

/// Concurrency-bounded, interval-paced task queue.
///
/// Cloning yields another handle to the same queue.
///
/// Listeners registered with [`QueueEngine::on`] run synchronously at each
/// emission point, outside the queue's locks, so they may call back into the
/// queue. A listener only for [`EventKind::Resolve`] will not hear about
/// failed tasks; subscribe to [`EventKind::Reject`] as well.
pub struct QueueEngine<T, E, S = TokioSpawner> {
    shared: Arc<Shared<T, E>>,
    spawner: S,
}

impl<T, E, S: Clone> Clone for QueueEngine<T, E, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            spawner: self.spawner.clone(),
        }
    }
}

impl<T, E> QueueEngine<T, E, TokioSpawner> {
    /// Create a queue that spawns onto the ambient tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] when `config` fails validation.
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        Self::with_spawner(config, TokioSpawner::default())
    }
}

impl<T, E, S> QueueEngine<T, E, S> {
    /// Create a queue that launches work through `spawner`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] when `config` fails validation.
    pub fn with_spawner(config: QueueConfig, spawner: S) -> Result<Self, QueueError> {
        config.validate().map_err(QueueError::InvalidConfig)?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(RunState::new()),
                listeners: RwLock::new(Listeners::new()),
                wake: Notify::new(),
            }),
            spawner,
        })
    }

    /// Configuration the queue was built with.
    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    /// True while a driver loop is armed.
    pub fn started(&self) -> bool {
        self.shared.state.lock().started
    }

    /// True after an explicit [`stop`](Self::stop) until the next
    /// [`start`](Self::start).
    pub fn stopped(&self) -> bool {
        self.shared.state.lock().stopped
    }

    /// True when no task is pending. In-flight tasks do not count.
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().store.is_empty()
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.shared.state.lock().store.len()
    }

    /// Number of tasks launched and not yet settled.
    pub fn in_flight(&self) -> usize {
        self.shared.state.lock().in_flight
    }

    /// Capture run state and counters.
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.shared.state.lock();
        QueueSnapshot {
            started: state.started,
            stopped: state.stopped,
            pending: state.store.len(),
            in_flight: state.in_flight,
            enqueued: state.store.next_id(),
            resolved: state.resolved,
            rejected: state.rejected,
            panicked: state.panicked,
        }
    }

    /// Drop every pending task. In-flight tasks and run state are untouched.
    pub fn clear(&self) {
        let removed = {
            let mut state = self.shared.state.lock();
            let removed = state.store.len();
            state.store.clear();
            removed
        };
        debug!(removed, "queue cleared");
    }

    /// Remove every listener registered for `kind`, returning how many there were.
    pub fn off(&self, kind: EventKind) -> usize {
        self.shared.listeners.write().remove_all(kind)
    }

    pub(crate) fn add_listener(&self, kind: EventKind, listener: Listener<T, E>) {
        self.shared.listeners.write().add(kind, listener);
    }

    fn emit(&self, event: &QueueEvent<'_, T, E>) {
        let listeners = self.shared.listeners.read().snapshot(event.kind());
        dispatch_event(&listeners, event);
    }
}

impl<T, E, S> QueueEngine<T, E, S>
where
    T: Send + 'static,
    E: Send + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Register `listener` for `kind`. Listeners run in registration order.
    pub fn on<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&QueueEvent<'_, T, E>) + Send + Sync + 'static,
    {
        self.add_listener(kind, Arc::new(listener));
    }

    /// Enter the running state and arm the driver.
    ///
    /// A no-op when already running. On an empty queue it only clears the
    /// stopped flag and emits nothing.
    pub fn start(&self) {
        let token = {
            let mut state = self.shared.state.lock();
            if state.started {
                return;
            }
            state.stopped = false;
            if state.store.is_empty() {
                debug!("start ignored: nothing pending");
                return;
            }
            state.arm()
        };

        info!(
            concurrent = self.shared.config.concurrent,
            interval_ms = self.shared.config.interval_ms,
            "queue started"
        );
        self.emit(&QueueEvent::Start);
        self.spawner.spawn(self.clone().drive(token));
    }

    /// Leave the running state and suppress auto-start until [`start`](Self::start).
    ///
    /// Tasks already launched run to completion and still emit their events.
    /// Calling it on a stopped queue emits `stop` again.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            state.disarm();
            state.stopped = true;
            state.last_ran = None;
        }
        self.shared.wake.notify_waiters();
        info!("queue stopped");
        self.emit(&QueueEvent::Stop);
    }

    /// Store one factory or a batch of them and return their ids.
    ///
    /// Starts the queue when the configuration asks for it and the queue was
    /// not stopped explicitly.
    pub fn enqueue(&self, tasks: impl Into<Tasks<T, E>>) -> Vec<TaskId> {
        let tasks = tasks.into();
        let ids: Vec<TaskId> = {
            let mut state = self.shared.state.lock();
            tasks
                .into_iter()
                .map(|factory| state.store.insert(factory))
                .collect()
        };
        debug!(count = ids.len(), "tasks enqueued");

        self.shared.wake.notify_waiters();
        if self.shared.config.start && !self.stopped() {
            self.start();
        }
        ids
    }

    /// Alias of [`enqueue`](Self::enqueue).
    pub fn add(&self, tasks: impl Into<Tasks<T, E>>) -> Vec<TaskId> {
        self.enqueue(tasks)
    }

    /// Enqueue a type-erased value.
    ///
    /// Accepts a [`TaskFactory`], a `Vec` of them, or a
    /// `Vec<Box<dyn Submittable>>` whose elements are each one of these.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidTask`] naming the offending type when any
    /// part of `value` is not a task. Nothing is stored in that case.
    pub fn enqueue_dyn(&self, value: Box<dyn Submittable>) -> Result<Vec<TaskId>, QueueError> {
        let factories = resolve_submission::<T, E>(value).map_err(|err| {
            warn!("rejected enqueue: {err}");
            err
        })?;
        Ok(self.enqueue(factories))
    }

    /// Run one paced dispatch cycle and wait for the tasks it launched.
    ///
    /// Waits until the cycle's start slot, launches up to the free
    /// concurrency, and resolves with each launched task's outcome in launch
    /// order once its events and bookkeeping are done. Tasks that panicked
    /// are omitted. Works whether or not the queue is started.
    pub async fn dequeue(&self) -> Vec<Result<T, E>> {
        let (slot, _) = self
            .shared
            .state
            .lock()
            .reserve_slot(self.shared.config.interval());
        tokio::time::sleep_until(slot).await;

        let receivers = self.dispatch(None, true).unwrap_or_default();
        join_all(receivers)
            .await
            .into_iter()
            .filter_map(Result::ok)
            .collect()
    }

    async fn drive(self, token: DriverToken) {
        debug!(token = token.0, "driver armed");
        loop {
            // Registered before the state is read so a wakeup sent after the
            // check below is never missed.
            let notified = self.shared.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let (slot, delay) = {
                let mut state = self.shared.state.lock();
                if state.driver != Some(token) {
                    break;
                }
                state.reserve_slot(self.shared.config.interval())
            };
            if !delay.is_zero() {
                debug!(token = token.0, ?delay, "waiting for next slot");
            }
            tokio::time::sleep_until(slot).await;

            if self.dispatch(Some(token), false).is_none() {
                break;
            }
            // Every slot is taken or nothing is pending; wait for either to change.
            notified.await;
        }
        debug!(token = token.0, "driver exited");
    }

    /// Launch up to the free concurrency. Returns `None` when `token` belongs
    /// to a driver that has been disarmed.
    fn dispatch(
        &self,
        token: Option<DriverToken>,
        collect: bool,
    ) -> Option<Vec<oneshot::Receiver<Result<T, E>>>> {
        let batch = {
            let mut state = self.shared.state.lock();
            if token.is_some() && state.driver != token {
                return None;
            }
            let free = self
                .shared
                .config
                .concurrent
                .saturating_sub(state.in_flight);
            let batch = state.store.take_batch(free);
            state.in_flight += batch.len();
            batch
        };

        if !batch.is_empty() {
            debug!(launched = batch.len(), "dispatch cycle");
        }

        let mut receivers = Vec::new();
        for entry in batch {
            if collect {
                let (tx, rx) = oneshot::channel();
                self.launch(entry, Some(tx));
                receivers.push(rx);
            } else {
                self.launch(entry, None);
            }
        }
        Some(receivers)
    }

    fn launch(
        &self,
        entry: TaskEntry<TaskFactory<T, E>>,
        reply: Option<oneshot::Sender<Result<T, E>>>,
    ) {
        let TaskEntry { id, factory } = entry;
        let engine = self.clone();

        self.spawner.spawn(async move {
            debug!("executing task {id}");
            let outcome = AssertUnwindSafe(async move { factory().await })
                .catch_unwind()
                .await;

            if let Ok(outcome) = outcome {
                engine.settle(id, &outcome);
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            } else {
                error!("task {id} panicked");
                engine.shared.state.lock().panicked += 1;
                engine.emit(&QueueEvent::Dequeue);
                engine.finalize();
            }
        });
    }

    fn settle(&self, id: TaskId, outcome: &Result<T, E>) {
        match outcome {
            Ok(value) => {
                self.shared.state.lock().resolved += 1;
                debug!("task {id} resolved");
                self.emit(&QueueEvent::Resolve(value));
            }
            Err(error) => {
                self.shared.state.lock().rejected += 1;
                debug!("task {id} rejected");
                self.emit(&QueueEvent::Reject(error));
            }
        }
        self.emit(&QueueEvent::Dequeue);
        self.finalize();
    }

    /// Account for one settled task and detect the drain.
    fn finalize(&self) {
        let drained = {
            let mut state = self.shared.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.is_drained()
        };

        if drained {
            info!("queue drained");
            self.emit(&QueueEvent::End);

            // An `end` listener may have enqueued more work; only idle if not.
            let was_running = {
                let mut state = self.shared.state.lock();
                let idle = state.started && state.is_drained();
                if idle {
                    state.disarm();
                }
                idle
            };
            self.shared.wake.notify_waiters();
            if was_running {
                self.emit(&QueueEvent::Stop);
            }
        } else {
            self.shared.wake.notify_waiters();
        }
    }
}
