//! Task factories and the values accepted by `enqueue`.

use std::any::Any;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

use super::QueueError;

/// Zero-argument callable that starts one unit of asynchronous work.
///
/// The factory is invoked only when the task is dispatched, so nothing runs
/// while it waits in the queue.
pub type TaskFactory<T, E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, E>> + Send>;

/// Wrap a closure returning a future into a [`TaskFactory`].
///
/// ```rust,ignore
/// let factory = paced_queue::core::task(|| async { Ok::<_, String>(42) });
/// queue.enqueue(factory);
/// ```
pub fn task<T, E, F, Fut>(f: F) -> TaskFactory<T, E>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Box::new(move || f().boxed())
}

/// Struct-based alternative to closure factories.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use paced_queue::core::Job;
///
/// struct Fetch {
///     url: String,
/// }
///
/// #[async_trait]
/// impl Job<String, String> for Fetch {
///     async fn run(self: Box<Self>) -> Result<String, String> {
///         Ok(format!("fetched {}", self.url))
///     }
/// }
///
/// queue.enqueue(Fetch { url: "https://example.com".into() }.into_task());
/// ```
#[async_trait]
pub trait Job<T, E>: Send + 'static
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Perform the work.
    async fn run(self: Box<Self>) -> Result<T, E>;

    /// Turn the job into a factory the queue can store.
    fn into_task(self) -> TaskFactory<T, E>
    where
        Self: Sized,
    {
        let job: Box<Self> = Box::new(self);
        Box::new(move || job.run())
    }
}

/// One factory or an ordered batch of factories.
pub enum Tasks<T, E> {
    /// A single factory.
    One(TaskFactory<T, E>),
    /// Several factories, stored in order.
    Many(Vec<TaskFactory<T, E>>),
}

impl<T, E> Tasks<T, E> {
    /// Number of factories carried.
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(list) => list.len(),
        }
    }

    /// True for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T, E> IntoIterator for Tasks<T, E> {
    type Item = TaskFactory<T, E>;
    type IntoIter = std::vec::IntoIter<TaskFactory<T, E>>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Self::One(factory) => vec![factory].into_iter(),
            Self::Many(list) => list.into_iter(),
        }
    }
}

impl<T, E> From<TaskFactory<T, E>> for Tasks<T, E> {
    fn from(factory: TaskFactory<T, E>) -> Self {
        Self::One(factory)
    }
}

impl<T, E> From<Vec<TaskFactory<T, E>>> for Tasks<T, E> {
    fn from(list: Vec<TaskFactory<T, E>>) -> Self {
        Self::Many(list)
    }
}

impl<T, E, const N: usize> From<[TaskFactory<T, E>; N]> for Tasks<T, E> {
    fn from(list: [TaskFactory<T, E>; N]) -> Self {
        Self::Many(list.into())
    }
}

/// Any value that can be handed to [`enqueue_dyn`](crate::core::QueueEngine::enqueue_dyn).
///
/// Implemented for every `Send + 'static` type so type-erased callers can
/// pass whatever they hold; the queue checks at runtime that it is a task.
pub trait Submittable: Any + Send {
    /// Name of the concrete type, used in error reports.
    fn type_name(&self) -> &'static str;
    /// Upcast for downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<X: Any + Send> Submittable for X {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<X>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Resolve a type-erased value into factories, or report what it was.
///
/// Lists are checked element by element and fail as a whole, so a rejected
/// value never leaves part of a batch behind.
pub(crate) fn resolve_submission<T, E>(
    value: Box<dyn Submittable>,
) -> Result<Vec<TaskFactory<T, E>>, QueueError>
where
    T: 'static,
    E: 'static,
{
    let found = Submittable::type_name(&*value);
    let any = <dyn Submittable>::into_any(value);

    let any = match any.downcast::<TaskFactory<T, E>>() {
        Ok(factory) => return Ok(vec![*factory]),
        Err(other) => other,
    };
    let any = match any.downcast::<Vec<TaskFactory<T, E>>>() {
        Ok(list) => return Ok(*list),
        Err(other) => other,
    };
    match any.downcast::<Vec<Box<dyn Submittable>>>() {
        Ok(list) => list
            .into_iter()
            .try_fold(Vec::new(), |mut acc, item| {
                acc.extend(resolve_submission(item)?);
                Ok(acc)
            }),
        Err(_) => Err(QueueError::InvalidTask { found }),
    }
}
