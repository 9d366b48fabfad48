//! Tasks, mailbox envelopes and completion signals

use crate::error::TaskError;
use crate::item::{Item, ItemId};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use ulid::Ulid;

/// Unique task identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Ulid);

impl TaskId {
    /// Generate new task ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a task as it appears in logs and errors
#[derive(Debug, Clone)]
pub(crate) struct TaskMeta {
    pub(crate) id: TaskId,
    pub(crate) lib: Arc<str>,
    pub(crate) name: Arc<str>,
}

impl TaskMeta {
    pub(crate) fn new(lib: &str, name: &str) -> Self {
        Self {
            id: TaskId::new(),
            lib: Arc::from(lib),
            name: Arc::from(name),
        }
    }

    /// The terminal task enqueued by a collect
    pub(crate) fn collect() -> Self {
        Self::new("collection", "collect")
    }

    pub(crate) fn qualified(&self) -> String {
        format!("{}.{}", self.lib, self.name)
    }
}

type Body<T, R> = Box<dyn FnOnce(&mut Item<T>) -> R + Send>;

/// Type-erased task body
pub(crate) type RunFn<T> = Box<dyn FnOnce(&mut Item<T>) -> Result<(), TaskPanic> + Send>;

/// A caught task panic whose completion has not been signalled yet
///
/// The worker tears the item down first and only then calls
/// [`TaskPanic::notify`], so a caller woken by the error already sees the
/// item cleaned.
pub(crate) struct TaskPanic {
    pub(crate) message: String,
    notify: Box<dyn FnOnce() + Send>,
}

impl TaskPanic {
    pub(crate) fn notify(self) {
        (self.notify)();
    }
}

/// Unit of work bound for one item
///
/// `lib` and `name` identify the originating host operation in logs. The
/// body runs on the item's worker with exclusive access to the item; its
/// return value is delivered through the [`Completion`] returned when the
/// task is scheduled.
pub struct Task<T, R = ()> {
    meta: TaskMeta,
    body: Body<T, R>,
}

impl<T, R> Task<T, R>
where
    T: 'static,
    R: Send + 'static,
{
    /// Create a task
    pub fn new<F>(lib: &str, name: &str, body: F) -> Self
    where
        F: FnOnce(&mut Item<T>) -> R + Send + 'static,
    {
        Self {
            meta: TaskMeta::new(lib, name),
            body: Box::new(body),
        }
    }

    /// Task identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.meta.id
    }

    /// Originating library
    #[inline]
    #[must_use]
    pub fn lib(&self) -> &str {
        &self.meta.lib
    }

    /// Originating operation
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Split into the mailbox envelope and the caller's completion
    pub(crate) fn into_envelope(self, item: ItemId) -> (Envelope<T>, Completion<R>) {
        let (tx, rx) = oneshot::channel();
        let Self { meta, body } = self;
        let completion = Completion {
            item,
            task_id: meta.id,
            task: meta.qualified(),
            rx,
        };

        let task = completion.task.clone();
        let run: RunFn<T> = Box::new(move |target: &mut Item<T>| {
            match panic::catch_unwind(AssertUnwindSafe(|| body(target))) {
                Ok(value) => {
                    let _ = tx.send(Ok(value));
                    Ok(())
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    let error = TaskError::Panicked {
                        item: target.id(),
                        task,
                        message: message.clone(),
                    };
                    Err(TaskPanic {
                        message,
                        notify: Box::new(move || {
                            let _ = tx.send(Err(error));
                        }),
                    })
                }
            }
        });

        (Envelope::Run { meta, run }, completion)
    }
}

impl<T, R> fmt::Debug for Task<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.meta.id)
            .field("lib", &self.meta.lib)
            .field("name", &self.meta.name)
            .finish_non_exhaustive()
    }
}

/// What travels through an item's mailbox
pub(crate) enum Envelope<T> {
    /// Ordinary task
    Run { meta: TaskMeta, run: RunFn<T> },
    /// Terminal teardown task; `done` fires once the item is cleaned
    Collect {
        meta: TaskMeta,
        done: oneshot::Sender<()>,
    },
}

impl<T> Envelope<T> {
    pub(crate) fn meta(&self) -> &TaskMeta {
        match self {
            Self::Run { meta, .. } | Self::Collect { meta, .. } => meta,
        }
    }
}

/// Completion signal of a scheduled task
///
/// Resolves with the task's return value once it has run. Await it from
/// async code or call [`Completion::blocking_wait`] from a plain thread.
/// Dropping a completion does not cancel the task.
#[must_use = "dropping a completion discards the task's result"]
pub struct Completion<R> {
    item: ItemId,
    task_id: TaskId,
    task: String,
    rx: oneshot::Receiver<Result<R, TaskError>>,
}

impl<R> Completion<R> {
    /// Item the task was scheduled on
    #[inline]
    #[must_use]
    pub fn item(&self) -> ItemId {
        self.item
    }

    /// Identifier of the scheduled task
    #[inline]
    #[must_use]
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Block the current thread until the task has run
    ///
    /// # Errors
    /// - `TaskError::Panicked` if the task body panicked
    /// - `TaskError::Abandoned` if the item was torn down first
    ///
    /// # Panics
    /// Panics when called from within an asynchronous execution context.
    pub fn blocking_wait(self) -> Result<R, TaskError> {
        let Self { item, task, rx, .. } = self;
        rx.blocking_recv()
            .unwrap_or_else(|_| Err(TaskError::Abandoned { item, task }))
    }
}

impl<R> Unpin for Completion<R> {}

impl<R> Future for Completion<R> {
    type Output = Result<R, TaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(TaskError::Abandoned {
                    item: this.item,
                    task: this.task.clone(),
                })
            })
        })
    }
}

impl<R> fmt::Debug for Completion<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("item", &self.item)
            .field("task_id", &self.task_id)
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemLabel;

    fn item() -> Item<i32> {
        Item::new(ItemLabel::new(ItemId::new(0), "test"))
    }

    #[test]
    fn envelope_delivers_return_value() {
        let task = Task::new("math", "double", |item: &mut Item<i32>| {
            let value = item.get_or_insert_with(|| 21);
            *value *= 2;
            *value
        });
        assert_eq!(task.lib(), "math");
        assert_eq!(task.name(), "double");

        let (envelope, completion) = task.into_envelope(ItemId::new(0));
        let Envelope::Run { meta, run } = envelope else {
            panic!("expected a run envelope");
        };
        assert_eq!(meta.qualified(), "math.double");
        assert_eq!(meta.id, completion.task_id());

        let mut target = item();
        assert!(run(&mut target).is_ok());
        assert_eq!(completion.blocking_wait(), Ok(42));
    }

    #[test]
    fn envelope_reports_panics() {
        let task: Task<i32> = Task::new("math", "explode", |_| panic!("division by zero"));
        let (envelope, completion) = task.into_envelope(ItemId::new(0));
        let Envelope::Run { run, .. } = envelope else {
            panic!("expected a run envelope");
        };

        let mut target = item();
        let Err(caught) = run(&mut target) else {
            panic!("expected the panic to be caught");
        };
        assert_eq!(caught.message, "division by zero");
        caught.notify();
        assert_eq!(
            completion.blocking_wait(),
            Err(TaskError::Panicked {
                item: ItemId::new(0),
                task: "math.explode".to_string(),
                message: "division by zero".to_string(),
            })
        );
    }

    #[test]
    fn dropped_envelope_abandons_completion() {
        let task: Task<i32> = Task::new("math", "noop", |_| ());
        let (envelope, completion) = task.into_envelope(ItemId::new(3));
        drop(envelope);

        assert_eq!(
            completion.blocking_wait(),
            Err(TaskError::Abandoned {
                item: ItemId::new(3),
                task: "math.noop".to_string(),
            })
        );
    }

    #[test]
    fn panic_payloads_render() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&17_u8), "non-string panic payload");
    }
}
