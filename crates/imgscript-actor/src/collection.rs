//! Collections: the scheduler's entry point
//!
//! A [`Collection`] owns an append-only list of items. Callers schedule
//! tasks by item id; each item runs its tasks one at a time in arrival
//! order while unrelated items make progress in parallel. [`Collection::collect`]
//! is the barrier that tears every item down.

use crate::config::CollectionConfig;
use crate::error::{CollectError, CollectionError, ConfigError, TaskError};
use crate::item::{Item, ItemId, ItemLabel};
use crate::log::{LogLevel, LogRecord, LogSink, TracingSink};
use crate::task::{Completion, Envelope, Task};
use crate::worker::{CollectHook, HookSlot, ItemHandle};
use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a collect barrier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectReport {
    /// Items torn down by this barrier
    pub collected: usize,
    /// Items that were already torn down (collected earlier or panicked)
    pub skipped: usize,
}

impl CollectReport {
    /// Items the barrier looked at
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.collected + self.skipped
    }
}

/// Append-only set of items sharing one collect hook
///
/// Share it behind an `Arc`: every method takes `&self`.
pub struct Collection<T> {
    config: CollectionConfig,
    items: RwLock<Vec<ItemHandle<T>>>,
    hook: HookSlot<T>,
    sink: Arc<dyn LogSink>,
}

impl<T: Send + 'static> Collection<T> {
    /// Collection with default configuration, logging through `tracing`
    #[must_use]
    pub fn new() -> Self {
        Self::build(CollectionConfig::default(), Arc::new(TracingSink))
    }

    /// Collection with default configuration and a custom log sink
    #[must_use]
    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self::build(CollectionConfig::default(), sink)
    }

    /// Collection with explicit configuration
    ///
    /// # Errors
    /// - `ConfigError::Invalid` if the configuration fails validation
    pub fn with_config(
        config: CollectionConfig,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, sink))
    }

    fn build(config: CollectionConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            config,
            items: RwLock::new(Vec::new()),
            hook: Arc::new(RwLock::new(None)),
            sink,
        }
    }

    /// Add an item and start its worker
    ///
    /// The returned id equals the number of items added before it.
    ///
    /// # Errors
    /// - `CollectionError::Spawn` if the worker thread cannot be started
    pub fn add_item(&self, name: &str) -> Result<ItemId, CollectionError> {
        let mut items = self.items.write();
        let label = ItemLabel::new(ItemId::new(items.len()), name);
        let handle = ItemHandle::spawn(
            label.clone(),
            &self.config,
            Arc::clone(&self.hook),
            Arc::clone(&self.sink),
        )
        .map_err(|source| CollectionError::Spawn {
            name: name.to_string(),
            source,
        })?;
        items.push(handle);
        drop(items);

        self.sink
            .record(LogRecord::for_item(LogLevel::Info, "item added", &label));
        Ok(label.id)
    }

    /// Install the teardown hook
    ///
    /// The hook runs on each item's worker during collect, and after a task
    /// panics, before the resource is dropped. Replaces any previous hook;
    /// items already torn down are not revisited.
    pub fn on_collect<F>(&self, hook: F)
    where
        F: Fn(&mut Item<T>) + Send + Sync + 'static,
    {
        let hook: CollectHook<T> = Arc::new(hook);
        *self.hook.write() = Some(hook);
    }

    /// Remove the teardown hook
    pub fn clear_on_collect(&self) {
        *self.hook.write() = None;
    }

    /// Enqueue a task, waiting while the item's mailbox is full
    ///
    /// # Errors
    /// - `TaskError::Closed` if the item has been torn down
    ///
    /// # Panics
    /// Panics if `id` does not name an item of this collection.
    pub async fn schedule<R>(
        &self,
        id: ItemId,
        task: Task<T, R>,
    ) -> Result<Completion<R>, TaskError>
    where
        R: Send + 'static,
    {
        let handle = self.handle(id);
        if handle.is_cleaned() {
            return Err(self.reject(&handle, task.lib(), task.name()));
        }

        let (envelope, completion) = task.into_envelope(id);
        self.log_scheduled(&handle, &envelope);
        match handle.send(envelope).await {
            Ok(()) => Ok(completion),
            Err(envelope) => {
                let meta = envelope.meta();
                Err(self.reject(&handle, &meta.lib, &meta.name))
            }
        }
    }

    /// Enqueue a task from a plain thread, blocking while the mailbox is full
    ///
    /// # Errors
    /// - `TaskError::Closed` if the item has been torn down
    ///
    /// # Panics
    /// Panics if `id` is out of range, or when called from within an
    /// asynchronous execution context.
    pub fn blocking_schedule<R>(
        &self,
        id: ItemId,
        task: Task<T, R>,
    ) -> Result<Completion<R>, TaskError>
    where
        R: Send + 'static,
    {
        let handle = self.handle(id);
        if handle.is_cleaned() {
            return Err(self.reject(&handle, task.lib(), task.name()));
        }

        let (envelope, completion) = task.into_envelope(id);
        self.log_scheduled(&handle, &envelope);
        match handle.blocking_send(envelope) {
            Ok(()) => Ok(completion),
            Err(envelope) => {
                let meta = envelope.meta();
                Err(self.reject(&handle, &meta.lib, &meta.name))
            }
        }
    }

    /// Schedule a task and wait for its result
    ///
    /// # Errors
    /// Any [`TaskError`] from scheduling or running the task.
    ///
    /// # Panics
    /// Panics if `id` does not name an item of this collection.
    pub async fn run<R>(&self, id: ItemId, task: Task<T, R>) -> Result<R, TaskError>
    where
        R: Send + 'static,
    {
        self.schedule(id, task).await?.await
    }

    /// Blocking form of [`Collection::run`]
    ///
    /// # Errors
    /// Any [`TaskError`] from scheduling or running the task.
    ///
    /// # Panics
    /// Panics if `id` is out of range, or when called from within an
    /// asynchronous execution context.
    pub fn blocking_run<R>(&self, id: ItemId, task: Task<T, R>) -> Result<R, TaskError>
    where
        R: Send + 'static,
    {
        self.blocking_schedule(id, task)?.blocking_wait()
    }

    /// Tear down every item and wait until all are done
    ///
    /// Tasks already queued ahead of the terminal task still run. Items are
    /// torn down in parallel. Applies the configured collect timeout, if
    /// any; without one this never fails.
    ///
    /// # Errors
    /// - `CollectError::TimedOut` if a configured deadline passes first
    pub async fn collect(&self) -> Result<CollectReport, CollectError> {
        match self.config.collect_timeout() {
            Some(timeout) => self.collect_with_timeout(timeout).await,
            None => Ok(self.collect_all().await),
        }
    }

    /// Collect with an explicit deadline
    ///
    /// On timeout, terminal tasks that were already enqueued still run
    /// eventually; the error lists items that had not finished teardown.
    ///
    /// # Errors
    /// - `CollectError::TimedOut` if some item is still pending at the deadline
    pub async fn collect_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<CollectReport, CollectError> {
        if let Ok(report) = tokio::time::timeout(timeout, self.collect_all()).await {
            return Ok(report);
        }

        let pending: Vec<ItemId> = self
            .items
            .read()
            .iter()
            .filter(|handle| !handle.is_cleaned())
            .map(|handle| {
                self.sink.record(LogRecord::for_item(
                    LogLevel::Warn,
                    "collect timed out",
                    handle.label(),
                ));
                handle.id()
            })
            .collect();

        Err(CollectError::TimedOut {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            pending,
        })
    }

    /// Blocking form of [`Collection::collect`]
    ///
    /// # Errors
    /// - `CollectError::TimedOut` if a configured deadline passes first
    /// - `CollectError::Runtime` if the private runtime cannot start
    ///
    /// # Panics
    /// Panics when called from within an asynchronous execution context.
    pub fn blocking_collect(&self) -> Result<CollectReport, CollectError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on(self.collect())
    }

    async fn collect_all(&self) -> CollectReport {
        let handles = self.items.read().clone();
        let outcomes = join_all(handles.iter().map(ItemHandle::collect)).await;
        let collected = outcomes.iter().filter(|torn_down| **torn_down).count();

        CollectReport {
            collected,
            skipped: outcomes.len() - collected,
        }
    }
}

impl<T> Collection<T> {
    /// Configuration in effect
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Number of items ever added
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether no item was ever added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Ids of all items, in insertion order
    #[must_use]
    pub fn ids(&self) -> Vec<ItemId> {
        self.items.read().iter().map(ItemHandle::id).collect()
    }

    /// Name of an item, `None` if out of range
    #[must_use]
    pub fn item_name(&self, id: ItemId) -> Option<String> {
        self.items
            .read()
            .get(id.index())
            .map(|handle| handle.label().name.to_string())
    }

    /// Whether an item has been torn down, `None` if out of range
    #[must_use]
    pub fn is_cleaned(&self, id: ItemId) -> Option<bool> {
        self.items.read().get(id.index()).map(ItemHandle::is_cleaned)
    }

    /// Tasks waiting in an item's mailbox, `None` if out of range
    #[must_use]
    pub fn pending(&self, id: ItemId) -> Option<usize> {
        self.items.read().get(id.index()).map(ItemHandle::pending)
    }

    fn handle(&self, id: ItemId) -> ItemHandle<T> {
        let items = self.items.read();
        match items.get(id.index()) {
            Some(handle) => handle.clone(),
            None => panic!(
                "item {id} is out of range: collection holds {} item(s)",
                items.len()
            ),
        }
    }

    fn log_scheduled(&self, handle: &ItemHandle<T>, envelope: &Envelope<T>) {
        self.sink.record(LogRecord::for_task(
            LogLevel::Info,
            "task scheduled",
            handle.label(),
            envelope.meta(),
        ));
    }

    fn reject(&self, handle: &ItemHandle<T>, lib: &str, name: &str) -> TaskError {
        let mut record =
            LogRecord::for_item(LogLevel::Warn, "task rejected: item closed", handle.label());
        record.lib = Arc::from(lib);
        record.task = Arc::from(name);
        self.sink.record(record);
        TaskError::Closed { item: handle.id() }
    }
}

impl<T: Send + 'static> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("config", &self.config)
            .field("items", &self.items.read().len())
            .field("has_collect_hook", &self.hook.read().is_some())
            .finish_non_exhaustive()
    }
}
