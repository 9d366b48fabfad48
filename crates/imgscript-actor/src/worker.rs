//! Item workers and the handles that feed them
//!
//! Each item owns one OS thread draining a bounded mailbox. The thread is
//! the only place the resource lives, which gives per-item mutual exclusion
//! and FIFO execution for free. Teardown (collect or a task panic) runs the
//! collect hook, drops the resource, then closes the mailbox.

use crate::config::CollectionConfig;
use crate::item::{Item, ItemId, ItemLabel};
use crate::log::{LogLevel, LogRecord, LogSink};
use crate::task::{panic_message, Envelope, TaskMeta};
use parking_lot::RwLock;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::{mpsc, oneshot};

/// Teardown callback run on the item's worker before its resource is dropped
pub type CollectHook<T> = Arc<dyn Fn(&mut Item<T>) + Send + Sync>;

/// Hook shared between a collection and all of its workers
pub(crate) type HookSlot<T> = Arc<RwLock<Option<CollectHook<T>>>>;

/// Caller-side handle to one item's worker
pub(crate) struct ItemHandle<T> {
    label: ItemLabel,
    capacity: usize,
    mailbox: mpsc::Sender<Envelope<T>>,
    cleaned: Arc<AtomicBool>,
}

impl<T> Clone for ItemHandle<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            capacity: self.capacity,
            mailbox: self.mailbox.clone(),
            cleaned: Arc::clone(&self.cleaned),
        }
    }
}

impl<T: Send + 'static> ItemHandle<T> {
    /// Start the worker thread for a new item
    pub(crate) fn spawn(
        label: ItemLabel,
        config: &CollectionConfig,
        hook: HookSlot<T>,
        sink: Arc<dyn LogSink>,
    ) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel(config.mailbox_capacity);
        let cleaned = Arc::new(AtomicBool::new(false));
        let thread_name = format!(
            "{}-{}-{}",
            config.thread_name_prefix,
            label.id.index(),
            label.name
        )
        .replace('\0', "");

        let worker = Worker {
            item: Item::new(label.clone()),
            mailbox: rx,
            cleaned: Arc::clone(&cleaned),
            hook,
            sink,
        };
        thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())?;

        Ok(Self {
            label,
            capacity: config.mailbox_capacity,
            mailbox: tx,
            cleaned,
        })
    }
}

impl<T> ItemHandle<T> {
    pub(crate) fn label(&self) -> &ItemLabel {
        &self.label
    }

    pub(crate) fn id(&self) -> ItemId {
        self.label.id
    }

    pub(crate) fn is_cleaned(&self) -> bool {
        self.cleaned.load(Ordering::Acquire)
    }

    /// Tasks queued but not yet picked up by the worker
    pub(crate) fn pending(&self) -> usize {
        if self.mailbox.is_closed() {
            return 0;
        }
        self.capacity.saturating_sub(self.mailbox.capacity())
    }

    /// Enqueue, waiting for mailbox space; hands the envelope back if closed
    pub(crate) async fn send(&self, envelope: Envelope<T>) -> Result<(), Envelope<T>> {
        self.mailbox.send(envelope).await.map_err(|err| err.0)
    }

    /// Enqueue from a plain thread, blocking for mailbox space
    pub(crate) fn blocking_send(&self, envelope: Envelope<T>) -> Result<(), Envelope<T>> {
        self.mailbox.blocking_send(envelope).map_err(|err| err.0)
    }

    /// Enqueue the terminal task and wait for teardown
    ///
    /// Returns `true` when this call tore the item down, `false` when the
    /// item was already gone.
    pub(crate) async fn collect(&self) -> bool {
        if self.is_cleaned() {
            return false;
        }
        let (done, finished) = oneshot::channel();
        let envelope = Envelope::Collect {
            meta: TaskMeta::collect(),
            done,
        };
        if self.send(envelope).await.is_err() {
            return false;
        }
        finished.await.is_ok()
    }
}

struct Worker<T> {
    item: Item<T>,
    mailbox: mpsc::Receiver<Envelope<T>>,
    cleaned: Arc<AtomicBool>,
    hook: HookSlot<T>,
    sink: Arc<dyn LogSink>,
}

impl<T> Worker<T> {
    fn run(mut self) {
        while let Some(envelope) = self.mailbox.blocking_recv() {
            match envelope {
                Envelope::Run { meta, run } => {
                    self.log_task(LogLevel::Info, "task called", &meta);
                    match run(&mut self.item) {
                        Ok(()) => self.log_task(LogLevel::Info, "task finished", &meta),
                        Err(caught) => {
                            self.log_task(
                                LogLevel::Error,
                                format!("task panicked: {}", caught.message),
                                &meta,
                            );
                            self.teardown();
                            caught.notify();
                        }
                    }
                }
                Envelope::Collect { meta, done } => {
                    self.log_task(LogLevel::Info, "task called", &meta);
                    self.teardown();
                    self.log_task(LogLevel::Info, "task finished", &meta);
                    let _ = done.send(());
                }
            }

            if self.item.is_cleaned() {
                break;
            }
        }

        self.mailbox.close();
        while let Ok(envelope) = self.mailbox.try_recv() {
            if let Envelope::Run { meta, .. } = &envelope {
                self.log_task(LogLevel::Warn, "task abandoned: item closed", meta);
            }
        }

        if !self.item.is_cleaned() {
            self.log_item(LogLevel::Warn, "item released without collect");
        }
    }

    /// Run the hook, drop the resource, mark the item cleaned
    fn teardown(&mut self) {
        let hook = self.hook.read().clone();
        if let Some(hook) = hook {
            let item = &mut self.item;
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| hook(item))) {
                self.log_item(
                    LogLevel::Error,
                    format!("collect hook panicked: {}", panic_message(payload.as_ref())),
                );
            }
        }

        let resource = self.item.mark_cleaned();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || drop(resource))) {
            self.log_item(
                LogLevel::Error,
                format!("resource drop panicked: {}", panic_message(payload.as_ref())),
            );
        }

        self.cleaned.store(true, Ordering::Release);
        self.log_item(LogLevel::Info, "item collected");
    }

    fn log_task(&self, level: LogLevel, message: impl Into<String>, meta: &TaskMeta) {
        self.sink
            .record(LogRecord::for_task(level, message, self.item.label(), meta));
    }

    fn log_item(&self, level: LogLevel, message: impl Into<String>) {
        self.sink
            .record(LogRecord::for_item(level, message, self.item.label()));
    }
}
