//! Structured scheduler log records and pluggable sinks
//!
//! Every scheduling event produces a [`LogRecord`] carrying the item and
//! task identity. The default sink forwards to `tracing`; [`MemorySink`]
//! keeps records in order so tests can reason about execution ordering.

use crate::item::{ItemId, ItemLabel};
use crate::task::{TaskId, TaskMeta};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Severity of a scheduler log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Normal lifecycle events
    Info,
    /// Rejected or degraded operations
    Warn,
    /// Task panics and failed teardown
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

/// One scheduler event
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Severity
    pub level: LogLevel,
    /// Event description, e.g. `"task called"`
    pub message: String,
    /// Item the event concerns
    pub item: ItemId,
    /// Item name at the time of the event
    pub item_name: Arc<str>,
    /// Originating library, empty for item-level events
    pub lib: Arc<str>,
    /// Originating operation, empty for item-level events
    pub task: Arc<str>,
    /// Task identifier, for task-level events
    pub task_id: Option<TaskId>,
    /// When the record was produced
    pub at: Instant,
}

impl LogRecord {
    pub(crate) fn for_task(
        level: LogLevel,
        message: impl Into<String>,
        item: &ItemLabel,
        task: &TaskMeta,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            item: item.id,
            item_name: Arc::clone(&item.name),
            lib: Arc::clone(&task.lib),
            task: Arc::clone(&task.name),
            task_id: Some(task.id),
            at: Instant::now(),
        }
    }

    pub(crate) fn for_item(level: LogLevel, message: impl Into<String>, item: &ItemLabel) -> Self {
        Self {
            level,
            message: message.into(),
            item: item.id,
            item_name: Arc::clone(&item.name),
            lib: Arc::from(""),
            task: Arc::from(""),
            task_id: None,
            at: Instant::now(),
        }
    }

    /// `lib.task`, or an empty string for item-level events
    #[must_use]
    pub fn qualified_task(&self) -> String {
        if self.lib.is_empty() && self.task.is_empty() {
            String::new()
        } else {
            format!("{}.{}", self.lib, self.task)
        }
    }
}

/// Destination for scheduler log records
///
/// Called from caller threads and item workers concurrently; implementations
/// must not block for long or they will stall the item that logged.
pub trait LogSink: Send + Sync {
    /// Accept one record
    fn record(&self, record: LogRecord);
}

impl<F> LogSink for F
where
    F: Fn(LogRecord) + Send + Sync,
{
    fn record(&self, record: LogRecord) {
        self(record);
    }
}

/// Forwards records to `tracing` under the `imgscript_actor` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, record: LogRecord) {
        let item = record.item.index();
        let task_id = record.task_id.map(|id| id.to_string()).unwrap_or_default();
        match record.level {
            LogLevel::Info => tracing::info!(
                item,
                item_name = %record.item_name,
                lib = %record.lib,
                task = %record.task,
                task_id = %task_id,
                "{}",
                record.message
            ),
            LogLevel::Warn => tracing::warn!(
                item,
                item_name = %record.item_name,
                lib = %record.lib,
                task = %record.task,
                task_id = %task_id,
                "{}",
                record.message
            ),
            LogLevel::Error => tracing::error!(
                item,
                item_name = %record.item_name,
                lib = %record.lib,
                task = %record.task,
                task_id = %task_id,
                "{}",
                record.message
            ),
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn record(&self, _record: LogRecord) {}
}

/// Keeps every record in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    /// Create an empty sink
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.inner.lock().clone()
    }

    /// Records for one item, in arrival order
    #[must_use]
    pub fn records_for(&self, item: ItemId) -> Vec<LogRecord> {
        self.inner
            .lock()
            .iter()
            .filter(|r| r.item == item)
            .cloned()
            .collect()
    }

    /// Messages only, in arrival order
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.inner.lock().iter().map(|r| r.message.clone()).collect()
    }

    /// Number of records with the given message
    #[must_use]
    pub fn count(&self, message: &str) -> usize {
        self.inner
            .lock()
            .iter()
            .filter(|r| r.message == message)
            .count()
    }

    /// Drop all records
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn record(&self, record: LogRecord) {
        self.inner.lock().push(record);
    }
}
