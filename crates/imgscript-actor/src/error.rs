//! Error types for the actor scheduler
//!
//! Scheduling misuse that indicates a host bug (an out-of-range item id) is
//! not represented here: it panics at the call site. These types cover the
//! conditions a well-behaved caller still has to handle:
//! - an item that stopped accepting work
//! - a task that panicked or never ran
//! - a collect barrier that did not finish in time

use crate::item::ItemId;

/// Failure of a single scheduled task
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The item was torn down and no longer accepts tasks
    #[error("item {item} is closed")]
    Closed {
        /// Target item
        item: ItemId,
    },

    /// The task body panicked; the item was torn down
    #[error("task {task} on item {item} panicked: {message}")]
    Panicked {
        /// Item the task ran on
        item: ItemId,
        /// `lib.name` of the task
        task: String,
        /// Panic payload, if it was a string
        message: String,
    },

    /// The item was torn down while the task was still queued
    #[error("task {task} on item {item} was abandoned before it ran")]
    Abandoned {
        /// Item the task was queued on
        item: ItemId,
        /// `lib.name` of the task
        task: String,
    },
}

impl TaskError {
    /// Item this error refers to
    #[inline]
    #[must_use]
    pub fn item(&self) -> ItemId {
        match self {
            Self::Closed { item } | Self::Panicked { item, .. } | Self::Abandoned { item, .. } => {
                *item
            }
        }
    }

    /// Whether this task itself was the one that failed
    ///
    /// `false` means the task was a bystander of an earlier teardown.
    #[inline]
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }
}

/// Failure of the collect barrier
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Not every item finished teardown before the deadline
    #[error("collect timed out after {timeout_ms}ms with {} item(s) still pending", pending.len())]
    TimedOut {
        /// Deadline in milliseconds
        timeout_ms: u64,
        /// Items whose teardown had not completed
        pending: Vec<ItemId>,
    },

    /// A private runtime for the blocking form could not be started
    #[error("collect runtime unavailable: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Failure to add an item to a collection
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// The item's worker thread could not be spawned
    #[error("failed to start worker for item {name:?}: {source}")]
    Spawn {
        /// Requested item name
        name: String,
        /// OS error
        #[source]
        source: std::io::Error,
    },
}

/// Invalid collection configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A field failed validation
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}
