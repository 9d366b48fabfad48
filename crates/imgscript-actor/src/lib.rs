//! imgscript actor - per-resource task scheduling
//!
//! Host resources (images, layers, documents) are wrapped in items. Each
//! item has a worker that runs scheduled tasks one at a time, in order,
//! with exclusive access to the resource:
//! - [`Collection`] holds items and is the scheduling entry point
//! - [`Task`] is a unit of work bound for one item
//! - [`Completion`] resolves with the task's result
//! - [`Collection::collect`] is the teardown barrier
//!
//! # Example
//!
//! ```
//! use imgscript_actor::{Collection, Item, Task};
//!
//! # tokio_test_rt().block_on(async {
//! let canvases: Collection<Vec<&'static str>> = Collection::new();
//! let id = canvases.add_item("poster").unwrap();
//!
//! let first = canvases
//!     .schedule(id, Task::new("draw", "line", |item: &mut Item<_>| {
//!         item.get_or_insert_with(Vec::new).push("line");
//!     }))
//!     .await
//!     .unwrap();
//! first.await.unwrap();
//!
//! let ops = canvases
//!     .run(id, Task::new("draw", "ops", |item: &mut Item<Vec<&'static str>>| item.get().cloned()))
//!     .await
//!     .unwrap();
//! assert_eq!(ops, Some(vec!["line"]));
//!
//! canvases.collect().await.unwrap();
//! # });
//! # fn tokio_test_rt() -> tokio::runtime::Runtime {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod collection;
pub mod config;
pub mod error;
pub mod item;
pub mod log;
pub mod task;
mod worker;

pub use collection::{CollectReport, Collection};
pub use config::{CollectionConfig, DEFAULT_MAILBOX_CAPACITY};
pub use error::{CollectError, CollectionError, ConfigError, TaskError};
pub use item::{Item, ItemId};
pub use log::{LogLevel, LogRecord, LogSink, MemorySink, NullSink, TracingSink};
pub use task::{Completion, Task, TaskId};
pub use worker::CollectHook;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for scheduling work onto items
    pub use crate::{Collection, CollectionConfig, Completion, Item, ItemId, Task, TaskError};
}
