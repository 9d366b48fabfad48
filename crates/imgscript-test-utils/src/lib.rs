//! Testing utilities for imgscript workspace
//!
//! Shared fixtures: a fake canvas resource, drop probes, a gate for
//! holding a worker inside a task, and recording collections.

#![allow(missing_docs)]

use imgscript_actor::{Collection, CollectionConfig, Item, MemorySink, Task};
use imgscript_args::{ArgSpec, Signature};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Stand-in for a host image: dimensions plus a log of applied operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pub width: i64,
    pub height: i64,
    pub ops: Vec<String>,
}

impl Canvas {
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn apply(&mut self, op: impl Into<String>) {
        self.ops.push(op.into());
    }
}

/// Counts how many [`DropProbe`]s created from it have been dropped
#[derive(Debug, Clone, Default)]
pub struct DropCounter(Arc<AtomicUsize>);

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> DropProbe {
        DropProbe(Arc::clone(&self.0))
    }

    pub fn dropped(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct DropProbe(Arc<AtomicUsize>);

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Holds item workers inside a task until the test opens it
#[derive(Debug, Clone, Default)]
pub struct Gate {
    inner: Arc<GateInner>,
}

#[derive(Debug, Default)]
struct GateInner {
    open: Mutex<bool>,
    opened: Condvar,
    entered: AtomicUsize,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block the calling worker until [`Gate::open`]
    pub fn wait(&self) {
        self.inner.entered.fetch_add(1, Ordering::SeqCst);
        let mut open = self.inner.open.lock();
        while !*open {
            self.inner.opened.wait(&mut open);
        }
    }

    pub fn open(&self) {
        *self.inner.open.lock() = true;
        self.inner.opened.notify_all();
    }

    pub fn entered(&self) -> usize {
        self.inner.entered.load(Ordering::SeqCst)
    }

    /// Poll until `n` workers are parked in [`Gate::wait`]
    pub async fn until_entered(&self, n: usize) {
        while self.entered() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    pub fn blocking_until_entered(&self, n: usize) {
        while self.entered() < n {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// A task that parks its worker on this gate
    pub fn task<T: 'static>(&self) -> Task<T> {
        let gate = self.clone();
        Task::new("test", "gate", move |_: &mut Item<T>| gate.wait())
    }
}

pub fn recording_collection<T: Send + 'static>() -> (Arc<Collection<T>>, Arc<MemorySink>) {
    recording_collection_with(CollectionConfig::default())
}

pub fn recording_collection_with<T: Send + 'static>(
    config: CollectionConfig,
) -> (Arc<Collection<T>>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let collection = Collection::with_config(config, sink.clone()).unwrap();
    (Arc::new(collection), sink)
}

/// `canvas.resize(width, height, opts?)` with an optional filter name
pub fn resize_signature() -> Signature {
    Signature::new(
        "canvas",
        "resize",
        vec![
            ArgSpec::int("width"),
            ArgSpec::int("height"),
            ArgSpec::table("opts", vec![ArgSpec::string("filter").optional()]).optional(),
        ],
    )
    .unwrap()
}

/// `canvas.draw(op...)`
pub fn draw_signature() -> Signature {
    Signature::new(
        "canvas",
        "draw",
        vec![ArgSpec::variadic("ops", ArgSpec::string("op"))],
    )
    .unwrap()
}
