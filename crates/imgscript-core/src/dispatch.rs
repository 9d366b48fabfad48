//! Host operation dispatch
//!
//! Glue between the interpreter and the scheduler. A script call names an
//! operation (`lib.name`), a target item and positional values; the
//! dispatcher parses the values against the operation's signature, then
//! runs the handler as a task on the item so it has exclusive access to the
//! resource.

use crate::config::RuntimeConfig;
use crate::error::{ConfigError, DispatchError, HostError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use imgscript_actor::{
    CollectReport, Collection, Completion, Item, ItemId, LogSink, Task, TracingSink,
};
use imgscript_args::{ArgSpec, ParsedArgs, Signature, Value};
use std::fmt;
use std::sync::Arc;

/// Handler outcome as delivered through a completion
pub type HostResult = Result<Value, HostError>;

/// Host operation body
pub type Handler<T> = Arc<dyn Fn(&mut Item<T>, &ParsedArgs) -> HostResult + Send + Sync>;

/// A registered host operation
pub struct HostOp<T> {
    signature: Signature,
    handler: Handler<T>,
}

impl<T> HostOp<T> {
    /// Pair a validated signature with its handler
    pub fn new<F>(signature: Signature, handler: F) -> Self
    where
        F: Fn(&mut Item<T>, &ParsedArgs) -> HostResult + Send + Sync + 'static,
    {
        Self {
            signature,
            handler: Arc::new(handler),
        }
    }

    /// Library name
    #[inline]
    #[must_use]
    pub fn lib(&self) -> &str {
        self.signature.lib()
    }

    /// Operation name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.signature.name()
    }

    /// `lib.name`
    #[inline]
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        self.signature.qualified_name()
    }

    /// Declared signature
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl<T> fmt::Debug for HostOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostOp")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Registry of host operations bound to one collection
pub struct Dispatcher<T> {
    collection: Arc<Collection<T>>,
    ops: DashMap<String, Arc<HostOp<T>>>,
}

/// A parsed call ready to be scheduled
struct PreparedCall<T> {
    op: String,
    task: Task<T, HostResult>,
}

impl<T: Send + 'static> Dispatcher<T> {
    /// Dispatcher over an existing collection
    #[must_use]
    pub fn new(collection: Arc<Collection<T>>) -> Self {
        Self {
            collection,
            ops: DashMap::new(),
        }
    }

    /// Dispatcher over a fresh collection built from runtime configuration
    ///
    /// # Errors
    /// - `ConfigError::Collection` if the collection settings are invalid
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        Self::from_config_with_sink(config, Arc::new(TracingSink))
    }

    /// Like [`Dispatcher::from_config`] with a custom scheduler log sink
    ///
    /// # Errors
    /// - `ConfigError::Collection` if the collection settings are invalid
    pub fn from_config_with_sink(
        config: &RuntimeConfig,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, ConfigError> {
        let collection = Collection::with_config(config.collection.clone(), sink)?;
        Ok(Self::new(Arc::new(collection)))
    }

    /// Underlying collection
    #[inline]
    #[must_use]
    pub fn collection(&self) -> &Arc<Collection<T>> {
        &self.collection
    }

    /// Register an operation
    ///
    /// # Errors
    /// - `DispatchError::DuplicateOp` if `lib.name` is already registered
    pub fn register(&self, op: HostOp<T>) -> Result<(), DispatchError> {
        match self.ops.entry(op.qualified_name().to_string()) {
            Entry::Occupied(entry) => Err(DispatchError::DuplicateOp(entry.key().clone())),
            Entry::Vacant(entry) => {
                tracing::debug!(op = %entry.key(), "registered host operation");
                entry.insert(Arc::new(op));
                Ok(())
            }
        }
    }

    /// Declare and register an operation in one step
    ///
    /// # Errors
    /// - `DispatchError::Signature` if `args` is malformed
    /// - `DispatchError::DuplicateOp` if `lib.name` is already registered
    pub fn define<F>(
        &self,
        lib: &str,
        name: &str,
        args: Vec<ArgSpec>,
        handler: F,
    ) -> Result<(), DispatchError>
    where
        F: Fn(&mut Item<T>, &ParsedArgs) -> HostResult + Send + Sync + 'static,
    {
        let signature = Signature::new(lib, name, args)?;
        self.register(HostOp::new(signature, handler))
    }

    /// Whether `lib.name` is registered
    #[must_use]
    pub fn contains(&self, lib: &str, name: &str) -> bool {
        self.ops.contains_key(&format!("{lib}.{name}"))
    }

    /// Registered operation names, sorted
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ops.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Add an item for scripts to target
    ///
    /// # Errors
    /// - `DispatchError::Open` if the item's worker cannot be started
    pub fn open(&self, name: &str) -> Result<ItemId, DispatchError> {
        Ok(self.collection.add_item(name)?)
    }

    /// Parse and enqueue a call without waiting for it
    ///
    /// # Errors
    /// - `DispatchError::UnknownOp` for an unregistered operation
    /// - `DispatchError::Args` if the values do not match the signature
    /// - `DispatchError::Task` if the item is closed
    ///
    /// # Panics
    /// Panics if `item` does not name an item of the collection.
    pub async fn submit(
        &self,
        lib: &str,
        name: &str,
        item: ItemId,
        values: &[Value],
    ) -> Result<Completion<HostResult>, DispatchError> {
        let call = self.prepare(lib, name, item, values)?;
        Ok(self.collection.schedule(item, call.task).await?)
    }

    /// Run a call to completion
    ///
    /// # Errors
    /// Anything [`Dispatcher::submit`] returns, plus
    /// - `DispatchError::Task` if the handler panicked
    /// - `DispatchError::Host` if the handler reported a failure
    ///
    /// # Panics
    /// Panics if `item` does not name an item of the collection.
    pub async fn call(
        &self,
        lib: &str,
        name: &str,
        item: ItemId,
        values: &[Value],
    ) -> Result<Value, DispatchError> {
        let call = self.prepare(lib, name, item, values)?;
        let outcome = self.collection.schedule(item, call.task).await?.await?;
        outcome.map_err(|source| host_failure(call.op, source))
    }

    /// Blocking form of [`Dispatcher::call`] for interpreter threads
    ///
    /// # Errors
    /// Same as [`Dispatcher::call`].
    ///
    /// # Panics
    /// Panics if `item` is out of range, or when called from within an
    /// asynchronous execution context.
    pub fn blocking_call(
        &self,
        lib: &str,
        name: &str,
        item: ItemId,
        values: &[Value],
    ) -> Result<Value, DispatchError> {
        let call = self.prepare(lib, name, item, values)?;
        let outcome = self
            .collection
            .blocking_schedule(item, call.task)?
            .blocking_wait()?;
        outcome.map_err(|source| host_failure(call.op, source))
    }

    /// Tear down every item
    ///
    /// # Errors
    /// - `DispatchError::Collect` if a configured collect deadline passes
    pub async fn shutdown(&self) -> Result<CollectReport, DispatchError> {
        let report = self.collection.collect().await?;
        tracing::info!(
            collected = report.collected,
            skipped = report.skipped,
            "dispatcher shut down"
        );
        Ok(report)
    }

    /// Blocking form of [`Dispatcher::shutdown`]
    ///
    /// # Errors
    /// - `DispatchError::Collect` if the barrier fails
    pub fn blocking_shutdown(&self) -> Result<CollectReport, DispatchError> {
        Ok(self.collection.blocking_collect()?)
    }

    fn lookup(&self, lib: &str, name: &str) -> Result<Arc<HostOp<T>>, DispatchError> {
        let key = format!("{lib}.{name}");
        match self.ops.get(&key) {
            Some(op) => Ok(Arc::clone(op.value())),
            None => Err(DispatchError::UnknownOp(key)),
        }
    }

    fn prepare(
        &self,
        lib: &str,
        name: &str,
        item: ItemId,
        values: &[Value],
    ) -> Result<PreparedCall<T>, DispatchError> {
        let op = self.lookup(lib, name)?;
        let args = op.signature().parse(values)?;
        tracing::trace!(op = %op.qualified_name(), item = item.index(), "dispatching host call");

        let handler = Arc::clone(&op.handler);
        let task = Task::new(op.lib(), op.name(), move |target: &mut Item<T>| {
            handler(target, &args)
        });
        Ok(PreparedCall {
            op: op.qualified_name().to_string(),
            task,
        })
    }
}

impl<T> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("collection", &self.collection)
            .field("operations", &self.ops.len())
            .finish()
    }
}

fn host_failure(op: String, source: HostError) -> DispatchError {
    DispatchError::Host { op, source }
}
