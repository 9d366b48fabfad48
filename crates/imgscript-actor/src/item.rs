//! Items: named host resources owned by a single worker
//!
//! Tasks never touch a resource directly. Each task receives `&mut Item<T>`
//! on the item's worker thread, so at most one task observes the resource
//! at a time without any lock around it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stable index of an item within its collection
///
/// Ids are assigned in insertion order starting at zero and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(usize);

impl ItemId {
    /// Wrap a raw index
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in the collection
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for ItemId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Identity shared by an item's worker, its handle and its log records
#[derive(Debug, Clone)]
pub(crate) struct ItemLabel {
    pub(crate) id: ItemId,
    pub(crate) name: Arc<str>,
}

impl ItemLabel {
    pub(crate) fn new(id: ItemId, name: &str) -> Self {
        Self {
            id,
            name: Arc::from(name),
        }
    }
}

/// Worker-side view of an item
///
/// Handed to task closures and to the collect hook. The resource slot
/// starts empty; the first task usually fills it.
#[derive(Debug)]
pub struct Item<T> {
    label: ItemLabel,
    resource: Option<T>,
    cleaned: bool,
}

impl<T> Item<T> {
    pub(crate) fn new(label: ItemLabel) -> Self {
        Self {
            label,
            resource: None,
            cleaned: false,
        }
    }

    /// Index within the collection
    #[inline]
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.label.id
    }

    /// Human-readable name (used in logs and thread names)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.label.name
    }

    /// Current resource, if any
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.resource.as_ref()
    }

    /// Current resource for mutation, if any
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.resource.as_mut()
    }

    /// Replace the resource, returning the previous one
    pub fn set(&mut self, resource: T) -> Option<T> {
        self.resource.replace(resource)
    }

    /// Remove the resource without tearing the item down
    pub fn take(&mut self) -> Option<T> {
        self.resource.take()
    }

    /// Resource, creating it first if the slot is empty
    pub fn get_or_insert_with(&mut self, create: impl FnOnce() -> T) -> &mut T {
        self.resource.get_or_insert_with(create)
    }

    /// Whether a resource is currently held
    #[inline]
    #[must_use]
    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    /// Whether teardown has run
    ///
    /// Set after the collect hook returns, so neither tasks nor the hook
    /// ever observe `true`.
    #[inline]
    #[must_use]
    pub fn is_cleaned(&self) -> bool {
        self.cleaned
    }

    pub(crate) fn label(&self) -> &ItemLabel {
        &self.label
    }

    /// Clear the resource slot and mark the item torn down
    pub(crate) fn mark_cleaned(&mut self) -> Option<T> {
        self.cleaned = true;
        self.resource.take()
    }
}
