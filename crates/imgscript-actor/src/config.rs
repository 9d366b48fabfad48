//! Collection configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of tasks an item's mailbox holds before senders wait
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Tuning knobs for a [`Collection`](crate::Collection)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Bounded mailbox size per item
    pub mailbox_capacity: usize,
    /// Deadline applied by `Collection::collect`, if any
    pub collect_timeout_ms: Option<u64>,
    /// Worker threads are named `{prefix}-{id}-{name}`
    pub thread_name_prefix: String,
}

impl CollectionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With mailbox capacity
    #[inline]
    #[must_use]
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// With a collect deadline
    #[inline]
    #[must_use]
    pub fn with_collect_timeout(mut self, timeout: Duration) -> Self {
        self.collect_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// With worker thread name prefix
    #[inline]
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Configured collect deadline
    #[inline]
    #[must_use]
    pub fn collect_timeout(&self) -> Option<Duration> {
        self.collect_timeout_ms.map(Duration::from_millis)
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    /// - `ConfigError::Invalid` for a zero mailbox capacity or zero timeout
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "mailbox_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.collect_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "collect_timeout_ms",
                reason: "must be positive; omit it to wait indefinitely".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            collect_timeout_ms: None,
            thread_name_prefix: "item".to_string(),
        }
    }
}
