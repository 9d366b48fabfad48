//! Runtime configuration
//!
//! Loaded from TOML. Every key is optional:
//!
//! ```toml
//! [collection]
//! mailbox_capacity = 64
//! collect_timeout_ms = 5000
//! thread_name_prefix = "item"
//!
//! [logging]
//! filter = "info,imgscript_actor=warn"
//! json = false
//! ```

use crate::error::ConfigError;
use imgscript_actor::CollectionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Scheduler settings
    pub collection: CollectionConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl RuntimeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With collection settings
    #[inline]
    #[must_use]
    pub fn with_collection(mut self, collection: CollectionConfig) -> Self {
        self.collection = collection;
        self
    }

    /// With log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.logging.filter = filter.into();
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML or mistyped keys
    /// - `ConfigError::Collection` if the collection settings are invalid
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Read` if the file cannot be read
    /// - anything [`RuntimeConfig::from_toml_str`] returns
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded runtime configuration");
        Ok(config)
    }

    /// Check every section
    ///
    /// # Errors
    /// - `ConfigError::Collection` if the collection settings are invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collection.validate()?;
        Ok(())
    }

    /// Render back to TOML
    ///
    /// # Errors
    /// - `ConfigError::Render` if serialization fails
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(RuntimeConfig::from_toml_str("").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [collection]
            collect_timeout_ms = 2500

            [logging]
            json = true
            "#,
        )
        .unwrap();

        assert_eq!(config.collection.mailbox_capacity, 64);
        assert_eq!(config.collection.collect_timeout_ms, Some(2500));
        assert_eq!(config.logging.filter, "info");
        assert!(config.logging.json);
    }

    #[test]
    fn invalid_collection_settings_are_rejected() {
        let err = RuntimeConfig::from_toml_str("[collection]\nmailbox_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Collection(_)));
    }

    #[test]
    fn mistyped_keys_are_parse_errors() {
        let err = RuntimeConfig::from_toml_str("[collection]\nmailbox_capacity = \"big\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn renders_round_trip() {
        let config = RuntimeConfig::new()
            .with_collection(CollectionConfig::new().with_mailbox_capacity(16))
            .with_log_filter("debug");
        let rendered = config.to_toml_string().unwrap();
        assert_eq!(RuntimeConfig::from_toml_str(&rendered).unwrap(), config);
    }
}
