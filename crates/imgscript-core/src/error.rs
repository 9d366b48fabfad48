//! Error types for imgscript core
//!
//! Dispatch errors fall into two groups:
//! - script errors the interpreter reports back to the script author
//! - host errors (closed items, failed collect) the embedder handles

use imgscript_actor::{CollectError, CollectionError, ItemId, TaskError};
use imgscript_args::{ArgError, SignatureError};
use std::path::PathBuf;

/// Failure of a host operation handler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The item has no resource loaded yet
    #[error("item {0} holds no resource")]
    NoResource(ItemId),

    /// An argument passed type checks but is semantically invalid
    #[error("invalid argument {arg}: {reason}")]
    InvalidArgument {
        /// Argument path
        arg: String,
        /// What is wrong with it
        reason: String,
    },

    /// Any other handler failure
    #[error("{0}")]
    Failed(String),
}

impl HostError {
    /// Build an invalid-argument error
    #[inline]
    #[must_use]
    pub fn invalid(arg: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg: arg.into(),
            reason: reason.into(),
        }
    }

    /// Build a generic failure
    #[inline]
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Dispatch failure
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No operation registered under this name
    #[error("unknown host operation {0}")]
    UnknownOp(String),

    /// Registration under a name that is already taken
    #[error("host operation {0} is already registered")]
    DuplicateOp(String),

    /// Malformed operation signature
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Script passed arguments that do not match the signature
    #[error(transparent)]
    Args(#[from] ArgError),

    /// Handler reported a failure
    #[error("{op} failed: {source}")]
    Host {
        /// `lib.name` of the operation
        op: String,
        /// Handler error
        #[source]
        source: HostError,
    },

    /// Task was rejected, panicked or abandoned
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Item could not be opened
    #[error(transparent)]
    Open(#[from] CollectionError),

    /// Shutdown barrier failed
    #[error(transparent)]
    Collect(#[from] CollectError),
}

impl DispatchError {
    /// Check if the error should be surfaced to the script author
    #[inline]
    #[must_use]
    pub fn is_script_error(&self) -> bool {
        match self {
            Self::UnknownOp(_) | Self::Host { .. } => true,
            Self::Args(err) => err.is_script_error(),
            Self::DuplicateOp(_)
            | Self::Signature(_)
            | Self::Task(_)
            | Self::Open(_)
            | Self::Collect(_) => false,
        }
    }

    /// Check if the target item is gone and must be reopened
    #[inline]
    #[must_use]
    pub fn is_item_closed(&self) -> bool {
        matches!(self, Self::Task(_))
    }
}

/// Runtime configuration failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// OS error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be rendered
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    /// Collection settings failed validation
    #[error(transparent)]
    Collection(#[from] imgscript_actor::ConfigError),

    /// Log filter directive could not be parsed
    #[error("invalid log filter {filter:?}: {reason}")]
    Filter {
        /// Offending directive
        filter: String,
        /// Parser message
        reason: String,
    },

    /// A global tracing subscriber is already installed
    #[error("tracing already initialised: {0}")]
    TracingInstalled(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_errors_are_classified() {
        assert!(DispatchError::UnknownOp("image.nope".into()).is_script_error());
        assert!(DispatchError::Host {
            op: "image.resize".into(),
            source: HostError::failed("out of memory"),
        }
        .is_script_error());
        assert!(!DispatchError::DuplicateOp("image.resize".into()).is_script_error());

        let closed = DispatchError::from(TaskError::Closed {
            item: ItemId::new(1),
        });
        assert!(closed.is_item_closed());
        assert!(!closed.is_script_error());
    }

    #[test]
    fn host_error_messages() {
        assert_eq!(
            HostError::invalid("width", "must be positive").to_string(),
            "invalid argument width: must be positive"
        );
        assert_eq!(
            DispatchError::Host {
                op: "canvas.load".into(),
                source: HostError::NoResource(ItemId::new(2)),
            }
            .to_string(),
            "canvas.load failed: item #2 holds no resource"
        );
    }
}
