//! Error types for argument marshaling
//!
//! Two families:
//! - [`ArgError`]: a script passed values that do not match an operation's
//!   declared shape. Recoverable; surfaced to the calling script.
//! - [`SignatureError`]: a host API author declared an impossible signature.
//!   Detected once, at registration time.

/// Script-level argument failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgError {
    /// A required argument was absent or nil
    #[error("{op}: missing required argument `{arg}`")]
    Missing {
        /// Operation being called
        op: String,
        /// Argument path (`opts.size`, `points[2]`)
        arg: String,
    },

    /// Value kind does not match the declared kind
    #[error("{op}: wrong type for argument `{arg}`: expected {expected}, found {found}")]
    WrongType {
        /// Operation being called
        op: String,
        /// Argument path
        arg: String,
        /// Declared kind
        expected: &'static str,
        /// Kind the script supplied
        found: &'static str,
    },

    /// A number was supplied for an integer argument but has no exact integer form
    #[error("{op}: wrong type for argument `{arg}`: expected integer, found non-integral number {value}")]
    NotAnInteger {
        /// Operation being called
        op: String,
        /// Argument path
        arg: String,
        /// Offending number
        value: f64,
    },

    /// More positional values than declared arguments
    #[error("{op}: too many arguments: expected at most {expected}, found {found}")]
    TooMany {
        /// Operation being called
        op: String,
        /// Declared positional count
        expected: usize,
        /// Supplied positional count
        found: usize,
    },

    /// Typed read of a parsed argument failed
    #[error("argument `{arg}` is {found}, not {expected}")]
    Access {
        /// Argument name
        arg: String,
        /// Requested kind
        expected: &'static str,
        /// Stored kind (`absent` when the name is unknown)
        found: &'static str,
    },
}

impl ArgError {
    /// Path of the offending argument, if the error concerns one
    #[must_use]
    pub fn arg(&self) -> Option<&str> {
        match self {
            Self::Missing { arg, .. }
            | Self::WrongType { arg, .. }
            | Self::NotAnInteger { arg, .. }
            | Self::Access { arg, .. } => Some(arg),
            Self::TooMany { .. } => None,
        }
    }

    /// Operation named in the error, if any
    #[must_use]
    pub fn op(&self) -> Option<&str> {
        match self {
            Self::Missing { op, .. }
            | Self::WrongType { op, .. }
            | Self::NotAnInteger { op, .. }
            | Self::TooMany { op, .. } => Some(op),
            Self::Access { .. } => None,
        }
    }

    /// Whether the script (rather than host code) caused this error
    ///
    /// `Access` errors come from host code reading a parsed map with the
    /// wrong accessor, which is a host bug.
    #[inline]
    #[must_use]
    pub fn is_script_error(&self) -> bool {
        !matches!(self, Self::Access { .. })
    }
}

/// Host-side signature declaration error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// Variadic declared before another top-level argument
    #[error("{op}: variadic argument `{arg}` must be the last argument")]
    VariadicNotLast {
        /// Operation being declared
        op: String,
        /// Offending argument
        arg: String,
    },

    /// Variadic nested inside a table field or element spec
    #[error("{op}: variadic argument `{arg}` is only allowed at the top level")]
    NestedVariadic {
        /// Operation being declared
        op: String,
        /// Offending argument path
        arg: String,
    },

    /// Two arguments (or two fields of one table) share a name
    #[error("{op}: duplicate argument name `{arg}`")]
    DuplicateName {
        /// Operation being declared
        op: String,
        /// Duplicated path
        arg: String,
    },

    /// Argument or table field without a name
    #[error("{op}: argument at position {position} of `{parent}` has an empty name")]
    EmptyName {
        /// Operation being declared
        op: String,
        /// Enclosing table path, or the operation for top-level arguments
        parent: String,
        /// Zero-based position
        position: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_type_message_names_operation_and_argument() {
        let err = ArgError::WrongType {
            op: "image.resize".to_string(),
            arg: "width".to_string(),
            expected: "integer",
            found: "string",
        };
        let msg = err.to_string();
        assert!(msg.contains("image.resize"));
        assert!(msg.contains("wrong type for argument `width`"));
    }

    #[test]
    fn access_errors_are_host_errors() {
        let err = ArgError::Access {
            arg: "x".to_string(),
            expected: "integer",
            found: "string",
        };
        assert!(!err.is_script_error());
        assert_eq!(err.op(), None);

        let err = ArgError::TooMany {
            op: "op".to_string(),
            expected: 1,
            found: 2,
        };
        assert!(err.is_script_error());
        assert_eq!(err.arg(), None);
    }
}
