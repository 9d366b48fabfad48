//! Host operation signatures
//!
//! A [`Signature`] pairs an operation's identity (`lib.name`) with its
//! argument specs. Construction checks the spec list once, so an impossible
//! declaration (a variadic that is not last, duplicate names) fails at
//! registration instead of surfacing on some later script call.

use crate::arg_spec::{ArgKind, ArgSpec};
use crate::error::{ArgError, SignatureError};
use crate::parsed::ParsedArgs;
use crate::parser::ArgParser;
use crate::value::Value;
use std::collections::HashSet;

/// Validated argument signature of one host operation
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    lib: String,
    name: String,
    qualified: String,
    args: Vec<ArgSpec>,
}

impl Signature {
    /// Declare a signature
    ///
    /// # Errors
    /// Returns [`SignatureError`] if the spec list is malformed.
    pub fn new(
        lib: impl Into<String>,
        name: impl Into<String>,
        args: Vec<ArgSpec>,
    ) -> Result<Self, SignatureError> {
        let lib = lib.into();
        let name = name.into();
        let qualified = format!("{lib}.{name}");

        check_level(&qualified, &qualified, &args, true)?;

        Ok(Self {
            lib,
            name,
            qualified,
            args,
        })
    }

    /// Library the operation belongs to
    #[inline]
    #[must_use]
    pub fn lib(&self) -> &str {
        &self.lib
    }

    /// Operation name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `lib.name`
    #[inline]
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified
    }

    /// Declared arguments
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// Parse a call's positional values
    ///
    /// # Errors
    /// Returns [`ArgError`] naming this operation.
    pub fn parse(&self, values: &[Value]) -> Result<ParsedArgs, ArgError> {
        ArgParser::new(&self.qualified).parse(values, &self.args)
    }
}

fn check_level(
    op: &str,
    parent: &str,
    specs: &[ArgSpec],
    top_level: bool,
) -> Result<(), SignatureError> {
    let mut seen = HashSet::new();

    for (position, spec) in specs.iter().enumerate() {
        if spec.name().is_empty() {
            return Err(SignatureError::EmptyName {
                op: op.to_string(),
                parent: parent.to_string(),
                position,
            });
        }

        let path = if top_level {
            spec.name().to_string()
        } else {
            format!("{parent}.{}", spec.name())
        };

        if !seen.insert(spec.name()) {
            return Err(SignatureError::DuplicateName {
                op: op.to_string(),
                arg: path,
            });
        }

        if spec.is_variadic() {
            if !top_level {
                return Err(SignatureError::NestedVariadic {
                    op: op.to_string(),
                    arg: path,
                });
            }
            if position + 1 != specs.len() {
                return Err(SignatureError::VariadicNotLast {
                    op: op.to_string(),
                    arg: path,
                });
            }
        }

        check_nested(op, &path, spec.kind())?;
    }

    Ok(())
}

fn check_nested(op: &str, path: &str, kind: &ArgKind) -> Result<(), SignatureError> {
    match kind {
        ArgKind::Table(fields) => check_level(op, path, fields, false),
        ArgKind::Array(element) | ArgKind::Variadic(element) => {
            let element_path = format!("{path}[]");
            if element.is_variadic() {
                return Err(SignatureError::NestedVariadic {
                    op: op.to_string(),
                    arg: element_path,
                });
            }
            check_nested(op, &element_path, element.kind())
        }
        ArgKind::Int | ArgKind::Float | ArgKind::Bool | ArgKind::String => Ok(()),
    }
}
