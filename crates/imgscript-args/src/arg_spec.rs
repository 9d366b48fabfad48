//! Declarative argument shapes
//!
//! An [`ArgSpec`] describes one expected argument of a host operation. Specs
//! are authored once per operation signature and never change.
//!
//! ```
//! use imgscript_args::ArgSpec;
//!
//! let args = vec![
//!     ArgSpec::int("image"),
//!     ArgSpec::table("opts", vec![
//!         ArgSpec::float("scale"),
//!         ArgSpec::string("filter").optional(),
//!     ]),
//!     ArgSpec::variadic("tags", ArgSpec::string("tag")),
//! ];
//! assert_eq!(args.len(), 3);
//! ```

use crate::parsed::{ArgValue, ParsedArgs};

/// Kind of an argument, with nested specs for compound kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ArgKind {
    /// 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean
    Bool,
    /// String
    String,
    /// Table with named fields, matched by name
    Table(Vec<ArgSpec>),
    /// Homogeneous sequence
    Array(Box<ArgSpec>),
    /// All remaining positional values; last top-level argument only
    Variadic(Box<ArgSpec>),
}

impl ArgKind {
    /// Kind name used in error messages
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "integer",
            Self::Float => "number",
            Self::Bool => "boolean",
            Self::String => "string",
            Self::Table(_) => "table",
            Self::Array(_) | Self::Variadic(_) => "array",
        }
    }

    /// Value assigned when an optional argument of this kind is omitted
    ///
    /// Tables are filled field by field, so host code can read an omitted
    /// options table with the usual accessors.
    #[must_use]
    pub fn zero_value(&self) -> ArgValue {
        match self {
            Self::Int => ArgValue::Int(0),
            Self::Float => ArgValue::Float(0.0),
            Self::Bool => ArgValue::Bool(false),
            Self::String => ArgValue::String(String::new()),
            Self::Table(fields) => {
                let mut table = ParsedArgs::new();
                for field in fields {
                    table.insert(field.name(), field.kind().zero_value());
                }
                ArgValue::Table(table)
            }
            Self::Array(_) | Self::Variadic(_) => ArgValue::List(Vec::new()),
        }
    }
}

/// One expected argument
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    name: String,
    optional: bool,
    kind: ArgKind,
}

impl ArgSpec {
    /// Create a required argument of the given kind
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ArgKind) -> Self {
        Self {
            name: name.into(),
            optional: false,
            kind,
        }
    }

    /// Integer argument
    #[must_use]
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ArgKind::Int)
    }

    /// Float argument
    #[must_use]
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ArgKind::Float)
    }

    /// Boolean argument
    #[must_use]
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ArgKind::Bool)
    }

    /// String argument
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ArgKind::String)
    }

    /// Table argument with named fields
    #[must_use]
    pub fn table(name: impl Into<String>, fields: Vec<ArgSpec>) -> Self {
        Self::new(name, ArgKind::Table(fields))
    }

    /// Array argument; every element must match `element`
    #[must_use]
    pub fn array(name: impl Into<String>, element: ArgSpec) -> Self {
        Self::new(name, ArgKind::Array(Box::new(element)))
    }

    /// Variadic tail; every remaining value must match `element`
    #[must_use]
    pub fn variadic(name: impl Into<String>, element: ArgSpec) -> Self {
        Self::new(name, ArgKind::Variadic(Box::new(element)))
    }

    /// Mark as optional
    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Argument name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ArgKind {
        &self.kind
    }

    /// Whether the argument may be omitted
    #[inline]
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether this is a variadic tail
    #[inline]
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        matches!(self.kind, ArgKind::Variadic(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_per_kind() {
        assert_eq!(ArgKind::Int.zero_value(), ArgValue::Int(0));
        assert_eq!(ArgKind::Bool.zero_value(), ArgValue::Bool(false));
        assert_eq!(
            ArgKind::String.zero_value(),
            ArgValue::String(String::new())
        );
        assert_eq!(
            ArgSpec::array("a", ArgSpec::int("")).kind().zero_value(),
            ArgValue::List(vec![])
        );
    }

    #[test]
    fn table_zero_value_fills_fields() {
        let spec = ArgSpec::table("opts", vec![ArgSpec::float("scale"), ArgSpec::bool("keep")]);
        let ArgValue::Table(zero) = spec.kind().zero_value() else {
            panic!("expected table");
        };
        assert_eq!(zero.float("scale").unwrap(), 0.0);
        assert!(!zero.bool("keep").unwrap());
    }

    #[test]
    fn optional_builder() {
        let spec = ArgSpec::string("label").optional();
        assert!(spec.is_optional());
        assert!(!spec.is_variadic());
        assert_eq!(spec.name(), "label");
    }
}
