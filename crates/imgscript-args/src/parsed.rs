//! Validated argument values
//!
//! [`ParsedArgs`] is what host operations receive after the parser has
//! accepted a call: a name-keyed map in declaration order whose values are
//! already converted to their declared kinds.

use crate::error::ArgError;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

/// A converted argument value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// String
    String(String),
    /// Nested table
    Table(ParsedArgs),
    /// Array or variadic elements, in order
    List(Vec<ArgValue>),
}

impl ArgValue {
    /// Kind name, matching [`ArgKind::name`](crate::ArgKind::name)
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::Bool(_) => "boolean",
            Self::String(_) => "string",
            Self::Table(_) => "table",
            Self::List(_) => "array",
        }
    }

    /// Integer contents
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float contents
    #[inline]
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean contents
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String contents
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Nested table
    #[inline]
    #[must_use]
    pub fn as_table(&self) -> Option<&ParsedArgs> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    /// List elements
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<ArgValue> for Value {
    fn from(value: ArgValue) -> Self {
        match value {
            ArgValue::Int(i) => Value::Int(i),
            ArgValue::Float(f) => Value::Float(f),
            ArgValue::Bool(b) => Value::Bool(b),
            ArgValue::String(s) => Value::String(s),
            ArgValue::Table(t) => Value::from(t),
            ArgValue::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
        }
    }
}

/// Name-keyed result of a successful parse
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParsedArgs {
    values: IndexMap<String, ArgValue>,
}

impl ParsedArgs {
    /// Create an empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    /// Raw value by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Check whether `name` is present
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check for emptiness
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Integer argument
    ///
    /// # Errors
    /// `ArgError::Access` if `name` is absent or not an integer.
    pub fn int(&self, name: &str) -> Result<i64, ArgError> {
        self.typed(name, "integer", ArgValue::as_int)
    }

    /// Float argument
    ///
    /// # Errors
    /// `ArgError::Access` if `name` is absent or not a float.
    pub fn float(&self, name: &str) -> Result<f64, ArgError> {
        self.typed(name, "number", ArgValue::as_float)
    }

    /// Boolean argument
    ///
    /// # Errors
    /// `ArgError::Access` if `name` is absent or not a boolean.
    pub fn bool(&self, name: &str) -> Result<bool, ArgError> {
        self.typed(name, "boolean", ArgValue::as_bool)
    }

    /// String argument
    ///
    /// # Errors
    /// `ArgError::Access` if `name` is absent or not a string.
    pub fn str(&self, name: &str) -> Result<&str, ArgError> {
        self.typed(name, "string", ArgValue::as_str)
    }

    /// Nested table argument
    ///
    /// # Errors
    /// `ArgError::Access` if `name` is absent or not a table.
    pub fn table(&self, name: &str) -> Result<&ParsedArgs, ArgError> {
        self.typed(name, "table", ArgValue::as_table)
    }

    /// Array or variadic argument
    ///
    /// # Errors
    /// `ArgError::Access` if `name` is absent or not a list.
    pub fn list(&self, name: &str) -> Result<&[ArgValue], ArgError> {
        self.typed(name, "array", ArgValue::as_list)
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: &'static str,
        read: impl FnOnce(&'a ArgValue) -> Option<T>,
    ) -> Result<T, ArgError> {
        let value = self.values.get(name).ok_or_else(|| ArgError::Access {
            arg: name.to_string(),
            expected,
            found: "absent",
        })?;
        read(value).ok_or_else(|| ArgError::Access {
            arg: name.to_string(),
            expected,
            found: value.kind_name(),
        })
    }
}

impl From<ParsedArgs> for Value {
    fn from(args: ParsedArgs) -> Self {
        Value::Table(
            args.values
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a ParsedArgs {
    type Item = (&'a String, &'a ArgValue);
    type IntoIter = indexmap::map::Iter<'a, String, ArgValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
