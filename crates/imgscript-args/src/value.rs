//! Dynamic script values
//!
//! [`Value`] is the closed set of shapes the embedded interpreter hands to the
//! host on its call stack:
//! - scalars (`Nil`, `Bool`, `Int`, `Float`, `String`)
//! - sequences (`Array`)
//! - string-keyed tables (`Table`, insertion ordered)
//!
//! Host code never inspects these directly; it declares an
//! [`ArgSpec`](crate::ArgSpec) list and lets the parser convert them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Script table: string keys in insertion order
pub type Table = IndexMap<String, Value>;

/// A dynamically-typed value produced by the interpreter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent / nil
    #[default]
    Nil,
    /// Boolean
    Bool(bool),
    /// Integer number
    Int(i64),
    /// Floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Ordered sequence
    Array(Vec<Value>),
    /// String-keyed table
    Table(Table),
}

impl Value {
    /// Build a table value from key/value pairs
    #[must_use]
    pub fn table<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Table(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array value
    #[must_use]
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Name of the value's kind, as used in error messages
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Table(_) => "table",
        }
    }

    /// Check for nil
    #[inline]
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Borrow as a table
    #[inline]
    #[must_use]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

impl From<Table> for Value {
    fn from(value: Table) -> Self {
        Self::Table(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Nil,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Table(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}
