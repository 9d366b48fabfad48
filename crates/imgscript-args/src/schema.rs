//! Flat default-filling merge for option objects
//!
//! Unlike the argument parser this performs no validation: the result has
//! exactly the schema's keys, each taken from `data` when present and from
//! the schema otherwise. Nested tables are replaced, not merged.

use crate::value::{Table, Value};
use indexmap::IndexMap;

/// Merge `data` over the defaults in `schema`
///
/// Keys present only in `data` are dropped. Key order follows `schema`.
///
/// ```
/// use imgscript_args::{map_schema, Value};
///
/// let Value::Table(schema) = Value::table([("v1", Value::from(1)), ("v3", Value::from("A"))]) else {
///     unreachable!()
/// };
/// let Value::Table(data) = Value::table([("v1", Value::from(2)), ("v4", Value::from("B"))]) else {
///     unreachable!()
/// };
///
/// let merged = map_schema(&schema, &data);
/// assert_eq!(merged["v1"], Value::from(2));
/// assert_eq!(merged["v3"], Value::from("A"));
/// assert!(!merged.contains_key("v4"));
/// ```
#[must_use]
pub fn map_schema<V: Clone>(
    schema: &IndexMap<String, V>,
    data: &IndexMap<String, V>,
) -> IndexMap<String, V> {
    schema
        .iter()
        .map(|(key, default)| (key.clone(), data.get(key).unwrap_or(default).clone()))
        .collect()
}

/// Merge a script-supplied option value over `schema`
///
/// Anything other than a table (typically nil for "no options") yields the
/// schema unchanged.
#[must_use]
pub fn map_schema_value(schema: &Table, data: &Value) -> Table {
    match data {
        Value::Table(data) => map_schema(schema, data),
        _ => schema.clone(),
    }
}
