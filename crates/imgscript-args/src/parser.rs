//! Positional argument parser
//!
//! Converts the interpreter's positional values into a [`ParsedArgs`] map by
//! walking an ordered [`ArgSpec`] list:
//! - scalars consume one slot and must have a matching kind
//! - optional arguments may be omitted (or nil) and take their zero value
//! - tables are matched field by field, by name, recursively
//! - arrays validate every element against one element spec
//! - a variadic tail consumes everything that remains
//!
//! The output is assembled privately and returned only when every spec has
//! resolved, so a failed call never observes a half-built map.

use crate::arg_spec::{ArgKind, ArgSpec};
use crate::error::ArgError;
use crate::parsed::{ArgValue, ParsedArgs};
use crate::value::{Table, Value};

/// Parse `values` against `specs` for the operation `op`
///
/// # Errors
/// Returns [`ArgError`] naming `op` and the offending argument path.
///
/// # Examples
///
/// ```
/// use imgscript_args::{parse_args, ArgSpec, Value};
///
/// let parsed = parse_args(
///     "image.crop",
///     &[Value::from(1), Value::from(2)],
///     &[ArgSpec::int("v1"), ArgSpec::int("v2")],
/// )
/// .unwrap();
/// assert_eq!(parsed.int("v2").unwrap(), 2);
/// ```
pub fn parse_args(op: &str, values: &[Value], specs: &[ArgSpec]) -> Result<ParsedArgs, ArgError> {
    ArgParser::new(op).parse(values, specs)
}

/// Parser bound to one operation name, for error reporting
#[derive(Debug, Clone, Copy)]
pub struct ArgParser<'a> {
    op: &'a str,
}

impl<'a> ArgParser<'a> {
    /// Create a parser reporting errors against `op`
    #[inline]
    #[must_use]
    pub fn new(op: &'a str) -> Self {
        Self { op }
    }

    /// Parse positional `values` against `specs`
    ///
    /// Trailing nils are treated as absent, matching how interpreters pad
    /// call frames.
    ///
    /// # Errors
    /// - `Missing` for an absent required argument
    /// - `WrongType` / `NotAnInteger` for a kind mismatch
    /// - `TooMany` when values remain after the last spec
    pub fn parse(&self, values: &[Value], specs: &[ArgSpec]) -> Result<ParsedArgs, ArgError> {
        let supplied = values
            .iter()
            .rposition(|v| !v.is_nil())
            .map_or(0, |last| last + 1);
        let values = &values[..supplied];

        let mut out = ParsedArgs::new();
        let mut cursor = 0;

        for spec in specs {
            if let ArgKind::Variadic(element) = spec.kind() {
                let rest = values.get(cursor..).unwrap_or_default();
                let items = self.elements(spec.name(), element, rest)?;
                cursor = values.len();
                out.insert(spec.name(), ArgValue::List(items));
            } else {
                let parsed = self.slot(spec.name(), spec, values.get(cursor))?;
                cursor += 1;
                out.insert(spec.name(), parsed);
            }
        }

        if cursor < values.len() {
            return Err(ArgError::TooMany {
                op: self.op.to_string(),
                expected: specs.len(),
                found: values.len(),
            });
        }

        Ok(out)
    }

    /// Resolve one argument slot, applying the optional/zero-value rule
    fn slot(&self, path: &str, spec: &ArgSpec, value: Option<&Value>) -> Result<ArgValue, ArgError> {
        match value {
            None | Some(Value::Nil) if spec.is_optional() => Ok(spec.kind().zero_value()),
            None | Some(Value::Nil) => Err(ArgError::Missing {
                op: self.op.to_string(),
                arg: path.to_string(),
            }),
            Some(value) => self.convert(path, spec.kind(), value),
        }
    }

    fn convert(&self, path: &str, kind: &ArgKind, value: &Value) -> Result<ArgValue, ArgError> {
        match (kind, value) {
            (ArgKind::Int, Value::Int(i)) => Ok(ArgValue::Int(*i)),
            (ArgKind::Int, Value::Float(f)) => self.integral(path, *f).map(ArgValue::Int),
            #[allow(clippy::cast_precision_loss)]
            (ArgKind::Float, Value::Int(i)) => Ok(ArgValue::Float(*i as f64)),
            (ArgKind::Float, Value::Float(f)) => Ok(ArgValue::Float(*f)),
            (ArgKind::Bool, Value::Bool(b)) => Ok(ArgValue::Bool(*b)),
            (ArgKind::String, Value::String(s)) => Ok(ArgValue::String(s.clone())),
            (ArgKind::Table(fields), Value::Table(table)) => {
                self.table(path, fields, table).map(ArgValue::Table)
            }
            // A nested variadic cannot consume positional slots; read it as an array.
            (ArgKind::Array(element) | ArgKind::Variadic(element), Value::Array(items)) => {
                self.elements(path, element, items).map(ArgValue::List)
            }
            (kind, other) => Err(ArgError::WrongType {
                op: self.op.to_string(),
                arg: path.to_string(),
                expected: kind.name(),
                found: other.type_name(),
            }),
        }
    }

    fn table(&self, path: &str, fields: &[ArgSpec], table: &Table) -> Result<ParsedArgs, ArgError> {
        let mut out = ParsedArgs::new();
        for field in fields {
            let field_path = format!("{path}.{}", field.name());
            let parsed = self.slot(&field_path, field, table.get(field.name()))?;
            out.insert(field.name(), parsed);
        }
        Ok(out)
    }

    fn elements(
        &self,
        path: &str,
        element: &ArgSpec,
        items: &[Value],
    ) -> Result<Vec<ArgValue>, ArgError> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.slot(&format!("{path}[{i}]"), element, Some(item)))
            .collect()
    }

    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn integral(&self, path: &str, f: f64) -> Result<i64, ArgError> {
        // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            Ok(f as i64)
        } else {
            Err(ArgError::NotAnInteger {
                op: self.op.to_string(),
                arg: path.to_string(),
                value: f,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const OP: &str = "test.op";

    fn parse(values: &[Value], specs: &[ArgSpec]) -> Result<ParsedArgs, ArgError> {
        parse_args(OP, values, specs)
    }

    #[test]
    fn two_integers() {
        let parsed = parse(
            &[Value::from(1), Value::from(2)],
            &[ArgSpec::int("v1"), ArgSpec::int("v2")],
        )
        .unwrap();

        assert_eq!(parsed.int("v1").unwrap(), 1);
        assert_eq!(parsed.int("v2").unwrap(), 2);
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn omitted_optional_string_is_empty() {
        let parsed = parse(
            &[Value::from("A")],
            &[ArgSpec::string("v1"), ArgSpec::string("v2").optional()],
        )
        .unwrap();

        assert_eq!(parsed.str("v1").unwrap(), "A");
        assert_eq!(parsed.str("v2").unwrap(), "");
    }

    #[test]
    fn nested_table() {
        let parsed = parse(
            &[Value::table([("v1", Value::from(1))])],
            &[ArgSpec::table("v1", vec![ArgSpec::int("v1")])],
        )
        .unwrap();

        assert_eq!(parsed.table("v1").unwrap().int("v1").unwrap(), 1);
    }

    #[test]
    fn variadic_collects_remaining_values() {
        let parsed = parse(
            &[Value::from(1), Value::from(2)],
            &[ArgSpec::variadic("v1", ArgSpec::int("n"))],
        )
        .unwrap();

        assert_eq!(
            parsed.list("v1").unwrap(),
            &[ArgValue::Int(1), ArgValue::Int(2)]
        );
    }

    #[test]
    fn variadic_after_fixed_arguments_may_be_empty() {
        let specs = [
            ArgSpec::string("name"),
            ArgSpec::variadic("rest", ArgSpec::float("x")),
        ];
        let parsed = parse(&[Value::from("a")], &specs).unwrap();
        assert!(parsed.list("rest").unwrap().is_empty());

        let parsed = parse(&[Value::from("a"), Value::from(1), Value::from(2.5)], &specs).unwrap();
        assert_eq!(
            parsed.list("rest").unwrap(),
            &[ArgValue::Float(1.0), ArgValue::Float(2.5)]
        );
    }

    #[test]
    fn wrong_type_names_operation_and_argument() {
        let err = parse(&[Value::from("wide")], &[ArgSpec::int("width")]).unwrap_err();

        assert_eq!(
            err,
            ArgError::WrongType {
                op: OP.to_string(),
                arg: "width".to_string(),
                expected: "integer",
                found: "string",
            }
        );
        assert!(err.to_string().starts_with("test.op: wrong type for argument `width`"));
    }

    #[test]
    fn missing_required_argument() {
        let err = parse(&[Value::from(1)], &[ArgSpec::int("x"), ArgSpec::int("y")]).unwrap_err();
        assert_eq!(
            err,
            ArgError::Missing {
                op: OP.to_string(),
                arg: "y".to_string(),
            }
        );
    }

    #[test]
    fn nil_in_required_slot_is_missing() {
        let err = parse(
            &[Value::Nil, Value::from(2)],
            &[ArgSpec::int("x"), ArgSpec::int("y")],
        )
        .unwrap_err();
        assert_eq!(err.arg(), Some("x"));
    }

    #[test]
    fn nil_in_optional_slot_takes_zero_value() {
        let parsed = parse(
            &[Value::Nil, Value::from(2)],
            &[ArgSpec::bool("flag").optional(), ArgSpec::int("y")],
        )
        .unwrap();
        assert!(!parsed.bool("flag").unwrap());
        assert_eq!(parsed.int("y").unwrap(), 2);
    }

    #[test]
    fn integral_float_accepted_for_int() {
        let parsed = parse(&[Value::from(4.0)], &[ArgSpec::int("n")]).unwrap();
        assert_eq!(parsed.int("n").unwrap(), 4);
    }

    #[test]
    fn fractional_float_rejected_for_int() {
        let err = parse(&[Value::from(4.5)], &[ArgSpec::int("n")]).unwrap_err();
        assert!(matches!(err, ArgError::NotAnInteger { value, .. } if value == 4.5));

        let err = parse(&[Value::from(f64::NAN)], &[ArgSpec::int("n")]).unwrap_err();
        assert!(matches!(err, ArgError::NotAnInteger { .. }));
    }

    #[test]
    fn int_widens_to_float() {
        let parsed = parse(&[Value::from(3)], &[ArgSpec::float("scale")]).unwrap();
        assert_eq!(parsed.float("scale").unwrap(), 3.0);
    }

    #[test]
    fn surplus_values_rejected() {
        let err = parse(&[Value::from(1), Value::from(2)], &[ArgSpec::int("x")]).unwrap_err();
        assert_eq!(
            err,
            ArgError::TooMany {
                op: OP.to_string(),
                expected: 1,
                found: 2,
            }
        );
    }

    #[test]
    fn trailing_nils_are_not_surplus() {
        let parsed = parse(
            &[Value::from(1), Value::Nil, Value::Nil],
            &[ArgSpec::int("x")],
        )
        .unwrap();
        assert_eq!(parsed.int("x").unwrap(), 1);
    }

    #[test]
    fn table_field_error_reports_dotted_path() {
        let opts = Value::table([("size", Value::from("big"))]);
        let err = parse(
            &[opts],
            &[ArgSpec::table("opts", vec![ArgSpec::int("size")])],
        )
        .unwrap_err();
        assert_eq!(err.arg(), Some("opts.size"));
    }

    #[test]
    fn table_ignores_undeclared_keys_and_defaults_optional_fields() {
        let opts = Value::table([
            ("scale", Value::from(2.0)),
            ("unknown", Value::from(true)),
        ]);
        let parsed = parse(
            &[opts],
            &[ArgSpec::table(
                "opts",
                vec![ArgSpec::float("scale"), ArgSpec::string("filter").optional()],
            )],
        )
        .unwrap();

        let opts = parsed.table("opts").unwrap();
        assert_eq!(opts.len(), 2);
        assert_eq!(opts.str("filter").unwrap(), "");
        assert!(!opts.contains("unknown"));
    }

    #[test]
    fn array_element_error_reports_index() {
        let points = Value::array([Value::from(1), Value::from("two"), Value::from(3)]);
        let err = parse(
            &[points],
            &[ArgSpec::array("points", ArgSpec::int("point"))],
        )
        .unwrap_err();
        assert_eq!(err.arg(), Some("points[1]"));
    }

    #[test]
    fn array_of_tables() {
        let layers = Value::array([
            Value::table([("name", Value::from("bg")), ("opacity", Value::from(1))]),
            Value::table([("name", Value::from("fg")), ("opacity", Value::from(0.5))]),
        ]);
        let parsed = parse(
            &[layers],
            &[ArgSpec::array(
                "layers",
                ArgSpec::table("layer", vec![ArgSpec::string("name"), ArgSpec::float("opacity")]),
            )],
        )
        .unwrap();

        let layers = parsed.list("layers").unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].as_table().unwrap().float("opacity").unwrap(), 0.5);
    }

    #[test]
    fn non_table_for_table_spec() {
        let err = parse(
            &[Value::array([1])],
            &[ArgSpec::table("opts", vec![])],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ArgError::WrongType { expected: "table", found: "array", .. }
        ));
    }

    #[test]
    fn omitted_optional_array_is_empty() {
        let parsed = parse(&[], &[ArgSpec::array("tags", ArgSpec::string("t")).optional()]).unwrap();
        assert!(parsed.list("tags").unwrap().is_empty());
    }
}
