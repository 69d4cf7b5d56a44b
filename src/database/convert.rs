//! Literal coercion and result formatting.
//!
//! The parser hands over untyped literal strings; only the coordinator
//! knows the target field, so coercion to a typed [`Value`] happens here.
//! The reverse direction formats decoded cells back into display strings
//! for result rows.

use eyre::{bail, Result};

use crate::sql::WhereClause;
use crate::storage::{Filter, Table};
use crate::types::{Field, Primitive, Row, Value};

/// Parses a raw literal into the field's primitive.
pub(crate) fn coerce(raw: &str, field: &Field, table: &str) -> Result<Value> {
    match field.primitive {
        Primitive::Str => Ok(Value::Str(raw.to_string())),
        Primitive::Int => match raw.parse::<i64>() {
            Ok(i) => Ok(Value::Int(i)),
            Err(_) => bail!("could not parse \"{}\" as int for {}.{}", raw, table, field.name),
        },
        Primitive::Float => match raw.parse::<f64>() {
            Ok(f) => Ok(Value::Float(f)),
            Err(_) => bail!(
                "could not parse \"{}\" as float for {}.{}",
                raw,
                table,
                field.name
            ),
        },
        Primitive::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => bail!(
                "could not parse \"{}\" as bool for {}.{}",
                raw,
                table,
                field.name
            ),
        },
    }
}

/// Resolves a parsed WHERE clause against the table's schema.
pub(crate) fn filter_from_where(table: &Table, clause: &WhereClause) -> Result<Filter> {
    let field = table.field_with_name(&clause.field)?;
    let value = coerce(&clause.value, field, table.name())?;

    Ok(Filter::Single {
        field: clause.field.clone(),
        op: clause.op,
        value,
    })
}

/// Formats one result row as cell strings: strings quoted, ints decimal,
/// floats in shortest round-trip form, bools as `true`/`false`.
pub(crate) fn format_row(row: &Row) -> Vec<String> {
    row.values.iter().map(format_cell).collect()
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("\"{}\"", s),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(primitive: Primitive) -> Field {
        Field::new("f", primitive)
    }

    #[test]
    fn coerce_parses_each_primitive() {
        assert_eq!(
            coerce("hi", &field(Primitive::Str), "t").unwrap(),
            Value::Str("hi".to_string())
        );
        assert_eq!(
            coerce("-7", &field(Primitive::Int), "t").unwrap(),
            Value::Int(-7)
        );
        assert_eq!(
            coerce("2.5", &field(Primitive::Float), "t").unwrap(),
            Value::Float(2.5)
        );
        assert_eq!(
            coerce("true", &field(Primitive::Bool), "t").unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            coerce("FALSE", &field(Primitive::Bool), "t").unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn coerce_reports_the_field_it_failed_on() {
        let err = coerce("abc", &field(Primitive::Int), "users").unwrap_err();
        assert!(err.to_string().contains("users.f"));

        assert!(coerce("1.5.2", &field(Primitive::Float), "t").is_err());
        assert!(coerce("yes", &field(Primitive::Bool), "t").is_err());
    }

    #[test]
    fn cells_format_per_primitive() {
        assert_eq!(format_cell(&Value::Str("a".to_string())), "\"a\"");
        assert_eq!(format_cell(&Value::Int(-3)), "-3");
        assert_eq!(format_cell(&Value::Bool(true)), "true");
    }

    #[test]
    fn floats_format_in_shortest_round_trip_form() {
        assert_eq!(format_cell(&Value::Float(1.5)), "1.5");
        assert_eq!(format_cell(&Value::Float(0.1)), "0.1");
        assert_eq!(format_cell(&Value::Float(3.0)), "3");
    }
}
