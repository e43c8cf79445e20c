//! Built-in filters
//!
//! Named value transforms that mapping files can attach to a field.
//!
//! - `upper` / `lower` / `trim` - string case and whitespace
//! - `string` - render any value as a string
//! - `number` - parse strings and booleans into numbers
//! - `bool` - truthiness of strings and numbers
//! - `split` - split a string on whitespace into an array

use serde_json::{Number, Value};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::field::Filter;

/// Names accepted by [`lookup`]
pub const BUILTIN_FILTERS: &[&str] = &[
    "upper", "lower", "trim", "string", "number", "bool", "split",
];

/// Resolve a built-in filter by name
pub fn lookup(name: &str) -> Result<Filter> {
    let filter: Filter = match name {
        "upper" => Arc::new(|v: &Value| map_str(v, str::to_uppercase)),
        "lower" => Arc::new(|v: &Value| map_str(v, str::to_lowercase)),
        "trim" => Arc::new(|v: &Value| map_str(v, |s| s.trim().to_string())),
        "string" => Arc::new(to_string),
        "number" => Arc::new(to_number),
        "bool" => Arc::new(to_bool),
        "split" => Arc::new(split),
        _ => {
            return Err(Error::UnknownFilter {
                name: name.to_string(),
            });
        }
    };
    Ok(filter)
}

// Non-string input passes through
fn map_str(value: &Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(s)),
        other => other.clone(),
    }
}

fn to_string(value: &Value) -> Value {
    match value {
        Value::String(_) | Value::Null => value.clone(),
        other => Value::String(other.to_string()),
    }
}

fn to_number(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Value::from(i)
            } else {
                s.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Value::Bool(b) => Value::from(u8::from(*b)),
        other => other.clone(),
    }
}

fn to_bool(value: &Value) -> Value {
    match value {
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Value::Bool(true),
            "false" | "no" | "0" | "" => Value::Bool(false),
            _ => Value::Null,
        },
        Value::Number(n) => Value::Bool(n.as_f64().is_some_and(|f| f != 0.0)),
        other => other.clone(),
    }
}

fn split(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::Array(s.split_whitespace().map(Value::from).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("upper", json!("John"), json!("JOHN"))]
    #[case("lower", json!("John"), json!("john"))]
    #[case("trim", json!("  x "), json!("x"))]
    #[case("upper", json!(42), json!(42))]
    #[case("string", json!(42), json!("42"))]
    #[case("string", Value::Null, Value::Null)]
    #[case("number", json!("42"), json!(42))]
    #[case("number", json!(" 2.5"), json!(2.5))]
    #[case("number", json!("abc"), Value::Null)]
    #[case("number", json!(true), json!(1))]
    #[case("bool", json!("yes"), json!(true))]
    #[case("bool", json!("0"), json!(false))]
    #[case("bool", json!(3), json!(true))]
    #[case("split", json!("John  Doe"), json!(["John", "Doe"]))]
    fn test_builtin_filters(#[case] name: &str, #[case] input: Value, #[case] expected: Value) {
        let filter = lookup(name).unwrap();
        assert_eq!(filter(&input), expected);
    }

    #[test]
    fn test_unknown_filter() {
        assert!(matches!(lookup("reverse"), Err(Error::UnknownFilter { .. })));
    }

    #[test]
    fn test_every_listed_filter_resolves() {
        for name in BUILTIN_FILTERS {
            assert!(lookup(name).is_ok(), "{name} should resolve");
        }
    }
}
