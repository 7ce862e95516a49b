//! Narrowing of untyped JSON coming back from the remote service.
//!
//! The service hands back numbers as floats, related records as
//! `[id, "label"]` pairs and sometimes ids as strings. Everything that turns
//! one of those into a typed value goes through this module.

use serde_json::Value;

use crate::error::MrpError;

/// Short description of a value's shape, used in [`MrpError::TypeMismatch`].
pub fn shape(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) if s.is_empty() => "empty string".into(),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(a) if a.is_empty() => "empty array".into(),
        Value::Array(a) => format!("array of {} elements", a.len()),
        Value::Object(_) => "object".into(),
    }
}

fn mismatch(expected: &'static str, value: &Value) -> MrpError {
    MrpError::TypeMismatch {
        expected,
        found: shape(value),
    }
}

/// Coerce a record identifier.
///
/// Accepts integers, floats (truncated toward zero), base-10 integer strings
/// and reference arrays (element 0 is used, the label is ignored). Anything
/// else is a [`MrpError::TypeMismatch`]; this never falls back to zero.
pub fn to_id(value: &Value) -> Result<i64, MrpError> {
    const EXPECTED: &str = "integer id";
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64().map(f64::trunc) {
                Some(f) if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(f as i64)
                }
                _ => Err(mismatch(EXPECTED, value)),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| mismatch(EXPECTED, value)),
        Value::Array(items) => match items.first() {
            Some(first) => to_id(first),
            None => Err(mismatch(EXPECTED, value)),
        },
        Value::Null | Value::Bool(_) | Value::Object(_) => Err(mismatch(EXPECTED, value)),
    }
}

/// Display label of a `[id, "label"]` reference, if the value is one.
pub fn reference_label(value: &Value) -> Option<&str> {
    match value {
        Value::Array(items) if items.len() >= 2 => items[1].as_str(),
        _ => None,
    }
}

/// Coerce a quantity or duration.
pub fn to_f64(value: &Value) -> Result<f64, MrpError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| mismatch("number", value)),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| mismatch("number", value)),
        _ => Err(mismatch("number", value)),
    }
}

/// Text field, treating the service's `false` for "unset" as absent.
pub fn text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn same_id_from_every_representation() {
        for v in [
            json!(7),
            json!(7.0),
            json!(7.9),
            json!("7"),
            json!(" 7 "),
            json!([7, "Widget"]),
            json!([7.0, "Widget"]),
            json!(["7", "Widget"]),
        ] {
            assert_eq!(to_id(&v).unwrap(), 7, "input {v}");
        }
    }

    #[test]
    fn floats_truncate_toward_zero() {
        assert_eq!(to_id(&json!(-3.7)).unwrap(), -3);
        assert_eq!(to_id(&json!(3.7)).unwrap(), 3);
    }

    #[test]
    fn rejects_non_id_shapes() {
        for v in [
            json!([]),
            json!({}),
            json!({"id": 1}),
            json!(true),
            json!(false),
            json!(null),
            json!(""),
            json!("abc"),
            json!("7.5"),
            json!(1e300),
        ] {
            match to_id(&v) {
                Err(MrpError::TypeMismatch { expected, .. }) => assert_eq!(expected, "integer id"),
                other => panic!("expected TypeMismatch for {v}, got {other:?}"),
            }
        }
    }

    #[test]
    fn mismatch_names_observed_shape() {
        let err = to_id(&json!([])).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected integer id, found empty array");
        let err = to_id(&json!(false)).unwrap_err();
        assert!(err.to_string().contains("boolean false"));
    }

    #[test]
    fn label_from_reference() {
        assert_eq!(reference_label(&json!([3, "Oolong Tea"])), Some("Oolong Tea"));
        assert_eq!(reference_label(&json!([3])), None);
        assert_eq!(reference_label(&json!(false)), None);
    }

    #[test]
    fn quantities_accept_numeric_strings() {
        assert_eq!(to_f64(&json!("12.5")).unwrap(), 12.5);
        assert_eq!(to_f64(&json!(4)).unwrap(), 4.0);
        assert!(to_f64(&json!(null)).is_err());
    }

    #[test]
    fn text_treats_false_as_unset() {
        assert_eq!(text(&json!("MO/0001")), Some("MO/0001"));
        assert_eq!(text(&json!(false)), None);
        assert_eq!(text(&json!("")), None);
    }
}
