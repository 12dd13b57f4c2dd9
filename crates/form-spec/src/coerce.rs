//! Conversions between raw widget input and schema-declared types.
//!
//! Two entry points with deliberately different failure modes:
//! [`to_json_type`] is strict and returns `None` when a value cannot take the
//! requested type, while [`to_schema_type`] never fails and hands back the raw
//! value when no allowed type fits.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};

use crate::schema::{SchemaType, schema_types, value_to_display};

static INTEGER_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?\d+$").expect("integer pattern"));
static NUMBER_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?$").expect("number pattern")
});
static LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?)").expect("float prefix pattern")
});
static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([-+]?\d+)").expect("integer prefix pattern"));

/// Largest magnitude at which every whole `f64` is exactly representable.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Strictly coerces `value` to the type named by `target`.
///
/// Returns `None` when the conversion is impossible and always for the
/// `"null"` target. Target names outside the five primitive types leave the
/// value untouched.
pub fn to_json_type(value: &Value, target: &str) -> Option<Value> {
    match target.parse::<SchemaType>() {
        Ok(
            kind @ (SchemaType::String
            | SchemaType::Number
            | SchemaType::Integer
            | SchemaType::Boolean
            | SchemaType::Null),
        ) => coerce(value, kind),
        _ => Some(value.clone()),
    }
}

/// Strict coercion to a known primitive type.
pub fn coerce(value: &Value, target: SchemaType) -> Option<Value> {
    if value.is_null() {
        return None;
    }
    match target {
        SchemaType::String => match value {
            Value::String(_) => Some(value.clone()),
            Value::Number(_) | Value::Bool(_) => Some(Value::String(value_to_display(value))),
            _ => None,
        },
        SchemaType::Number => match value {
            Value::Number(number) if number.is_i64() || number.is_u64() => Some(value.clone()),
            Value::Number(number) => number.as_f64().and_then(number_value),
            Value::String(text) if NUMBER_TEXT.is_match(text.trim()) => {
                text.trim().parse::<f64>().ok().and_then(number_value)
            }
            _ => None,
        },
        SchemaType::Integer => match value {
            Value::Number(number) if number.is_i64() || number.is_u64() => Some(value.clone()),
            Value::Number(number) => number
                .as_f64()
                .filter(|float| float.fract() == 0.0)
                .and_then(number_value),
            Value::String(text) if INTEGER_TEXT.is_match(text.trim()) => {
                let trimmed = text.trim();
                match trimmed.parse::<i64>() {
                    Ok(whole) => Some(Value::from(whole)),
                    Err(_) => trimmed.parse::<f64>().ok().and_then(number_value),
                }
            }
            _ => None,
        },
        SchemaType::Boolean => truthy_token(value).map(Value::Bool),
        SchemaType::Null | SchemaType::Object | SchemaType::Array => None,
    }
}

/// Coerces `value` toward the first fitting type in `allowed`.
///
/// Candidates are tried in a fixed precedence (integer before number before
/// string before boolean) rather than in list order. When a `boolean` type is
/// allowed, any non-boolean value is returned as is. The raw value is
/// returned whenever nothing applies.
pub fn to_schema_type(value: &Value, allowed: &[SchemaType]) -> Value {
    let allows = |kind: SchemaType| allowed.contains(&kind);
    let numeric = allows(SchemaType::Number) || allows(SchemaType::Integer);

    if allows(SchemaType::Null) && !has_value(value) {
        return Value::Null;
    }
    if allows(SchemaType::Boolean) && !value.is_boolean() {
        return value.clone();
    }
    if allows(SchemaType::Integer)
        && let Some(whole) = coerce(value, SchemaType::Integer)
    {
        return whole;
    }
    if allows(SchemaType::Number)
        && let Some(number) = coerce(value, SchemaType::Number)
    {
        return number;
    }
    if allows(SchemaType::String)
        && (value.is_string() || value.is_number())
        && let Some(text) = coerce(value, SchemaType::String)
    {
        return text;
    }
    if allows(SchemaType::Boolean)
        && let Some(flag) = coerce(value, SchemaType::Boolean)
    {
        return flag;
    }
    if allows(SchemaType::String) {
        if value.is_null() {
            return Value::String(String::new());
        }
        if let Some(text) = coerce(value, SchemaType::String) {
            return text;
        }
    }
    if numeric {
        match value {
            Value::Bool(true) => return Value::from(1),
            Value::Bool(false) | Value::Null => return Value::from(0),
            Value::String(text) if text.is_empty() => return Value::from(0),
            _ => {}
        }
    }
    if allows(SchemaType::Number)
        && let Some(prefix) = leading_float(value).filter(|float| *float != 0.0)
        && let Some(number) = number_value(prefix)
    {
        return number;
    }
    if allows(SchemaType::Integer)
        && let Some(prefix) = leading_int(value).filter(|whole| *whole != 0)
    {
        return Value::from(prefix);
    }
    if numeric && !allows(SchemaType::Null) {
        return Value::from(0);
    }
    value.clone()
}

/// Applies [`to_schema_type`] using the `type` keyword of `schema`.
///
/// A schema without a usable `type` keyword leaves the value untouched.
pub fn coerce_to_schema(value: &Value, schema: &Value) -> Value {
    let types = schema_types(schema);
    if types.is_empty() {
        return value.clone();
    }
    to_schema_type(value, &types)
}

/// `true`-like and `false`-like tokens: booleans, `1`/`0` and their text forms.
pub fn truthy_token(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => match number.as_f64() {
            Some(one) if one == 1.0 => Some(true),
            Some(zero) if zero == 0.0 => Some(false),
            _ => None,
        },
        Value::String(text) => match text.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Null and the empty string carry no value; everything else does.
pub fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

/// JavaScript-style truthiness, used by layout conditions.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Builds a JSON number, storing whole values as integers.
pub fn number_value(float: f64) -> Option<Value> {
    if !float.is_finite() {
        return None;
    }
    if float.fract() == 0.0 && float.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::from(float as i64));
    }
    Number::from_f64(float).map(Value::Number)
}

fn leading_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => LEADING_FLOAT
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|found| found.as_str().parse().ok()),
        _ => None,
    }
}

fn leading_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64)),
        Value::String(text) => LEADING_INT
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|found| found.as_str().parse().ok()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::schema::SchemaType::{Boolean, Integer, Null, Number as Num, String as Str};

    #[test]
    fn to_json_type_converts_numbers_and_strings() {
        assert_eq!(to_json_type(&json!("10"), "number"), Some(json!(10)));
        assert_eq!(to_json_type(&json!("10"), "integer"), Some(json!(10)));
        assert_eq!(to_json_type(&json!(10), "integer"), Some(json!(10)));
        assert_eq!(to_json_type(&json!(10), "string"), Some(json!("10")));
        assert_eq!(to_json_type(&json!("2.5"), "number"), Some(json!(2.5)));
    }

    #[test]
    fn to_json_type_rejects_fractional_integers() {
        assert_eq!(to_json_type(&json!("10.5"), "integer"), None);
        assert_eq!(to_json_type(&json!(10.5), "integer"), None);
        assert_eq!(to_json_type(&json!("ten"), "number"), None);
    }

    #[test]
    fn to_json_type_handles_boolean_tokens() {
        assert_eq!(to_json_type(&json!("true"), "boolean"), Some(json!(true)));
        assert_eq!(to_json_type(&json!(0), "boolean"), Some(json!(false)));
        assert_eq!(to_json_type(&json!("yes"), "boolean"), None);
    }

    #[test]
    fn null_target_and_null_input_yield_sentinel() {
        assert_eq!(to_json_type(&json!("anything"), "null"), None);
        assert_eq!(to_json_type(&Value::Null, "string"), None);
    }

    #[test]
    fn unknown_target_returns_input() {
        assert_eq!(to_json_type(&json!([1, 2]), "tuple"), Some(json!([1, 2])));
        assert_eq!(to_json_type(&json!("x"), "object"), Some(json!("x")));
    }

    #[test]
    fn to_schema_type_prefers_numbers_over_strings() {
        assert_eq!(to_schema_type(&json!(10), &[Num, Integer, Str]), json!(10));
        assert_eq!(to_schema_type(&json!(10), &[Num, Str]), json!(10));
        assert_eq!(to_schema_type(&json!(10), &[Str]), json!("10"));
        assert_eq!(
            to_schema_type(&json!(10.5), &[Num, Integer, Str]),
            json!(10.5)
        );
        assert_eq!(to_schema_type(&json!(10.5), &[Integer, Str]), json!("10.5"));
        assert_eq!(to_schema_type(&json!(10.5), &[Integer]), json!(10));
    }

    #[test]
    fn to_schema_type_boolean_and_fallback_cases() {
        assert_eq!(
            to_schema_type(&json!("1"), &[Integer, Num, Str, Boolean]),
            json!("1")
        );
        assert_eq!(to_schema_type(&json!("true"), &[Boolean]), json!("true"));
        assert_eq!(to_schema_type(&json!("true"), &[Num]), json!(0));
        assert_eq!(to_schema_type(&json!(true), &[Boolean]), json!(true));
    }

    #[test]
    fn to_schema_type_handles_null_and_prefixes() {
        assert_eq!(to_schema_type(&json!(""), &[Str, Null]), Value::Null);
        assert_eq!(to_schema_type(&Value::Null, &[Str]), json!(""));
        assert_eq!(to_schema_type(&json!("12abc"), &[Num]), json!(12));
        assert_eq!(to_schema_type(&json!(true), &[Integer]), json!(1));
        assert_eq!(to_schema_type(&json!("abc"), &[Num, Null]), json!("abc"));
        assert_eq!(
            to_schema_type(&json!({ "a": 1 }), &[SchemaType::Object]),
            json!({ "a": 1 })
        );
    }

    #[test]
    fn single_type_round_trips() {
        for (value, kind) in [
            (json!(3.25), Num),
            (json!("hello"), Str),
            (json!(false), Boolean),
        ] {
            let coerced = coerce(&value, kind).expect("coercible");
            assert_eq!(to_schema_type(&coerced, &[kind]), value);
        }
    }

    #[test]
    fn coerce_to_schema_reads_type_keyword() {
        let schema = json!({ "type": ["integer", "string"] });
        assert_eq!(coerce_to_schema(&json!("7"), &schema), json!(7));
        assert_eq!(coerce_to_schema(&json!("7"), &json!({})), json!("7"));
    }
}
