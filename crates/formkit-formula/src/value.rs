//! Runtime values produced while evaluating a formula.
//!
//! The model mirrors the JavaScript values formulas are written against:
//! numbers are `f64`, dates are millisecond timestamps (`NaN` for an invalid
//! date), and the built-in namespaces/functions are values so that
//! `Math.max` or `parseInt` can be looked up before they are called.

use chrono::{DateTime, Utc};
use formkit_core::FieldValue;
use formkit_core::values::format_number;

use crate::error::{FormulaError, Result};

/// Built-in objects and functions reachable from a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
    Math,
    Date,
    MathFn(MathFn),
    String,
    Number,
    ParseInt,
    ParseFloat,
    IsNaN,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    Abs,
    Ceil,
    Floor,
    Round,
    Trunc,
    Sign,
    Sqrt,
    Pow,
    Min,
    Max,
}

impl MathFn {
    pub fn lookup(name: &str) -> Option<Self> {
        let f = match name {
            "abs" => Self::Abs,
            "ceil" => Self::Ceil,
            "floor" => Self::Floor,
            "round" => Self::Round,
            "trunc" => Self::Trunc,
            "sign" => Self::Sign,
            "sqrt" => Self::Sqrt,
            "pow" => Self::Pow,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return None,
        };
        Some(f)
    }
}

/// A formula value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Milliseconds since the Unix epoch, UTC. `NaN` is an invalid date.
    Date(f64),
    Array(Vec<Value>),
    Native(Native),
}

impl Value {
    /// JavaScript `typeof`-style name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Date(_) => "date",
            Self::Array(_) => "array",
            Self::Native(_) => "function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
            Self::Date(_) | Self::Array(_) | Self::Native(_) => true,
        }
    }

    /// JavaScript `Number(value)`.
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined | Self::Native(_) => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::Str(s) => string_to_number(s),
            Self::Date(ms) => *ms,
            Self::Array(_) => string_to_number(&self.to_display()),
        }
    }

    /// JavaScript `String(value)`.
    pub fn to_display(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_owned(),
            Self::Null => "null".to_owned(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Str(s) => s.clone(),
            Self::Date(ms) => iso_string(*ms).unwrap_or_else(|| "Invalid Date".to_owned()),
            Self::Array(items) => items
                .iter()
                .map(|v| match v {
                    Self::Undefined | Self::Null => String::new(),
                    other => other.to_display(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Self::Native(_) => "function".to_owned(),
        }
    }

    /// Converts the value into something a form can store.
    ///
    /// `undefined` becomes `None`. Integral numbers become JSON integers,
    /// `NaN`/`Infinity` become their string form, dates become ISO strings.
    pub fn into_field_value(self) -> Result<Option<FieldValue>> {
        let value = match self {
            Self::Undefined => return Ok(None),
            Self::Null => FieldValue::Null,
            Self::Bool(b) => FieldValue::Bool(b),
            Self::Number(n) => number_to_field(n),
            Self::Str(s) => FieldValue::String(s),
            Self::Date(ms) => iso_string(ms).map_or(FieldValue::Null, FieldValue::String),
            Self::Array(items) => FieldValue::Array(
                items
                    .into_iter()
                    .map(|v| v.into_field_value().map(|v| v.unwrap_or(FieldValue::Null)))
                    .collect::<Result<_>>()?,
            ),
            Self::Native(native) => {
                return Err(FormulaError::Unrepresentable(format!("{:?}", native)));
            }
        };
        Ok(Some(value))
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn number_to_field(n: f64) -> FieldValue {
    if !n.is_finite() {
        return FieldValue::String(format_number(n));
    }
    if n == n.trunc() && n.abs() <= MAX_SAFE_INTEGER {
        // -0 is stored as 0.
        return FieldValue::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(FieldValue::Null, FieldValue::Number)
}

/// JavaScript string-to-number conversion: surrounding whitespace is
/// ignored, the empty string is `0`, anything unparsable is `NaN`.
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    let (sign, body) = match s.as_bytes()[0] {
        b'-' => (-1.0, &s[1..]),
        b'+' => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    if body == "Infinity" {
        return sign * f64::INFINITY;
    }
    // Rust also accepts "inf"/"nan", which JavaScript does not.
    let numeric = !body.is_empty()
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return f64::NAN;
    }
    body.parse::<f64>().map_or(f64::NAN, |n| sign * n)
}

/// Formats a timestamp the way `Date.prototype.toISOString` does.
pub fn iso_string(ms: f64) -> Option<String> {
    to_datetime(ms).map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

pub fn to_datetime(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_coercion_follows_js() {
        assert_eq!(Value::Str(" 42 ".into()).to_number(), 42.0);
        assert_eq!(Value::Str("".into()).to_number(), 0.0);
        assert_eq!(Value::Str("-1.5e2".into()).to_number(), -150.0);
        assert!(Value::Str("12px".into()).to_number().is_nan());
        assert!(Value::Str("inf".into()).to_number().is_nan());
        assert_eq!(Value::Str("-Infinity".into()).to_number(), f64::NEG_INFINITY);
        assert!(Value::Undefined.to_number().is_nan());
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert_eq!(Value::Array(vec![]).to_number(), 0.0);
        assert_eq!(Value::Array(vec![Value::Number(7.0)]).to_number(), 7.0);
    }

    #[test]
    fn display_follows_js() {
        assert_eq!(Value::Number(3.0).to_display(), "3");
        assert_eq!(Value::Number(0.5).to_display(), "0.5");
        assert_eq!(
            Value::Array(vec![Value::Number(1.0), Value::Null, Value::Str("x".into())]).to_display(),
            "1,,x"
        );
        assert_eq!(Value::Date(0.0).to_display(), "1970-01-01T00:00:00.000Z");
        assert_eq!(Value::Date(f64::NAN).to_display(), "Invalid Date");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
        assert!(Value::Str("0".into()).is_truthy());
    }

    #[test]
    fn stored_form_of_results() {
        assert_eq!(Value::Number(6.0).into_field_value(), Ok(Some(json!(6))));
        assert_eq!(Value::Number(-0.0).into_field_value(), Ok(Some(json!(0))));
        assert_eq!(Value::Number(2.5).into_field_value(), Ok(Some(json!(2.5))));
        assert_eq!(Value::Number(f64::NAN).into_field_value(), Ok(Some(json!("NaN"))));
        assert_eq!(
            Value::Number(f64::INFINITY).into_field_value(),
            Ok(Some(json!("Infinity")))
        );
        assert_eq!(Value::Undefined.into_field_value(), Ok(None));
        assert_eq!(
            Value::Date(86_400_000.0).into_field_value(),
            Ok(Some(json!("1970-01-02T00:00:00.000Z")))
        );
        assert_eq!(
            Value::Array(vec![Value::Undefined, Value::Bool(true)]).into_field_value(),
            Ok(Some(json!([null, true])))
        );
        assert!(Value::Native(Native::Math).into_field_value().is_err());
    }
}
