//! Runtime values of scope variables.
//!
//! Values are JSON-shaped with an extra `Undefined` for "no such variable".
//! Coercions follow the JavaScript rules page authors expect from attribute
//! expressions: `+` concatenates when either side is a string, arithmetic
//! coerces to numbers, and conditions use truthiness.

use std::collections::BTreeMap;
use std::fmt;

use pattr_carton::CompactString;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::errors::EvalError;

/// Object payload; ordered so dumps and serialization are stable
pub type Object = BTreeMap<CompactString, Value>;

/// A scope variable value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Object),
}

impl Value {
    /// JavaScript-style type name, used in error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    #[inline]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Self::Array(items) => match items.as_slice() {
                [] => 0.0,
                [single] => single.to_number(),
                _ => f64::NAN,
            },
            Self::Object(_) => f64::NAN,
        }
    }

    /// Text for presentation directives; nullish values render as empty
    pub fn to_text(&self) -> String {
        if self.is_nullish() {
            String::new()
        } else {
            self.to_string()
        }
    }

    /// `Object.is` semantics, used for change detection (`NaN` is the same as `NaN`)
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                (a.is_nan() && b.is_nan())
                    || (a == b && a.is_sign_negative() == b.is_sign_negative())
            }
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_value(y))
            }
            (Self::Object(a), Self::Object(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.same_value(vb))
            }
            _ => self == other,
        }
    }

    /// `===`
    pub fn strict_eq(&self, other: &Self) -> bool {
        self == other
    }

    /// `==`: nullish values equal each other, primitives compare numerically
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Self::String(a), Self::String(b)) => a == b,
            (
                Self::Number(_) | Self::String(_) | Self::Bool(_),
                Self::Number(_) | Self::String(_) | Self::Bool(_),
            ) => self.to_number() == other.to_number(),
            _ => self == other,
        }
    }

    /// Read `self[key]`
    pub fn get_member(&self, key: &Value) -> Result<Value, EvalError> {
        match self {
            Self::Undefined | Self::Null => Err(EvalError::Type(format!(
                "cannot read property '{}' of {}",
                key,
                self.type_name()
            ))),
            Self::Object(map) => Ok(map
                .get(key.to_string().as_str())
                .cloned()
                .unwrap_or_default()),
            Self::Array(items) => Ok(match array_index(key) {
                Some(i) => items.get(i).cloned().unwrap_or_default(),
                None if is_length(key) => Value::Number(items.len() as f64),
                None => Value::Undefined,
            }),
            Self::String(s) => Ok(match array_index(key) {
                Some(i) => s
                    .chars()
                    .nth(i)
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or_default(),
                None if is_length(key) => Value::Number(s.chars().count() as f64),
                None => Value::Undefined,
            }),
            Self::Bool(_) | Self::Number(_) => Ok(Value::Undefined),
        }
    }

    /// Write `self[key] = value`
    pub fn set_member(&mut self, key: &Value, value: Value) -> Result<(), EvalError> {
        match self {
            Self::Object(map) => {
                map.insert(CompactString::from(key.to_string()), value);
                Ok(())
            }
            Self::Array(items) => match array_index(key) {
                Some(i) if i < items.len() => {
                    items[i] = value;
                    Ok(())
                }
                Some(i) if i - items.len() <= MAX_ARRAY_GAP => {
                    items.resize(i, Value::Undefined);
                    items.push(value);
                    Ok(())
                }
                Some(i) => Err(EvalError::Type(format!(
                    "array index {} is too far past the end (length {})",
                    i,
                    items.len()
                ))),
                None => Err(EvalError::Type(format!(
                    "cannot set property '{}' of array",
                    key
                ))),
            },
            other => Err(EvalError::Type(format!(
                "cannot set property '{}' of {}",
                key,
                other.type_name()
            ))),
        }
    }

    /// Convert from parsed JSON
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (CompactString::from(k), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON; `undefined` and non-finite numbers become `null`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Undefined | Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => match integral(*n) {
                Some(i) => serde_json::Value::from(i),
                None => serde_json::Number::from_f64(*n)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            },
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Whole numbers that print without a fraction
fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15).then_some(n as i64)
}

/// Holes an array write may open past the current end
const MAX_ARRAY_GAP: usize = 1024;

fn array_index(key: &Value) -> Option<usize> {
    let n = match key {
        Value::Number(n) => *n,
        Value::String(s) => s.parse::<f64>().ok()?,
        _ => return None,
    };
    (n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then_some(n as usize)
}

fn is_length(key: &Value) -> bool {
    matches!(key, Value::String(s) if s == "length")
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if let Some(i) = integral(n) {
        write!(f, "{}", i)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => fmt_number(*n, f),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Self::Object(_) => f.write_str("[object Object]"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined | Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None if n.is_finite() => serializer.serialize_f64(*n),
                None => serializer.serialize_unit(),
            },
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(object) => {
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (k, v) in object {
                    map.serialize_entry(k.as_str(), v)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Self::from_json(json)
    }
}
