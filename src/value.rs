use std::collections::BTreeMap;

use crate::error::Category;

/// A dynamic host value handed to the query builders.
///
/// Typed Rust values (`i32`, `&str`, [`Vector`](crate::ast::Vector), ...) are
/// converted into literals directly. `Value` covers the cases where the shape
/// is only known at runtime, such as JSON read from a file or passed through
/// from another service, and is classified by the functions in
/// [`coerce`](crate::coerce).
///
/// Integers and floats are kept apart so that `1` coerces to an integer
/// literal and `1.0` to a float literal.
///
/// # Examples
///
/// ```
/// use topk_query::Value;
///
/// let ints = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
/// let from_json: Value = serde_json::json!([1, 2]).into();
/// assert_eq!(ints, from_json);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    Boolean(bool),

    Integer(i64),

    Float(f64),

    String(String),

    /// Raw byte buffer
    Bytes(Vec<u8>),

    Array(Vec<Value>),

    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Runtime category, used in coercion errors.
    pub fn category(&self) -> Category {
        match self {
            Value::Null => Category::Null,
            Value::Boolean(_) => Category::Boolean,
            Value::Integer(_) => Category::Integer,
            Value::Float(n) if n.is_nan() => Category::NaN,
            Value::Float(n) if n.is_infinite() => Category::Infinity,
            Value::Float(_) => Category::Float,
            Value::String(_) => Category::String,
            Value::Bytes(_) => Category::Bytes,
            Value::Array(_) => Category::Array,
            Value::Object(_) => Category::Object,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                // u64 above i64::MAX and every fractional number
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
