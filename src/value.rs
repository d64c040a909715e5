use std::collections::HashMap;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

/// A runtime value embedded in the tree as a literal.
///
/// Only the parts of the value system the parser needs live here: array
/// literals (`[1, "a"]`), boolean keywords and JSON object literals are
/// carried as [`Value`]s inside [`crate::ast::Node::Value`].
///
/// # Examples
///
/// ```
/// use qlfront::Value;
///
/// let array = Value::Array(vec![Value::Integer(1), Value::String("a".to_string())]);
/// assert_eq!(array.to_string(), r#"[1, "a"]"#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    Boolean(bool),

    Integer(i64),

    /// Exact decimal, scale preserved (`3.50` stays `3.50`)
    Decimal(Decimal),

    String(String),

    /// Array literal (homogeneous or heterogeneous)
    Array(Vec<Value>),

    /// JSON object literal
    Object(HashMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Decimal(d) => d.round().to_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    n.as_f64()
                        .and_then(Decimal::from_f64)
                        .map(Value::Decimal)
                        .unwrap_or(Value::Null)
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Decimal(d) => d
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(Into::into).collect()),
            Value::Object(obj) => serde_json::Value::Object(
                obj.iter().map(|(k, v)| (k.clone(), v.into())).collect(),
            ),
        }
    }
}
