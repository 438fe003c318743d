use serde::{Deserialize, Serialize};
use std::fmt;

/// A single generated datum, bound as a statement parameter.
///
/// Deserializes untagged so configuration files can write literals directly
/// (`value = 42`, `values = ["a", "b"]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the integer payload, if this is an `Integer`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Real(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

/// `None` becomes `NULL`, which is what a missing foreign-key target looks like.
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_is_null() {
        let value: Value = None::<i64>.into();
        assert!(value.is_null());
        assert_eq!(Value::from(Some(7_i64)), Value::Integer(7));
    }

    #[test]
    fn untagged_literals_pick_the_narrowest_variant() {
        use serde::de::IntoDeserializer;
        use serde::de::value::Error;

        fn parse<'de, D: serde::Deserializer<'de>>(de: D) -> Value {
            Value::deserialize(de).map_err(|e| e.to_string()).unwrap()
        }

        assert_eq!(parse(IntoDeserializer::<Error>::into_deserializer(true)), Value::Bool(true));
        assert_eq!(parse(IntoDeserializer::<Error>::into_deserializer(3_i64)), Value::Integer(3));
        assert_eq!(parse(IntoDeserializer::<Error>::into_deserializer(2.5_f64)), Value::Real(2.5));
        assert_eq!(
            parse(IntoDeserializer::<Error>::into_deserializer("x")),
            Value::Text("x".to_string())
        );
    }
}
