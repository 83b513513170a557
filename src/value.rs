use std::fmt::Write as _;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SqliteExecError;

/// A host value for one of the engine's storage classes.
///
/// The same enum is used for binding parameters and for reading results, so
/// round-trip code never branches on driver types:
/// ```rust
/// use sqlite_exec::prelude::*;
///
/// let params = vec![
///     Value::Integer(1),
///     Value::Text("alice".into()),
///     Value::from(true),
/// ];
/// # let _ = params;
/// ```
///
/// `Integer` is the wide, precision-preserving representation produced when a
/// statement's safe-integer mode is on; with the mode off, INTEGER columns
/// are read back as `Real` (the floating-point-backed numeric type). Binding
/// an `Integer` is always full-precision regardless of the read-side mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Integer value (64-bit, exact)
    Integer(i64),
    /// Floating point value (64-bit)
    Real(f64),
    /// Text/string value
    Text(String),
    /// Binary data, owned by the host
    Blob(Vec<u8>),
}

impl Value {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(value) => Some(*value),
            Value::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let Value::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Integer(i) => Some(*i != 0),
            Value::Real(f) => Some(*f != 0.0),
            _ => None,
        }
    }

    /// Parse a TEXT value in one of the formats this crate binds timestamps
    /// with.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        let s = self.as_text()?;
        // Try "YYYY-MM-DD HH:MM:SS"
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Some(dt);
        }
        // Try "YYYY-MM-DD HH:MM:SS.SSS"
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(dt);
        }
        None
    }

    /// Serialize any JSON value into a TEXT parameter.
    ///
    /// This is the intentional path for storing structured data; the
    /// `TryFrom<&JsonValue>` conversion, by contrast, rejects arrays and
    /// objects because they have no scalar storage class.
    #[must_use]
    pub fn json(value: &JsonValue) -> Value {
        Value::Text(value.to_string())
    }

    /// The storage-class name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(value.to_vec())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        let mut buf = String::with_capacity(32);
        // Format directly into the string buffer
        write!(buf, "{}", value.format("%F %T%.f")).expect("formatting into a String cannot fail");
        Value::Text(buf)
    }
}

impl TryFrom<u64> for Value {
    type Error = SqliteExecError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value).map(Value::Integer).map_err(|_| {
            SqliteExecError::TypeError(format!(
                "cannot bind u64 value {value}: out of range for a 64-bit signed integer"
            ))
        })
    }
}

impl TryFrom<&JsonValue> for Value {
    type Error = SqliteExecError;

    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(b) => Ok(Value::from(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Real(f))
                } else {
                    Err(SqliteExecError::TypeError(format!(
                        "cannot bind JSON number {n}: out of range"
                    )))
                }
            }
            JsonValue::String(s) => Ok(Value::Text(s.clone())),
            JsonValue::Array(_) => Err(SqliteExecError::TypeError(
                "cannot bind a value of type array; serialize it with Value::json".into(),
            )),
            JsonValue::Object(_) => Err(SqliteExecError::TypeError(
                "cannot bind a value of type object; serialize it with Value::json".into(),
            )),
        }
    }
}
