//! Conversions between the engine's storage classes and host [`Value`]s.
//!
//! The engine hands out borrowed column data (`ValueRef`); everything leaving
//! this module is owned by the host, so a materialized value never aliases
//! engine memory once the cursor moves on. Blobs and text are copied out,
//! integers and reals are plain copies.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

use crate::error::SqliteExecError;
use crate::value::Value;

/// Convert one engine column value into a host [`Value`].
///
/// `safe_integers` selects the representation for INTEGER columns: the exact
/// 64-bit integer when on, the double-backed numeric when off. FLOAT, TEXT,
/// BLOB and NULL are unaffected by the mode.
///
/// # Errors
///
/// Returns [`SqliteExecError::TypeError`] if a TEXT column is not valid
/// UTF-8.
pub(crate) fn from_engine(
    value: ValueRef<'_>,
    safe_integers: bool,
) -> Result<Value, SqliteExecError> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => {
            if safe_integers {
                Ok(Value::Integer(i))
            } else {
                Ok(Value::Real(i as f64))
            }
        }
        ValueRef::Real(f) => Ok(Value::Real(f)),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => Ok(Value::Text(s.to_owned())),
            Err(e) => Err(SqliteExecError::TypeError(format!(
                "TEXT column is not valid UTF-8: {e}"
            ))),
        },
        ValueRef::Blob(bytes) => Ok(Value::Blob(bytes.to_vec())),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}
