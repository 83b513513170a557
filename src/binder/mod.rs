//! Parameter binding: validates host arguments against a statement's
//! placeholders and attaches them to the engine statement.
//!
//! Binding is idempotent; re-invoking before an execution overwrites prior
//! bindings. All validation happens before the first engine bind call, so a
//! rejected argument list leaves no partial bindings behind.

mod scanner;

pub use scanner::{PlaceholderScan, PlaceholderStyle, scan_placeholders};

use crate::error::SqliteExecError;
use crate::value::Value;

/// Arguments for one statement execution.
///
/// Positional parameters are matched by position against `?`/`?NNN`
/// placeholders; named parameters are matched against `:name`, `@name`, or
/// `$name` placeholders. Keys may be given with or without the sigil.
#[derive(Debug, Clone, Default)]
pub enum Params {
    /// No arguments supplied at this call site.
    #[default]
    Empty,
    /// Values bound by position, in order.
    Positional(Vec<Value>),
    /// `(name, value)` pairs bound by name.
    Named(Vec<(String, Value)>),
}

impl Params {
    /// Build positional parameters from anything convertible to [`Value`].
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Params::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Build named parameters from `(name, value)` pairs.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Params::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Params::Empty => true,
            Params::Positional(v) => v.is_empty(),
            Params::Named(v) => v.is_empty(),
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

impl From<&[Value]> for Params {
    fn from(values: &[Value]) -> Self {
        Params::Positional(values.to_vec())
    }
}

/// Validate `params` against the statement's placeholders and attach them.
///
/// # Errors
///
/// - [`SqliteExecError::RangeError`] on positional arity mismatch or an
///   unknown named parameter.
/// - [`SqliteExecError::TypeError`] when the argument kind does not match the
///   placeholder style, or a required named parameter is absent.
pub(crate) fn apply(
    stmt: &mut rusqlite::Statement<'_>,
    scan: &PlaceholderScan,
    params: &Params,
) -> Result<(), SqliteExecError> {
    let expected = stmt.parameter_count();

    match (scan.style(), params) {
        (PlaceholderStyle::None, p) => {
            if p.is_empty() {
                Ok(())
            } else {
                Err(SqliteExecError::RangeError(format!(
                    "expected 0 parameters, got {}",
                    param_len(p)
                )))
            }
        }
        (PlaceholderStyle::Positional, Params::Positional(values)) => {
            if values.len() != expected {
                return Err(SqliteExecError::RangeError(format!(
                    "expected {expected} positional parameter(s), got {}",
                    values.len()
                )));
            }
            for (i, value) in values.iter().enumerate() {
                stmt.raw_bind_parameter(i + 1, value)?;
            }
            Ok(())
        }
        (PlaceholderStyle::Positional, Params::Empty) => Err(SqliteExecError::RangeError(format!(
            "expected {expected} positional parameter(s), got 0"
        ))),
        (PlaceholderStyle::Positional, Params::Named(_)) => Err(SqliteExecError::TypeError(
            "this statement uses positional placeholders; named parameters were supplied".into(),
        )),
        (PlaceholderStyle::Named, Params::Named(pairs)) => {
            let mut bound = vec![false; expected];
            for (key, value) in pairs {
                let index = resolve_named(stmt, key)?.ok_or_else(|| {
                    SqliteExecError::RangeError(format!("unknown named parameter \"{key}\""))
                })?;
                stmt.raw_bind_parameter(index, value)?;
                bound[index - 1] = true;
            }
            if let Some(missing) = first_missing(stmt, scan, &bound)? {
                return Err(SqliteExecError::TypeError(format!(
                    "missing named parameter \"{missing}\""
                )));
            }
            Ok(())
        }
        (PlaceholderStyle::Named, Params::Empty) => {
            let first = scan.names().first().map_or("?", String::as_str);
            Err(SqliteExecError::TypeError(format!(
                "missing named parameter \"{first}\""
            )))
        }
        (PlaceholderStyle::Named, Params::Positional(_)) => Err(SqliteExecError::TypeError(
            "this statement uses named placeholders; bind them by name".into(),
        )),
    }
}

fn param_len(params: &Params) -> usize {
    match params {
        Params::Empty => 0,
        Params::Positional(v) => v.len(),
        Params::Named(v) => v.len(),
    }
}

/// Resolve a key (with or without sigil) to the engine's one-based parameter
/// index.
fn resolve_named(
    stmt: &rusqlite::Statement<'_>,
    key: &str,
) -> Result<Option<usize>, SqliteExecError> {
    if key.starts_with([':', '@', '$']) {
        return Ok(stmt.parameter_index(key)?);
    }
    for sigil in [':', '@', '$'] {
        let candidate = format!("{sigil}{key}");
        if let Some(index) = stmt.parameter_index(&candidate)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Find the first scanned placeholder name whose index did not get a binding.
fn first_missing(
    stmt: &rusqlite::Statement<'_>,
    scan: &PlaceholderScan,
    bound: &[bool],
) -> Result<Option<String>, SqliteExecError> {
    if bound.iter().all(|b| *b) {
        return Ok(None);
    }
    for name in scan.names() {
        if let Some(index) = stmt.parameter_index(name)? {
            if !bound[index - 1] {
                return Ok(Some(name.clone()));
            }
        }
    }
    Ok(None)
}
