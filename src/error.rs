use thiserror::Error;

/// Error type shared by every operation in this crate.
///
/// The variants mirror how failures surface to callers: engine diagnostics
/// pass through untouched, while misuse of the statement surface is reported
/// as a type or range error before the engine is ever involved.
#[derive(Debug, Error)]
pub enum SqliteExecError {
    /// Compilation or execution failure reported by the engine, carrying the
    /// engine's diagnostic message and error code.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Unsupported host type or misuse of the statement surface, e.g. calling
    /// a row-returning method on a statement that returns no data, supplying
    /// positional arguments to a statement with named placeholders, or
    /// omitting a required named parameter.
    #[error("type error: {0}")]
    TypeError(String),

    /// Out-of-range access: positional parameter arity mismatch, unknown
    /// named parameter, column index out of bounds, or unknown column name.
    #[error("range error: {0}")]
    RangeError(String),

    /// A lazy row view was accessed after its cursor was closed, finished
    /// iterating, or failed mid-step.
    #[error("row is no longer valid (statement has been stepped or closed)")]
    StaleRow,
}

impl SqliteExecError {
    /// The extended engine error code, when this error originated in the
    /// engine.
    #[must_use]
    pub fn sqlite_error_code(&self) -> Option<i64> {
        match self {
            SqliteExecError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                Some(i64::from(err.extended_code))
            }
            _ => None,
        }
    }
}
