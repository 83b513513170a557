//! Transaction wrapper: runs a host function inside a begin/commit/rollback
//! bracket, with mode variants and safe nesting via savepoints.

use crate::database::Database;
use crate::error::SqliteExecError;

/// How the outermost transaction acquires its locks.
///
/// `Default` issues a plain `BEGIN` (the engine's deferred behavior); the
/// other variants name the lock mode explicitly. Modes only matter for the
/// outermost transaction — a nested call accepts one but runs inside a
/// savepoint regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    #[default]
    Default,
    Deferred,
    Immediate,
    Exclusive,
}

impl TransactionMode {
    #[must_use]
    pub(crate) fn begin_sql(self) -> &'static str {
        match self {
            TransactionMode::Default => "BEGIN",
            TransactionMode::Deferred => "BEGIN DEFERRED",
            TransactionMode::Immediate => "BEGIN IMMEDIATE",
            TransactionMode::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

/// A host function wrapped in transaction semantics.
///
/// Built with [`Database::transaction`]. Each invocation brackets the wrapped
/// function: commit on `Ok`, rollback and re-raise the original error
/// unchanged on `Err`. Invoking while the connection is already inside a
/// transaction nests through a named savepoint instead of a second top-level
/// `BEGIN`; an inner failure rolls back only to that savepoint.
///
/// ```rust
/// use sqlite_exec::prelude::*;
///
/// # fn demo(db: &Database) -> Result<(), SqliteExecError> {
/// let mut insert_pair = db.transaction(|(a, b): (i64, i64)| {
///     db.prepare("INSERT INTO pairs VALUES (?, ?)")?
///         .run(&Params::positional([Value::Integer(a), Value::Integer(b)]))?;
///     Ok::<(), SqliteExecError>(())
/// });
/// insert_pair.immediate((1, 2))?;
/// # Ok(())
/// # }
/// ```
pub struct Transaction<'db, F> {
    db: &'db Database,
    func: F,
}

impl<'db, F> Transaction<'db, F> {
    pub(crate) fn new(db: &'db Database, func: F) -> Self {
        Self { db, func }
    }

    /// Invoke the wrapped function in default mode (plain `BEGIN`).
    ///
    /// # Errors
    ///
    /// The wrapped function's error, unchanged, after rollback; or a bracket
    /// failure (begin/commit) converted through `E::From`.
    pub fn call<A, T, E>(&mut self, args: A) -> Result<T, E>
    where
        F: FnMut(A) -> Result<T, E>,
        E: From<SqliteExecError>,
    {
        self.call_with_mode(TransactionMode::Default, args)
    }

    /// Invoke with `BEGIN DEFERRED`.
    ///
    /// # Errors
    ///
    /// See [`call`](Transaction::call).
    pub fn deferred<A, T, E>(&mut self, args: A) -> Result<T, E>
    where
        F: FnMut(A) -> Result<T, E>,
        E: From<SqliteExecError>,
    {
        self.call_with_mode(TransactionMode::Deferred, args)
    }

    /// Invoke with `BEGIN IMMEDIATE`.
    ///
    /// # Errors
    ///
    /// See [`call`](Transaction::call).
    pub fn immediate<A, T, E>(&mut self, args: A) -> Result<T, E>
    where
        F: FnMut(A) -> Result<T, E>,
        E: From<SqliteExecError>,
    {
        self.call_with_mode(TransactionMode::Immediate, args)
    }

    /// Invoke with `BEGIN EXCLUSIVE`.
    ///
    /// # Errors
    ///
    /// See [`call`](Transaction::call).
    pub fn exclusive<A, T, E>(&mut self, args: A) -> Result<T, E>
    where
        F: FnMut(A) -> Result<T, E>,
        E: From<SqliteExecError>,
    {
        self.call_with_mode(TransactionMode::Exclusive, args)
    }

    /// Invoke with an explicit [`TransactionMode`].
    ///
    /// # Errors
    ///
    /// See [`call`](Transaction::call).
    pub fn call_with_mode<A, T, E>(&mut self, mode: TransactionMode, args: A) -> Result<T, E>
    where
        F: FnMut(A) -> Result<T, E>,
        E: From<SqliteExecError>,
    {
        if self.db.in_transaction() {
            self.run_nested(args)
        } else {
            self.run_top_level(mode, args)
        }
    }

    fn run_top_level<A, T, E>(&mut self, mode: TransactionMode, args: A) -> Result<T, E>
    where
        F: FnMut(A) -> Result<T, E>,
        E: From<SqliteExecError>,
    {
        self.db.exec(mode.begin_sql()).map_err(E::from)?;
        tracing::debug!(mode = ?mode, "transaction begun");
        match (self.func)(args) {
            Ok(value) => {
                self.db.exec("COMMIT").map_err(E::from)?;
                tracing::debug!("transaction committed");
                Ok(value)
            }
            Err(err) => {
                // The body's error propagates unchanged; a rollback failure
                // is logged, not raised, and never retried.
                if self.db.in_transaction()
                    && let Err(rollback_err) = self.db.exec("ROLLBACK")
                {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    fn run_nested<A, T, E>(&mut self, args: A) -> Result<T, E>
    where
        F: FnMut(A) -> Result<T, E>,
        E: From<SqliteExecError>,
    {
        let name = format!("sp_{}", self.db.enter_savepoint());
        if let Err(e) = self.db.exec(&format!("SAVEPOINT {name}")) {
            self.db.exit_savepoint();
            return Err(E::from(e));
        }
        tracing::debug!(savepoint = %name, "nested transaction begun");

        let result = match (self.func)(args) {
            Ok(value) => self
                .db
                .exec(&format!("RELEASE {name}"))
                .map_err(E::from)
                .map(|()| value),
            Err(err) => {
                // ROLLBACK TO leaves the savepoint on the stack; RELEASE pops
                // it so the outer transaction continues cleanly.
                if let Err(rollback_err) = self.db.exec(&format!("ROLLBACK TO {name}")) {
                    tracing::warn!(error = %rollback_err, savepoint = %name, "savepoint rollback failed");
                } else if let Err(release_err) = self.db.exec(&format!("RELEASE {name}")) {
                    tracing::warn!(error = %release_err, savepoint = %name, "savepoint release failed");
                }
                Err(err)
            }
        };
        self.db.exit_savepoint();
        result
    }
}
