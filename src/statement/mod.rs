//! One prepared query: lifecycle, execution state, column metadata, and the
//! entry points into the result materializer.

mod columns;
mod scan_status;

pub use columns::ColumnDescriptor;
pub(crate) use columns::ColumnSet;
pub use scan_status::{SCANSTAT_COMPLEX, ScanStatusMetric, ScanStatusValue};

use std::cell::{Cell, OnceCell, RefCell};
use std::sync::Arc;

use serde::Serialize;

use crate::binder::{self, Params, PlaceholderScan, scan_placeholders};
use crate::database::Database;
use crate::error::SqliteExecError;
use crate::rows::{self, LazyColumnIter, Row, RowIter};

/// Outcome of [`Statement::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Rows modified by the most recent execution.
    pub changes: u64,
    /// Rowid of the most recent successful INSERT on this connection.
    pub last_insert_rowid: i64,
}

/// A prepared statement, exclusively owned by one [`Database`] connection.
///
/// A statement drives at most one open cursor at a time: every execution
/// method borrows the statement mutably, and the returned cursor holds that
/// borrow until it is dropped. Dropping the statement finalizes it.
pub struct Statement<'conn> {
    db: &'conn Database,
    stmt: rusqlite::Statement<'conn>,
    source: String,
    reader: bool,
    scan: PlaceholderScan,
    safe_integers: Cell<bool>,
    has_bound: Cell<bool>,
    columns: OnceCell<Arc<ColumnSet>>,
    // Execution bookkeeping consumed by scan_status.
    runs: Cell<u64>,
    visits: Cell<u64>,
    plan: RefCell<Option<Arc<Vec<scan_status::PlanElement>>>>,
}

impl<'conn> Statement<'conn> {
    /// Compile `sql` against the connection.
    ///
    /// # Errors
    ///
    /// [`SqliteExecError::Sqlite`] with the engine diagnostic on a
    /// syntax/semantic failure; [`SqliteExecError::TypeError`] when the
    /// statement mixes positional and named placeholders.
    pub(crate) fn prepare(db: &'conn Database, sql: &str) -> Result<Self, SqliteExecError> {
        let stmt = db.connection().prepare(sql)?;
        let scan = scan_placeholders(sql);
        if scan.is_mixed() {
            return Err(SqliteExecError::TypeError(
                "cannot mix positional and named placeholders in one statement".into(),
            ));
        }
        let reader = stmt.column_count() > 0;
        tracing::debug!(sql, reader, "prepared statement");
        Ok(Self {
            db,
            stmt,
            source: sql.to_owned(),
            reader,
            scan,
            safe_integers: Cell::new(db.default_safe_integers_enabled()),
            has_bound: Cell::new(false),
            columns: OnceCell::new(),
            runs: Cell::new(0),
            visits: Cell::new(0),
            plan: RefCell::new(None),
        })
    }

    /// The SQL text this statement was prepared from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the statement produces result rows.
    #[must_use]
    pub fn reader(&self) -> bool {
        self.reader
    }

    /// True when the statement does not write the database.
    #[must_use]
    pub fn readonly(&self) -> bool {
        self.stmt.readonly()
    }

    /// Toggle safe-integer mode for this statement.
    ///
    /// With the mode on, INTEGER columns are read back as exact 64-bit
    /// integers; with it off they are read as the double-backed numeric
    /// representation. Binding is always full-precision. Each cursor captures
    /// the setting at open time; toggling does not affect a cursor that is
    /// already open.
    pub fn safe_integers(&self, toggle: bool) -> &Self {
        self.safe_integers.set(toggle);
        self
    }

    /// Whether safe-integer mode is currently on.
    #[must_use]
    pub fn safe_integers_enabled(&self) -> bool {
        self.safe_integers.get()
    }

    /// Validate `params` and attach them ahead of execution.
    ///
    /// Bindings persist until overwritten: subsequent executions with no
    /// call-site parameters reuse them. Rebinding overwrites.
    ///
    /// # Errors
    ///
    /// See [`Params`] — arity mismatches are range errors, placeholder-style
    /// mismatches and missing names are type errors.
    pub fn bind(&mut self, params: &Params) -> Result<&mut Self, SqliteExecError> {
        binder::apply(&mut self.stmt, &self.scan, params)?;
        self.has_bound.set(true);
        Ok(self)
    }

    fn apply_params(&mut self, params: &Params) -> Result<(), SqliteExecError> {
        if matches!(params, Params::Empty) && self.has_bound.get() {
            // Bindings survive a reset; nothing to do.
            return Ok(());
        }
        binder::apply(&mut self.stmt, &self.scan, params)
    }

    fn require_reader(&self, method: &str) -> Result<(), SqliteExecError> {
        if self.reader {
            Ok(())
        } else {
            Err(SqliteExecError::TypeError(format!(
                "the {method}() method can only be used on statements that return data"
            )))
        }
    }

    pub(crate) fn column_set(&self) -> &Arc<ColumnSet> {
        self.columns
            .get_or_init(|| ColumnSet::from_statement(&self.stmt))
    }

    /// Column metadata, available before execution.
    ///
    /// # Errors
    ///
    /// [`SqliteExecError::TypeError`] on a statement that returns no data.
    pub fn columns(&self) -> Result<&[ColumnDescriptor], SqliteExecError> {
        self.require_reader("columns")?;
        Ok(self.column_set().descriptors())
    }

    /// Execute the statement once, without materializing rows.
    ///
    /// Permitted for readers and non-readers alike: the engine is stepped a
    /// single time and the statement is reset.
    ///
    /// # Errors
    ///
    /// Binding errors before any engine step; [`SqliteExecError::Sqlite`]
    /// when the step fails.
    pub fn run(&mut self, params: &Params) -> Result<RunResult, SqliteExecError> {
        self.apply_params(params)?;
        self.runs.set(self.runs.get() + 1);
        tracing::debug!(sql = %self.source, "run");
        {
            let mut rows = self.stmt.raw_query();
            if rows.next()?.is_some() {
                self.visits.set(self.visits.get() + 1);
            }
            // Dropping the cursor resets the statement.
        }
        Ok(RunResult {
            changes: self.db.changes(),
            last_insert_rowid: self.db.last_insert_rowid(),
        })
    }

    /// Execute and materialize the first row, if any.
    ///
    /// Absence is `None`, never an error.
    ///
    /// # Errors
    ///
    /// Usage and binding errors before any engine step; engine failures
    /// during the first step.
    pub fn get(&mut self, params: &Params) -> Result<Option<Row>, SqliteExecError> {
        self.require_reader("get")?;
        self.apply_params(params)?;
        self.runs.set(self.runs.get() + 1);
        let columns = Arc::clone(self.column_set());
        let safe_integers = self.safe_integers.get();
        let mut rows = self.stmt.raw_query();
        match rows.next()? {
            Some(engine_row) => {
                self.visits.set(self.visits.get() + 1);
                Ok(Some(rows::materialize(engine_row, &columns, safe_integers)?))
            }
            None => Ok(None),
        }
    }

    /// Execute and materialize every row eagerly.
    ///
    /// The cursor is driven to exhaustion internally; if the engine fails at
    /// row N, the rows materialized so far are discarded and the error
    /// propagates — there are no partial results.
    ///
    /// # Errors
    ///
    /// Usage and binding errors before any engine step; engine failures
    /// during any step.
    pub fn all(&mut self, params: &Params) -> Result<Vec<Row>, SqliteExecError> {
        self.require_reader("all")?;
        self.apply_params(params)?;
        self.runs.set(self.runs.get() + 1);
        let columns = Arc::clone(self.column_set());
        let safe_integers = self.safe_integers.get();
        let mut out = Vec::new();
        let mut rows = self.stmt.raw_query();
        while let Some(engine_row) = rows.next()? {
            self.visits.set(self.visits.get() + 1);
            out.push(rows::materialize(engine_row, &columns, safe_integers)?);
        }
        Ok(out)
    }

    /// Open an eager per-row cursor.
    ///
    /// Each `next()` advances the engine exactly one step and returns an
    /// owned row. The cursor is fresh per call and not restartable; dropping
    /// it before exhaustion releases it deterministically.
    ///
    /// # Errors
    ///
    /// Usage and binding errors before the cursor opens.
    pub fn iterate(&mut self, params: &Params) -> Result<RowIter<'_>, SqliteExecError> {
        self.require_reader("iterate")?;
        self.apply_params(params)?;
        self.runs.set(self.runs.get() + 1);
        let columns = Arc::clone(self.column_set());
        let safe_integers = self.safe_integers.get();
        tracing::trace!(sql = %self.source, "iterate: cursor opened");
        let rows = self.stmt.raw_query();
        Ok(RowIter::new(rows, columns, safe_integers, &self.visits))
    }

    /// Open a lazy-column cursor.
    ///
    /// See [`LazyColumnIter`] for the reuse, memoization, and invalidation
    /// contract.
    ///
    /// # Errors
    ///
    /// Usage and binding errors before the cursor opens.
    pub fn iterate_with_lazy_columns(
        &mut self,
        params: &Params,
    ) -> Result<LazyColumnIter<'_>, SqliteExecError> {
        self.require_reader("iterate_with_lazy_columns")?;
        self.apply_params(params)?;
        self.runs.set(self.runs.get() + 1);
        let columns = Arc::clone(self.column_set());
        let safe_integers = self.safe_integers.get();
        tracing::trace!(sql = %self.source, "lazy cursor opened");
        let rows = self.stmt.raw_query();
        Ok(LazyColumnIter::new(
            rows,
            columns,
            safe_integers,
            &self.visits,
        ))
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("source", &self.source)
            .field("reader", &self.reader)
            .field("safe_integers", &self.safe_integers.get())
            .finish()
    }
}
