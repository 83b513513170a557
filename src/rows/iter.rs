use std::cell::Cell;
use std::sync::Arc;

use crate::error::SqliteExecError;
use crate::statement::ColumnSet;

use super::row::{self, Row};

/// Eager per-row cursor: each step advances the engine once and hands back a
/// fully materialized, owned [`Row`].
///
/// The iterator holds the statement's cursor for its lifetime; dropping it —
/// whether after exhaustion, on `break`, or while unwinding an error — resets
/// the engine statement, so early termination is the cancellation path. A
/// step failure closes the cursor, yields the error once, and the iterator is
/// exhausted from then on.
pub struct RowIter<'stmt> {
    rows: Option<rusqlite::Rows<'stmt>>,
    columns: Arc<ColumnSet>,
    safe_integers: bool,
    visits: &'stmt Cell<u64>,
}

impl<'stmt> RowIter<'stmt> {
    pub(crate) fn new(
        rows: rusqlite::Rows<'stmt>,
        columns: Arc<ColumnSet>,
        safe_integers: bool,
        visits: &'stmt Cell<u64>,
    ) -> Self {
        Self {
            rows: Some(rows),
            columns,
            safe_integers,
            visits,
        }
    }

    fn close(&mut self) {
        // Dropping the engine cursor resets the statement.
        self.rows = None;
    }
}

impl Iterator for RowIter<'_> {
    type Item = Result<Row, SqliteExecError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rows = self.rows.as_mut()?;
        match rows.next() {
            Ok(Some(engine_row)) => {
                let materialized = row::materialize(engine_row, &self.columns, self.safe_integers);
                if materialized.is_ok() {
                    self.visits.set(self.visits.get() + 1);
                } else {
                    self.close();
                }
                Some(materialized)
            }
            Ok(None) => {
                self.close();
                None
            }
            Err(e) => {
                self.close();
                Some(Err(e.into()))
            }
        }
    }
}
