use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use fallible_streaming_iterator::FallibleStreamingIterator;

use crate::error::SqliteExecError;
use crate::marshal;
use crate::statement::ColumnSet;
use crate::value::Value;

/// Sentinel generation that no real row can carry. Real generations start at
/// 1 and only count up; forcing the cursor here on close invalidates every
/// cached value at once.
const STALE_GENERATION: u64 = u64::MAX;

struct CursorState<'stmt> {
    /// `None` once the cursor is closed; dropping the engine cursor resets
    /// the statement.
    rows: Option<rusqlite::Rows<'stmt>>,
    /// Bumped on every successful step.
    generation: u64,
    alive: bool,
}

struct RowCache {
    generation: u64,
    values: Vec<Option<Value>>,
}

/// Lazy-column cursor: the performance-critical delivery strategy.
///
/// One [`LazyRow`] view is constructed on the first successful step and
/// reused for every row; advancing only moves the engine cursor and bumps the
/// generation counter — no per-row allocation. Column values are marshalled
/// on first access and memoized for the current generation.
///
/// Exhaustion, an explicit [`close`](LazyColumnIter::close), and dropping the
/// cursor mid-iteration (`break`, early return, a propagated error) all
/// release the engine cursor exactly once and invalidate the row view, so a
/// retained view fails with [`SqliteExecError::StaleRow`] instead of reading
/// stale data.
pub struct LazyColumnIter<'stmt> {
    state: Rc<RefCell<CursorState<'stmt>>>,
    row: Option<LazyRow<'stmt>>,
    columns: Arc<ColumnSet>,
    safe_integers: bool,
    visits: &'stmt Cell<u64>,
}

enum StepOutcome {
    Row,
    Done,
    Failed(rusqlite::Error),
}

impl<'stmt> LazyColumnIter<'stmt> {
    pub(crate) fn new(
        rows: rusqlite::Rows<'stmt>,
        columns: Arc<ColumnSet>,
        safe_integers: bool,
        visits: &'stmt Cell<u64>,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(CursorState {
                rows: Some(rows),
                generation: 0,
                alive: true,
            })),
            row: None,
            columns,
            safe_integers,
            visits,
        }
    }

    /// Advance the engine one step.
    ///
    /// Returns the reusable row view while a row is available, `None` once
    /// the cursor is exhausted or closed. Calling `next` after exhaustion
    /// keeps returning `None`.
    ///
    /// # Errors
    ///
    /// A mid-step engine failure closes the cursor, invalidates the row view,
    /// and surfaces as [`SqliteExecError::Sqlite`]; subsequent calls return
    /// `None`.
    pub fn next(&mut self) -> Result<Option<&LazyRow<'stmt>>, SqliteExecError> {
        let outcome = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            if !state.alive {
                return Ok(None);
            }
            match state.rows.as_mut() {
                None => return Ok(None),
                Some(rows) => match rows.advance() {
                    Ok(()) => {
                        if rows.get().is_some() {
                            state.generation += 1;
                            StepOutcome::Row
                        } else {
                            StepOutcome::Done
                        }
                    }
                    Err(e) => StepOutcome::Failed(e),
                },
            }
        };

        match outcome {
            StepOutcome::Row => {
                self.visits.set(self.visits.get() + 1);
                if self.row.is_none() {
                    self.row = Some(LazyRow {
                        state: Rc::clone(&self.state),
                        cache: Rc::new(RefCell::new(RowCache {
                            generation: 0,
                            values: vec![None; self.columns.len()],
                        })),
                        columns: Arc::clone(&self.columns),
                        safe_integers: self.safe_integers,
                    });
                }
                Ok(self.row.as_ref())
            }
            StepOutcome::Done => {
                self.close();
                Ok(None)
            }
            StepOutcome::Failed(e) => {
                self.close();
                Err(e.into())
            }
        }
    }

    /// Close the cursor early. Idempotent: closing an already-closed cursor
    /// does nothing. Dropping the iterator has the same effect.
    pub fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.alive {
            state.alive = false;
            state.generation = STALE_GENERATION;
            state.rows = None;
            tracing::trace!("lazy cursor closed");
        }
    }
}

impl Drop for LazyColumnIter<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

/// The reusable zero-copy row view produced by [`LazyColumnIter`].
///
/// Cheap clones share the same view state: a clone retained past the
/// iteration observes the same invalidation as the view itself. Column access
/// indirects into the cursor's current row; values are memoized per
/// generation, so reading the same column twice within one row marshals once.
#[derive(Clone)]
pub struct LazyRow<'stmt> {
    state: Rc<RefCell<CursorState<'stmt>>>,
    cache: Rc<RefCell<RowCache>>,
    columns: Arc<ColumnSet>,
    safe_integers: bool,
}

impl LazyRow<'_> {
    /// Read the column at `index` from the current row.
    ///
    /// # Errors
    ///
    /// - [`SqliteExecError::StaleRow`] once the cursor has advanced past this
    ///   view's validity (closed, exhausted, or failed).
    /// - [`SqliteExecError::RangeError`] when `index` is out of bounds.
    pub fn get_by_index(&self, index: usize) -> Result<Value, SqliteExecError> {
        let state = self.state.borrow();
        if !state.alive {
            return Err(SqliteExecError::StaleRow);
        }
        if index >= self.columns.len() {
            return Err(SqliteExecError::RangeError(format!(
                "column index {index} out of range (statement has {} columns)",
                self.columns.len()
            )));
        }

        let mut cache = self.cache.borrow_mut();
        if cache.generation != state.generation {
            for slot in &mut cache.values {
                *slot = None;
            }
            cache.generation = state.generation;
        }
        if let Some(value) = &cache.values[index] {
            return Ok(value.clone());
        }

        let Some(rows) = state.rows.as_ref() else {
            return Err(SqliteExecError::StaleRow);
        };
        let Some(engine_row) = rows.get() else {
            return Err(SqliteExecError::StaleRow);
        };
        let value = marshal::from_engine(engine_row.get_ref(index)?, self.safe_integers)?;
        cache.values[index] = Some(value.clone());
        Ok(value)
    }

    /// Read a column by name (case-sensitive; aliases resolve to the alias
    /// name).
    ///
    /// # Errors
    ///
    /// [`SqliteExecError::RangeError`] for an unknown name, plus everything
    /// [`get_by_index`](LazyRow::get_by_index) can return.
    pub fn get_by_name(&self, name: &str) -> Result<Value, SqliteExecError> {
        let index = self.columns.index_of(name).ok_or_else(|| {
            SqliteExecError::RangeError(format!("no column named \"{name}\""))
        })?;
        self.get_by_index(index)
    }

    /// Number of columns. Derived from static statement metadata, so this
    /// stays available after the view is invalidated.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The generation this view currently represents. After invalidation it
    /// reports the stale sentinel, a value no real row can carry.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }
}
