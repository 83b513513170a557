use std::sync::Arc;

use crate::statement::ColumnSet;
use crate::value::Value;

/// A fully materialized result row.
///
/// Column metadata is shared across all rows of a result set; the values are
/// owned by this row and remain valid after the cursor advances or closes.
#[derive(Debug, Clone)]
pub struct Row {
    pub(crate) columns: Arc<ColumnSet>,
    pub(crate) values: Vec<Value>,
}

impl Row {
    /// Get a value by column index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name (case-sensitive; aliases resolve to the
    /// alias name).
    #[must_use]
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Number of columns in the row.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.values.len()
    }

    /// Column name at `index`.
    #[must_use]
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.name(index)
    }

    /// The row's values in column order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the row, keeping only its values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Copy every column of the engine's current row into an owned [`Row`].
pub(crate) fn materialize(
    engine_row: &rusqlite::Row<'_>,
    columns: &Arc<ColumnSet>,
    safe_integers: bool,
) -> Result<Row, crate::error::SqliteExecError> {
    let mut values = Vec::with_capacity(columns.len());
    for i in 0..columns.len() {
        values.push(crate::marshal::from_engine(
            engine_row.get_ref(i)?,
            safe_integers,
        )?);
    }
    Ok(Row {
        columns: Arc::clone(columns),
        values,
    })
}
