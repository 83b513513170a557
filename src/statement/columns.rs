use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

/// Metadata for one result column.
///
/// `name` is the name the engine reports for the column — the alias when the
/// SELECT list aliases it, the expression text otherwise. The origin fields
/// are `None` for expressions, aliases of computed values, and on engine
/// builds that do not expose origin metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    /// Result-set column name (alias-aware).
    pub name: String,
    /// Declared type from the table definition, when known.
    #[serde(rename = "type")]
    pub decl_type: Option<String>,
    /// Origin table, when the column is a direct table reference.
    pub table: Option<String>,
    /// Origin database, when the column is a direct table reference.
    pub database: Option<String>,
    /// Origin column name, when the column is a direct table reference.
    pub column: Option<String>,
}

/// Column metadata shared by every row a statement produces.
///
/// Built once per statement: descriptors in result order plus a
/// case-sensitive name→index table. A duplicated column name resolves to its
/// last occurrence.
#[derive(Debug)]
pub(crate) struct ColumnSet {
    descriptors: Vec<ColumnDescriptor>,
    by_name: HashMap<String, usize>,
}

impl ColumnSet {
    pub(crate) fn from_statement(stmt: &rusqlite::Statement<'_>) -> Arc<ColumnSet> {
        let descriptors: Vec<ColumnDescriptor> = stmt
            .columns()
            .iter()
            .map(|col| ColumnDescriptor {
                name: col.name().to_owned(),
                decl_type: col.decl_type().map(ToOwned::to_owned),
                table: None,
                database: None,
                column: None,
            })
            .collect();

        let by_name = descriptors
            .iter()
            .enumerate()
            .map(|(i, desc)| (desc.name.clone(), i))
            .collect::<HashMap<_, _>>();

        Arc::new(ColumnSet {
            descriptors,
            by_name,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub(crate) fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.descriptors
    }

    pub(crate) fn name(&self, index: usize) -> Option<&str> {
        self.descriptors.get(index).map(|d| d.name.as_str())
    }

    /// Case-sensitive lookup; the last duplicate wins.
    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}
