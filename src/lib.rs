//! Synchronous statement-execution layer for embedded SQLite: parameter
//! binding, three row-delivery strategies over one cursor, typed value
//! marshalling with a safe-integer mode, and nested transactions.

mod binder;
mod database;
mod error;
mod marshal;
mod rows;
mod statement;
mod transaction;
mod value;

pub mod prelude;

pub use binder::{Params, PlaceholderStyle};
pub use database::{Database, OpenOptions};
pub use error::SqliteExecError;
pub use rows::{LazyColumnIter, LazyRow, Row, RowIter};
pub use statement::{
    ColumnDescriptor, RunResult, SCANSTAT_COMPLEX, ScanStatusMetric, ScanStatusValue, Statement,
};
pub use transaction::{Transaction, TransactionMode};
pub use value::Value;
