//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types to make it easier to
//! get started with the library.

pub use crate::{
    ColumnDescriptor, Database, LazyColumnIter, LazyRow, OpenOptions, Params, Row, RowIter,
    RunResult, SCANSTAT_COMPLEX, ScanStatusMetric, ScanStatusValue, SqliteExecError, Statement,
    Transaction, TransactionMode, Value,
};
