//! Result materialization: the three row-delivery strategies share one
//! underlying engine cursor but hand back different shapes — owned batches,
//! owned per-step rows, or a reusable zero-copy row view.

mod iter;
mod lazy;
mod row;

pub use iter::RowIter;
pub use lazy::{LazyColumnIter, LazyRow};
pub use row::Row;
pub(crate) use row::materialize;
