mod multi;
mod row;

pub use multi::MultiResults;
pub(crate) use multi::{RowSink, TypedSink};
pub(crate) use row::Columns;
pub use row::Row;
