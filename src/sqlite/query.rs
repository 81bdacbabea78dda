use std::sync::Arc;

use rusqlite::types::ValueRef;

use crate::error::SqlFluentError;
use crate::results::{Columns, Row};
use crate::types::SqlValue;

/// Extract a `SqlValue` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlFluentError` if the value cannot be read.
pub(crate) fn extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<SqlValue, SqlFluentError> {
    let value = match row.get_ref(idx)? {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Int(i),
        ValueRef::Real(f) => SqlValue::Float(f),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    };
    Ok(value)
}

/// Convert the current rusqlite row into a [`Row`] sharing `columns`.
pub(crate) fn build_row(row: &rusqlite::Row<'_>, columns: &Arc<Columns>, width: usize) -> Result<Row, SqlFluentError> {
    let mut values = Vec::with_capacity(width);
    for i in 0..width {
        values.push(extract_value(row, i)?);
    }
    Ok(Row::new(Arc::clone(columns), values))
}
