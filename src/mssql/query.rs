use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tiberius::{ColumnData, FromSql};

use crate::error::SqlFluentError;
use crate::results::{Columns, Row};
use crate::types::SqlValue;

/// Convert one tiberius column value into a `SqlValue`.
pub(crate) fn extract_value(data: ColumnData<'static>) -> Result<SqlValue, SqlFluentError> {
    let value = match data {
        ColumnData::U8(v) => v.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))),
        ColumnData::I16(v) => v.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))),
        ColumnData::I32(v) => v.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))),
        ColumnData::I64(v) => v.map_or(SqlValue::Null, SqlValue::Int),
        ColumnData::F32(v) => v.map_or(SqlValue::Null, |v| SqlValue::Float(f64::from(v))),
        ColumnData::F64(v) => v.map_or(SqlValue::Null, SqlValue::Float),
        ColumnData::Bit(v) => v.map_or(SqlValue::Null, SqlValue::Bool),
        ColumnData::String(v) => v.map_or(SqlValue::Null, |s| SqlValue::Text(s.into_owned())),
        ColumnData::Guid(v) => v.map_or(SqlValue::Null, |g| SqlValue::Text(g.to_string())),
        ColumnData::Binary(v) => v.map_or(SqlValue::Null, |b| SqlValue::Blob(b.into_owned())),
        ColumnData::Numeric(v) => v.map_or(SqlValue::Null, |n| SqlValue::Float(f64::from(n))),
        ColumnData::Xml(v) => v.map_or(SqlValue::Null, |x| {
            SqlValue::Text(x.into_owned().into_string())
        }),
        temporal @ (ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)) => {
            NaiveDateTime::from_sql(&temporal)?.map_or(SqlValue::Null, SqlValue::Timestamp)
        }
        temporal @ ColumnData::DateTimeOffset(_) => DateTime::<Utc>::from_sql(&temporal)?
            .map_or(SqlValue::Null, |dt| SqlValue::Timestamp(dt.naive_utc())),
        temporal @ ColumnData::Date(_) => {
            NaiveDate::from_sql(&temporal)?.map_or(SqlValue::Null, SqlValue::Date)
        }
        temporal @ ColumnData::Time(_) => NaiveTime::from_sql(&temporal)?
            .map_or(SqlValue::Null, |t| SqlValue::Text(t.to_string())),
    };
    Ok(value)
}

/// Convert a tiberius row into a [`Row`] sharing `columns`.
pub(crate) fn build_row(row: tiberius::Row, columns: &Arc<Columns>) -> Result<Row, SqlFluentError> {
    let values = row
        .into_iter()
        .map(extract_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Row::new(Arc::clone(columns), values))
}
