use chrono::{NaiveDate, NaiveDateTime};
use tiberius::Query;

use crate::types::{DbType, SqlValue};

/// Bind a value to the next positional slot of the query.
///
/// `NULL` is bound with a type matching the declared [`DbType`] so SQL Server can assign it
/// to the typed local variable without an implicit conversion error.
pub(crate) fn bind_value(query: &mut Query<'_>, db_type: DbType, value: SqlValue) {
    match value {
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Timestamp(dt) => query.bind(dt),
        SqlValue::Date(d) => query.bind(d),
        SqlValue::Json(json) => query.bind(json.to_string()),
        SqlValue::Blob(bytes) => query.bind(bytes),
        SqlValue::Null => bind_null(query, db_type),
    }
}

fn bind_null(query: &mut Query<'_>, db_type: DbType) {
    match db_type {
        DbType::TinyInt | DbType::SmallInt | DbType::Int | DbType::BigInt => {
            query.bind(Option::<i64>::None);
        }
        DbType::Bit => query.bind(Option::<bool>::None),
        DbType::Real | DbType::Float | DbType::Decimal | DbType::Money => {
            query.bind(Option::<f64>::None);
        }
        DbType::Binary | DbType::VarBinary => query.bind(Option::<Vec<u8>>::None),
        DbType::DateTime | DbType::DateTime2 => query.bind(Option::<NaiveDateTime>::None),
        DbType::Date => query.bind(Option::<NaiveDate>::None),
        DbType::Char
        | DbType::VarChar
        | DbType::NChar
        | DbType::NVarChar
        | DbType::Text
        | DbType::NText
        | DbType::Time
        | DbType::UniqueIdentifier
        | DbType::Xml => query.bind(Option::<String>::None),
    }
}
