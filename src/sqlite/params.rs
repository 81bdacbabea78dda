use std::fmt::Write;

use rusqlite::Statement;
use rusqlite::types::Value;

use crate::command::Param;
use crate::error::SqlFluentError;
use crate::types::SqlValue;

// Thread-local buffer for timestamp formatting
thread_local! {
    static TIMESTAMP_BUF: std::cell::RefCell<String> = std::cell::RefCell::new(String::with_capacity(32));
}

/// Convert a single `SqlValue` to a rusqlite `Value`.
#[must_use]
pub(crate) fn sql_value_to_sqlite(value: SqlValue) -> Value {
    match value {
        SqlValue::Int(i) => Value::Integer(i),
        SqlValue::Float(f) => Value::Real(f),
        SqlValue::Text(s) => Value::Text(s),
        SqlValue::Bool(b) => Value::Integer(i64::from(b)),
        SqlValue::Timestamp(dt) => TIMESTAMP_BUF.with(|buf| {
            let mut borrow = buf.borrow_mut();
            borrow.clear();
            // writing into a String cannot fail
            let _ = write!(borrow, "{}", dt.format("%F %T%.f"));
            Value::Text(borrow.clone())
        }),
        SqlValue::Date(d) => Value::Text(d.format("%F").to_string()),
        SqlValue::Json(json) => Value::Text(json.to_string()),
        SqlValue::Blob(bytes) => Value::Blob(bytes),
        SqlValue::Null => Value::Null,
    }
}

/// Bind every parameter this statement has a placeholder for.
///
/// A batch is prepared one statement at a time, so each statement only picks up the
/// parameters it mentions. Names are tried as given, then with each of `SQLite`'s sigils.
/// Parameters with no matching placeholder are skipped; `Output` and `ReturnValue`
/// parameters are never sent.
pub(crate) fn bind_parameters(stmt: &mut Statement<'_>, params: &[Param]) -> Result<(), SqlFluentError> {
    for param in params.iter().filter(|p| p.direction.sends_value()) {
        if let Some(idx) = placeholder_index(stmt, param)? {
            stmt.raw_bind_parameter(idx, sql_value_to_sqlite(param.sized_value()))?;
        }
    }
    Ok(())
}

fn placeholder_index(stmt: &Statement<'_>, param: &Param) -> Result<Option<usize>, SqlFluentError> {
    if let Some(idx) = stmt.parameter_index(&param.name)? {
        return Ok(Some(idx));
    }
    let bare = param.bare_name();
    for sigil in ['@', ':', '$'] {
        if let Some(idx) = stmt.parameter_index(&format!("{sigil}{bare}"))? {
            return Ok(Some(idx));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn converts_values() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap();
        assert_eq!(
            sql_value_to_sqlite(SqlValue::Timestamp(ts)),
            Value::Text("2024-05-17 08:30:00".into())
        );
        assert_eq!(sql_value_to_sqlite(SqlValue::Bool(true)), Value::Integer(1));
        assert_eq!(sql_value_to_sqlite(SqlValue::Null), Value::Null);
    }
}
