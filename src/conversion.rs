use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::types::SqlValue;

/// Reads a typed value out of a [`SqlValue`].
///
/// `null_value` is what the null-coalescing reader hands back when the stored value is the
/// SQL null marker: the type's zero value, or `None` for `Option<T>`.
pub trait FromSqlValue: Sized {
    /// Name used in [`TypeMismatch`](crate::SqlFluentError::TypeMismatch) errors.
    const TYPE_NAME: &'static str;

    /// Convert a non-null value, or `None` when the value cannot be read as `Self`.
    fn from_sql_value(value: &SqlValue) -> Option<Self>;

    /// Value returned for the SQL null marker.
    fn null_value() -> Self;
}

macro_rules! int_from_sql_value {
    ($($ty:ty),*) => {
        $(
            impl FromSqlValue for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn from_sql_value(value: &SqlValue) -> Option<Self> {
                    value.as_int().and_then(|v| <$ty>::try_from(v).ok())
                }

                fn null_value() -> Self {
                    0
                }
            }
        )*
    };
}

int_from_sql_value!(i64, i32, i16, i8, u8, u16, u32, u64, usize);

impl FromSqlValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_float()
    }

    fn null_value() -> Self {
        0.0
    }
}

impl FromSqlValue for f32 {
    const TYPE_NAME: &'static str = "f32";

    #[allow(clippy::cast_possible_truncation)]
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_float().map(|v| v as f32)
    }

    fn null_value() -> Self {
        0.0
    }
}

impl FromSqlValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_bool()
    }

    fn null_value() -> Self {
        false
    }
}

impl FromSqlValue for String {
    const TYPE_NAME: &'static str = "String";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Json(json) => Some(json.to_string()),
            _ => None,
        }
    }

    fn null_value() -> Self {
        String::new()
    }
}

impl FromSqlValue for Vec<u8> {
    const TYPE_NAME: &'static str = "Vec<u8>";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_blob().map(<[u8]>::to_vec)
    }

    fn null_value() -> Self {
        Vec::new()
    }
}

impl FromSqlValue for NaiveDateTime {
    const TYPE_NAME: &'static str = "NaiveDateTime";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_timestamp()
    }

    fn null_value() -> Self {
        NaiveDateTime::default()
    }
}

impl FromSqlValue for NaiveDate {
    const TYPE_NAME: &'static str = "NaiveDate";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        value.as_date()
    }

    fn null_value() -> Self {
        NaiveDate::default()
    }
}

impl FromSqlValue for JsonValue {
    const TYPE_NAME: &'static str = "serde_json::Value";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Json(json) => Some(json.clone()),
            SqlValue::Text(s) => serde_json::from_str(s).ok(),
            _ => None,
        }
    }

    fn null_value() -> Self {
        JsonValue::Null
    }
}

impl FromSqlValue for SqlValue {
    const TYPE_NAME: &'static str = "SqlValue";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        Some(value.clone())
    }

    fn null_value() -> Self {
        SqlValue::Null
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        T::from_sql_value(value).map(Some)
    }

    fn null_value() -> Self {
        None
    }
}
