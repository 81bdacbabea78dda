use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

/// Values that can be stored in a database row or bound as command parameters.
///
/// Every backend converts into and out of this enum, so mappers and parameter lists never
/// touch driver types:
/// ```rust
/// use sql_fluent::prelude::*;
///
/// let values = vec![
///     SqlValue::Int(800),
///     SqlValue::Text("black".into()),
///     SqlValue::Null,
/// ];
/// # let _ = values;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// Calendar date
    Date(NaiveDate),
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
    /// The SQL null marker
    Null,
}

impl SqlValue {
    /// Check if this value is the SQL null marker
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, used in mismatch errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Bool(_) => "bool",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Date(_) => "date",
            SqlValue::Json(_) => "json",
            SqlValue::Blob(_) => "blob",
            SqlValue::Null => "null",
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(value) => Some(*value),
            SqlValue::Bool(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(value) => Some(*value),
            SqlValue::Int(1) => Some(true),
            SqlValue::Int(0) => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SqlValue::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Timestamps come back from SQLite as text, so accept the common layouts.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::Timestamp(value) => Some(*value),
            SqlValue::Date(value) => value.and_hms_opt(0, 0, 0),
            SqlValue::Text(s) => {
                // "YYYY-MM-DD HH:MM:SS" with optional fraction, or the ISO 'T' separator
                ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SqlValue::Date(value) => Some(*value),
            SqlValue::Timestamp(value) => Some(value.date()),
            SqlValue::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| self.as_timestamp().map(|ts| ts.date())),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Blob(bytes) => Some(bytes),
            SqlValue::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(value: JsonValue) -> Self {
        SqlValue::Json(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Declared database type of a parameter.
///
/// Mirrors the SQL Server type names; SQLite only looks at the value's storage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Bit,
    Real,
    Float,
    Decimal,
    Money,
    Char,
    VarChar,
    NChar,
    NVarChar,
    Text,
    NText,
    Binary,
    VarBinary,
    Date,
    Time,
    DateTime,
    DateTime2,
    UniqueIdentifier,
    Xml,
}

impl DbType {
    /// Types whose length is declared by the parameter `size`.
    #[must_use]
    pub fn is_variable_length(self) -> bool {
        matches!(
            self,
            DbType::Char
                | DbType::VarChar
                | DbType::NChar
                | DbType::NVarChar
                | DbType::Text
                | DbType::NText
                | DbType::Binary
                | DbType::VarBinary
        )
    }
}

/// How a parameter travels between caller and server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

impl Direction {
    /// Whether the value is sent with the command.
    #[must_use]
    pub fn sends_value(self) -> bool {
        matches!(self, Direction::Input | Direction::InputOutput)
    }

    /// Whether the server reports a value back after execution.
    #[must_use]
    pub fn reads_back(self) -> bool {
        !matches!(self, Direction::Input)
    }
}

/// Whether the command text is ad-hoc SQL or the name of a stored procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandKind {
    #[default]
    Text,
    StoredProcedure,
}
