use std::collections::HashMap;
use std::sync::Arc;

use crate::conversion::FromSqlValue;
use crate::error::SqlFluentError;
use crate::types::SqlValue;

/// Column layout shared by every row of one result set.
#[derive(Debug)]
pub(crate) struct Columns {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Columns {
    pub(crate) fn new(names: Vec<String>) -> Arc<Self> {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Arc::new(Self { names, index })
    }

    fn position(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.index.get(column_name) {
            return Some(idx);
        }
        // SQL Server and SQLite both treat column names case-insensitively
        self.names
            .iter()
            .position(|col| col.eq_ignore_ascii_case(column_name))
    }
}

/// The row the cursor is positioned on.
///
/// Mappers receive a `&Row` and read fields by name through [`Row::get`], the
/// null-coalescing reader: a SQL `NULL` comes back as the requested type's zero value
/// (or `None` for `Option<T>`) instead of an error.
///
/// ```rust
/// use sql_fluent::prelude::*;
///
/// let row = Row::from_pairs([("ProductId", SqlValue::Int(7)), ("Weight", SqlValue::Null)]);
/// let id: i64 = row.get("ProductId")?;
/// let weight: Option<f64> = row.get("Weight")?;
/// let weight_or_zero: f64 = row.get("Weight")?;
/// assert_eq!((id, weight, weight_or_zero), (7, None, 0.0));
/// # Ok::<(), SqlFluentError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Columns>,
    values: Vec<SqlValue>,
}

impl Row {
    pub(crate) fn new(columns: Arc<Columns>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Build a standalone row, mostly useful for exercising mappers in tests.
    pub fn from_pairs<N, I>(pairs: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, SqlValue)>,
    {
        let (names, values): (Vec<String>, Vec<SqlValue>) = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .unzip();
        Self::new(Columns::new(names), values)
    }

    /// Read a column by name, coalescing SQL `NULL` to `T`'s null value.
    ///
    /// # Errors
    /// Returns [`SqlFluentError::ColumnNotFound`] when no column has that name and
    /// [`SqlFluentError::TypeMismatch`] when the stored value cannot be read as `T`.
    pub fn get<T: FromSqlValue>(&self, column_name: &str) -> Result<T, SqlFluentError> {
        let value = self
            .value(column_name)
            .ok_or_else(|| SqlFluentError::ColumnNotFound(column_name.to_owned()))?;
        read(column_name, value)
    }

    /// Read a column by position, with the same coalescing rules as [`Row::get`].
    ///
    /// # Errors
    /// Returns [`SqlFluentError::ColumnNotFound`] when `index` is out of bounds and
    /// [`SqlFluentError::TypeMismatch`] when the value cannot be read as `T`.
    pub fn get_by_index<T: FromSqlValue>(&self, index: usize) -> Result<T, SqlFluentError> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| SqlFluentError::ColumnNotFound(format!("#{index}")))?;
        let name = self
            .columns
            .names
            .get(index)
            .map_or("", String::as_str);
        read(name, value)
    }

    /// Raw access to a column's stored value.
    #[must_use]
    pub fn value(&self, column_name: &str) -> Option<&SqlValue> {
        self.columns
            .position(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns.names
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

fn read<T: FromSqlValue>(column_name: &str, value: &SqlValue) -> Result<T, SqlFluentError> {
    if value.is_null() {
        return Ok(T::null_value());
    }
    T::from_sql_value(value).ok_or_else(|| SqlFluentError::TypeMismatch {
        column: column_name.to_owned(),
        expected: T::TYPE_NAME,
        found: value.kind(),
    })
}
