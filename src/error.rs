use thiserror::Error;

/// Every failure an execution can surface.
///
/// Driver errors pass through untouched (`#[error(transparent)]`); the remaining variants
/// cover configuration, the worker channel, and the row reader used by mappers.
#[derive(Debug, Error)]
pub enum SqlFluentError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unsupported by this backend: {0}")]
    Unsupported(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column {column} holds {found}, which cannot be read as {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Raised by caller-supplied row mappers.
    #[error("Mapping error: {0}")]
    Mapping(String),
}

impl SqlFluentError {
    /// Convenience for mappers that need to reject a row.
    pub fn mapping(message: impl Into<String>) -> Self {
        SqlFluentError::Mapping(message.into())
    }
}
