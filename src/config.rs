#[cfg(feature = "sqlite")]
use serde::Deserialize;

use crate::error::SqlFluentError;

/// Where a command runs, resolved from a connection string.
///
/// | connection string            | target                          |
/// |------------------------------|---------------------------------|
/// | `sqlite:<path>`, `sqlite://<path>`, `:memory:`, bare path | SQLite file |
/// | `mssql://<ado string>`, any string containing `=`          | SQL Server  |
/// | `scripted:<name>` (feature `test-utils`)                   | scripted    |
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ConnectionTarget {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteOptions),
    #[cfg(feature = "mssql")]
    Mssql(MssqlOptions),
    #[cfg(feature = "test-utils")]
    Scripted(String),
}

impl ConnectionTarget {
    /// Parse a connection string.
    ///
    /// # Errors
    /// Returns [`SqlFluentError::ConfigError`] when the string names a backend this build
    /// was compiled without, or when an ADO string is malformed.
    pub fn parse(connection_string: &str) -> Result<Self, SqlFluentError> {
        let trimmed = connection_string.trim();
        if trimmed.is_empty() {
            return Err(SqlFluentError::ConfigError(
                "connection string is empty".into(),
            ));
        }

        if let Some(name) = trimmed.strip_prefix("scripted:") {
            return scripted_target(name);
        }

        if let Some(ado) = trimmed.strip_prefix("mssql://") {
            return mssql_target(ado);
        }

        if let Some(path) = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
        {
            return sqlite_target(path);
        }

        if trimmed.contains('=') {
            return mssql_target(trimmed);
        }

        sqlite_target(trimmed)
    }

    /// Short backend label for logs.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            ConnectionTarget::Sqlite(_) => "sqlite",
            #[cfg(feature = "mssql")]
            ConnectionTarget::Mssql(_) => "mssql",
            #[cfg(feature = "test-utils")]
            ConnectionTarget::Scripted(_) => "scripted",
            #[allow(unreachable_patterns)]
            _ => "none",
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<SqliteOptions> for ConnectionTarget {
    fn from(opts: SqliteOptions) -> Self {
        ConnectionTarget::Sqlite(opts)
    }
}

#[cfg(feature = "mssql")]
impl From<MssqlOptions> for ConnectionTarget {
    fn from(opts: MssqlOptions) -> Self {
        ConnectionTarget::Mssql(opts)
    }
}

#[cfg(feature = "sqlite")]
#[allow(clippy::unnecessary_wraps)]
fn sqlite_target(path: &str) -> Result<ConnectionTarget, SqlFluentError> {
    Ok(ConnectionTarget::Sqlite(SqliteOptions::new(path.to_owned())))
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_target(path: &str) -> Result<ConnectionTarget, SqlFluentError> {
    Err(SqlFluentError::ConfigError(format!(
        "`{path}` looks like a SQLite database but the `sqlite` feature is disabled"
    )))
}

#[cfg(feature = "mssql")]
fn mssql_target(ado: &str) -> Result<ConnectionTarget, SqlFluentError> {
    MssqlOptions::from_ado_string(ado).map(ConnectionTarget::Mssql)
}

#[cfg(not(feature = "mssql"))]
fn mssql_target(_ado: &str) -> Result<ConnectionTarget, SqlFluentError> {
    Err(SqlFluentError::ConfigError(
        "SQL Server connection strings need the `mssql` feature".into(),
    ))
}

#[cfg(feature = "test-utils")]
#[allow(clippy::unnecessary_wraps)]
fn scripted_target(name: &str) -> Result<ConnectionTarget, SqlFluentError> {
    Ok(ConnectionTarget::Scripted(name.to_owned()))
}

#[cfg(not(feature = "test-utils"))]
fn scripted_target(_name: &str) -> Result<ConnectionTarget, SqlFluentError> {
    Err(SqlFluentError::ConfigError(
        "scripted connections need the `test-utils` feature".into(),
    ))
}

/// Options for opening a `SQLite` database.
#[cfg(feature = "sqlite")]
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteOptions {
    pub db_path: String,
    /// Milliseconds to wait on a locked database before failing.
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
}

#[cfg(feature = "sqlite")]
impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            busy_timeout_ms: None,
        }
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, millis: u64) -> Self {
        self.busy_timeout_ms = Some(millis);
        self
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.db_path == ":memory:"
    }
}

/// Options for connecting to SQL Server.
#[cfg(feature = "mssql")]
#[derive(Debug, Clone)]
pub struct MssqlOptions {
    pub(crate) config: tiberius::Config,
}

#[cfg(feature = "mssql")]
impl MssqlOptions {
    /// Parse an ADO.NET style string (`Server=tcp:host,1433;Database=...;User Id=...;Password=...`).
    ///
    /// # Errors
    /// Returns [`SqlFluentError::ConfigError`] if tiberius rejects the string.
    pub fn from_ado_string(ado: &str) -> Result<Self, SqlFluentError> {
        let config = tiberius::Config::from_ado_string(ado)
            .map_err(|e| SqlFluentError::ConfigError(format!("invalid ADO string: {e}")))?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn builder(server: String, database: String, user: String, password: String) -> MssqlOptionsBuilder {
        MssqlOptionsBuilder {
            server,
            database,
            user,
            password,
            port: None,
            instance_name: None,
        }
    }
}

/// Fluent builder for MSSQL options.
#[cfg(feature = "mssql")]
#[derive(Debug, Clone)]
pub struct MssqlOptionsBuilder {
    server: String,
    database: String,
    user: String,
    password: String,
    port: Option<u16>,
    instance_name: Option<String>,
}

#[cfg(feature = "mssql")]
impl MssqlOptionsBuilder {
    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn instance_name(mut self, instance_name: Option<String>) -> Self {
        self.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn finish(self) -> MssqlOptions {
        let mut config = tiberius::Config::new();
        config.host(&self.server);
        config.database(&self.database);
        config.port(self.port.unwrap_or(1433));
        config.authentication(tiberius::AuthMethod::sql_server(&self.user, &self.password));
        if let Some(instance) = &self.instance_name {
            config.instance_name(instance);
        }
        config.trust_cert();
        MssqlOptions { config }
    }
}
