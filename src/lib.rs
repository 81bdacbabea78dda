//! Fluent command building and result mapping over `SQLite` and SQL Server.
//!
//! A chain starts at [`SqlFluent`], picks a command, binds parameters and ends in one of
//! the result assemblers: a single object, a sequence (eager or lazy), a scalar, nothing,
//! parents with correlated children ([`Cascade`]) or several named result sets
//! ([`Multi`]). Each execution owns one connection and releases it on every exit path.
//!
//! ```no_run
//! use sql_fluent::prelude::*;
//!
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! let users = SqlFluent::new("sqlite:app.db")
//!     .query("SELECT id, name FROM users WHERE name LIKE @pattern")
//!     .parameters()
//!     .parameter(Param::input("@pattern", DbType::NVarChar, "a%"))
//!     .end()
//!     .execute_many(|row| {
//!         Ok(User {
//!             id: row.get("id")?,
//!             name: row.get("name")?,
//!         })
//!     })?;
//! # let _ = users;
//! # Ok::<(), SqlFluentError>(())
//! ```

pub mod command;
pub mod config;
pub mod conversion;
pub mod error;
pub mod fluent;
pub mod prelude;
pub mod results;
pub mod types;

mod executor;
mod session;

#[cfg(feature = "mssql")]
mod mssql;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use command::{CommandDescriptor, Param, ParameterSet};
pub use config::ConnectionTarget;
#[cfg(feature = "mssql")]
pub use config::{MssqlOptions, MssqlOptionsBuilder};
#[cfg(feature = "sqlite")]
pub use config::SqliteOptions;
pub use conversion::FromSqlValue;
pub use error::SqlFluentError;
pub use fluent::{
    Blocking, Cascade, CascadeLevels, CascadeReady, CascadeSelected, Command, Discipline,
    LazyRows, Multi, NoLevels, Parameters, SqlFluent, Suspending, WithLevels,
};
pub use results::{MultiResults, Row};
pub use types::{CommandKind, DbType, Direction, SqlValue};
