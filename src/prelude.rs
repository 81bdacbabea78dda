//! Convenient imports for common functionality.
//!
//! ```
//! use sql_fluent::prelude::*;
//! ```

pub use crate::command::{Param, ParameterSet};
pub use crate::config::ConnectionTarget;
pub use crate::conversion::FromSqlValue;
pub use crate::error::SqlFluentError;
pub use crate::fluent::{Blocking, Command, LazyRows, Parameters, SqlFluent, Suspending};
pub use crate::results::{MultiResults, Row};
pub use crate::types::{CommandKind, DbType, Direction, SqlValue};

#[cfg(feature = "mssql")]
pub use crate::config::MssqlOptions;
#[cfg(feature = "sqlite")]
pub use crate::config::SqliteOptions;
