//! In-process scripted database for exercising the fluent API without a server.
//!
//! A script is installed under a name and addressed with the connection string
//! `scripted:<name>`. Each execution records its command, hands out the canned result
//! sets row by row, and reports the scripted output values when it finishes.
//!
//! ```
//! use sql_fluent::prelude::*;
//! use sql_fluent::test_utils::{self, Script, ScriptedResultSet};
//!
//! test_utils::install(
//!     "doc-users",
//!     Script::new().result_set(
//!         ScriptedResultSet::new(&["id", "name"])
//!             .row(vec![SqlValue::Int(1), SqlValue::Text("ada".into())]),
//!     ),
//! );
//!
//! let names: Vec<String> = SqlFluent::new("scripted:doc-users")
//!     .query("SELECT id, name FROM users")
//!     .execute_many(|row| row.get("name"))?;
//! assert_eq!(names, vec!["ada".to_string()]);
//! # Ok::<(), SqlFluentError>(())
//! ```

mod scripted;

pub use scripted::{
    Script, ScriptedResultSet, executed_commands, install, open_connections, rows_fetched,
    wait_for_release,
};

pub(crate) use scripted::spawn_worker;
