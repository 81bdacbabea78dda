use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::command::{CommandDescriptor, ParameterSet};
use crate::error::SqlFluentError;
use crate::results::{Columns, Row};
use crate::session::{Ready, Request, Requests, reply};
use crate::types::SqlValue;

/// One canned result set: column names and the rows to hand out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl ScriptedResultSet {
    #[must_use]
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with `Null`.
    #[must_use]
    pub fn row(mut self, mut values: Vec<SqlValue>) -> Self {
        values.resize(self.columns.len(), SqlValue::Null);
        self.rows.push(values);
        self
    }
}

/// What a scripted connection answers with.
#[derive(Debug, Clone, Default)]
pub struct Script {
    result_sets: Vec<ScriptedResultSet>,
    outputs: Vec<(String, SqlValue)>,
    fail_on_open: Option<String>,
    fail_after_rows: Option<(usize, String)>,
}

impl Script {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn result_set(mut self, set: ScriptedResultSet) -> Self {
        self.result_sets.push(set);
        self
    }

    /// Value reported for an output, input/output or return-value parameter.
    #[must_use]
    pub fn output(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.outputs.push((name.into(), value.into()));
        self
    }

    /// Refuse the connection with a [`SqlFluentError::ConnectionError`].
    #[must_use]
    pub fn fail_on_open(mut self, message: impl Into<String>) -> Self {
        self.fail_on_open = Some(message.into());
        self
    }

    /// Fail with a [`SqlFluentError::ExecutionError`] once `rows` rows have been fetched.
    #[must_use]
    pub fn fail_after_rows(mut self, rows: usize, message: impl Into<String>) -> Self {
        self.fail_after_rows = Some((rows, message.into()));
        self
    }
}

#[derive(Default)]
struct Entry {
    script: Script,
    executed: Vec<CommandDescriptor>,
    open: usize,
    fetched: usize,
}

static SCRIPTS: LazyLock<Mutex<HashMap<String, Entry>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn registry() -> MutexGuard<'static, HashMap<String, Entry>> {
    SCRIPTS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install (or replace) the script served under `name`, resetting its counters.
pub fn install(name: &str, script: Script) {
    registry().insert(
        name.to_owned(),
        Entry {
            script,
            ..Entry::default()
        },
    );
}

/// Commands executed against `name`, in execution order.
#[must_use]
pub fn executed_commands(name: &str) -> Vec<CommandDescriptor> {
    registry()
        .get(name)
        .map(|entry| entry.executed.clone())
        .unwrap_or_default()
}

/// Connections to `name` currently held by a session.
#[must_use]
pub fn open_connections(name: &str) -> usize {
    registry().get(name).map_or(0, |entry| entry.open)
}

/// Rows handed out by connections to `name` since it was installed.
#[must_use]
pub fn rows_fetched(name: &str) -> usize {
    registry().get(name).map_or(0, |entry| entry.fetched)
}

/// Wait until no session holds a connection to `name`.
///
/// Connections released by dropping a session are given back on the worker thread, so
/// observers poll for it. Returns `false` if `timeout` elapses first.
#[must_use]
pub fn wait_for_release(name: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if open_connections(name) == 0 {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

/// Held for the lifetime of one scripted connection.
struct OpenConnection {
    name: String,
}

impl OpenConnection {
    fn acquire(name: &str, command: &CommandDescriptor) -> Result<(Self, Script), SqlFluentError> {
        let mut scripts = registry();
        let entry = scripts.get_mut(name).ok_or_else(|| {
            SqlFluentError::ConfigError(format!("no script installed for scripted:{name}"))
        })?;
        if let Some(message) = &entry.script.fail_on_open {
            return Err(SqlFluentError::ConnectionError(message.clone()));
        }
        entry.executed.push(command.clone());
        entry.open += 1;
        Ok((
            Self {
                name: name.to_owned(),
            },
            entry.script.clone(),
        ))
    }

    fn count_row(&self) {
        if let Some(entry) = registry().get_mut(&self.name) {
            entry.fetched += 1;
        }
    }
}

impl Drop for OpenConnection {
    fn drop(&mut self) {
        if let Some(entry) = registry().get_mut(&self.name) {
            entry.open = entry.open.saturating_sub(1);
        }
    }
}

pub(crate) fn spawn_worker(
    name: String,
    command: CommandDescriptor,
    ready: Ready,
    requests: Requests,
) -> Result<(), SqlFluentError> {
    thread::Builder::new()
        .name("sql-fluent-scripted".into())
        .spawn(move || run_worker(&name, command, ready, requests))
        .map(|_| ())
        .map_err(|err| {
            SqlFluentError::ConnectionError(format!("failed to spawn scripted worker: {err}"))
        })
}

fn run_worker(name: &str, command: CommandDescriptor, ready: Ready, mut requests: Requests) {
    let (connection, script) = match OpenConnection::acquire(name, &command) {
        Ok(acquired) => acquired,
        Err(err) => {
            reply(ready, Err(err));
            return;
        }
    };
    reply(ready, Ok(()));

    let mut sets = script.result_sets.into_iter();
    let mut current = sets.next().map(Cursor::new);
    let mut fetched = 0usize;

    while let Some(request) = requests.blocking_recv() {
        match request {
            Request::NextRow { respond_to } => {
                if let Some((limit, message)) = &script.fail_after_rows {
                    if fetched >= *limit {
                        tracing::warn!(script = name, "scripted failure after {limit} rows");
                        drop(connection);
                        reply(respond_to, Err(SqlFluentError::ExecutionError(message.clone())));
                        return;
                    }
                }
                let row = current.as_mut().and_then(Cursor::next_row);
                if row.is_some() {
                    fetched += 1;
                    connection.count_row();
                }
                reply(respond_to, Ok(row));
            }
            Request::NextResult { respond_to } => {
                current = sets.next().map(Cursor::new);
                reply(respond_to, Ok(current.is_some()));
            }
            Request::Finish { respond_to } => {
                drop(connection);
                let mut params = ParameterSet::new(command.parameters);
                params.apply_reported(script.outputs);
                reply(respond_to, Ok(params));
                return;
            }
        }
    }
    tracing::debug!(script = name, "scripted session dropped before finishing");
}

struct Cursor {
    columns: std::sync::Arc<Columns>,
    rows: std::vec::IntoIter<Vec<SqlValue>>,
}

impl Cursor {
    fn new(set: ScriptedResultSet) -> Self {
        Self {
            columns: Columns::new(set.columns),
            rows: set.rows.into_iter(),
        }
    }

    fn next_row(&mut self) -> Option<Row> {
        self.rows
            .next()
            .map(|values| Row::new(self.columns.clone(), values))
    }
}
