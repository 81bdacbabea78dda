use std::thread;
use std::time::Duration;

use rusqlite::{Batch, Connection, Rows, Statement};
use tokio::sync::oneshot;

use crate::command::{CommandDescriptor, ParameterSet};
use crate::config::SqliteOptions;
use crate::error::SqlFluentError;
use crate::results::Columns;
use crate::session::{Ready, Request, Requests, reply};
use crate::types::CommandKind;

use super::params::bind_parameters;
use super::query::build_row;

type AdvanceReply = oneshot::Sender<Result<bool, SqlFluentError>>;
type FinishReply = oneshot::Sender<Result<ParameterSet, SqlFluentError>>;

/// Start the thread that owns the `SQLite` connection for one execution.
///
/// # Errors
/// Returns [`SqlFluentError::ConnectionError`] if the thread cannot be spawned.
pub(crate) fn spawn_worker(
    options: SqliteOptions,
    command: CommandDescriptor,
    ready: Ready,
    requests: Requests,
) -> Result<(), SqlFluentError> {
    thread::Builder::new()
        .name("sql-fluent-sqlite".into())
        .spawn(move || run_worker(&options, &command, ready, requests))
        .map(|_| ())
        .map_err(|err| {
            SqlFluentError::ConnectionError(format!("failed to spawn SQLite worker thread: {err}"))
        })
}

fn run_worker(
    options: &SqliteOptions,
    command: &CommandDescriptor,
    ready: Ready,
    mut requests: Requests,
) {
    if command.kind == CommandKind::StoredProcedure {
        reply(
            ready,
            Err(SqlFluentError::Unsupported(format!(
                "SQLite has no stored procedures (`{}`)",
                command.text
            ))),
        );
        return;
    }

    let conn = match open_connection(options) {
        Ok(conn) => conn,
        Err(err) => {
            reply(ready, Err(err));
            return;
        }
    };

    let Some(respond_to) = serve(&conn, command, ready, &mut requests) else {
        return;
    };

    // SQLite has no output parameters; report what was bound, after the connection is gone
    let outcome = conn
        .close()
        .map(|()| ParameterSet::new(command.parameters.clone()))
        .map_err(|(_, err)| SqlFluentError::from(err));
    reply(respond_to, outcome);
}

fn open_connection(options: &SqliteOptions) -> Result<Connection, SqlFluentError> {
    let conn = if options.is_in_memory() {
        Connection::open_in_memory()?
    } else {
        Connection::open(&options.db_path)?
    };
    if let Some(millis) = options.busy_timeout_ms {
        conn.busy_timeout(Duration::from_millis(millis))?;
    }
    Ok(conn)
}

/// Whoever is waiting for the worker to reach the next result set.
enum Pending {
    Ready(Ready),
    Advance(AdvanceReply),
    Finish(FinishReply),
}

impl Pending {
    fn fail(self, err: SqlFluentError) {
        tracing::warn!(error = %err, "sqlite worker failed");
        match self {
            Pending::Ready(respond_to) => reply(respond_to, Err(err)),
            Pending::Advance(respond_to) => reply(respond_to, Err(err)),
            Pending::Finish(respond_to) => reply(respond_to, Err(err)),
        }
    }
}

/// Walk the batch one statement at a time, answering requests against each result set.
///
/// Statements without columns run immediately and never surface as result sets. Returns
/// the finish responder once the whole batch has run, or `None` when the execution failed
/// or the session was dropped.
fn serve(
    conn: &Connection,
    command: &CommandDescriptor,
    ready: Ready,
    requests: &mut Requests,
) -> Option<FinishReply> {
    let mut pending = Pending::Ready(ready);
    let mut batch = Batch::new(conn, &command.text);

    loop {
        let mut stmt = match batch.next() {
            Ok(Some(stmt)) => stmt,
            Ok(None) => break,
            Err(err) => {
                pending.fail(err.into());
                return None;
            }
        };
        if let Err(err) = bind_parameters(&mut stmt, &command.parameters) {
            pending.fail(err);
            return None;
        }

        let width = stmt.column_count();
        if width == 0 {
            if let Err(err) = stmt.raw_execute() {
                pending.fail(err.into());
                return None;
            }
            continue;
        }

        match pending {
            Pending::Finish(respond_to) => {
                if let Err(err) = run_to_completion(&mut stmt) {
                    Pending::Finish(respond_to).fail(err);
                    return None;
                }
                pending = Pending::Finish(respond_to);
                continue;
            }
            Pending::Ready(respond_to) => reply(respond_to, Ok(())),
            Pending::Advance(respond_to) => reply(respond_to, Ok(true)),
        }

        let columns = Columns::new(
            stmt.column_names()
                .into_iter()
                .map(str::to_owned)
                .collect(),
        );
        let mut rows = stmt.raw_query();
        let mut exhausted = false;

        pending = loop {
            let Some(request) = requests.blocking_recv() else {
                tracing::debug!("sqlite session dropped mid result set");
                return None;
            };
            match request {
                Request::NextRow { respond_to } => {
                    if exhausted {
                        reply(respond_to, Ok(None));
                        continue;
                    }
                    match rows.next() {
                        Ok(Some(row)) => match build_row(row, &columns, width) {
                            Ok(row) => reply(respond_to, Ok(Some(row))),
                            Err(err) => {
                                reply(respond_to, Err(err));
                                return None;
                            }
                        },
                        Ok(None) => {
                            exhausted = true;
                            reply(respond_to, Ok(None));
                        }
                        Err(err) => {
                            reply(respond_to, Err(err.into()));
                            return None;
                        }
                    }
                }
                Request::NextResult { respond_to } => break Pending::Advance(respond_to),
                Request::Finish { respond_to } => break Pending::Finish(respond_to),
            }
        };

        // step the rest so DML with RETURNING completes
        if !exhausted {
            if let Err(err) = drain(&mut rows) {
                pending.fail(err);
                return None;
            }
        }
    }

    match pending {
        Pending::Finish(respond_to) => Some(respond_to),
        Pending::Ready(respond_to) => {
            reply(respond_to, Ok(()));
            serve_exhausted(requests)
        }
        Pending::Advance(respond_to) => {
            reply(respond_to, Ok(false));
            serve_exhausted(requests)
        }
    }
}

/// Every statement has run; answer with empty reads until the caller finishes.
fn serve_exhausted(requests: &mut Requests) -> Option<FinishReply> {
    while let Some(request) = requests.blocking_recv() {
        match request {
            Request::NextRow { respond_to } => reply(respond_to, Ok(None)),
            Request::NextResult { respond_to } => reply(respond_to, Ok(false)),
            Request::Finish { respond_to } => return Some(respond_to),
        }
    }
    None
}

fn drain(rows: &mut Rows<'_>) -> Result<(), SqlFluentError> {
    while rows.next()?.is_some() {}
    Ok(())
}

fn run_to_completion(stmt: &mut Statement<'_>) -> Result<(), SqlFluentError> {
    let mut rows = stmt.raw_query();
    drain(&mut rows)
}
