use std::sync::Arc;
use std::thread;

use futures::TryStreamExt;
use tiberius::{Client, Query, QueryItem, QueryStream, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::command::{CommandDescriptor, ParameterSet};
use crate::config::MssqlOptions;
use crate::error::SqlFluentError;
use crate::results::{Columns, Row};
use crate::session::{Ready, Request, Requests, reply};
use crate::types::SqlValue;

use super::batch::{MssqlBatch, OUTPUTS_MARKER};
use super::params::bind_value;
use super::query::{build_row, extract_value};

type MssqlClient = Client<Compat<TcpStream>>;

/// Start the thread that owns the SQL Server client for one execution.
///
/// tiberius is async-only, so the thread drives a current-thread runtime; callers on the
/// blocking discipline never need a runtime of their own.
///
/// # Errors
/// Returns [`SqlFluentError::ConnectionError`] if the thread cannot be spawned.
pub(crate) fn spawn_worker(
    options: MssqlOptions,
    command: CommandDescriptor,
    ready: Ready,
    requests: Requests,
) -> Result<(), SqlFluentError> {
    thread::Builder::new()
        .name("sql-fluent-mssql".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    reply(
                        ready,
                        Err(SqlFluentError::ConnectionError(format!(
                            "failed to start SQL Server worker runtime: {err}"
                        ))),
                    );
                    return;
                }
            };
            runtime.block_on(run_worker(options, command, ready, requests));
        })
        .map(|_| ())
        .map_err(|err| {
            SqlFluentError::ConnectionError(format!(
                "failed to spawn SQL Server worker thread: {err}"
            ))
        })
}

async fn connect(options: &MssqlOptions) -> Result<MssqlClient, SqlFluentError> {
    let config = options.config.clone();
    // resolves named instances through SQL Browser, plain host:port otherwise
    let tcp = TcpStream::connect_named(&config).await?;
    tcp.set_nodelay(true)
        .map_err(|e| SqlFluentError::ConnectionError(format!("TCP configuration error: {e}")))?;
    Ok(Client::connect(config, tcp.compat_write()).await?)
}

async fn run_worker(
    options: MssqlOptions,
    command: CommandDescriptor,
    ready: Ready,
    mut requests: Requests,
) {
    let mut client = match connect(&options).await {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!(error = %err, "mssql connection failed");
            reply(ready, Err(err));
            return;
        }
    };

    let batch = MssqlBatch::build(&command);
    let mut query = Query::new(batch.text);
    for (db_type, value) in batch.values {
        bind_value(&mut query, db_type, value);
    }

    let stream = match query.query(&mut client).await {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(error = %err, "mssql batch failed");
            reply(ready, Err(err.into()));
            return;
        }
    };
    let mut cursor = Cursor::new(stream);
    if let Err(err) = cursor.next_result().await {
        reply(ready, Err(err));
        return;
    }
    reply(ready, Ok(()));

    while let Some(request) = requests.recv().await {
        match request {
            Request::NextRow { respond_to } => {
                let row = cursor.next_row().await;
                let failed = row.is_err();
                reply(respond_to, row);
                if failed {
                    return;
                }
            }
            Request::NextResult { respond_to } => {
                let advanced = cursor.next_result().await;
                let failed = advanced.is_err();
                reply(respond_to, advanced);
                if failed {
                    return;
                }
            }
            Request::Finish { respond_to } => {
                let reported = cursor.drain().await;
                drop(cursor);
                drop(client);
                let outcome = reported.map(|reported| {
                    let mut params = ParameterSet::new(command.parameters);
                    params.apply_reported(reported);
                    params
                });
                reply(respond_to, outcome);
                return;
            }
        }
    }
    tracing::debug!("mssql session dropped before finishing");
}

/// Forward-only view over a tiberius result stream, one result set at a time.
struct Cursor<'a> {
    stream: QueryStream<'a>,
    lookahead: Option<QueryItem>,
    columns: Option<Arc<Columns>>,
    current_done: bool,
    ended: bool,
    reported: Vec<(String, SqlValue)>,
}

impl<'a> Cursor<'a> {
    fn new(stream: QueryStream<'a>) -> Self {
        Self {
            stream,
            lookahead: None,
            columns: None,
            current_done: true,
            ended: false,
            reported: Vec::new(),
        }
    }

    async fn pull(&mut self) -> Result<Option<QueryItem>, SqlFluentError> {
        if let Some(item) = self.lookahead.take() {
            return Ok(Some(item));
        }
        if self.ended {
            return Ok(None);
        }
        let item = self.stream.try_next().await?;
        if item.is_none() {
            self.ended = true;
        }
        Ok(item)
    }

    async fn next_row(&mut self) -> Result<Option<Row>, SqlFluentError> {
        if self.current_done {
            return Ok(None);
        }
        let Some(columns) = self.columns.clone() else {
            return Ok(None);
        };
        match self.pull().await? {
            Some(QueryItem::Row(row)) => build_row(row, &columns).map(Some),
            Some(meta @ QueryItem::Metadata(_)) => {
                self.lookahead = Some(meta);
                self.current_done = true;
                Ok(None)
            }
            None => {
                self.current_done = true;
                Ok(None)
            }
        }
    }

    /// Skip what is left of the current set and position on the next caller-visible one.
    async fn next_result(&mut self) -> Result<bool, SqlFluentError> {
        loop {
            match self.pull().await? {
                None => {
                    self.columns = None;
                    self.current_done = true;
                    return Ok(false);
                }
                Some(QueryItem::Row(_)) => {}
                Some(QueryItem::Metadata(meta)) => {
                    let names: Vec<String> = meta
                        .columns()
                        .iter()
                        .map(|col| col.name().to_owned())
                        .collect();
                    if names.first().is_some_and(|first| first == OUTPUTS_MARKER) {
                        self.capture_outputs(&names).await?;
                        continue;
                    }
                    self.columns = Some(Columns::new(names));
                    self.current_done = false;
                    return Ok(true);
                }
            }
        }
    }

    async fn capture_outputs(&mut self, names: &[String]) -> Result<(), SqlFluentError> {
        match self.pull().await? {
            Some(QueryItem::Row(row)) => {
                for (name, data) in names.iter().zip(row).skip(1) {
                    self.reported.push((name.clone(), extract_value(data)?));
                }
            }
            Some(other) => self.lookahead = Some(other),
            None => {}
        }
        self.current_done = true;
        Ok(())
    }

    /// Run the rest of the batch and hand back the reported output values.
    async fn drain(&mut self) -> Result<Vec<(String, SqlValue)>, SqlFluentError> {
        while self.next_result().await? {}
        Ok(std::mem::take(&mut self.reported))
    }
}
