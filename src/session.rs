use tokio::sync::{mpsc, oneshot};

use crate::command::{CommandDescriptor, ParameterSet};
use crate::config::ConnectionTarget;
use crate::error::SqlFluentError;
use crate::results::Row;

/// Messages a [`Session`] sends to the worker that owns its connection.
pub(crate) enum Request {
    NextRow {
        respond_to: oneshot::Sender<Result<Option<Row>, SqlFluentError>>,
    },
    NextResult {
        respond_to: oneshot::Sender<Result<bool, SqlFluentError>>,
    },
    /// Run the rest of the command, close the connection, report parameters.
    Finish {
        respond_to: oneshot::Sender<Result<ParameterSet, SqlFluentError>>,
    },
}

/// Answered once the connection is open and the command has produced its first result
/// set (or run to completion when it produces none).
pub(crate) type Ready = oneshot::Sender<Result<(), SqlFluentError>>;

pub(crate) type Requests = mpsc::UnboundedReceiver<Request>;

/// One execution's connection, owned by a backend worker and driven over a channel.
///
/// The worker keeps the connection for as long as this handle is alive. Dropping the
/// handle closes the channel; the worker then abandons whatever is left of the command
/// and releases the connection, so every exit path (success, mapper error, driver error,
/// an abandoned lazy sequence) gives the connection back.
pub(crate) struct Session {
    sender: mpsc::UnboundedSender<Request>,
    backend: &'static str,
    finished: bool,
}

impl Session {
    /// Acquire a connection, bind the parameters and run the command.
    pub(crate) async fn open(
        target: &ConnectionTarget,
        command: CommandDescriptor,
    ) -> Result<Self, SqlFluentError> {
        let backend = target.backend();
        tracing::debug!(
            backend,
            kind = ?command.kind,
            parameters = command.parameters.len(),
            "opening session"
        );

        let (sender, receiver) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        spawn_worker(target, command, ready_tx, receiver)?;

        ready_rx.await.map_err(|_| {
            SqlFluentError::ConnectionError(format!(
                "{backend} worker exited before the command ran"
            ))
        })??;

        Ok(Self {
            sender,
            backend,
            finished: false,
        })
    }

    /// Fetch the next row of the active result set, `None` once it is exhausted.
    pub(crate) async fn next_row(&mut self) -> Result<Option<Row>, SqlFluentError> {
        let row = self
            .request(|respond_to| Request::NextRow { respond_to }, "fetching a row")
            .await?;
        tracing::trace!(backend = self.backend, has_row = row.is_some(), "row fetched");
        Ok(row)
    }

    /// Skip the rest of the active result set and move to the next one.
    pub(crate) async fn next_result(&mut self) -> Result<bool, SqlFluentError> {
        let advanced = self
            .request(
                |respond_to| Request::NextResult { respond_to },
                "advancing to the next result set",
            )
            .await?;
        tracing::trace!(backend = self.backend, advanced, "result set advanced");
        Ok(advanced)
    }

    /// Complete the command and release the connection.
    pub(crate) async fn finish(mut self) -> Result<ParameterSet, SqlFluentError> {
        self.finished = true;
        let params = self
            .request(|respond_to| Request::Finish { respond_to }, "finishing")
            .await?;
        tracing::debug!(backend = self.backend, "session finished");
        Ok(params)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, SqlFluentError>>) -> Request,
        action: &str,
    ) -> Result<T, SqlFluentError> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(build(tx)).map_err(|_| {
            SqlFluentError::ConnectionError(format!("{} worker closed", self.backend))
        })?;
        rx.await.map_err(|_| {
            SqlFluentError::ConnectionError(format!(
                "{} worker dropped while {action}",
                self.backend
            ))
        })?
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                backend = self.backend,
                "session dropped before finishing; releasing connection"
            );
        }
    }
}

fn spawn_worker(
    target: &ConnectionTarget,
    command: CommandDescriptor,
    ready: Ready,
    requests: Requests,
) -> Result<(), SqlFluentError> {
    match target {
        #[cfg(feature = "sqlite")]
        ConnectionTarget::Sqlite(opts) => {
            crate::sqlite::spawn_worker(opts.clone(), command, ready, requests)
        }
        #[cfg(feature = "mssql")]
        ConnectionTarget::Mssql(opts) => {
            crate::mssql::spawn_worker(opts.clone(), command, ready, requests)
        }
        #[cfg(feature = "test-utils")]
        ConnectionTarget::Scripted(name) => {
            crate::test_utils::spawn_worker(name.clone(), command, ready, requests)
        }
        #[allow(unreachable_patterns)]
        _ => {
            let _ = (command, ready, requests);
            Err(SqlFluentError::ConfigError(
                "no database backend enabled".into(),
            ))
        }
    }
}

/// Shared by workers: send a reply, ignoring a caller that has gone away.
pub(crate) fn reply<T>(respond_to: oneshot::Sender<T>, value: T) {
    let _ = respond_to.send(value);
}
