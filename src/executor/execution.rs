use crate::command::{CommandDescriptor, ParameterSet};
use crate::config::ConnectionTarget;
use crate::error::SqlFluentError;
use crate::session::Session;

/// Callback handed the parameter set once an execution has finished.
pub(crate) type PostExecute = Box<dyn FnOnce(&ParameterSet) + Send>;

/// A connection string is only parsed when a command runs, so a bad one surfaces as an
/// execution error rather than at construction.
#[derive(Debug, Clone)]
pub(crate) enum TargetSource {
    Raw(String),
    Resolved(ConnectionTarget),
}

impl TargetSource {
    fn resolve(self) -> Result<ConnectionTarget, SqlFluentError> {
        match self {
            TargetSource::Raw(raw) => ConnectionTarget::parse(&raw),
            TargetSource::Resolved(target) => Ok(target),
        }
    }
}

/// Everything one execution needs: where, what, and who to tell afterwards.
pub(crate) struct Execution {
    pub(crate) target: TargetSource,
    pub(crate) command: CommandDescriptor,
    pub(crate) post: Option<PostExecute>,
}

impl Execution {
    pub(crate) fn new(target: TargetSource) -> Self {
        Self {
            target,
            command: CommandDescriptor::default(),
            post: None,
        }
    }

    pub(crate) async fn start(self) -> Result<Running, SqlFluentError> {
        let target = self.target.resolve()?;
        let session = Session::open(&target, self.command).await?;
        Ok(Running {
            session,
            post: self.post,
        })
    }
}

/// An open session plus the callback to run when it completes.
pub(crate) struct Running {
    pub(crate) session: Session,
    post: Option<PostExecute>,
}

impl Running {
    /// Finish the command, release the connection, then run the post-execution callback.
    pub(crate) async fn complete(self) -> Result<(), SqlFluentError> {
        let params = self.session.finish().await?;
        if let Some(post) = self.post {
            post(&params);
        }
        Ok(())
    }
}
