//! Typestate chain that composes a command, its parameters and a result assembler.
//!
//! Every stage consumes `self` and returns the next stage, so only meaningful sequences
//! compile. The discipline marker `D` picks blocking or `async` terminal operations.

mod cascade;
mod lazy;
mod multi;

use std::marker::PhantomData;

use futures::executor::block_on;

use crate::command::{Param, ParameterSet};
use crate::config::ConnectionTarget;
use crate::error::SqlFluentError;
use crate::executor::{self, Execution, TargetSource};
use crate::results::Row;
use crate::types::{CommandKind, SqlValue};

pub use cascade::{Cascade, CascadeLevels, CascadeReady, CascadeSelected, NoLevels, WithLevels};
pub use lazy::LazyRows;
pub use multi::Multi;

/// Terminal operations run to completion on the calling thread.
pub enum Blocking {}
/// Terminal operations are `async` and yield at every round trip.
pub enum Suspending {}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Blocking {}
    impl Sealed for super::Suspending {}
}

/// Execution discipline of a chain; implemented by [`Blocking`] and [`Suspending`].
pub trait Discipline: sealed::Sealed {}
impl Discipline for Blocking {}
impl Discipline for Suspending {}

/// Entry point: a connection target waiting for a command.
///
/// ```no_run
/// use sql_fluent::prelude::*;
///
/// let count = SqlFluent::new("sqlite:app.db")
///     .query("SELECT COUNT(*) FROM users WHERE active = @active")
///     .parameters()
///     .parameter(Param::input("@active", DbType::Bit, true))
///     .end()
///     .execute_scalar()?;
/// # let _ = count;
/// # Ok::<(), SqlFluentError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SqlFluent {
    target: TargetSource,
}

impl SqlFluent {
    /// Target a connection string; it is parsed when the command executes.
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            target: TargetSource::Raw(connection_string.into()),
        }
    }

    #[must_use]
    pub fn with_target(target: ConnectionTarget) -> Self {
        Self {
            target: TargetSource::Resolved(target),
        }
    }

    /// Run ad-hoc command text.
    pub fn query(self, text: impl Into<String>) -> Command<Blocking> {
        Command::new(self.target).query(text)
    }

    /// Run a stored procedure by name.
    pub fn stored_procedure(self, name: impl Into<String>) -> Command<Blocking> {
        Command::new(self.target).stored_procedure(name)
    }
}

/// A command ready to bind parameters or execute.
pub struct Command<D> {
    execution: Execution,
    _discipline: PhantomData<D>,
}

impl<D: Discipline> Command<D> {
    fn new(target: TargetSource) -> Self {
        Self::from_execution(Execution::new(target))
    }

    fn from_execution(execution: Execution) -> Self {
        Self {
            execution,
            _discipline: PhantomData,
        }
    }

    /// Replace the command with ad-hoc text. The last of `query`/`stored_procedure` wins.
    #[must_use]
    pub fn query(mut self, text: impl Into<String>) -> Self {
        self.execution.command.set_text(text.into(), CommandKind::Text);
        self
    }

    /// Replace the command with a stored procedure call.
    #[must_use]
    pub fn stored_procedure(mut self, name: impl Into<String>) -> Self {
        self.execution
            .command
            .set_text(name.into(), CommandKind::StoredProcedure);
        self
    }

    /// Start binding parameters.
    pub fn parameters(self) -> Parameters<D> {
        Parameters { command: self }
    }

    /// Run `callback` with the post-execution parameter set once the command finishes.
    ///
    /// This is where `Output`, `InputOutput` and `ReturnValue` parameters are read. The
    /// callback does not run if the execution fails or a lazy sequence is abandoned.
    #[must_use]
    pub fn post_execute<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&ParameterSet) + Send + 'static,
    {
        self.execution.post = Some(Box::new(callback));
        self
    }

    /// Correlate child result sets to parents mapped from the first one.
    pub fn cascade(self) -> Cascade<D> {
        Cascade::new(self.execution)
    }

    /// Read several independent, named result sets.
    pub fn multi(self) -> Multi<D> {
        Multi::new(self.execution)
    }
}

impl Command<Blocking> {
    /// Switch the chain to `async` terminal operations.
    pub fn suspending(self) -> Command<Suspending> {
        Command::from_execution(self.execution)
    }

    /// Run for side effects only.
    ///
    /// # Errors
    /// Returns the driver's error if the connection, binding or execution fails.
    pub fn execute_non_query(self) -> Result<(), SqlFluentError> {
        block_on(executor::non_query(self.execution))
    }

    /// Map the first row; later rows are never mapped.
    ///
    /// # Errors
    /// Returns the driver's error, or the mapper's.
    pub fn execute_single<T, F>(self, mapper: F) -> Result<Option<T>, SqlFluentError>
    where
        F: FnMut(&Row) -> Result<T, SqlFluentError>,
    {
        block_on(executor::single(self.execution, mapper))
    }

    /// Map every row of the first result set, in order.
    ///
    /// # Errors
    /// Returns the driver's error, or the first mapper error.
    pub fn execute_many<T, F>(self, mapper: F) -> Result<Vec<T>, SqlFluentError>
    where
        F: FnMut(&Row) -> Result<T, SqlFluentError>,
    {
        block_on(executor::many(self.execution, mapper))
    }

    /// Map rows on demand while the caller iterates.
    ///
    /// The returned sequence holds the connection until it is exhausted, closed or dropped.
    ///
    /// # Errors
    /// Returns the driver's error if the connection or command fails to start.
    pub fn execute_lazy<T, F>(self, mapper: F) -> Result<LazyRows<T, F>, SqlFluentError>
    where
        F: FnMut(&Row) -> Result<T, SqlFluentError>,
    {
        let running = block_on(self.execution.start())?;
        Ok(LazyRows::new(running, mapper))
    }

    /// First column of the first row, `None` when there is no row.
    ///
    /// # Errors
    /// Returns the driver's error if the execution fails.
    pub fn execute_scalar(self) -> Result<Option<SqlValue>, SqlFluentError> {
        block_on(executor::scalar(self.execution))
    }
}

impl Command<Suspending> {
    /// Run for side effects only.
    ///
    /// # Errors
    /// Returns the driver's error if the connection, binding or execution fails.
    pub async fn execute_non_query(self) -> Result<(), SqlFluentError> {
        executor::non_query(self.execution).await
    }

    /// Map the first row; later rows are never mapped.
    ///
    /// # Errors
    /// Returns the driver's error, or the mapper's.
    pub async fn execute_single<T, F>(self, mapper: F) -> Result<Option<T>, SqlFluentError>
    where
        F: FnMut(&Row) -> Result<T, SqlFluentError>,
    {
        executor::single(self.execution, mapper).await
    }

    /// Map every row of the first result set, in order.
    ///
    /// # Errors
    /// Returns the driver's error, or the first mapper error.
    pub async fn execute_many<T, F>(self, mapper: F) -> Result<Vec<T>, SqlFluentError>
    where
        F: FnMut(&Row) -> Result<T, SqlFluentError>,
    {
        executor::many(self.execution, mapper).await
    }

    /// First column of the first row, `None` when there is no row.
    ///
    /// # Errors
    /// Returns the driver's error if the execution fails.
    pub async fn execute_scalar(self) -> Result<Option<SqlValue>, SqlFluentError> {
        executor::scalar(self.execution).await
    }
}

/// Parameter binding stage; [`end`](Parameters::end) returns to the command.
pub struct Parameters<D> {
    command: Command<D>,
}

impl<D: Discipline> Parameters<D> {
    /// Append a parameter. Names, placeholders and types are checked by the driver.
    #[must_use]
    pub fn parameter(mut self, param: Param) -> Self {
        self.command.execution.command.bind(param);
        self
    }

    /// Append `param` only if `predicate` holds; it is evaluated now, not at execution.
    #[must_use]
    pub fn parameter_if(self, predicate: impl FnOnce() -> bool, param: Param) -> Self {
        if predicate() {
            self.parameter(param)
        } else {
            self
        }
    }

    pub fn end(self) -> Command<D> {
        self.command
    }
}
