use std::marker::PhantomData;

use futures::executor::block_on;

use crate::error::SqlFluentError;
use crate::executor::{self, Execution, LevelMapper, PrimaryMapper};
use crate::results::Row;

use super::{Blocking, Discipline, Suspending};

/// No child levels registered yet.
pub enum NoLevels {}
/// At least one child level registered.
pub enum WithLevels {}

/// Waiting for the mapper that turns a first-set row into a parent.
pub struct Cascade<D> {
    execution: Execution,
    _discipline: PhantomData<D>,
}

impl<D: Discipline> Cascade<D> {
    pub(crate) fn new(execution: Execution) -> Self {
        Self {
            execution,
            _discipline: PhantomData,
        }
    }

    pub fn primary<P, F>(self, mapper: F) -> CascadeLevels<D, P, NoLevels>
    where
        F: FnMut(&Row) -> Result<P, SqlFluentError> + Send + 'static,
    {
        CascadeLevels {
            execution: self.execution,
            primary: Box::new(mapper),
            levels: Vec::new(),
            _state: PhantomData,
        }
    }
}

/// Registering child levels; each level consumes the next result set in order.
pub struct CascadeLevels<D, P, L> {
    execution: Execution,
    primary: PrimaryMapper<P>,
    levels: Vec<LevelMapper<P>>,
    _state: PhantomData<(D, L)>,
}

impl<D: Discipline, P, L> CascadeLevels<D, P, L> {
    /// Add a level that applies each row of the next result set to a parent.
    pub fn level<F>(mut self, mapper: F) -> CascadeLevels<D, P, WithLevels>
    where
        F: FnMut(&Row, &mut P) -> Result<(), SqlFluentError> + Send + 'static,
    {
        self.levels.push(Box::new(mapper));
        CascadeLevels {
            execution: self.execution,
            primary: self.primary,
            levels: self.levels,
            _state: PhantomData,
        }
    }

    pub fn end(self) -> CascadeReady<D, P, L> {
        CascadeReady {
            execution: self.execution,
            primary: self.primary,
            levels: self.levels,
            _state: PhantomData,
        }
    }
}

/// A complete cascade. With levels, `execute_many` needs a
/// [`selector`](CascadeReady::selector) first.
pub struct CascadeReady<D, P, L> {
    execution: Execution,
    primary: PrimaryMapper<P>,
    levels: Vec<LevelMapper<P>>,
    _state: PhantomData<(D, L)>,
}

impl<D: Discipline, P> CascadeReady<D, P, WithLevels> {
    /// Pick the parent for each child row.
    ///
    /// `selector` builds a predicate from a child row; the row goes to the first parent
    /// the predicate accepts and is dropped when none does.
    pub fn selector<S, Q>(self, selector: S) -> CascadeSelected<D, P, S>
    where
        S: FnMut(&Row) -> Result<Q, SqlFluentError>,
        Q: Fn(&P) -> bool,
    {
        CascadeSelected {
            execution: self.execution,
            primary: self.primary,
            levels: self.levels,
            selector,
            _discipline: PhantomData,
        }
    }
}

impl<P, L> CascadeReady<Blocking, P, L> {
    /// Map the first row of the first set, then attach every row of each level's set to it.
    ///
    /// # Errors
    /// Returns the driver's error, or the first mapper error.
    pub fn execute_single(self) -> Result<Option<P>, SqlFluentError> {
        block_on(executor::cascade_single(
            self.execution,
            self.primary,
            self.levels,
        ))
    }
}

impl<P> CascadeReady<Blocking, P, NoLevels> {
    /// Map every row of the first set.
    ///
    /// # Errors
    /// Returns the driver's error, or the first mapper error.
    pub fn execute_many(self) -> Result<Vec<P>, SqlFluentError> {
        block_on(executor::many(self.execution, self.primary))
    }
}

impl<P, L> CascadeReady<Suspending, P, L> {
    /// Map the first row of the first set, then attach every row of each level's set to it.
    ///
    /// # Errors
    /// Returns the driver's error, or the first mapper error.
    pub async fn execute_single(self) -> Result<Option<P>, SqlFluentError> {
        executor::cascade_single(self.execution, self.primary, self.levels).await
    }
}

impl<P> CascadeReady<Suspending, P, NoLevels> {
    /// Map every row of the first set.
    ///
    /// # Errors
    /// Returns the driver's error, or the first mapper error.
    pub async fn execute_many(self) -> Result<Vec<P>, SqlFluentError> {
        executor::many(self.execution, self.primary).await
    }
}

/// A multi-parent cascade with its child selector.
pub struct CascadeSelected<D, P, S> {
    execution: Execution,
    primary: PrimaryMapper<P>,
    levels: Vec<LevelMapper<P>>,
    selector: S,
    _discipline: PhantomData<D>,
}

impl<P, S, Q> CascadeSelected<Blocking, P, S>
where
    S: FnMut(&Row) -> Result<Q, SqlFluentError>,
    Q: Fn(&P) -> bool,
{
    /// Map every parent, then route each child row to the first parent it selects.
    ///
    /// # Errors
    /// Returns the driver's error, or the first mapper or selector error.
    pub fn execute_many(self) -> Result<Vec<P>, SqlFluentError> {
        block_on(executor::cascade_many(
            self.execution,
            self.primary,
            self.levels,
            self.selector,
        ))
    }
}

impl<P, S, Q> CascadeSelected<Suspending, P, S>
where
    S: FnMut(&Row) -> Result<Q, SqlFluentError>,
    Q: Fn(&P) -> bool,
{
    /// Map every parent, then route each child row to the first parent it selects.
    ///
    /// # Errors
    /// Returns the driver's error, or the first mapper or selector error.
    pub async fn execute_many(self) -> Result<Vec<P>, SqlFluentError> {
        executor::cascade_many(self.execution, self.primary, self.levels, self.selector).await
    }
}
