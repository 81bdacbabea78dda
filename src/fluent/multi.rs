use std::marker::PhantomData;

use futures::executor::block_on;

use crate::error::SqlFluentError;
use crate::executor::{self, Execution};
use crate::results::{MultiResults, Row, RowSink, TypedSink};

use super::{Blocking, Discipline, Suspending};

/// Readers paired with result sets by registration order.
///
/// The first reader drains the first set, the second reader the second set, and so on.
/// Readers beyond the last set produce empty sequences. Registering a key twice makes
/// `execute` fail with [`SqlFluentError::ConfigError`] before a connection is opened.
pub struct Multi<D> {
    execution: Execution,
    readers: Vec<(String, Box<dyn RowSink>)>,
    _discipline: PhantomData<D>,
}

impl<D: Discipline> Multi<D> {
    pub(crate) fn new(execution: Execution) -> Self {
        Self {
            execution,
            readers: Vec::new(),
            _discipline: PhantomData,
        }
    }

    #[must_use]
    pub fn reader<T, F>(mut self, key: impl Into<String>, mapper: F) -> Self
    where
        T: Send + 'static,
        F: FnMut(&Row) -> Result<T, SqlFluentError> + Send + 'static,
    {
        let sink: Box<dyn RowSink> = Box::new(TypedSink::<T, F>::new(mapper));
        self.readers.push((key.into(), sink));
        self
    }
}

impl Multi<Blocking> {
    /// # Errors
    /// Returns `ConfigError` for a duplicate reader key, the driver's error, or the first
    /// mapper error.
    pub fn execute(self) -> Result<MultiResults, SqlFluentError> {
        block_on(executor::multi(self.execution, self.readers))
    }
}

impl Multi<Suspending> {
    /// # Errors
    /// Returns `ConfigError` for a duplicate reader key, the driver's error, or the first
    /// mapper error.
    pub async fn execute(self) -> Result<MultiResults, SqlFluentError> {
        executor::multi(self.execution, self.readers).await
    }
}
