use std::iter::FusedIterator;

use futures::executor::block_on;

use crate::error::SqlFluentError;
use crate::executor::Running;
use crate::results::Row;

/// Rows of the first result set, fetched and mapped one at a time.
///
/// The sequence owns its connection. It is released when the rows run out, when a fetch
/// or the mapper fails, on [`close`](LazyRows::close), or when the sequence is dropped.
/// Statements after an abandoned row are never run. Forward-only and not restartable.
pub struct LazyRows<T, F> {
    running: Option<Running>,
    mapper: F,
    _item: std::marker::PhantomData<fn() -> T>,
}

impl<T, F> LazyRows<T, F>
where
    F: FnMut(&Row) -> Result<T, SqlFluentError>,
{
    pub(crate) fn new(running: Running, mapper: F) -> Self {
        Self {
            running: Some(running),
            mapper,
            _item: std::marker::PhantomData,
        }
    }

    /// Stop early and release the connection. The post-execution callback does not run.
    pub fn close(mut self) {
        self.release();
    }

    /// Whether the sequence still holds its connection.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.running.is_some()
    }

    fn release(&mut self) {
        if self.running.take().is_some() {
            tracing::debug!("lazy rows released before exhaustion");
        }
    }
}

impl<T, F> Iterator for LazyRows<T, F>
where
    F: FnMut(&Row) -> Result<T, SqlFluentError>,
{
    type Item = Result<T, SqlFluentError>;

    fn next(&mut self) -> Option<Self::Item> {
        let running = self.running.as_mut()?;
        match block_on(running.session.next_row()) {
            Ok(Some(row)) => {
                let item = (self.mapper)(&row);
                if item.is_err() {
                    self.release();
                }
                Some(item)
            }
            Ok(None) => {
                let running = self.running.take()?;
                block_on(running.complete()).err().map(Err)
            }
            Err(err) => {
                self.release();
                Some(Err(err))
            }
        }
    }
}

impl<T, F> FusedIterator for LazyRows<T, F> where F: FnMut(&Row) -> Result<T, SqlFluentError> {}
