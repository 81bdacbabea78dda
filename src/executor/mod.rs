//! One execution routine shared by the blocking and suspending disciplines.
//!
//! Each entry point opens a [`Session`](crate::session::Session), runs one assembler
//! against it and finishes it. Any early return drops the session, which releases the
//! connection.

mod assemble;
mod execution;

pub(crate) use assemble::{LevelMapper, PrimaryMapper};
pub(crate) use execution::{Execution, Running, TargetSource};

use std::collections::HashSet;

use crate::error::SqlFluentError;
use crate::results::{MultiResults, Row, RowSink};
use crate::types::SqlValue;

pub(crate) async fn non_query(execution: Execution) -> Result<(), SqlFluentError> {
    execution.start().await?.complete().await
}

pub(crate) async fn single<T, F>(execution: Execution, mapper: F) -> Result<Option<T>, SqlFluentError>
where
    F: FnMut(&Row) -> Result<T, SqlFluentError>,
{
    let mut running = execution.start().await?;
    let item = assemble::single(&mut running.session, mapper).await?;
    running.complete().await?;
    Ok(item)
}

pub(crate) async fn many<T, F>(execution: Execution, mapper: F) -> Result<Vec<T>, SqlFluentError>
where
    F: FnMut(&Row) -> Result<T, SqlFluentError>,
{
    let mut running = execution.start().await?;
    let items = assemble::many(&mut running.session, mapper).await?;
    running.complete().await?;
    Ok(items)
}

pub(crate) async fn scalar(execution: Execution) -> Result<Option<SqlValue>, SqlFluentError> {
    let mut running = execution.start().await?;
    let value = assemble::scalar(&mut running.session).await?;
    running.complete().await?;
    Ok(value)
}

pub(crate) async fn cascade_single<P>(
    execution: Execution,
    primary: PrimaryMapper<P>,
    levels: Vec<LevelMapper<P>>,
) -> Result<Option<P>, SqlFluentError> {
    let mut running = execution.start().await?;
    let parent = assemble::cascade_single(&mut running.session, primary, levels).await?;
    running.complete().await?;
    Ok(parent)
}

pub(crate) async fn cascade_many<P, S, Q>(
    execution: Execution,
    primary: PrimaryMapper<P>,
    levels: Vec<LevelMapper<P>>,
    selector: S,
) -> Result<Vec<P>, SqlFluentError>
where
    S: FnMut(&Row) -> Result<Q, SqlFluentError>,
    Q: Fn(&P) -> bool,
{
    let mut running = execution.start().await?;
    let parents = assemble::cascade_many(&mut running.session, primary, levels, selector).await?;
    running.complete().await?;
    Ok(parents)
}

pub(crate) async fn multi(
    execution: Execution,
    readers: Vec<(String, Box<dyn RowSink>)>,
) -> Result<MultiResults, SqlFluentError> {
    reject_duplicate_keys(&readers)?;
    let mut running = execution.start().await?;
    let results = assemble::multi(&mut running.session, readers).await?;
    running.complete().await?;
    Ok(results)
}

fn reject_duplicate_keys(readers: &[(String, Box<dyn RowSink>)]) -> Result<(), SqlFluentError> {
    let mut seen = HashSet::with_capacity(readers.len());
    match readers.iter().find(|(key, _)| !seen.insert(key.as_str())) {
        Some((key, _)) => Err(SqlFluentError::ConfigError(format!(
            "multi reader key `{key}` is registered more than once"
        ))),
        None => Ok(()),
    }
}
