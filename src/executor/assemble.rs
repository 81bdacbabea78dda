use crate::error::SqlFluentError;
use crate::results::{MultiResults, Row, RowSink};
use crate::session::Session;
use crate::types::SqlValue;

/// Maps one row of the first result set into a cascade parent.
pub(crate) type PrimaryMapper<P> = Box<dyn FnMut(&Row) -> Result<P, SqlFluentError> + Send>;

/// Attaches one row of a child result set to its parent.
pub(crate) type LevelMapper<P> =
    Box<dyn FnMut(&Row, &mut P) -> Result<(), SqlFluentError> + Send>;

pub(super) async fn single<T, F>(
    session: &mut Session,
    mut mapper: F,
) -> Result<Option<T>, SqlFluentError>
where
    F: FnMut(&Row) -> Result<T, SqlFluentError>,
{
    match session.next_row().await? {
        Some(row) => mapper(&row).map(Some),
        None => Ok(None),
    }
}

pub(super) async fn many<T, F>(session: &mut Session, mut mapper: F) -> Result<Vec<T>, SqlFluentError>
where
    F: FnMut(&Row) -> Result<T, SqlFluentError>,
{
    let mut items = Vec::new();
    while let Some(row) = session.next_row().await? {
        items.push(mapper(&row)?);
    }
    Ok(items)
}

pub(super) async fn scalar(session: &mut Session) -> Result<Option<SqlValue>, SqlFluentError> {
    Ok(session
        .next_row()
        .await?
        .and_then(|row| row.into_values().into_iter().next()))
}

/// Apply every row of the current result set to `parent`.
async fn attach<P>(
    session: &mut Session,
    level: &mut LevelMapper<P>,
    parent: &mut P,
) -> Result<(), SqlFluentError> {
    while let Some(row) = session.next_row().await? {
        level(&row, parent)?;
    }
    Ok(())
}

pub(super) async fn cascade_single<P>(
    session: &mut Session,
    mut primary: PrimaryMapper<P>,
    mut levels: Vec<LevelMapper<P>>,
) -> Result<Option<P>, SqlFluentError> {
    let Some(row) = session.next_row().await? else {
        return Ok(None);
    };
    let mut parent = primary(&row)?;
    for level in &mut levels {
        if !session.next_result().await? {
            break;
        }
        attach(session, level, &mut parent).await?;
    }
    Ok(Some(parent))
}

pub(super) async fn cascade_many<P, S, Q>(
    session: &mut Session,
    primary: PrimaryMapper<P>,
    mut levels: Vec<LevelMapper<P>>,
    mut selector: S,
) -> Result<Vec<P>, SqlFluentError>
where
    S: FnMut(&Row) -> Result<Q, SqlFluentError>,
    Q: Fn(&P) -> bool,
{
    let mut parents = many(session, primary).await?;
    for level in &mut levels {
        if !session.next_result().await? {
            break;
        }
        while let Some(row) = session.next_row().await? {
            let matches = selector(&row)?;
            match parents.iter_mut().find(|parent| matches(&**parent)) {
                Some(parent) => level(&row, parent)?,
                None => tracing::trace!("child row matched no parent; dropped"),
            }
        }
    }
    Ok(parents)
}

/// Readers pair with result sets by position; a reader past the last set gets nothing.
pub(super) async fn multi(
    session: &mut Session,
    readers: Vec<(String, Box<dyn RowSink>)>,
) -> Result<MultiResults, SqlFluentError> {
    let mut results = MultiResults::default();
    let mut positioned = true;
    for (index, (key, mut sink)) in readers.into_iter().enumerate() {
        if index > 0 && positioned {
            positioned = session.next_result().await?;
        }
        if positioned {
            while let Some(row) = session.next_row().await? {
                sink.push(&row)?;
            }
        }
        results.insert(key, sink.into_rows());
    }
    Ok(results)
}
