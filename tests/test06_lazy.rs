#![cfg(feature = "test-utils")]

use std::time::Duration;

use sql_fluent::prelude::*;
use sql_fluent::test_utils::{self, Script, ScriptedResultSet};

fn numbered(name: &str, count: i64) {
    let set = (1..=count).fold(ScriptedResultSet::new(&["n"]), |set, n| {
        set.row(vec![SqlValue::Int(n)])
    });
    test_utils::install(name, Script::new().result_set(set));
}

#[test]
fn rows_are_fetched_on_demand() -> Result<(), SqlFluentError> {
    numbered("lazy-demand", 5);
    let mut rows = SqlFluent::new("scripted:lazy-demand")
        .query("SELECT n FROM numbers")
        .execute_lazy(|row| row.get::<i64>("n"))?;

    assert_eq!(test_utils::rows_fetched("lazy-demand"), 0);
    assert_eq!(rows.next().transpose()?, Some(1));
    assert_eq!(rows.next().transpose()?, Some(2));
    assert_eq!(test_utils::rows_fetched("lazy-demand"), 2);
    assert_eq!(test_utils::open_connections("lazy-demand"), 1);

    let rest: Vec<i64> = rows.by_ref().collect::<Result<_, _>>()?;
    assert_eq!(rest, vec![3, 4, 5]);
    assert!(!rows.is_open());
    assert_eq!(test_utils::open_connections("lazy-demand"), 0);
    // forward-only: an exhausted sequence stays exhausted
    assert!(rows.next().is_none());
    Ok(())
}

#[test]
fn dropping_the_sequence_releases_the_connection() -> Result<(), SqlFluentError> {
    numbered("lazy-drop", 3);
    let mut rows = SqlFluent::new("scripted:lazy-drop")
        .query("SELECT n FROM numbers")
        .execute_lazy(|row| row.get::<i64>("n"))?;
    assert_eq!(rows.next().transpose()?, Some(1));
    drop(rows);

    assert!(test_utils::wait_for_release("lazy-drop", Duration::from_secs(5)));
    assert_eq!(test_utils::rows_fetched("lazy-drop"), 1);
    Ok(())
}

#[test]
fn close_stops_early() -> Result<(), SqlFluentError> {
    numbered("lazy-close", 3);
    let mut rows = SqlFluent::new("scripted:lazy-close")
        .query("SELECT n FROM numbers")
        .execute_lazy(|row| row.get::<i64>("n"))?;
    assert_eq!(rows.next().transpose()?, Some(1));
    rows.close();
    assert!(test_utils::wait_for_release("lazy-close", Duration::from_secs(5)));
    Ok(())
}

#[test]
fn mapper_error_ends_the_sequence() -> Result<(), SqlFluentError> {
    numbered("lazy-error", 3);
    let mut rows = SqlFluent::new("scripted:lazy-error")
        .query("SELECT n FROM numbers")
        .execute_lazy(|row| {
            let n: i64 = row.get("n")?;
            if n == 2 {
                return Err(SqlFluentError::mapping("two is not allowed"));
            }
            Ok(n)
        })?;
    assert_eq!(rows.next().transpose()?, Some(1));
    assert!(matches!(rows.next(), Some(Err(SqlFluentError::Mapping(_)))));
    assert!(rows.next().is_none());
    assert!(test_utils::wait_for_release("lazy-error", Duration::from_secs(5)));
    Ok(())
}

#[test]
fn post_execute_runs_once_exhausted() -> Result<(), SqlFluentError> {
    numbered("lazy-post", 2);
    let (tx, rx) = std::sync::mpsc::channel();
    let rows = SqlFluent::new("scripted:lazy-post")
        .query("SELECT n FROM numbers")
        .post_execute(move |params| {
            let _ = tx.send(params.len());
        })
        .execute_lazy(|row| row.get::<i64>("n"))?;
    let total: i64 = rows.map(|n| n.unwrap_or_default()).sum();
    assert_eq!(total, 3);
    assert_eq!(rx.try_recv().ok(), Some(0));
    Ok(())
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_abandoned_batch_skips_later_statements() -> Result<(), SqlFluentError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lazy.db").to_string_lossy().into_owned();
    let db = || {
        SqlFluent::with_target(SqliteOptions::new(path.clone()).with_busy_timeout(5_000).into())
    };
    db()
        .query(
            "CREATE TABLE numbers (n INTEGER);
             INSERT INTO numbers (n) VALUES (1), (2), (3);
             CREATE TABLE audit (note TEXT);",
        )
        .execute_non_query()?;

    let mut rows = db()
        .query("SELECT n FROM numbers ORDER BY n; INSERT INTO audit (note) VALUES ('finished');")
        .execute_lazy(|row| row.get::<i64>("n"))?;
    assert_eq!(rows.next().transpose()?, Some(1));
    drop(rows);

    let audited = db()
        .query("SELECT COUNT(*) FROM audit")
        .execute_scalar()?;
    assert_eq!(audited, Some(SqlValue::Int(0)));

    let all: Vec<i64> = db()
        .query("SELECT n FROM numbers ORDER BY n; INSERT INTO audit (note) VALUES ('finished');")
        .execute_lazy(|row| row.get::<i64>("n"))?
        .collect::<Result<_, _>>()?;
    assert_eq!(all, vec![1, 2, 3]);

    let audited = db()
        .query("SELECT COUNT(*) FROM audit")
        .execute_scalar()?;
    assert_eq!(audited, Some(SqlValue::Int(1)));
    Ok(())
}
