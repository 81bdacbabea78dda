#![cfg(feature = "test-utils")]

use std::sync::{Arc, Mutex};

use sql_fluent::prelude::*;
use sql_fluent::test_utils::{self, Script, ScriptedResultSet};

fn capture() -> (Arc<Mutex<Option<ParameterSet>>>, impl FnOnce(&ParameterSet) + Send + 'static) {
    let slot = Arc::new(Mutex::new(None));
    let writer = Arc::clone(&slot);
    (slot, move |params: &ParameterSet| {
        *writer.lock().unwrap() = Some(params.clone());
    })
}

#[test]
fn output_parameters_come_back_as_reported() -> Result<(), SqlFluentError> {
    test_utils::install(
        "params-proc",
        Script::new()
            .output("@total", 1234.5)
            .output("@label", "  padded  ")
            .output("@RETURN_VALUE", 3_i64),
    );
    let (slot, callback) = capture();

    SqlFluent::new("scripted:params-proc")
        .stored_procedure("dbo.usp_close_month")
        .parameters()
        .parameter(Param::input("@month", DbType::Int, 5_i64))
        .parameter(Param::output("@total", DbType::Decimal))
        .parameter(Param::input_output("@label", DbType::NVarChar, "draft").size(20))
        .parameter(Param::return_value("@RETURN_VALUE", DbType::Int))
        .end()
        .post_execute(callback)
        .execute_non_query()?;

    let params = slot.lock().unwrap().take().expect("callback ran");
    assert_eq!(params.len(), 4);
    assert_eq!(params.value::<f64>("@total")?, 1234.5);
    assert_eq!(params.value::<String>("label")?, "  padded  ");
    assert_eq!(params.value::<i32>("@RETURN_VALUE")?, 3);
    // inputs are untouched
    assert_eq!(params.value::<i64>("@month")?, 5);

    let executed = test_utils::executed_commands("params-proc");
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].kind, CommandKind::StoredProcedure);
    assert_eq!(executed[0].text, "dbo.usp_close_month");
    Ok(())
}

#[test]
fn reported_outputs_never_overwrite_inputs() -> Result<(), SqlFluentError> {
    test_utils::install(
        "params-input-only",
        Script::new().output("@id", 99_i64),
    );
    let (slot, callback) = capture();
    SqlFluent::new("scripted:params-input-only")
        .query("DELETE FROM t WHERE id = @id")
        .parameters()
        .parameter(Param::input("@id", DbType::Int, 1_i64))
        .end()
        .post_execute(callback)
        .execute_non_query()?;
    let params = slot.lock().unwrap().take().expect("callback ran");
    assert_eq!(params.value::<i64>("@id")?, 1);
    Ok(())
}

#[test]
fn post_execute_runs_for_readers_too() -> Result<(), SqlFluentError> {
    test_utils::install(
        "params-reader",
        Script::new()
            .result_set(ScriptedResultSet::new(&["id"]).row(vec![SqlValue::Int(1)]))
            .output("@count", 1_i64),
    );
    let (slot, callback) = capture();
    let ids = SqlFluent::new("scripted:params-reader")
        .query("SELECT id FROM t; SET @count = @@ROWCOUNT")
        .parameters()
        .parameter(Param::output("@count", DbType::Int))
        .end()
        .post_execute(callback)
        .execute_many(|row| row.get::<i64>("id"))?;
    assert_eq!(ids, vec![1]);
    let params = slot.lock().unwrap().take().expect("callback ran");
    assert_eq!(params.value::<i64>("@count")?, 1);
    Ok(())
}

#[test]
fn post_execute_skipped_when_execution_fails() {
    test_utils::install(
        "params-failing",
        Script::new()
            .result_set(
                ScriptedResultSet::new(&["id"])
                    .row(vec![SqlValue::Int(1)])
                    .row(vec![SqlValue::Int(2)]),
            )
            .fail_after_rows(1, "connection reset"),
    );
    let (slot, callback) = capture();
    let err = SqlFluent::new("scripted:params-failing")
        .query("SELECT id FROM t")
        .post_execute(callback)
        .execute_many(|row| row.get::<i64>("id"))
        .unwrap_err();
    assert!(matches!(err, SqlFluentError::ExecutionError(_)));
    assert!(slot.lock().unwrap().is_none());
    assert_eq!(test_utils::open_connections("params-failing"), 0);
}

#[test]
fn refused_connections_surface_unchanged() {
    test_utils::install("params-refused", Script::new().fail_on_open("login failed"));
    let err = SqlFluent::new("scripted:params-refused")
        .query("SELECT 1")
        .execute_scalar()
        .unwrap_err();
    match err {
        SqlFluentError::ConnectionError(message) => assert_eq!(message, "login failed"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn parameter_if_evaluates_at_bind_time() -> Result<(), SqlFluentError> {
    test_utils::install("params-conditional", Script::new());
    let include_archived = false;
    SqlFluent::new("scripted:params-conditional")
        .query("SELECT * FROM t WHERE name = @name AND (@archived IS NULL OR archived = @archived)")
        .parameters()
        .parameter(Param::input("@name", DbType::NVarChar, "ada"))
        .parameter_if(|| include_archived, Param::input("@archived", DbType::Bit, true))
        .parameter_if(|| true, Param::input("@limit", DbType::Int, 10_i64))
        .end()
        .execute_non_query()?;

    let executed = test_utils::executed_commands("params-conditional");
    let names: Vec<&str> = executed[0].parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["@name", "@limit"]);
    Ok(())
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_reports_bound_values() -> Result<(), SqlFluentError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = format!("sqlite:{}", dir.path().join("params.db").display());
    let (slot, callback) = capture();
    SqlFluent::new(db)
        .query("CREATE TABLE t (id INTEGER); INSERT INTO t (id) VALUES (@id);")
        .parameters()
        .parameter(Param::input("@id", DbType::Int, 7_i64))
        .parameter(Param::output("@ignored", DbType::Int))
        .end()
        .post_execute(callback)
        .execute_non_query()?;
    let params = slot.lock().unwrap().take().expect("callback ran");
    assert_eq!(params.value::<i64>("@id")?, 7);
    assert_eq!(params.value::<i64>("@ignored")?, 0);
    Ok(())
}
