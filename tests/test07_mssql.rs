#![cfg(feature = "mssql")]

//! Runs against a live SQL Server when `SQL_FLUENT_MSSQL` holds an ADO connection string,
//! e.g. `Server=tcp:localhost,1433;User Id=sa;Password=...;TrustServerCertificate=true`.

use sql_fluent::prelude::*;

fn connection() -> Option<String> {
    std::env::var("SQL_FLUENT_MSSQL").ok().map(|ado| format!("mssql://{ado}"))
}

#[test]
fn procedure_outputs_and_return_value() -> Result<(), SqlFluentError> {
    let Some(db) = connection() else {
        eprintln!("SQL_FLUENT_MSSQL not set; skipping");
        return Ok(());
    };

    SqlFluent::new(db.clone())
        .query(
            "CREATE OR ALTER PROCEDURE dbo.sql_fluent_double
                @input INT, @doubled INT OUTPUT, @label NVARCHAR(20) OUTPUT
             AS BEGIN
                SELECT @input AS original;
                SET @doubled = @input * 2;
                SET @label = @label + N'!';
                RETURN 7;
             END",
        )
        .execute_non_query()?;

    let outputs = std::sync::Arc::new(std::sync::Mutex::new(None));
    let sink = std::sync::Arc::clone(&outputs);
    let original = SqlFluent::new(db)
        .stored_procedure("dbo.sql_fluent_double")
        .parameters()
        .parameter(Param::input("@input", DbType::Int, 21_i64))
        .parameter(Param::output("@doubled", DbType::Int))
        .parameter(Param::input_output("@label", DbType::NVarChar, "hi").size(20))
        .parameter(Param::return_value("@RETURN_VALUE", DbType::Int))
        .end()
        .post_execute(move |params| {
            *sink.lock().unwrap() = Some(params.clone());
        })
        .execute_single(|row| row.get::<i64>("original"))?;

    assert_eq!(original, Some(21));
    let params: ParameterSet = outputs.lock().unwrap().take().expect("callback ran");
    assert_eq!(params.value::<i64>("@doubled")?, 42);
    assert_eq!(params.value::<String>("@label")?, "hi!");
    assert_eq!(params.value::<i64>("@RETURN_VALUE")?, 7);
    Ok(())
}

#[test]
fn text_batches_yield_multiple_result_sets() -> Result<(), SqlFluentError> {
    let Some(db) = connection() else {
        return Ok(());
    };
    let results = SqlFluent::new(db)
        .query("SELECT @a AS n; SELECT @a + 1 AS n UNION ALL SELECT @a + 2;")
        .parameters()
        .parameter(Param::input("@a", DbType::Int, 1_i64))
        .end()
        .multi()
        .reader("first", |row| row.get::<i64>("n"))
        .reader("second", |row| row.get::<i64>("n"))
        .execute()?;
    assert_eq!(results.get::<i64>("first"), &[1]);
    assert_eq!(results.get::<i64>("second"), &[2, 3]);
    Ok(())
}
