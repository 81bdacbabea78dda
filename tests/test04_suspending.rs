#![cfg(feature = "sqlite")]

mod common;

use common::{CUSTOMERS, Customer, customer, order, unique_db_path};
use sql_fluent::prelude::*;

async fn seeded(prefix: &str) -> Result<String, SqlFluentError> {
    let db = format!("sqlite:{}", unique_db_path(prefix));
    SqlFluent::new(db.clone())
        .query(CUSTOMERS)
        .suspending()
        .execute_non_query()
        .await?;
    Ok(db)
}

#[tokio::test]
async fn suspending_readers_match_blocking_results() -> Result<(), SqlFluentError> {
    let db = seeded("suspending").await?;

    let customers = SqlFluent::new(db.clone())
        .query("SELECT id, name, email, active FROM customers ORDER BY id")
        .suspending()
        .execute_many(customer)
        .await?;
    let blocking = tokio::task::spawn_blocking({
        let db = db.clone();
        move || {
            SqlFluent::new(db)
                .query("SELECT id, name, email, active FROM customers ORDER BY id")
                .execute_many(customer)
        }
    })
    .await
    .expect("blocking task")?;
    assert_eq!(customers, blocking);

    let single = SqlFluent::new(db.clone())
        .query("SELECT id, name, email, active FROM customers WHERE id = @id")
        .parameters()
        .parameter(Param::input("@id", DbType::Int, 2_i64))
        .end()
        .suspending()
        .execute_single(customer)
        .await?;
    assert_eq!(single.map(|c| c.name), Some("Brian".to_string()));

    let count = SqlFluent::new(db)
        .query("SELECT COUNT(*) FROM orders")
        .suspending()
        .execute_scalar()
        .await?;
    assert_eq!(count, Some(SqlValue::Int(4)));
    Ok(())
}

#[tokio::test]
async fn suspending_cascade_and_multi() -> Result<(), SqlFluentError> {
    let db = seeded("suspending_cascade").await?;

    let customers = SqlFluent::new(db.clone())
        .query(
            "SELECT id, name, email, active FROM customers ORDER BY id;
             SELECT id, customer_id, total FROM orders ORDER BY id;",
        )
        .suspending()
        .cascade()
        .primary(customer)
        .level(|row, parent: &mut Customer| {
            parent.orders.push(order(row)?);
            Ok(())
        })
        .end()
        .selector(|row| {
            let customer_id: i64 = row.get("customer_id")?;
            Ok(move |parent: &Customer| parent.id == customer_id)
        })
        .execute_many()
        .await?;
    let counts: Vec<usize> = customers.iter().map(|c| c.orders.len()).collect();
    assert_eq!(counts, vec![1, 2, 0]);

    let first = SqlFluent::new(db.clone())
        .query(
            "SELECT id, name, email, active FROM customers WHERE id = 2;
             SELECT id, total FROM orders WHERE customer_id = 2;",
        )
        .suspending()
        .cascade()
        .primary(customer)
        .level(|row, parent: &mut Customer| {
            parent.orders.push(order(row)?);
            Ok(())
        })
        .end()
        .execute_single()
        .await?;
    assert_eq!(first.map(|c| c.orders.len()), Some(2));

    let results = SqlFluent::new(db)
        .query("SELECT name FROM customers ORDER BY id; SELECT total FROM orders ORDER BY id;")
        .suspending()
        .multi()
        .reader("names", |row| row.get::<String>("name"))
        .reader("totals", |row| row.get::<f64>("total"))
        .execute()
        .await?;
    assert_eq!(results.get::<String>("names").len(), 3);
    assert_eq!(results.get::<f64>("totals"), &[12.5, 30.0, 7.25, 99.0]);
    Ok(())
}

#[tokio::test]
async fn suspending_futures_can_be_spawned() -> Result<(), SqlFluentError> {
    let db = seeded("suspending_spawn").await?;
    let handle = tokio::spawn(async move {
        SqlFluent::new(db)
            .query("SELECT name FROM customers WHERE active = 1 ORDER BY id")
            .suspending()
            .execute_many(|row| row.get::<String>("name"))
            .await
    });
    let names = handle.await.expect("join")?;
    assert_eq!(names, vec!["Ada".to_string(), "Cleo".to_string()]);
    Ok(())
}
