#![allow(dead_code)]

use sql_fluent::prelude::*;
use tempfile::tempdir;

/// Path to a fresh `SQLite` file that lives for the rest of the test binary.
pub fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

/// A `SQLite` database seeded with `script`.
pub fn seeded_sqlite(prefix: &str, script: &str) -> Result<String, SqlFluentError> {
    let connection = format!("sqlite:{}", unique_db_path(prefix));
    SqlFluent::new(connection.clone())
        .query(script)
        .execute_non_query()?;
    Ok(connection)
}

pub const CUSTOMERS: &str = "
    CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT, email TEXT, active INTEGER);
    CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER, total REAL);
    CREATE TABLE notes (id INTEGER PRIMARY KEY, customer_id INTEGER, body TEXT);
    INSERT INTO customers (id, name, email, active) VALUES
        (1, 'Ada', 'ada@example.com', 1),
        (2, 'Brian', NULL, 0),
        (3, 'Cleo', 'cleo@example.com', 1);
    INSERT INTO orders (id, customer_id, total) VALUES
        (10, 2, 12.5),
        (11, 1, 30.0),
        (12, 2, 7.25),
        (13, 9, 99.0);
    INSERT INTO notes (id, customer_id, body) VALUES
        (20, 1, 'prefers email'),
        (21, 1, 'vip'),
        (22, 3, NULL);
";

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub orders: Vec<Order>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub total: f64,
}

pub fn customer(row: &Row) -> Result<Customer, SqlFluentError> {
    Ok(Customer {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        active: row.get("active")?,
        orders: Vec::new(),
        notes: Vec::new(),
    })
}

pub fn order(row: &Row) -> Result<Order, SqlFluentError> {
    Ok(Order {
        id: row.get("id")?,
        total: row.get("total")?,
    })
}
