// SQLite backend
//
// - params: parameter conversion and per-statement binding
// - query: value extraction from rusqlite rows
// - worker: the thread that owns the connection for one execution

mod params;
mod query;
mod worker;

pub(crate) use worker::spawn_worker;
