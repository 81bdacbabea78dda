// MSSQL backend
//
// - batch: rewrites a command into one T-SQL batch (named parameters, EXEC, outputs)
// - params: binding values to the tiberius query
// - query: value extraction from tiberius rows
// - worker: the thread (and runtime) that owns the client for one execution

mod batch;
mod params;
mod query;
mod worker;

pub(crate) use worker::spawn_worker;
