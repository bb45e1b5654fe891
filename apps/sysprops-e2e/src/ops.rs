//! Blocking table operations built on [`wait_for`].
//!
//! Each helper starts the callback form of a client operation and waits
//! for its single completion. `params` are extra query-string pairs for
//! the call; pass `&[]` for none.

use serde_json::Value;
use table_client::{Filter, JsonTable, QueryParameters, Table, TableRow};

use crate::adapter::wait_for;
use crate::error::HarnessError;

pub fn insert<T: TableRow>(
    table: &Table<T>,
    row: T,
    params: &QueryParameters,
) -> Result<T, HarnessError> {
    wait_for(|done| table.insert_with_callback(row, params, move |r| done.complete(r)))
}

/// Reads the whole table.
pub fn read<T: TableRow>(table: &Table<T>, params: &QueryParameters) -> Result<Vec<T>, HarnessError> {
    wait_for(|done| table.read_with_callback(params, move |r| done.complete(r)))
}

pub fn query<T: TableRow>(
    table: &Table<T>,
    filter: Filter,
    params: &QueryParameters,
) -> Result<Vec<T>, HarnessError> {
    wait_for(|done| table.query_with_callback(filter, params, move |r| done.complete(r)))
}

pub fn lookup<T: TableRow>(
    table: &Table<T>,
    id: &str,
    params: &QueryParameters,
) -> Result<T, HarnessError> {
    wait_for(|done| table.lookup_with_callback(id, params, move |r| done.complete(r)))
}

/// Updates a row; a row carrying a version is only applied if it is current.
pub fn update<T: TableRow>(
    table: &Table<T>,
    row: T,
    params: &QueryParameters,
) -> Result<T, HarnessError> {
    wait_for(|done| table.update_with_callback(row, params, move |r| done.complete(r)))
}

pub fn delete<T: TableRow>(table: &Table<T>, row: T) -> Result<(), HarnessError> {
    wait_for(|done| table.delete_with_callback(row, move |r| done.complete(r)))
}

pub fn insert_json(
    table: &JsonTable,
    row: Value,
    params: &QueryParameters,
) -> Result<Value, HarnessError> {
    wait_for(|done| table.insert_with_callback(row, params, move |r| done.complete(r)))
}

pub fn update_json(
    table: &JsonTable,
    row: Value,
    params: &QueryParameters,
) -> Result<Value, HarnessError> {
    wait_for(|done| table.update_with_callback(row, params, move |r| done.complete(r)))
}
