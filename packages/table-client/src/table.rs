//! Typed table handle.

use std::marker::PhantomData;

use serde_json::Value;
use table_types::{Filter, SystemProperties};

use crate::error::Result;
use crate::json_table::JsonTable;
use crate::models::{QueryParameters, TableRow};

/// Handle for a table whose rows decode into `T`.
///
/// Rows are converted to JSON on the way out and decoded on the way back,
/// so optional system fields on `T` are filled in from the response.
pub struct Table<T> {
    inner: JsonTable,
    _row: PhantomData<fn() -> T>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _row: PhantomData,
        }
    }
}

impl<T: TableRow> Table<T> {
    pub(crate) fn new(mut inner: JsonTable) -> Self {
        inner.set_system_properties(T::system_properties());
        Self {
            inner,
            _row: PhantomData,
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// System properties requested by this handle.
    pub fn system_properties(&self) -> SystemProperties {
        self.inner.system_properties()
    }

    /// Replaces the system properties requested by this handle.
    pub fn set_system_properties(&mut self, properties: SystemProperties) {
        self.inner.set_system_properties(properties);
    }

    pub async fn insert(&self, row: &T, params: &QueryParameters) -> Result<T> {
        let stored = self.inner.insert(serde_json::to_value(row)?, params).await?;
        decode(stored)
    }

    pub async fn update(&self, row: &T, params: &QueryParameters) -> Result<T> {
        let stored = self.inner.update(serde_json::to_value(row)?, params).await?;
        decode(stored)
    }

    pub async fn lookup(&self, id: &str, params: &QueryParameters) -> Result<T> {
        decode(self.inner.lookup(id, params).await?)
    }

    pub async fn read(&self, params: &QueryParameters) -> Result<Vec<T>> {
        decode_all(self.inner.read(params).await?)
    }

    pub async fn query(&self, filter: &Filter, params: &QueryParameters) -> Result<Vec<T>> {
        decode_all(self.inner.query(filter, params).await?)
    }

    pub async fn delete(&self, row: &T) -> Result<()> {
        self.inner.delete(&serde_json::to_value(row)?).await
    }

    /// Callback form of [`insert`](Self::insert).
    pub fn insert_with_callback<F>(&self, row: T, params: &QueryParameters, callback: F)
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let table = self.clone();
        let params = params.to_vec();
        self.inner.client().runtime().spawn(async move {
            callback(table.insert(&row, &params).await);
        });
    }

    /// Callback form of [`update`](Self::update).
    pub fn update_with_callback<F>(&self, row: T, params: &QueryParameters, callback: F)
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let table = self.clone();
        let params = params.to_vec();
        self.inner.client().runtime().spawn(async move {
            callback(table.update(&row, &params).await);
        });
    }

    /// Callback form of [`lookup`](Self::lookup).
    pub fn lookup_with_callback<F>(&self, id: &str, params: &QueryParameters, callback: F)
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let table = self.clone();
        let id = id.to_string();
        let params = params.to_vec();
        self.inner.client().runtime().spawn(async move {
            callback(table.lookup(&id, &params).await);
        });
    }

    /// Callback form of [`read`](Self::read).
    pub fn read_with_callback<F>(&self, params: &QueryParameters, callback: F)
    where
        F: FnOnce(Result<Vec<T>>) + Send + 'static,
    {
        let table = self.clone();
        let params = params.to_vec();
        self.inner.client().runtime().spawn(async move {
            callback(table.read(&params).await);
        });
    }

    /// Callback form of [`query`](Self::query).
    pub fn query_with_callback<F>(&self, filter: Filter, params: &QueryParameters, callback: F)
    where
        F: FnOnce(Result<Vec<T>>) + Send + 'static,
    {
        let table = self.clone();
        let params = params.to_vec();
        self.inner.client().runtime().spawn(async move {
            callback(table.query(&filter, &params).await);
        });
    }

    /// Callback form of [`delete`](Self::delete).
    pub fn delete_with_callback<F>(&self, row: T, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let table = self.clone();
        self.inner.client().runtime().spawn(async move {
            callback(table.delete(&row).await);
        });
    }
}

fn decode<T: TableRow>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

fn decode_all<T: TableRow>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter().map(decode).collect()
}
