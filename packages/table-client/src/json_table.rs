//! Table handle for raw JSON rows.

use reqwest::Method;
use serde_json::{Map, Value};
use table_types::{Filter, SystemProperties, SystemProperty, FILTER_PARAMETER, ID_FIELD};

use crate::client::MobileServiceClient;
use crate::error::{ClientError, Result};
use crate::models::{effective_parameters, QueryParameters};

/// Handle for a table whose rows are JSON objects.
///
/// The handle's system-property set is sent with every call unless the
/// call's own parameters carry `__systemproperties`.
#[derive(Clone)]
pub struct JsonTable {
    client: MobileServiceClient,
    name: String,
    system_properties: SystemProperties,
}

impl JsonTable {
    pub(crate) fn new(client: MobileServiceClient, name: String) -> Self {
        Self {
            client,
            name,
            system_properties: SystemProperties::none(),
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn client(&self) -> &MobileServiceClient {
        &self.client
    }

    /// System properties requested by this handle.
    pub fn system_properties(&self) -> SystemProperties {
        self.system_properties
    }

    /// Replaces the system properties requested by this handle.
    pub fn set_system_properties(&mut self, properties: SystemProperties) {
        self.system_properties = properties;
    }

    fn parameters(&self, params: &QueryParameters) -> Vec<(String, String)> {
        effective_parameters(params, self.system_properties)
    }

    /// Inserts a row. System fields in `row` are dropped before sending.
    pub async fn insert(&self, row: Value, params: &QueryParameters) -> Result<Value> {
        let (body, _) = prepare_row(row)?;
        self.client
            .send(
                Method::POST,
                &self.client.table_url(&self.name),
                &self.parameters(params),
                Some(&body),
                None,
            )
            .await
    }

    /// Updates a row identified by its `id`.
    ///
    /// When the row carries a `__version`, the update only succeeds if the
    /// server's version still matches; otherwise the service answers with
    /// [`ClientError::PreconditionFailed`].
    pub async fn update(&self, row: Value, params: &QueryParameters) -> Result<Value> {
        let (body, version) = prepare_row(row)?;
        let id = row_id(&body)?;
        self.client
            .send(
                Method::PATCH,
                &self.client.row_url(&self.name, &id),
                &self.parameters(params),
                Some(&body),
                version.as_deref(),
            )
            .await
    }

    /// Fetches one row by id.
    pub async fn lookup(&self, id: &str, params: &QueryParameters) -> Result<Value> {
        self.client
            .send(
                Method::GET,
                &self.client.row_url(&self.name, id),
                &self.parameters(params),
                None,
                None,
            )
            .await
    }

    /// Reads every row of the table.
    pub async fn read(&self, params: &QueryParameters) -> Result<Vec<Value>> {
        self.fetch(None, params).await
    }

    /// Reads the rows matching `filter`.
    pub async fn query(&self, filter: &Filter, params: &QueryParameters) -> Result<Vec<Value>> {
        self.fetch(Some(filter), params).await
    }

    async fn fetch(&self, filter: Option<&Filter>, params: &QueryParameters) -> Result<Vec<Value>> {
        let mut pairs = self.parameters(params);
        if let Some(filter) = filter {
            pairs.push((FILTER_PARAMETER.to_string(), filter.to_string()));
        }
        let data = self
            .client
            .send(
                Method::GET,
                &self.client.table_url(&self.name),
                &pairs,
                None,
                None,
            )
            .await?;
        match data {
            Value::Object(mut page) => match page.remove("results") {
                Some(Value::Array(rows)) => Ok(rows),
                _ => Err(ClientError::Service {
                    status: 200,
                    message: "query response has no results".to_string(),
                }),
            },
            Value::Array(rows) => Ok(rows),
            _ => Err(ClientError::Service {
                status: 200,
                message: "unexpected query response".to_string(),
            }),
        }
    }

    /// Deletes the row identified by `row`'s id.
    pub async fn delete(&self, row: &Value) -> Result<()> {
        let id = row_id(row)?;
        self.delete_by_id(&id).await
    }

    /// Deletes a row by id.
    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.client
            .send(
                Method::DELETE,
                &self.client.row_url(&self.name, id),
                &[],
                None,
                None,
            )
            .await
            .map(|_| ())
    }

    /// Callback form of [`insert`](Self::insert).
    pub fn insert_with_callback<F>(&self, row: Value, params: &QueryParameters, callback: F)
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        let table = self.clone();
        let params = params.to_vec();
        self.client.runtime().spawn(async move {
            callback(table.insert(row, &params).await);
        });
    }

    /// Callback form of [`update`](Self::update).
    pub fn update_with_callback<F>(&self, row: Value, params: &QueryParameters, callback: F)
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        let table = self.clone();
        let params = params.to_vec();
        self.client.runtime().spawn(async move {
            callback(table.update(row, &params).await);
        });
    }

    /// Callback form of [`lookup`](Self::lookup).
    pub fn lookup_with_callback<F>(&self, id: &str, params: &QueryParameters, callback: F)
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        let table = self.clone();
        let id = id.to_string();
        let params = params.to_vec();
        self.client.runtime().spawn(async move {
            callback(table.lookup(&id, &params).await);
        });
    }

    /// Callback form of [`read`](Self::read).
    pub fn read_with_callback<F>(&self, params: &QueryParameters, callback: F)
    where
        F: FnOnce(Result<Vec<Value>>) + Send + 'static,
    {
        let table = self.clone();
        let params = params.to_vec();
        self.client.runtime().spawn(async move {
            callback(table.read(&params).await);
        });
    }

    /// Callback form of [`query`](Self::query).
    pub fn query_with_callback<F>(&self, filter: Filter, params: &QueryParameters, callback: F)
    where
        F: FnOnce(Result<Vec<Value>>) + Send + 'static,
    {
        let table = self.clone();
        let params = params.to_vec();
        self.client.runtime().spawn(async move {
            callback(table.query(&filter, &params).await);
        });
    }

    /// Callback form of [`delete`](Self::delete).
    pub fn delete_with_callback<F>(&self, row: Value, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let table = self.clone();
        self.client.runtime().spawn(async move {
            callback(table.delete(&row).await);
        });
    }
}

/// Splits a row into the body to send and the version it carried.
///
/// System fields are server-managed and never sent.
fn prepare_row(row: Value) -> Result<(Value, Option<String>)> {
    let Value::Object(mut fields) = row else {
        return Err(ClientError::InvalidRow("row must be a JSON object".to_string()));
    };
    let version = match fields.remove(SystemProperty::Version.field_name()) {
        Some(Value::String(v)) => Some(v),
        _ => None,
    };
    strip_system_fields(&mut fields);
    Ok((Value::Object(fields), version))
}

fn strip_system_fields(fields: &mut Map<String, Value>) {
    for property in SystemProperty::ALL {
        fields.remove(property.field_name());
    }
}

fn row_id(row: &Value) -> Result<String> {
    match row.get(ID_FIELD) {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Null) | None => Err(ClientError::InvalidRow(
            "row has no id".to_string(),
        )),
        Some(other) => Err(ClientError::InvalidRow(format!(
            "row id must be a non-empty string, got {}",
            other
        ))),
    }
}
