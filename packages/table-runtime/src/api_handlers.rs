//! Applies API requests to the database.

use std::sync::Arc;

use serde_json::{json, Value};
use table_core::{Database, ServiceConfig};

use crate::api_request::{ApiRequest, QueryParams};
use crate::Result;

/// Executes [`ApiRequest`]s against a [`Database`].
#[derive(Debug, Clone)]
pub struct ApiHandlers {
    database: Arc<Database>,
    max_top: usize,
}

impl ApiHandlers {
    /// Creates handlers for the given database.
    pub fn new(database: Arc<Database>, config: &ServiceConfig) -> Self {
        Self {
            database,
            max_top: config.max_top,
        }
    }

    /// Applies one request and sends the outcome on its response channel.
    ///
    /// A receiver that has gone away (client timed out) is not an error.
    pub fn handle_api_request(&self, req: ApiRequest) {
        match req {
            ApiRequest::Insert {
                table,
                row,
                properties,
                response,
            } => {
                tracing::debug!("Insert into {} (system properties: {})", table, properties);
                let _ = response.send(self.database.insert(&table, row, properties));
            }
            ApiRequest::Update {
                table,
                id,
                patch,
                if_match,
                properties,
                response,
            } => {
                tracing::debug!(
                    "Update {} in {} (if-match: {:?}, system properties: {})",
                    id,
                    table,
                    if_match,
                    properties
                );
                let result =
                    self.database
                        .update(&table, &id, patch, if_match.as_deref(), properties);
                if let Err(e) = &result {
                    tracing::debug!("Update of {} in {} rejected: {}", id, table, e);
                }
                let _ = response.send(result);
            }
            ApiRequest::Lookup {
                table,
                id,
                properties,
                response,
            } => {
                tracing::debug!("Lookup {} in {}", id, table);
                let _ = response.send(self.database.lookup(&table, &id, properties));
            }
            ApiRequest::Query {
                table,
                query,
                response,
            } => {
                tracing::debug!("Query {}: {:?}", table, query);
                let _ = response.send(self.handle_query(&table, query));
            }
            ApiRequest::Delete {
                table,
                id,
                response,
            } => {
                tracing::debug!("Delete {} from {}", id, table);
                let result = self.database.delete(&table, &id).map(|()| Value::Null);
                let _ = response.send(result);
            }
        }
    }

    fn handle_query(&self, table: &str, query: QueryParams) -> Result<Value> {
        let top = query.top.map_or(self.max_top, |t| t.min(self.max_top));
        let skip = query.skip.unwrap_or(0);
        let results = self
            .database
            .query(table, query.filter.as_ref(), skip, top, query.properties)?;
        Ok(json!({
            "count": results.len(),
            "results": results,
        }))
    }
}
