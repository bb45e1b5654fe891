//! Requests sent from the HTTP layer to the runtime.

use serde_json::Value;
use table_types::{Filter, SystemProperties};

use crate::ResponseSender;

/// Query options for a table read.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// Row predicate
    pub filter: Option<Filter>,
    /// Maximum rows to return; capped by the service's `max_top`
    pub top: Option<usize>,
    /// Matching rows to skip
    pub skip: Option<usize>,
    /// System fields to include in each row
    pub properties: SystemProperties,
}

/// API request from the REST server
#[derive(Debug)]
pub enum ApiRequest {
    /// Insert a row; the table is created on first insert
    Insert {
        table: String,
        row: Value,
        properties: SystemProperties,
        response: ResponseSender,
    },
    /// Partially update a row
    Update {
        table: String,
        id: String,
        patch: Value,
        /// Version the client last saw, if it sent one
        if_match: Option<String>,
        properties: SystemProperties,
        response: ResponseSender,
    },
    /// Fetch a row by id
    Lookup {
        table: String,
        id: String,
        properties: SystemProperties,
        response: ResponseSender,
    },
    /// Read rows matching a query
    Query {
        table: String,
        query: QueryParams,
        response: ResponseSender,
    },
    /// Delete a row by id
    Delete {
        table: String,
        id: String,
        response: ResponseSender,
    },
}

impl ApiRequest {
    /// Short operation name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiRequest::Insert { .. } => "insert",
            ApiRequest::Update { .. } => "update",
            ApiRequest::Lookup { .. } => "lookup",
            ApiRequest::Query { .. } => "query",
            ApiRequest::Delete { .. } => "delete",
        }
    }

    /// Name of the table the request targets.
    pub fn table(&self) -> &str {
        match self {
            ApiRequest::Insert { table, .. }
            | ApiRequest::Update { table, .. }
            | ApiRequest::Lookup { table, .. }
            | ApiRequest::Query { table, .. }
            | ApiRequest::Delete { table, .. } => table,
        }
    }

    /// Consumes the request, returning its response channel.
    pub fn into_response(self) -> ResponseSender {
        match self {
            ApiRequest::Insert { response, .. }
            | ApiRequest::Update { response, .. }
            | ApiRequest::Lookup { response, .. }
            | ApiRequest::Query { response, .. }
            | ApiRequest::Delete { response, .. } => response,
        }
    }
}
