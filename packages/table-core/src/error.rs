//! Table service error types.

use serde_json::Value;
use thiserror::Error;

/// Table operation errors.
#[derive(Error, Debug, Clone)]
pub enum TableError {
    /// Table not found
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    /// Row not found
    #[error("Row '{id}' not found in table '{table}'")]
    RowNotFound { table: String, id: String },

    /// Insert with an id that is already taken
    #[error("Row '{id}' already exists in table '{table}'")]
    RowAlreadyExists { table: String, id: String },

    /// Id present but not a non-empty string
    #[error("Invalid row id: {0}")]
    InvalidId(String),

    /// Row body is not a JSON object or is otherwise malformed
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// Client tried to write a server-managed field
    #[error("System property '{field}' cannot be set by the client")]
    SystemPropertyNotWritable { field: String },

    /// Supplied version does not match the stored one
    #[error("Precondition failed for row '{id}': version does not match")]
    PreconditionFailed { id: String, current: Value },

    /// Filter expression could not be parsed
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// `__systemproperties` value could not be parsed
    #[error("Invalid system properties: {0}")]
    InvalidSystemProperties(String),

    /// Request queue is full
    #[error("Service overloaded: {0}")]
    Overloaded(String),

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Operation timeout
    #[error("Operation timeout")]
    Timeout,
}

impl From<table_types::TypesError> for TableError {
    fn from(err: table_types::TypesError) -> Self {
        match err {
            table_types::TypesError::UnknownSystemProperty(_) => {
                TableError::InvalidSystemProperties(err.to_string())
            }
            table_types::TypesError::InvalidFilter { .. } => TableError::InvalidFilter(err.to_string()),
        }
    }
}
