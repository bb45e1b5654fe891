//! Error types for the table client.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by table operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport failure talking to the service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// Response or row could not be (de)serialized
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Row is unusable for the requested operation
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// Update rejected because the submitted version is stale
    #[error("{0}")]
    PreconditionFailed(Box<PreconditionFailed>),
}

impl ClientError {
    /// Returns the precondition failure, if this is one.
    pub fn as_precondition_failed(&self) -> Option<&PreconditionFailed> {
        match self {
            ClientError::PreconditionFailed(inner) => Some(inner),
            _ => None,
        }
    }

    /// HTTP status reported by the service, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Service { status, .. } => Some(*status),
            ClientError::PreconditionFailed(_) => Some(412),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Conflict reported by the service, carrying its current copy of the row.
#[derive(Debug, Clone, Error)]
#[error("Precondition failed: {message}")]
pub struct PreconditionFailed {
    message: String,
    current: Value,
}

impl PreconditionFailed {
    pub fn new(message: impl Into<String>, current: Value) -> Self {
        Self {
            message: message.into(),
            current,
        }
    }

    /// Server message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The server's row as JSON.
    pub fn current(&self) -> &Value {
        &self.current
    }

    /// The server's row decoded as `T`.
    pub fn item<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.current.clone())?)
    }

    /// Version of the server's row, when it was returned.
    pub fn version(&self) -> Option<&str> {
        self.current
            .get(table_types::SystemProperty::Version.field_name())
            .and_then(Value::as_str)
    }
}

impl From<PreconditionFailed> for ClientError {
    fn from(err: PreconditionFailed) -> Self {
        ClientError::PreconditionFailed(Box::new(err))
    }
}
