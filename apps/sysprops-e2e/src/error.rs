//! Harness error types.

use table_client::ClientError;
use thiserror::Error;

/// Failure of a scenario step.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A client operation failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A check on a response did not hold
    #[error("{0}")]
    Assertion(String),

    /// A response value differed from the one expected
    #[error("Expected value: {expected}, actual: {actual}")]
    ExpectedValue { expected: String, actual: String },

    /// The operation's completion was dropped without reporting a result
    #[error("Operation completed without reporting a result")]
    CompletionDropped,

    /// The service or client could not be set up
    #[error("Setup failed: {0}")]
    Setup(String),
}

impl HarnessError {
    pub fn assertion(message: impl Into<String>) -> Self {
        HarnessError::Assertion(message.into())
    }

    pub fn expected_value(expected: impl ToString, actual: impl ToString) -> Self {
        HarnessError::ExpectedValue {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// True if this wraps a precondition failure from the service.
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, HarnessError::Client(ClientError::PreconditionFailed(_)))
    }
}
