//! Parse errors for shared types.

use thiserror::Error;

/// Errors raised while parsing system-property selections or filters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    /// A `__systemproperties` token did not name a known property.
    #[error("unknown system property '{0}'")]
    UnknownSystemProperty(String),

    /// Filter text could not be parsed.
    #[error("invalid filter at position {position}: {message}")]
    InvalidFilter { position: usize, message: String },
}
