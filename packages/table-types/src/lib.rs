//! Shared vocabulary for the mobile table service.
//!
//! This crate defines the server-managed system properties, the set type used
//! to select them, and the filter expressions understood by table queries.

pub mod error;
pub mod filter;
pub mod system_property;

pub use error::TypesError;
pub use filter::{field, FieldRef, Filter, Literal};
pub use system_property::{SystemProperties, SystemProperty};

/// Name of the row key field.
pub const ID_FIELD: &str = "id";

/// Query-string parameter selecting which system properties a response carries.
pub const SYSTEM_PROPERTIES_PARAMETER: &str = "__systemproperties";

/// Query-string parameter carrying a filter expression.
pub const FILTER_PARAMETER: &str = "$filter";

/// Query-string parameter limiting the number of returned rows.
pub const TOP_PARAMETER: &str = "$top";

/// Query-string parameter skipping leading rows.
pub const SKIP_PARAMETER: &str = "$skip";

/// Header carrying the application key.
pub const APPLICATION_KEY_HEADER: &str = "X-ZUMO-APPLICATION";

/// Returns true if `name` is reserved for a system property (`__` prefix).
pub fn is_system_field(name: &str) -> bool {
    name.starts_with("__")
}

/// Formats a timestamp the way system properties are stored and filtered.
pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
