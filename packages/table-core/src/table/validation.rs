//! Validation of incoming row bodies.

use serde_json::{Map, Value};
use table_types::{is_system_field, ID_FIELD};

use crate::error::TableError;

/// Ensures the body is a JSON object and returns it.
pub(crate) fn require_object(body: Value) -> Result<Map<String, Value>, TableError> {
    match body {
        Value::Object(obj) => Ok(obj),
        other => Err(TableError::InvalidRow(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Removes `id` from the body.
///
/// Returns `None` when the id is absent or null. A present id must be a
/// non-empty string.
pub(crate) fn take_id(obj: &mut Map<String, Value>) -> Result<Option<String>, TableError> {
    match obj.remove(ID_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(Some(id)),
        Some(Value::String(_)) => Err(TableError::InvalidId("id must not be empty".to_string())),
        Some(other) => Err(TableError::InvalidId(format!(
            "id must be a string, got {}",
            json_kind(&other)
        ))),
    }
}

/// Rejects bodies that try to set server-managed fields.
pub(crate) fn reject_system_fields(obj: &Map<String, Value>) -> Result<(), TableError> {
    match obj.keys().find(|k| is_system_field(k)) {
        Some(field) => Err(TableError::SystemPropertyNotWritable {
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
