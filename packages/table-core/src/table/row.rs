//! Stored row representation and response projection.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use table_types::{format_timestamp, SystemProperties, SystemProperty, ID_FIELD};

/// A row as held by the service: user fields plus server-managed metadata.
#[derive(Debug, Clone)]
pub struct StoredRow {
    /// Row key
    pub id: String,
    /// User fields, excluding `id` and system fields
    pub fields: Map<String, Value>,
    /// Set once at insert
    pub created_at: DateTime<Utc>,
    /// Advanced on every write
    pub updated_at: DateTime<Utc>,
    /// Replaced on every write
    pub version: String,
}

impl StoredRow {
    fn system_value(&self, property: SystemProperty) -> Value {
        match property {
            SystemProperty::CreatedAt => Value::String(format_timestamp(&self.created_at)),
            SystemProperty::UpdatedAt => Value::String(format_timestamp(&self.updated_at)),
            SystemProperty::Version => Value::String(self.version.clone()),
        }
    }

    /// Builds the JSON object for `properties`: id, user fields, and only
    /// the selected system fields.
    pub fn project(&self, properties: SystemProperties) -> Map<String, Value> {
        let mut obj = Map::with_capacity(self.fields.len() + 1 + properties.len());
        obj.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        for (name, value) in &self.fields {
            obj.insert(name.clone(), value.clone());
        }
        for property in properties.iter() {
            obj.insert(property.field_name().to_string(), self.system_value(property));
        }
        obj
    }

    /// JSON object with every system field, used for filter evaluation.
    pub fn full(&self) -> Map<String, Value> {
        self.project(SystemProperties::all())
    }
}
