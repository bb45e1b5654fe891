//! Row shapes stored by the scenarios.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use table_client::{SystemProperties, TableRow};

/// Row of the string-id round-trip table.
///
/// System fields are optional: a response only carries the ones that were
/// requested, and they are never sent back to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTripRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<f64>,
    #[serde(default)]
    pub flag: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "__version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "__createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "__updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RoundTripRow {
    /// Row filled with sample data and no id; the service assigns one.
    pub fn sample() -> Self {
        Self {
            id: None,
            name: Some("Sample Data".to_string()),
            number: Some(123.45),
            flag: Some(true),
            tags: vec!["alpha".to_string(), "beta".to_string()],
            version: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Sample row with a fresh random id.
    pub fn sample_with_id() -> Self {
        Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            ..Self::sample()
        }
    }

    /// Id as a string slice, empty if unset.
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}

impl TableRow for RoundTripRow {
    fn system_properties() -> SystemProperties {
        SystemProperties::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_system_fields_are_not_serialized() {
        let value = serde_json::to_value(RoundTripRow::sample()).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("id"));
        assert!(object.keys().all(|k| !k.starts_with("__")));
        assert_eq!(object["name"], "Sample Data");
    }

    #[test]
    fn test_system_fields_deserialize_from_response() {
        let row: RoundTripRow = serde_json::from_value(json!({
            "id": "a",
            "name": "x",
            "__version": "00000000000003e9",
            "__createdAt": "2024-03-01T10:00:00.123Z"
        }))
        .unwrap();
        assert_eq!(row.version.as_deref(), Some("00000000000003e9"));
        assert_eq!(
            row.created_at.unwrap().timestamp_millis() % 1000,
            123
        );
        assert!(row.updated_at.is_none());
        assert!(row.tags.is_empty());
    }
}
