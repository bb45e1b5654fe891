//! Row storage and write path.
//!
//! Each table has:
//! - Rows keyed by id, iterated in insertion order
//! - A version sequence producing opaque version tokens
//! - A timestamp guard keeping `__updatedAt` strictly increasing

use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use table_types::{SystemProperties, SystemProperty};

use crate::error::TableError;

use super::row::StoredRow;
use super::validation;

/// Rows of one table plus the state needed to assign system properties.
#[derive(Debug)]
pub struct Table {
    /// Table name
    pub name: String,
    pub(super) rows: HashMap<String, StoredRow>,
    /// Row ids in insertion order
    pub(super) order: Vec<String>,
    version_seq: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: HashMap::new(),
            order: Vec::new(),
            version_seq: 0,
            last_timestamp: None,
        }
    }

    fn next_version(&mut self) -> String {
        self.version_seq += 1;
        hex::encode(self.version_seq.to_be_bytes())
    }

    /// Current time at millisecond precision, strictly after any timestamp
    /// this table has already issued.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let now = Utc
            .timestamp_millis_opt(now.timestamp_millis())
            .single()
            .unwrap_or(now);
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn not_found(&self, id: &str) -> TableError {
        TableError::RowNotFound {
            table: self.name.clone(),
            id: id.to_string(),
        }
    }

    /// Inserts a row and returns it projected to `properties`.
    ///
    /// A missing or null id is replaced by a random UUID.
    pub fn insert(&mut self, body: Value, properties: SystemProperties) -> Result<Value, TableError> {
        let mut fields = validation::require_object(body)?;
        let id = validation::take_id(&mut fields)?
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        validation::reject_system_fields(&fields)?;

        if self.rows.contains_key(&id) {
            return Err(TableError::RowAlreadyExists {
                table: self.name.clone(),
                id,
            });
        }

        let now = self.next_timestamp();
        let row = StoredRow {
            id: id.clone(),
            fields,
            created_at: now,
            updated_at: now,
            version: self.next_version(),
        };
        let projected = row.project(properties);
        tracing::debug!("Inserted row {} into {} (version {})", id, self.name, row.version);
        self.rows.insert(id.clone(), row);
        self.order.push(id);
        Ok(Value::Object(projected))
    }

    /// Returns the row projected to `properties`.
    pub fn lookup(&self, id: &str, properties: SystemProperties) -> Result<Value, TableError> {
        self.rows
            .get(id)
            .map(|row| Value::Object(row.project(properties)))
            .ok_or_else(|| self.not_found(id))
    }

    /// Merges `patch` into the row's user fields.
    ///
    /// When `if_match` is given it must equal the stored version, otherwise
    /// the update is rejected with the current row (projected to
    /// `properties` plus the version).
    pub fn update(
        &mut self,
        id: &str,
        patch: Value,
        if_match: Option<&str>,
        properties: SystemProperties,
    ) -> Result<Value, TableError> {
        let mut patch = validation::require_object(patch)?;
        if let Some(body_id) = validation::take_id(&mut patch)? {
            if body_id != id {
                return Err(TableError::InvalidRow(format!(
                    "body id '{}' does not match '{}'",
                    body_id, id
                )));
            }
        }
        validation::reject_system_fields(&patch)?;

        let current = self.rows.get(id).ok_or_else(|| self.not_found(id))?;
        if let Some(expected) = if_match {
            if expected != current.version {
                tracing::debug!(
                    "Version mismatch on {}/{}: expected {}, stored {}",
                    self.name,
                    id,
                    expected,
                    current.version
                );
                return Err(TableError::PreconditionFailed {
                    id: id.to_string(),
                    current: Value::Object(
                        current.project(properties.with(SystemProperty::Version)),
                    ),
                });
            }
        }

        let now = self.next_timestamp();
        let version = self.next_version();
        let row = self.rows.get_mut(id).ok_or_else(|| TableError::RowNotFound {
            table: self.name.clone(),
            id: id.to_string(),
        })?;
        for (name, value) in patch {
            row.fields.insert(name, value);
        }
        row.updated_at = now;
        row.version = version;
        Ok(Value::Object(row.project(properties)))
    }

    /// Removes the row. The stored version is not checked.
    pub fn delete(&mut self, id: &str) -> Result<(), TableError> {
        if self.rows.remove(id).is_none() {
            return Err(self.not_found(id));
        }
        self.order.retain(|existing| existing != id);
        Ok(())
    }
}
