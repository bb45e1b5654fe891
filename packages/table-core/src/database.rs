//! Database container managing tables.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use table_types::{Filter, SystemProperties};

use crate::error::TableError;
use crate::table::Table;

/// Database container holding all tables.
///
/// Tables are created implicitly by their first insert.
#[derive(Debug, Default)]
pub struct Database {
    /// Map of table name to table instance
    tables: RwLock<HashMap<String, Table>>,
}

impl Database {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_table<R>(
        &self,
        name: &str,
        f: impl FnOnce(&Table) -> Result<R, TableError>,
    ) -> Result<R, TableError> {
        let tables = self.tables.read().map_err(|_| TableError::LockPoisoned)?;
        let table = tables.get(name).ok_or_else(|| TableError::TableNotFound {
            table: name.to_string(),
        })?;
        f(table)
    }

    fn with_table_mut<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Table) -> Result<R, TableError>,
    ) -> Result<R, TableError> {
        let mut tables = self.tables.write().map_err(|_| TableError::LockPoisoned)?;
        let table = tables.get_mut(name).ok_or_else(|| TableError::TableNotFound {
            table: name.to_string(),
        })?;
        f(table)
    }

    /// Inserts a row, creating the table on first use.
    pub fn insert(
        &self,
        table: &str,
        body: Value,
        properties: SystemProperties,
    ) -> Result<Value, TableError> {
        let mut tables = self.tables.write().map_err(|_| TableError::LockPoisoned)?;
        let entry = tables.entry(table.to_string()).or_insert_with(|| {
            tracing::info!("Creating table {}", table);
            Table::new(table)
        });
        entry.insert(body, properties)
    }

    /// Looks up a row by id.
    pub fn lookup(
        &self,
        table: &str,
        id: &str,
        properties: SystemProperties,
    ) -> Result<Value, TableError> {
        self.with_table(table, |t| t.lookup(id, properties))
    }

    /// Applies a partial update, optionally guarded by a version.
    pub fn update(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        if_match: Option<&str>,
        properties: SystemProperties,
    ) -> Result<Value, TableError> {
        self.with_table_mut(table, |t| t.update(id, patch, if_match, properties))
    }

    /// Deletes a row by id.
    pub fn delete(&self, table: &str, id: &str) -> Result<(), TableError> {
        self.with_table_mut(table, |t| t.delete(id))
    }

    /// Queries a table. A table that was never written reads as empty.
    pub fn query(
        &self,
        table: &str,
        filter: Option<&Filter>,
        skip: usize,
        top: usize,
        properties: SystemProperties,
    ) -> Result<Vec<Value>, TableError> {
        match self.with_table(table, |t| Ok(t.query(filter, skip, top, properties))) {
            Err(TableError::TableNotFound { .. }) => Ok(Vec::new()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_creates_table() {
        let db = Database::new();
        assert!(matches!(
            db.lookup("items", "a", SystemProperties::none()),
            Err(TableError::TableNotFound { .. })
        ));
        db.insert("items", json!({"id": "a"}), SystemProperties::none())
            .unwrap();
        let row = db.lookup("items", "a", SystemProperties::none()).unwrap();
        assert_eq!(row["id"], "a");
    }

    #[test]
    fn test_unknown_table() {
        let db = Database::new();
        assert!(matches!(
            db.lookup("nope", "a", SystemProperties::none()),
            Err(TableError::TableNotFound { .. })
        ));
        assert!(matches!(
            db.delete("nope", "a"),
            Err(TableError::TableNotFound { .. })
        ));
        assert!(db
            .query("nope", None, 0, 10, SystemProperties::none())
            .unwrap()
            .is_empty());
    }
}
