//! Query-related methods for table operations.

use serde_json::Value;
use table_types::{Filter, SystemProperties};

use super::Table;

impl Table {
    /// Queries rows with an optional filter.
    ///
    /// # Arguments
    /// * `filter` - Predicate evaluated against the full row, so system
    ///   fields are filterable even when not selected for the response
    /// * `skip` - Number of matching rows to skip
    /// * `top` - Maximum number of rows to return
    /// * `properties` - System fields to include in each returned row
    ///
    /// # Returns
    /// Matching rows in insertion order.
    pub fn query(
        &self,
        filter: Option<&Filter>,
        skip: usize,
        top: usize,
        properties: SystemProperties,
    ) -> Vec<Value> {
        self.order
            .iter()
            .filter_map(|id| self.rows.get(id))
            .filter(|row| filter.map_or(true, |f| f.matches(&row.full())))
            .skip(skip)
            .take(top)
            .map(|row| Value::Object(row.project(properties)))
            .collect()
    }
}
