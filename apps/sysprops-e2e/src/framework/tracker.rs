use table_client::{ClientError, JsonTable, MobileServiceClient};

/// Ids of rows a scenario inserted and has not deleted.
///
/// Whatever is left when the scenario ends, passed or failed, is deleted
/// so failed runs do not leave rows in the table.
#[derive(Clone)]
pub struct RowTracker {
    client: MobileServiceClient,
    table: JsonTable,
    ids: Vec<String>,
}

impl RowTracker {
    pub fn new(client: MobileServiceClient, table_name: &str) -> Self {
        Self {
            table: client.json_table(table_name),
            client,
            ids: Vec::new(),
        }
    }

    pub fn track(&mut self, id: &str) {
        if !id.is_empty() && !self.ids.iter().any(|known| known == id) {
            self.ids.push(id.to_string());
        }
    }

    pub fn forget(&mut self, id: &str) {
        self.ids.retain(|known| known != id);
    }

    /// Deletes every tracked row, returning how many were removed.
    ///
    /// Rows that are already gone are skipped; other failures are logged
    /// and do not stop the cleanup. Must not be called from inside an
    /// async task.
    pub fn cleanup(self) -> usize {
        let runtime = self.client.runtime();
        let mut removed = 0;
        for id in &self.ids {
            match runtime.block_on(self.table.delete_by_id(id)) {
                Ok(()) => removed += 1,
                Err(ClientError::Service { status: 404, .. }) => {}
                Err(e) => tracing::warn!("Failed to clean up row {}: {}", id, e),
            }
        }
        if removed > 0 {
            tracing::debug!("Cleaned up {} rows from {}", removed, self.table.name());
        }
        removed
    }
}
