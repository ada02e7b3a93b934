//! Catalog maintenance methods on PartsApi.

use crate::catalog::ImportSummary;
use crate::error::{PartsError, Result};
use crate::PartsApi;
use tracing::warn;

impl PartsApi {
    // ========================================
    // Catalog Methods
    // ========================================

    /// Bulk-import raw part objects. The payload must be a JSON array of objects;
    /// nothing is written if any element is rejected.
    pub async fn import_parts(&self, payload: serde_json::Value) -> Result<ImportSummary> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let summary = store.import_parts(&payload)?;
            if let Err(e) = store.checkpoint_wal() {
                warn!("WAL checkpoint after import failed: {}", e);
            }
            Ok(summary)
        })
        .await
        .map_err(|e| PartsError::ImportFailed {
            message: format!("Import task failed: {}", e),
        })?
    }

    /// Add one part. Returns its id.
    pub async fn insert_part(&self, part: serde_json::Value) -> Result<i64> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.insert_part(&part))
            .await
            .map_err(|e| PartsError::Other(format!("Insert task failed: {}", e)))?
    }

    pub async fn count_parts(&self) -> Result<usize> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.count())
            .await
            .map_err(|e| PartsError::Other(format!("Count task failed: {}", e)))?
    }

    /// Remove every part.
    pub async fn clear_parts(&self) -> Result<()> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            store.clear()?;
            store.checkpoint_wal()
        })
        .await
        .map_err(|e| PartsError::Other(format!("Clear task failed: {}", e)))?
    }

    /// Create an index on a data field so it can be used for sorting and range filters.
    pub async fn create_field_index(&self, field: &str) -> Result<()> {
        let store = self.store.clone();
        let field = field.to_string();
        tokio::task::spawn_blocking(move || store.create_field_index(&field))
            .await
            .map_err(|e| PartsError::Other(format!("Index task failed: {}", e)))?
    }
}
