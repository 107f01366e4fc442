use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::snapshot::Snapshot;
use super::Result;
use crate::codec::WireString;
use crate::handlers::{ConflictError, Field, HandlerIndex, HandlerRecord, SearchMode, StoragePort};

/// Volatile store for tests and development
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: RwLock<HandlerIndex>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.index.read().await.len()
    }
}

#[async_trait]
impl StoragePort for MemoryStore {
    /// Replacing a stored id keeps its position. A conflicting record is
    /// rejected before anything stored is touched.
    async fn persist(&self, record: &HandlerRecord) -> Result<()> {
        let mut index = self.index.write().await;
        let conflicts: Vec<HandlerRecord> = index
            .find_conflicting(&record.id)
            .iter()
            .filter(|stored| stored.id != record.id)
            .map(|stored| HandlerRecord::clone(stored))
            .collect();
        if !conflicts.is_empty() {
            return Err(ConflictError {
                id: record.id.clone(),
                conflicts,
            }
            .into());
        }

        match index.remove_entry(&record.id) {
            Some((seq, _)) => index.reinsert(seq, Arc::new(record.clone()))?,
            None => {
                index.insert(record.clone())?;
            }
        }
        debug!(id = %record.id, "Stored handler in memory");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.index.write().await.remove(id).is_some())
    }

    async fn load_by_field(
        &self,
        caller_id: &str,
        field: Field,
        value: &str,
    ) -> Result<Option<WireString>> {
        Snapshot::new(&*self.index.read().await).by_field(caller_id, field, value)
    }

    async fn load_by_owner(&self, owner_storage_id: u32) -> Result<Option<WireString>> {
        Snapshot::new(&*self.index.read().await).by_owner(owner_storage_id)
    }

    async fn load_exact(
        &self,
        caller_id: &str,
        id: &str,
        mode: SearchMode,
    ) -> Result<Option<WireString>> {
        Snapshot::new(&*self.index.read().await).exact(caller_id, id, mode)
    }

    async fn load_by_url(
        &self,
        caller_id: &str,
        url: &str,
        action: &str,
    ) -> Result<Option<WireString>> {
        Snapshot::new(&*self.index.read().await).by_url(caller_id, url, action)
    }

    async fn load_field_values(&self, caller_id: &str, field: Field) -> Result<Option<WireString>> {
        Snapshot::new(&*self.index.read().await).field_values(caller_id, field)
    }

    async fn load_all(&self) -> Result<Option<WireString>> {
        Snapshot::new(&*self.index.read().await).all()
    }
}
