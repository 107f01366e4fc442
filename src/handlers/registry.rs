use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::field::{Field, FieldNotSupported, SearchMode, UnknownField};
use super::index::{ConflictError, HandlerIndex};
use super::traits::StoragePort;
use super::types::{HandlerRecord, InvalidRecord};
use crate::codec::{CodecError, decode_record, decode_record_array};
use crate::observability::Metrics;
use crate::storage::{MemoryStore, StorageError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    UnknownField(#[from] UnknownField),

    #[error(transparent)]
    FieldNotSupported(#[from] FieldNotSupported),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("malformed stored handler: {0}")]
    Format(#[from] CodecError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<InvalidRecord> for RegistryError {
    fn from(err: InvalidRecord) -> Self {
        RegistryError::InvalidArgument(err.to_string())
    }
}

/// Content handler registry.
///
/// The in-memory index is the source of truth for every query except URL
/// resolution, which is answered by the storage port. Mutations hold the
/// index lock only for the in-memory step; the storage round trip happens
/// after it is released and a failed write is compensated under the lock.
///
/// Mutations are serialized by `writes`, held across the store round trip,
/// so store writes land in the same order as index changes. Readers never
/// take it.
pub struct Registry {
    index: Mutex<HandlerIndex>,
    writes: Mutex<()>,
    store: Arc<dyn StoragePort>,
    metrics: Metrics,
}

impl Registry {
    /// Opens a registry over `store`, loading every record it holds.
    ///
    /// Stored records that are invalid or conflict with an earlier one are
    /// skipped and logged.
    pub async fn open(store: Arc<dyn StoragePort>) -> Result<Self, RegistryError> {
        let wire = store.load_all().await?;
        let records = decode_record_array(wire.as_ref())?;

        let mut index = HandlerIndex::new();
        let mut skipped = 0usize;
        for record in records {
            if let Err(err) = record.validate() {
                error!(id = %record.id, error = %err, "Skipping invalid stored handler");
                skipped += 1;
                continue;
            }
            if let Err(err) = index.insert(record) {
                error!(
                    id = %err.id,
                    conflicts = ?err.conflicting_ids(),
                    "Skipping conflicting stored handler"
                );
                skipped += 1;
            }
        }

        info!(handlers = index.len(), skipped, "Handler registry loaded");
        Ok(Self::with_index(store, index))
    }

    /// Empty registry over `store`, without reading it.
    pub fn with_store(store: Arc<dyn StoragePort>) -> Self {
        Self::with_index(store, HandlerIndex::new())
    }

    /// Empty registry backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    fn with_index(store: Arc<dyn StoragePort>, index: HandlerIndex) -> Self {
        Self {
            index: Mutex::new(index),
            writes: Mutex::new(()),
            store,
            metrics: Metrics::new(),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn len(&self) -> usize {
        self.index.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.lock().await.is_empty()
    }

    /// Every registered handler in registration order.
    pub async fn list(&self) -> Vec<Arc<HandlerRecord>> {
        self.index.lock().await.iter().cloned().collect()
    }

    pub async fn register(&self, record: HandlerRecord) -> Result<Arc<HandlerRecord>, RegistryError> {
        record.validate()?;

        let _writes = self.writes.lock().await;
        let inserted = self.index.lock().await.insert(record);
        let registered = match inserted {
            Ok(registered) => registered,
            Err(conflict) => {
                self.metrics.conflict();
                warn!(
                    id = %conflict.id,
                    conflicts = ?conflict.conflicting_ids(),
                    "Handler registration conflicts"
                );
                return Err(conflict.into());
            }
        };

        if let Err(err) = self.store.persist(&registered).await {
            self.metrics.storage_failed();
            self.index.lock().await.remove_if_same(&registered);
            error!(id = %registered.id, error = %err, "Failed to persist handler, registration reverted");
            return Err(err.into());
        }

        self.metrics.registered();
        info!(
            id = %registered.id,
            owner = registered.owner_storage_id,
            class = %registered.class_name,
            "Registered handler"
        );
        Ok(registered)
    }

    /// Returns `false`, without touching the store, when `id` is not
    /// registered.
    pub async fn unregister(&self, id: &str) -> Result<bool, RegistryError> {
        let _writes = self.writes.lock().await;
        self.unregister_serialized(id).await
    }

    /// Unregisters every handler owned by a bundle, returning how many went.
    pub async fn unregister_owner(&self, owner_storage_id: u32) -> Result<usize, RegistryError> {
        let _writes = self.writes.lock().await;
        let ids: Vec<String> = self
            .index
            .lock()
            .await
            .records_for_owner(owner_storage_id)
            .iter()
            .map(|record| record.id.clone())
            .collect();

        let mut removed = 0;
        for id in ids {
            if self.unregister_serialized(&id).await? {
                removed += 1;
            }
        }
        info!(owner = owner_storage_id, removed, "Unregistered bundle handlers");
        Ok(removed)
    }

    /// Caller holds `writes`.
    async fn unregister_serialized(&self, id: &str) -> Result<bool, RegistryError> {
        let removed = self.index.lock().await.remove_entry(id);
        let Some((seq, removed)) = removed else {
            debug!(id, "Unregister of unknown handler");
            return Ok(false);
        };

        if let Err(err) = self.store.delete(id).await {
            self.metrics.storage_failed();
            let restored = self.index.lock().await.reinsert(seq, removed);
            match restored {
                Ok(()) => warn!(id, error = %err, "Failed to delete stored handler, unregistration reverted"),
                Err(conflict) => error!(
                    id,
                    error = %err,
                    conflicts = ?conflict.conflicting_ids(),
                    "Failed to delete stored handler and could not restore it"
                ),
            }
            return Err(err.into());
        }

        self.metrics.unregistered();
        info!(id, "Unregistered handler");
        Ok(true)
    }

    pub async fn find_conflicted(&self, test_id: &str) -> Vec<Arc<HandlerRecord>> {
        self.index.lock().await.find_conflicting(test_id)
    }

    pub async fn find_handler(
        &self,
        caller_id: &str,
        field: Field,
        value: &str,
    ) -> Result<Vec<Arc<HandlerRecord>>, RegistryError> {
        if value.is_empty() {
            return Err(RegistryError::InvalidArgument(
                "search value must not be empty".to_string(),
            ));
        }
        self.metrics.lookup();

        let found = self.index.lock().await.search(field, value, caller_id)?;
        debug!(caller_id, %field, value, found = found.len(), "Handler search");
        Ok(found)
    }

    pub async fn get_values(&self, caller_id: &str, field: Field) -> Vec<String> {
        self.metrics.lookup();
        self.index.lock().await.values_for(field, caller_id)
    }

    /// Contents of an array field of one handler; empty if it is not
    /// registered.
    pub async fn get_array_field(
        &self,
        handler_id: &str,
        field: Field,
    ) -> Result<Vec<String>, RegistryError> {
        if !field.is_array() {
            return Err(FieldNotSupported {
                field,
                operation: "get_array_field",
            }
            .into());
        }
        self.metrics.lookup();

        let index = self.index.lock().await;
        Ok(index
            .get(handler_id)
            .map(|record| {
                record
                    .field_values(field)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn get_handler(
        &self,
        caller_id: &str,
        id: &str,
        mode: SearchMode,
    ) -> Option<Arc<HandlerRecord>> {
        if id.is_empty() {
            return None;
        }
        self.metrics.lookup();

        let index = self.index.lock().await;
        match mode {
            SearchMode::Exact => index.get(id).cloned(),
            SearchMode::Prefix => index.find_by_prefix(id, caller_id),
        }
    }

    pub async fn get_handler_by_owner(
        &self,
        owner_storage_id: u32,
        class_name: &str,
    ) -> Result<Option<Arc<HandlerRecord>>, RegistryError> {
        if class_name.is_empty() {
            return Err(RegistryError::InvalidArgument(
                "class name must not be empty".to_string(),
            ));
        }
        self.metrics.lookup();

        Ok(self
            .index
            .lock()
            .await
            .records_for_owner(owner_storage_id)
            .into_iter()
            .find(|record| record.class_name == class_name))
    }

    pub async fn records_for_owner(&self, owner_storage_id: u32) -> Vec<Arc<HandlerRecord>> {
        self.index.lock().await.records_for_owner(owner_storage_id)
    }

    /// Asks the store which handler serves `url`.
    ///
    /// Store and format failures resolve to `None`. A result whose id is
    /// registered is answered with the registered record.
    pub async fn resolve_by_url(
        &self,
        caller_id: &str,
        url: &str,
        action: &str,
    ) -> Option<Arc<HandlerRecord>> {
        self.metrics.lookup();

        let wire = match self.store.load_by_url(caller_id, url, action).await {
            Ok(wire) => wire,
            Err(err) => {
                warn!(url, error = %err, "URL resolution failed in store");
                return None;
            }
        };
        let record = match decode_record(wire.as_ref()) {
            Ok(record) => record?,
            Err(err) => {
                warn!(url, error = %err, "Store returned a malformed handler");
                return None;
            }
        };

        let index = self.index.lock().await;
        Some(
            index
                .get(&record.id)
                .cloned()
                .unwrap_or_else(|| Arc::new(record)),
        )
    }

    /// Releases the storage port.
    pub async fn close(&self) -> Result<(), RegistryError> {
        self.store.close().await?;
        info!("Handler registry closed");
        Ok(())
    }
}
