use std::path::Path;

use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use tracing::{debug, info, warn};

use super::Result;
use super::keys::{decode_handler_key, encode_handler_key};
use super::snapshot::{Snapshot, index_records};
use crate::codec::{WireString, decode_record, encode_record};
use crate::handlers::{Field, HandlerIndex, HandlerRecord, SearchMode, StoragePort};

/// Fjall-backed persistent handler store
///
/// Records are kept in key order, so a registry rehydrated from this store
/// sees them ordered by id.
#[derive(Clone)]
pub struct FjallStore {
    keyspace: Keyspace,
    handlers: PartitionHandle,
}

impl FjallStore {
    /// Open or create a Fjall store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening Fjall handler store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let handlers = keyspace.open_partition("handlers", PartitionCreateOptions::default())?;

        info!("Fjall handler store opened");
        Ok(Self { keyspace, handlers })
    }

    /// Persist all pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let mut count = 0;
        for item in self.handlers.iter() {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// Decodes every stored record; undecodable entries are skipped.
    fn records(&self) -> Result<Vec<HandlerRecord>> {
        let mut records = Vec::new();
        for item in self.handlers.iter() {
            let (key, value) = item?;
            let decoded = WireString::from_bytes(&value)
                .and_then(|wire| decode_record(Some(&wire)));
            match decoded {
                Ok(Some(record)) => records.push(record),
                Ok(None) => warn!(key = ?decode_handler_key(&key), "Ignoring stored handler without id"),
                Err(err) => warn!(key = ?decode_handler_key(&key), error = %err, "Ignoring malformed stored handler"),
            }
        }
        Ok(records)
    }

    fn index(&self) -> Result<HandlerIndex> {
        Ok(index_records(self.records()?))
    }
}

#[async_trait]
impl StoragePort for FjallStore {
    async fn persist(&self, record: &HandlerRecord) -> Result<()> {
        let key = encode_handler_key(&record.id);
        let value = encode_record(record)?.to_bytes();
        self.handlers.insert(key, value)?;
        debug!("Persisted handler: {}", record.id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let key = encode_handler_key(id);
        let existed = self.handlers.contains_key(&key)?;
        if existed {
            self.handlers.remove(key)?;
            debug!("Deleted handler: {}", id);
        }
        Ok(existed)
    }

    async fn load_by_field(
        &self,
        caller_id: &str,
        field: Field,
        value: &str,
    ) -> Result<Option<WireString>> {
        Snapshot::new(&self.index()?).by_field(caller_id, field, value)
    }

    async fn load_by_owner(&self, owner_storage_id: u32) -> Result<Option<WireString>> {
        Snapshot::new(&self.index()?).by_owner(owner_storage_id)
    }

    async fn load_exact(
        &self,
        caller_id: &str,
        id: &str,
        mode: SearchMode,
    ) -> Result<Option<WireString>> {
        if mode == SearchMode::Exact {
            let Some(value) = self.handlers.get(encode_handler_key(id))? else {
                return Ok(None);
            };
            return Ok(Some(WireString::from_bytes(&value)?));
        }
        Snapshot::new(&self.index()?).exact(caller_id, id, mode)
    }

    async fn load_by_url(
        &self,
        caller_id: &str,
        url: &str,
        action: &str,
    ) -> Result<Option<WireString>> {
        Snapshot::new(&self.index()?).by_url(caller_id, url, action)
    }

    async fn load_field_values(&self, caller_id: &str, field: Field) -> Result<Option<WireString>> {
        Snapshot::new(&self.index()?).field_values(caller_id, field)
    }

    async fn load_all(&self) -> Result<Option<WireString>> {
        Snapshot::new(&self.index()?).all()
    }

    async fn close(&self) -> Result<()> {
        self.flush()?;
        info!("Fjall handler store flushed");
        Ok(())
    }
}
