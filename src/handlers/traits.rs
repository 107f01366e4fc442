use async_trait::async_trait;

use super::field::{Field, SearchMode};
use super::types::HandlerRecord;
use crate::codec::WireString;
use crate::storage::StorageError;

/// Persistent backing store the registry fronts.
///
/// Every `load_*` query answers with an encoded wire value, or `None` when
/// nothing matches:
///
/// - `load_by_field`, `load_by_owner` and `load_all` return an array of full
///   records.
/// - `load_exact` and `load_by_url` return one full record.
/// - `load_field_values` returns a plain sequence of strings.
#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn persist(&self, record: &HandlerRecord) -> Result<(), StorageError>;

    /// Removes the stored form of `id`, reporting whether one existed.
    async fn delete(&self, id: &str) -> Result<bool, StorageError>;

    async fn load_by_field(
        &self,
        caller_id: &str,
        field: Field,
        value: &str,
    ) -> Result<Option<WireString>, StorageError>;

    async fn load_by_owner(&self, owner_storage_id: u32)
    -> Result<Option<WireString>, StorageError>;

    async fn load_exact(
        &self,
        caller_id: &str,
        id: &str,
        mode: SearchMode,
    ) -> Result<Option<WireString>, StorageError>;

    async fn load_by_url(
        &self,
        caller_id: &str,
        url: &str,
        action: &str,
    ) -> Result<Option<WireString>, StorageError>;

    async fn load_field_values(
        &self,
        caller_id: &str,
        field: Field,
    ) -> Result<Option<WireString>, StorageError>;

    /// Every stored record, used to rehydrate the registry on startup.
    async fn load_all(&self) -> Result<Option<WireString>, StorageError>;

    /// Releases the store. Later calls may fail.
    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
