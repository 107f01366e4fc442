//! Storage ports for the handler registry.
//!
//! Both bundled stores answer the `load_*` queries from an index built over
//! their own contents, so either can stand in for an external store.

mod fjall_store;
mod keys;
mod memory;
mod snapshot;

use thiserror::Error;

use crate::codec::CodecError;
use crate::handlers::{ConflictError, FieldNotSupported};

pub use fjall_store::FjallStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Codec(#[from] CodecError),

    #[error("Stored handler conflicts: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Unsupported query: {0}")]
    InvalidQuery(#[from] FieldNotSupported),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
