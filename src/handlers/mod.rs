//! Content handler registry.
//!
//! ## Key Components
//!
//! - [`HandlerRecord`] - One registered handler and its searchable fields
//! - [`HandlerIndex`] - In-memory index enforcing id prefix-disjointness
//! - [`Registry`] - Public operation surface over the index and a store
//! - [`StoragePort`] - Persistent store the registry fronts
//!
//! ## Example
//!
//! ```rust,ignore
//! use chreg::handlers::{Field, HandlerRecord, Registry};
//!
//! let registry = Registry::in_memory();
//! registry
//!     .register(
//!         HandlerRecord::builder()
//!             .id("com.acme.viewer")
//!             .owner_storage_id(7)
//!             .class_name("com.acme.Viewer")
//!             .types(vec!["text/html".into()])
//!             .build(),
//!     )
//!     .await?;
//!
//! let found = registry.find_handler("com.acme", Field::Types, "text/html").await?;
//! ```

mod field;
mod index;
mod registry;
mod resolve;
mod traits;
mod types;

pub use field::{Field, FieldNotSupported, SearchMode, UnknownField, UnknownSearchMode};
pub use index::{ConflictError, HandlerIndex};
pub use registry::{Registry, RegistryError};
pub use resolve::url_path;
pub use traits::StoragePort;
pub use types::{ActionNameMap, HandlerRecord, InvalidRecord, RegistrationMethod, ids_overlap};
