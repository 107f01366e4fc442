//! Request and response bodies for the registry HTTP surface.
//!
//! Handler records travel as JSON in the shape of [`HandlerRecord`]:
//!
//! ```json
//! {
//!   "id": "com.acme.viewer",
//!   "owner_storage_id": 7,
//!   "class_name": "com.acme.Viewer",
//!   "registration_method": 0,
//!   "types": ["text/html"],
//!   "suffixes": [".html"],
//!   "actions": ["open"],
//!   "action_names": [{ "locale": "en", "names": ["Open"] }],
//!   "accesses": []
//! }
//! ```
//!
//! Fields in paths and queries accept the numeric index (`1`) or the name
//! (`types`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::handlers::{Field, HandlerRecord};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallerQuery {
    #[serde(default)]
    pub caller: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HandlerQuery {
    #[serde(default)]
    pub caller: String,
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub caller: String,
    pub field: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    #[serde(default)]
    pub caller: String,
    pub url: String,
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    pub class: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HandlerList {
    pub handlers: Vec<HandlerRecord>,
}

impl From<Vec<Arc<HandlerRecord>>> for HandlerList {
    fn from(records: Vec<Arc<HandlerRecord>>) -> Self {
        Self {
            handlers: records.iter().map(|r| HandlerRecord::clone(r)).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValuesResponse {
    pub field: Field,
    pub values: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConflictsResponse {
    pub id: String,
    pub conflicts: Vec<HandlerRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedResponse {
    pub removed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub handlers: usize,
}
