use std::path::PathBuf;

use serde::Deserialize;

use crate::store::RecordStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<RecordStore>,
    /// Used by `students.list` when the request has no `pageSize`.
    pub page_size: u32,
}
