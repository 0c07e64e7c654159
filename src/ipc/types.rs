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

/// Everything a handler may touch. The store is built once, at startup or
/// on `workspace.select`, and lent to each handler through this struct.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<Box<dyn RecordStore>>,
}

impl AppState {
    pub fn new(workspace: Option<PathBuf>, store: Option<Box<dyn RecordStore>>) -> Self {
        Self { workspace, store }
    }
}
