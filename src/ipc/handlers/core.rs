use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::RecordStore;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    // Count is informational; a broken database should not fail health.
    let record_count = state.store.as_ref().and_then(|s| s.count().ok());
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "recordCount": record_count
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match select_workspace(state, &path) {
        Ok(()) => ok(&req.id, json!({ "workspacePath": path.to_string_lossy() })),
        Err(e) => store_err(&req.id, &e),
    }
}

/// Opens `path` as the active workspace, replacing any previous one.
pub fn select_workspace(state: &mut AppState, path: &Path) -> Result<(), crate::store::StoreError> {
    match RecordStore::open(path) {
        Ok(store) => {
            info!(db = %store.db_path().display(), "workspace selected");
            state.workspace = Some(path.to_path_buf());
            state.store = Some(store);
            Ok(())
        }
        Err(e) => {
            warn!(workspace = %path.display(), error = %e, "workspace open failed");
            Err(e)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
