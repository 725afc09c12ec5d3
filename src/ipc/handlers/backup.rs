use crate::backup;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::handlers::core::select_workspace;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn path_param(req: &Request, key: &str) -> Option<PathBuf> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Some(PathBuf::from(v.trim())),
        _ => None,
    }
}

fn handle_backup_snapshot(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(out_path) = path_param(req, "outPath") else {
        return err(&req.id, "bad_params", "missing outPath", None);
    };
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match backup::snapshot_workspace(&workspace, &out_path) {
        Ok(summary) => {
            info!(path = %out_path.display(), records = summary.record_count, "snapshot written");
            ok(
                &req.id,
                json!({
                    "path": out_path.to_string_lossy(),
                    "recordCount": summary.record_count,
                    "bytes": summary.bytes
                }),
            )
        }
        Err(e) => err(
            &req.id,
            "io_failed",
            format!("{e:#}"),
            Some(json!({ "path": out_path.to_string_lossy() })),
        ),
    }
}

/// Restores into `workspacePath` (default: the active workspace). The active
/// workspace only changes when it is the restore target or none is selected.
fn handle_backup_restore(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(in_path) = path_param(req, "inPath") else {
        return err(&req.id, "bad_params", "missing inPath", None);
    };
    let Some(target) = path_param(req, "workspacePath").or_else(|| state.workspace.clone())
    else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    if !in_path.is_file() {
        return err(
            &req.id,
            "not_found",
            "snapshot file not found",
            Some(json!({ "path": in_path.to_string_lossy() })),
        );
    }

    // No connection is held between store calls, so the file can be swapped.
    let summary = match backup::restore_workspace(&in_path, &target) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "restore_rejected",
                format!("{e:#}"),
                Some(json!({ "path": in_path.to_string_lossy() })),
            )
        }
    };
    info!(
        from = %in_path.display(),
        workspace = %target.display(),
        records = summary.record_count,
        "workspace restored"
    );

    let reselect = match state.workspace.as_ref() {
        None => true,
        Some(active) => *active == target,
    };
    if reselect {
        if let Err(e) = select_workspace(state, &target) {
            return store_err(&req.id, &e);
        }
    }

    ok(
        &req.id,
        json!({
            "workspacePath": target.to_string_lossy(),
            "recordCount": summary.record_count,
            "selected": reselect
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.snapshot" => Some(handle_backup_snapshot(state, req)),
        "backup.restore" => Some(handle_backup_restore(state, req)),
        _ => None,
    }
}
