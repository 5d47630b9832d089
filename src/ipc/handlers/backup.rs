use crate::backup;
use crate::ipc::helpers::{required_str, respond, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::Path;

fn current_db_path(state: &AppState) -> Result<std::path::PathBuf, HandlerErr> {
    state
        .db_path
        .clone()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

fn handle_backup_export(state: &mut AppState, req: &Request) -> HandlerResult {
    let out_path = required_str(&req.params, "outPath")?;
    let db_path = current_db_path(state)?;
    let summary = backup::export_bundle(&db_path, Path::new(out_path))
        .map_err(|e| HandlerErr::new("backup_failed", format!("{e:#}")))?;
    Ok(json!({
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "dbSha256": summary.db_sha256,
    }))
}

/// Replaces the active database. The connection is closed for the swap and
/// reopened afterwards, also when the restore fails.
fn handle_backup_import(state: &mut AppState, req: &Request) -> HandlerResult {
    let in_path = required_str(&req.params, "inPath")?;
    let db_path = current_db_path(state)?;

    state.close_store();
    let restored = backup::import_bundle(Path::new(in_path), &db_path);
    state
        .open_store(db_path)
        .map_err(|e| HandlerErr::new("db_open_failed", e.to_string()))?;

    let summary = restored.map_err(|e| HandlerErr::new("backup_failed", format!("{e:#}")))?;
    Ok(json!({ "bundleFormatDetected": summary.bundle_format_detected }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "backup.export" => handle_backup_export(state, req),
        "backup.import" => handle_backup_import(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
