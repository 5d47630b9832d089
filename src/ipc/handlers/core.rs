use crate::ipc::helpers::{optional_str, respond, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "dbPath": state.db_path.as_ref().map(|p| p.to_string_lossy().to_string()),
        "storeOpen": state.store.is_some(),
    }))
}

/// Switches to another data directory. Without `path` the configured data
/// directory is (re)opened.
fn handle_workspace_select(state: &mut AppState, req: &Request) -> HandlerResult {
    let dir = optional_str(&req.params, "path")
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config.data_dir());
    let db_path = dir.join(&state.config.storage.database_name);

    state
        .open_store(db_path.clone())
        .map_err(|e| HandlerErr::new("db_open_failed", e.to_string()))?;
    Ok(json!({
        "dataDir": dir.to_string_lossy(),
        "dbPath": db_path.to_string_lossy(),
    }))
}

fn handle_last_error(state: &mut AppState, _req: &Request) -> HandlerResult {
    let message = state.store.as_ref().and_then(|s| s.last_error());
    Ok(json!({ "message": message }))
}

fn handle_config_get(state: &mut AppState, _req: &Request) -> HandlerResult {
    let images = &state.config.images;
    Ok(json!({
        "dataDir": state.config.data_dir().to_string_lossy(),
        "databaseName": state.config.storage.database_name,
        "images": {
            "maxSizeKb": images.max_size_kb,
            "minSizeKb": images.min_size_kb,
            "encodeQuality": images.encode_quality,
            "displayWidth": images.display_width,
            "displayHeight": images.display_height,
        }
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "health" => handle_health(state, req),
        "workspace.select" => handle_workspace_select(state, req),
        "store.lastError" => handle_last_error(state, req),
        "config.get" => handle_config_get(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
