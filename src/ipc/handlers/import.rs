use crate::import;
use crate::ipc::helpers::{required_str, respond, store_mut, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::spreadsheet::ImportFormat;
use serde_json::json;
use std::path::Path;

fn handle_import_file(state: &mut AppState, req: &Request) -> HandlerResult {
    let path = required_str(&req.params, "path")?;
    let summary = import::import_file(store_mut(state)?, Path::new(path))?;
    let skipped: Vec<_> = summary
        .skipped
        .iter()
        .map(|s| json!({ "line": s.line, "found": s.found, "expected": s.expected }))
        .collect();
    Ok(json!({
        "imported": summary.imported,
        "classesCreated": summary.classes_created,
        "skipped": skipped,
    }))
}

fn handle_import_formats(_state: &mut AppState, _req: &Request) -> HandlerResult {
    let formats: Vec<_> = ImportFormat::ADVERTISED
        .iter()
        .map(|f| json!({ "extension": f.extension(), "readable": f.is_readable() }))
        .collect();
    Ok(json!({
        "formats": formats,
        "requiredColumns": import::REQUIRED_COLUMNS,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "import.file" => handle_import_file(state, req),
        "import.formats" => handle_import_formats(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
