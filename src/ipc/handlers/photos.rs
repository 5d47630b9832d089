use crate::ipc::helpers::{
    optional_u32, required_i64, required_str, respond, store, store_mut, HandlerErr,
    HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::photo::PhotoProcessor;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::json;
use std::path::Path;

fn handle_photos_upload(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_i64(&req.params, "studentId")?;
    let path = required_str(&req.params, "path")?;
    let target_kb = req
        .params
        .get("targetKb")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(state.config.images.max_size_kb);
    let quality = state.config.images.encode_quality;

    if store(state)?.student(id)?.is_none() {
        return Err(HandlerErr::not_found("student").with_details(json!({ "studentId": id })));
    }

    let fitted = PhotoProcessor::from_path(Path::new(path))?.fit_to_size(target_kb, quality)?;
    store_mut(state)?.set_student_photo(id, Some(&fitted.bytes))?;
    Ok(json!({
        "bytes": fitted.bytes.len(),
        "quality": fitted.quality,
        "width": fitted.width,
        "height": fitted.height,
        "resized": fitted.resized,
    }))
}

/// Returns the stored photo as a PNG scaled for display. Bounds default to
/// the configured display size.
fn handle_photos_get(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_i64(&req.params, "studentId")?;
    let max_width = optional_u32(&req.params, "maxWidth").or(Some(state.config.images.display_width));
    let max_height =
        optional_u32(&req.params, "maxHeight").or(Some(state.config.images.display_height));

    let Some(student) = store(state)?.student(id)? else {
        return Err(HandlerErr::not_found("student").with_details(json!({ "studentId": id })));
    };
    let Some(photo) = student.photo.filter(|p| !p.is_empty()) else {
        return Ok(json!({ "hasPhoto": false }));
    };

    let shown = PhotoProcessor::from_bytes(&photo)?.display_png(max_width, max_height)?;
    Ok(json!({
        "hasPhoto": true,
        "storedBytes": photo.len(),
        "width": shown.width,
        "height": shown.height,
        "pngBase64": BASE64.encode(&shown.png),
    }))
}

fn handle_photos_clear(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_i64(&req.params, "studentId")?;
    if !store_mut(state)?.set_student_photo(id, None)? {
        return Err(HandlerErr::not_found("student").with_details(json!({ "studentId": id })));
    }
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "photos.upload" => handle_photos_upload(state, req),
        "photos.get" => handle_photos_get(state, req),
        "photos.clear" => handle_photos_clear(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
