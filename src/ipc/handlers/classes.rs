use crate::ipc::helpers::{
    required_i64, required_str, respond, store, store_mut, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_classes_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    let Some(store) = state.store.as_ref() else {
        return Ok(json!({ "classes": [] }));
    };

    let classes: Vec<_> = store
        .list_classes()?
        .into_iter()
        .map(|c| {
            json!({
                "id": c.id,
                "name": c.name,
                "studentCount": c.student_count,
            })
        })
        .collect();
    Ok(json!({ "classes": classes }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> HandlerResult {
    let name = required_str(&req.params, "name")?.trim().to_string();
    if name.is_empty() {
        return Err(HandlerErr::bad_params("name must not be empty"));
    }
    let class_id = store_mut(state)?.add_class(&name)?;
    Ok(json!({ "classId": class_id, "name": name }))
}

fn handle_classes_lookup(state: &mut AppState, req: &Request) -> HandlerResult {
    let name = required_str(&req.params, "name")?;
    let class_id = store(state)?.class_id(name)?;
    Ok(json!({ "classId": class_id, "exists": class_id.is_some() }))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    let class_id = required_i64(&req.params, "classId")?;
    let store = store_mut(state)?;
    let removed_students = store.count_students_in_class(class_id)?;
    if !store.delete_class(class_id)? {
        return Err(HandlerErr::not_found("class").with_details(json!({ "classId": class_id })));
    }
    Ok(json!({ "ok": true, "removedStudents": removed_students }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "classes.list" => handle_classes_list(state, req),
        "classes.create" => handle_classes_create(state, req),
        "classes.lookup" => handle_classes_lookup(state, req),
        "classes.delete" => handle_classes_delete(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
