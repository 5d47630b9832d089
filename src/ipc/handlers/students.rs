use crate::ipc::helpers::{
    class_key, optional_i64, optional_str, required_i64, required_str, respond, store, store_mut,
    student_json, HandlerErr, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use crate::store::{ClassKey, NewStudent, StudentUpdate};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let store = store(state)?;
    let students = match class_key(&req.params) {
        Some(key) => store.students_in_class(key)?,
        None => store.all_students()?,
    };
    let students: Vec<_> = students.iter().map(student_json).collect();
    Ok(json!({ "students": students }))
}

fn handle_students_get(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_i64(&req.params, "studentId")?;
    let student = store(state)?.student(id)?;
    Ok(json!({ "student": student.as_ref().map(student_json) }))
}

fn handle_students_search(state: &mut AppState, req: &Request) -> HandlerResult {
    let keyword = required_str(&req.params, "keyword")?;
    let students = store(state)?.search_students(keyword)?;
    let students: Vec<_> = students.iter().map(student_json).collect();
    Ok(json!({ "students": students }))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> HandlerResult {
    let student = NewStudent::new(
        required_str(&req.params, "name")?,
        required_str(&req.params, "studentId")?,
        required_str(&req.params, "className")?,
    );
    let id = store_mut(state)?.add_student(&student)?;
    Ok(json!({ "id": id }))
}

/// Partial update: absent fields keep their stored value. `className`
/// moves the student to that class, creating it if needed.
fn handle_students_update(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_i64(&req.params, "studentId")?;
    let store = store_mut(state)?;
    let Some(current) = store.student(id)? else {
        return Err(HandlerErr::not_found("student").with_details(json!({ "studentId": id })));
    };

    let mut update = StudentUpdate::from(current);
    if let Some(name) = optional_str(&req.params, "name") {
        update.name = name.to_string();
    }
    if let Some(external) = optional_str(&req.params, "externalId") {
        update.student_id = external.to_string();
    }
    let class_name = match optional_i64(&req.params, "classId") {
        Some(class_id) => {
            update.class_id = class_id;
            None
        }
        None => optional_str(&req.params, "className"),
    };

    match class_name {
        Some(class_name) => store.update_student_in_class(&update, class_name)?,
        None => store.update_student(&update)?,
    };
    let updated = store.student(id)?;
    Ok(json!({ "student": updated.as_ref().map(student_json) }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = required_i64(&req.params, "studentId")?;
    if !store_mut(state)?.delete_student(id)? {
        return Err(HandlerErr::not_found("student").with_details(json!({ "studentId": id })));
    }
    Ok(json!({ "ok": true }))
}

fn handle_students_count(state: &mut AppState, req: &Request) -> HandlerResult {
    let store = store(state)?;
    let count = match class_key(&req.params) {
        Some(ClassKey::Id(id)) => store.count_students_in_class(id)?,
        Some(ClassKey::Name(name)) => match store.class_id(name)? {
            Some(id) => store.count_students_in_class(id)?,
            None => 0,
        },
        None => store.count_students()?,
    };
    Ok(json!({ "count": count }))
}

fn handle_students_clear(state: &mut AppState, _req: &Request) -> HandlerResult {
    let removed = store_mut(state)?.clear_all_students()?;
    Ok(json!({ "removed": removed }))
}

fn handle_students_random(state: &mut AppState, req: &Request) -> HandlerResult {
    let Some(key) = class_key(&req.params) else {
        return Err(HandlerErr::bad_params("missing classId or className"));
    };
    let picked = store(state)?.random_student(key)?;
    Ok(json!({ "student": picked.as_ref().map(student_json) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_students_list(state, req),
        "students.get" => handle_students_get(state, req),
        "students.search" => handle_students_search(state, req),
        "students.create" => handle_students_create(state, req),
        "students.update" => handle_students_update(state, req),
        "students.delete" => handle_students_delete(state, req),
        "students.count" => handle_students_count(state, req),
        "students.clear" => handle_students_clear(state, req),
        "students.random" => handle_students_random(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
