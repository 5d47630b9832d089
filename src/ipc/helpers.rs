use serde_json::json;

use crate::error::RosterError;
use crate::ipc::error::{err, ok, roster_err};
use crate::ipc::types::{AppState, Request};
use crate::store::{ClassKey, RosterStore, StudentRecord};

pub struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
    source: Option<RosterError>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new("not_found", format!("{} not found", what))
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        match self.source {
            Some(e) => roster_err(id, &e),
            None => err(id, self.code, self.message, self.details),
        }
    }
}

impl From<RosterError> for HandlerErr {
    fn from(e: RosterError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
            details: None,
            source: Some(e),
        }
    }
}

pub type HandlerResult = Result<serde_json::Value, HandlerErr>;

pub fn respond(req: &Request, result: HandlerResult) -> serde_json::Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn store(state: &AppState) -> Result<&RosterStore, HandlerErr> {
    state
        .store
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn store_mut(state: &mut AppState) -> Result<&mut RosterStore, HandlerErr> {
    state
        .store
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn required_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

pub fn required_i64(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_i64(params: &serde_json::Value, key: &str) -> Option<i64> {
    params.get(key).and_then(|v| v.as_i64())
}

pub fn optional_u32(params: &serde_json::Value, key: &str) -> Option<u32> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
}

/// `classId` wins over `className`; neither means "no class filter".
pub fn class_key(params: &serde_json::Value) -> Option<ClassKey<'_>> {
    if let Some(id) = optional_i64(params, "classId") {
        return Some(ClassKey::Id(id));
    }
    optional_str(params, "className").map(ClassKey::Name)
}

pub fn student_json(s: &StudentRecord) -> serde_json::Value {
    json!({
        "id": s.id,
        "name": s.name,
        "studentId": s.student_id,
        "classId": s.class_id,
        "className": s.class_name,
        "hasPhoto": s.has_photo(),
        "createdAt": s.created_at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
    })
}
