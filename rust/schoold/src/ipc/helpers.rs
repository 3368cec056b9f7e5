use crate::import::ImportError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::Request;
use crate::model::SchoolData;
use rusqlite::Connection;
use serde_json::{json, Value};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<ImportError> for HandlerErr {
    fn from(e: ImportError) -> Self {
        let details = match &e {
            ImportError::MissingColumns { missing, .. } => Some(json!({ "missingColumns": missing })),
            ImportError::TooManyRows { rows, limit } => Some(json!({ "rows": rows, "limit": limit })),
            ImportError::Unreadable(_) | ImportError::Empty => None,
        };
        Self {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

pub fn query_failed(e: anyhow::Error) -> HandlerErr {
    HandlerErr::new("db_query_failed", format!("{e:#}"))
}

pub fn update_failed(e: anyhow::Error) -> HandlerErr {
    HandlerErr::new("db_update_failed", format!("{e:#}"))
}

/// Wrap a handler body that returns `Result` into a response envelope.
pub fn respond(req: &Request, result: Result<Value, HandlerErr>) -> Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

/// Takes the field rather than the whole state so callers can still mutate `state.pending`.
pub fn require_db(db: &Option<Connection>) -> Result<&Connection, HandlerErr> {
    db.as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn get_required_u64(params: &Value, key: &str) -> Result<u64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// String field for forms: absent reads as "", non-strings are rejected.
pub fn get_form_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(HandlerErr::bad_params(format!("{} must be string", key))),
    }
}

/// Class and subject a teacher works on, for marks imports and homework.
pub struct ClassTarget {
    pub class: String,
    pub subject: String,
    pub teacher_name: String,
}

/// From `teacherId` (its assigned class and subject), or from explicit `class` + `subject`.
pub fn resolve_class_target(data: &SchoolData, params: &Value) -> Result<ClassTarget, HandlerErr> {
    if let Some(teacher_id) = params.get("teacherId").and_then(|v| v.as_u64()) {
        let teacher = data
            .teachers
            .iter()
            .find(|t| t.id == teacher_id)
            .ok_or_else(|| HandlerErr::new("not_found", "teacher not found"))?;
        if teacher.assigned_class.trim().is_empty() || teacher.subject.trim().is_empty() {
            return Err(HandlerErr::bad_params(
                "teacher has no assigned class or subject",
            ));
        }
        return Ok(ClassTarget {
            class: teacher.assigned_class.clone(),
            subject: teacher.subject.clone(),
            teacher_name: teacher.name.clone(),
        });
    }
    Ok(ClassTarget {
        class: get_required_str(params, "class")?,
        subject: get_required_str(params, "subject")?,
        teacher_name: get_optional_str(params, "teacherName").unwrap_or_default(),
    })
}
