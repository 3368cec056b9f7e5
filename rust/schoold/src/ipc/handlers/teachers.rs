use crate::import::validate::is_valid_email;
use crate::ipc::helpers::{
    get_form_str, get_required_u64, query_failed, require_db, respond, update_failed, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{next_id, normalize_key, SchoolData, SchoolPatch, Teacher};
use crate::store::{now_rfc3339, RecordStore};
use serde_json::{json, Map, Value};
use tracing::info;

struct TeacherForm {
    name: String,
    email: String,
    password: String,
    subject: String,
    assigned_class: String,
}

impl TeacherForm {
    fn from_params(params: &Value) -> Result<Self, HandlerErr> {
        Ok(Self {
            name: get_form_str(params, "name")?.trim().to_string(),
            email: get_form_str(params, "email")?.trim().to_string(),
            password: get_form_str(params, "password")?,
            subject: get_form_str(params, "subject")?.trim().to_string(),
            assigned_class: get_form_str(params, "assignedClass")?.trim().to_string(),
        })
    }

    fn validate(&self, data: &SchoolData, editing: Option<u64>) -> Result<(), Map<String, Value>> {
        let mut errors = Map::new();
        if self.name.is_empty() {
            errors.insert("name".into(), json!("Name is required"));
        }
        if self.email.is_empty() {
            errors.insert("email".into(), json!("Email is required"));
        } else if !is_valid_email(&self.email) {
            errors.insert("email".into(), json!("Invalid email format"));
        }
        if self.password.trim().is_empty() {
            errors.insert("password".into(), json!("Password is required"));
        }
        if self.subject.is_empty() {
            errors.insert("subject".into(), json!("Subject is required"));
        }
        let email = normalize_key(&self.email);
        if data
            .teachers
            .iter()
            .any(|t| normalize_key(&t.email) == email && Some(t.id) != editing)
        {
            errors.insert("email".into(), json!("Email already exists for another teacher"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn into_teacher(self, id: u64) -> Teacher {
        Teacher {
            id,
            name: self.name,
            email: self.email,
            password: self.password,
            subject: self.subject,
            assigned_class: self.assigned_class,
        }
    }
}

fn validation_failed(fields: Map<String, Value>) -> HandlerErr {
    HandlerErr::new("validation_failed", "teacher form has errors")
        .with_details(json!({ "fields": fields }))
}

fn write_teachers(store: &RecordStore, teachers: Vec<Teacher>, log: Option<String>) -> Result<(), HandlerErr> {
    let patch = SchoolPatch {
        teachers: Some(teachers),
        ..Default::default()
    };
    let now = now_rfc3339();
    match log {
        Some(message) => store.write_logged(patch, message, &now),
        None => store.write(patch, &now),
    }
    .map_err(update_failed)?;
    Ok(())
}

fn handle_list(state: &mut AppState, _req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let data = RecordStore::new(conn).read().map_err(query_failed)?;
    Ok(json!({ "teachers": data.teachers }))
}

fn handle_create(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let store = RecordStore::new(conn);
    let data = store.read().map_err(query_failed)?;
    let form = TeacherForm::from_params(&req.params)?;
    form.validate(&data, None).map_err(validation_failed)?;

    let teacher = form.into_teacher(next_id(data.teachers.iter().map(|t| t.id)));
    let mut teachers = data.teachers;
    teachers.push(teacher.clone());
    write_teachers(&store, teachers, Some(format!("Teacher {} added.", teacher.name)))?;
    info!(id = teacher.id, "teacher created");
    Ok(json!({ "teacher": teacher }))
}

fn handle_update(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let id = get_required_u64(&req.params, "id")?;
    let store = RecordStore::new(conn);
    let data = store.read().map_err(query_failed)?;
    if !data.teachers.iter().any(|t| t.id == id) {
        return Err(HandlerErr::new("not_found", "teacher not found"));
    }
    let form = TeacherForm::from_params(&req.params)?;
    form.validate(&data, Some(id)).map_err(validation_failed)?;

    let teacher = form.into_teacher(id);
    let teachers = data
        .teachers
        .into_iter()
        .map(|t| if t.id == id { teacher.clone() } else { t })
        .collect::<Vec<_>>();
    write_teachers(&store, teachers, None)?;
    info!(id, "teacher updated");
    Ok(json!({ "teacher": teacher }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let id = get_required_u64(&req.params, "id")?;
    let store = RecordStore::new(conn);
    let data = store.read().map_err(query_failed)?;
    let Some(removed) = data.teachers.iter().find(|t| t.id == id).cloned() else {
        return Err(HandlerErr::new("not_found", "teacher not found"));
    };
    let teachers = data
        .teachers
        .into_iter()
        .filter(|t| t.id != id)
        .collect::<Vec<_>>();
    write_teachers(&store, teachers, Some(format!("Teacher {} removed.", removed.name)))?;
    info!(id, "teacher deleted");
    Ok(json!({ "deleted": id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "teachers.list" => handle_list(state, req),
        "teachers.create" => handle_create(state, req),
        "teachers.update" => handle_update(state, req),
        "teachers.delete" => handle_delete(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
