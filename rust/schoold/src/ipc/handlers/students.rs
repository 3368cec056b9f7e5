use crate::import::validate::is_valid_email;
use crate::import::RowError;
use crate::ipc::helpers::{
    get_form_str, get_optional_str, get_required_u64, query_failed, require_db, respond,
    update_failed, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{next_id, FeeStatus, SchoolData, SchoolPatch, Student, StudentKey};
use crate::store::{now_rfc3339, RecordStore};
use serde_json::{json, Map, Value};
use tracing::info;

struct StudentForm {
    name: String,
    class: String,
    roll_no: String,
    parent_email: String,
    parent_password: String,
    fee_status: String,
}

impl StudentForm {
    fn from_params(params: &Value) -> Result<Self, HandlerErr> {
        Ok(Self {
            name: get_form_str(params, "name")?.trim().to_string(),
            class: get_form_str(params, "class")?.trim().to_string(),
            roll_no: get_form_str(params, "rollNo")?.trim().to_string(),
            parent_email: get_form_str(params, "parentEmail")?.trim().to_string(),
            parent_password: get_form_str(params, "parentPassword")?,
            fee_status: get_form_str(params, "feeStatus")?.trim().to_string(),
        })
    }

    /// Every failing field is reported, keyed by its wire name.
    fn validate(&self, data: &SchoolData, editing: Option<u64>) -> Result<FeeStatus, Map<String, Value>> {
        let mut errors = Map::new();
        let mut fail = |field: &str, msg: &str| {
            errors.insert(field.to_string(), Value::String(msg.to_string()));
        };

        if self.name.is_empty() {
            fail("name", "Name is required");
        }
        if self.class.is_empty() {
            fail("class", "Class is required");
        }
        if self.roll_no.is_empty() {
            fail("rollNo", "Roll number is required");
        }
        if self.parent_email.is_empty() {
            fail("parentEmail", "Parent email is required");
        } else if !is_valid_email(&self.parent_email) {
            fail("parentEmail", "Invalid email format");
        }
        if self.parent_password.trim().is_empty() {
            fail("parentPassword", "Parent password is required");
        }
        let fee_status = FeeStatus::parse(&self.fee_status);
        if self.fee_status.is_empty() {
            fail("feeStatus", "Fee status is required");
        } else if fee_status.is_none() {
            fail("feeStatus", &RowError::InvalidFeeStatus.to_string());
        }

        let key = StudentKey::new(&self.class, &self.roll_no);
        let taken = data
            .students
            .iter()
            .any(|s| s.key() == key && Some(s.id) != editing);
        if taken {
            fail("rollNo", "A student with this roll number already exists in this class");
        }

        match fee_status {
            Some(f) if errors.is_empty() => Ok(f),
            _ => Err(errors),
        }
    }
}

fn validation_failed(fields: Map<String, Value>) -> HandlerErr {
    HandlerErr::new("validation_failed", "student form has errors")
        .with_details(json!({ "fields": fields }))
}

fn handle_list(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let data = RecordStore::new(conn).read().map_err(query_failed)?;
    let class = get_optional_str(&req.params, "class");

    let mut students = data
        .students
        .into_iter()
        .filter(|s| class.as_deref().map_or(true, |c| s.in_class(c)))
        .collect::<Vec<_>>();
    students.sort_by(|a, b| {
        a.class
            .cmp(&b.class)
            .then_with(|| a.roll_no.cmp(&b.roll_no))
    });
    Ok(json!({ "students": students }))
}

fn handle_create(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let store = RecordStore::new(conn);
    let data = store.read().map_err(query_failed)?;
    let form = StudentForm::from_params(&req.params)?;
    let fee_status = form.validate(&data, None).map_err(validation_failed)?;

    let student = Student {
        id: next_id(data.students.iter().map(|s| s.id)),
        name: form.name,
        class: form.class,
        roll_no: form.roll_no,
        parent_email: form.parent_email,
        parent_password: form.parent_password,
        fee_status,
        attendance: Vec::new(),
        marks: Vec::new(),
    };
    let mut students = data.students;
    students.push(student.clone());

    let now = now_rfc3339();
    store
        .write_logged(
            SchoolPatch {
                students: Some(students),
                ..Default::default()
            },
            format!("Student {} added to {}.", student.name, student.class),
            &now,
        )
        .map_err(update_failed)?;
    info!(id = student.id, "student created");
    Ok(json!({ "student": student }))
}

fn handle_update(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let id = get_required_u64(&req.params, "id")?;
    let store = RecordStore::new(conn);
    let data = store.read().map_err(query_failed)?;
    if !data.students.iter().any(|s| s.id == id) {
        return Err(HandlerErr::new("not_found", "student not found"));
    }
    let form = StudentForm::from_params(&req.params)?;
    let fee_status = form.validate(&data, Some(id)).map_err(validation_failed)?;

    let mut updated = None;
    let students = data
        .students
        .into_iter()
        .map(|mut s| {
            if s.id == id {
                s.name = form.name.clone();
                s.class = form.class.clone();
                s.roll_no = form.roll_no.clone();
                s.parent_email = form.parent_email.clone();
                s.parent_password = form.parent_password.clone();
                s.fee_status = fee_status;
                updated = Some(s.clone());
            }
            s
        })
        .collect::<Vec<_>>();

    store
        .write(
            SchoolPatch {
                students: Some(students),
                ..Default::default()
            },
            &now_rfc3339(),
        )
        .map_err(update_failed)?;
    info!(id, "student updated");
    Ok(json!({ "student": updated }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let id = get_required_u64(&req.params, "id")?;
    let store = RecordStore::new(conn);
    let data = store.read().map_err(query_failed)?;
    let Some(removed) = data.students.iter().find(|s| s.id == id).cloned() else {
        return Err(HandlerErr::new("not_found", "student not found"));
    };
    let students = data
        .students
        .into_iter()
        .filter(|s| s.id != id)
        .collect::<Vec<_>>();

    let now = now_rfc3339();
    store
        .write_logged(
            SchoolPatch {
                students: Some(students),
                ..Default::default()
            },
            format!("Student {} removed from {}.", removed.name, removed.class),
            &now,
        )
        .map_err(update_failed)?;
    info!(id, "student deleted");
    Ok(json!({ "deleted": id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_list(state, req),
        "students.create" => handle_create(state, req),
        "students.update" => handle_update(state, req),
        "students.delete" => handle_delete(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
