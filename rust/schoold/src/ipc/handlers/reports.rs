use crate::ipc::helpers::{get_optional_str, query_failed, require_db, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::SchoolData;
use crate::reports;
use crate::store::RecordStore;
use serde_json::{json, Value};

fn load(state: &AppState) -> Result<SchoolData, HandlerErr> {
    let conn = require_db(&state.db)?;
    RecordStore::new(conn).read().map_err(query_failed)
}

fn handle_classes(state: &mut AppState, _req: &Request) -> Result<Value, HandlerErr> {
    let data = load(state)?;
    Ok(json!({ "classes": reports::classes(&data.students) }))
}

fn handle_attendance(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let data = load(state)?;
    let class = get_optional_str(&req.params, "class");
    let rows = reports::attendance_rows(&data.students, class.as_deref());
    let summary = reports::attendance_summary(&rows);
    Ok(json!({ "class": class, "rows": rows, "summary": summary }))
}

fn handle_marks(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let data = load(state)?;
    let class = get_optional_str(&req.params, "class");
    let rows = reports::mark_rows(&data.students, class.as_deref());
    let summary = reports::mark_summary(&rows);
    Ok(json!({ "class": class, "rows": rows, "summary": summary }))
}

fn handle_dashboard(state: &mut AppState, _req: &Request) -> Result<Value, HandlerErr> {
    let data = load(state)?;
    Ok(json!({ "counts": reports::dashboard(&data) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "reports.classes" => handle_classes(state, req),
        "reports.attendance" => handle_attendance(state, req),
        "reports.marks" => handle_marks(state, req),
        "reports.dashboard" => handle_dashboard(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
