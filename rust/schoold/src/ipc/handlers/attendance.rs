use crate::ipc::helpers::{
    get_optional_str, get_required_str, query_failed, require_db, respond, update_failed,
    HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceStatus, SchoolPatch};
use crate::store::{now_rfc3339, today, RecordStore};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;

fn parse_date(params: &Value) -> Result<String, HandlerErr> {
    match get_optional_str(params, "date") {
        None => Ok(today()),
        Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
            .map(|nd| nd.format("%Y-%m-%d").to_string())
            .map_err(|_| HandlerErr::bad_params("date must be YYYY-MM-DD")),
    }
}

fn parse_entries(params: &Value) -> Result<HashMap<u64, AttendanceStatus>, HandlerErr> {
    let Some(raw) = params.get("entries") else {
        return Ok(HashMap::new());
    };
    let arr = raw
        .as_array()
        .ok_or_else(|| HandlerErr::bad_params("entries must be an array"))?;
    let mut out = HashMap::new();
    for (i, e) in arr.iter().enumerate() {
        let student_id = e
            .get("studentId")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| HandlerErr::bad_params(format!("entries[{}].studentId missing", i)))?;
        let status = e
            .get("status")
            .and_then(|v| v.as_str())
            .and_then(AttendanceStatus::parse)
            .ok_or_else(|| {
                HandlerErr::bad_params(format!(
                    "entries[{}].status must be one of: Present, Absent, Late, Excused",
                    i
                ))
            })?;
        out.insert(student_id, status);
    }
    Ok(out)
}

fn handle_save(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let class = get_required_str(&req.params, "class")?;
    let date = parse_date(&req.params)?;
    let entries = parse_entries(&req.params)?;

    let store = RecordStore::new(conn);
    let data = store.read().map_err(query_failed)?;
    if let Some(stray) = entries.keys().find(|id| {
        !data
            .students
            .iter()
            .any(|s| s.id == **id && s.in_class(&class))
    }) {
        return Err(HandlerErr::bad_params(format!(
            "student {} is not in class {}",
            stray, class
        )));
    }

    let mut saved = 0usize;
    let students = data
        .students
        .into_iter()
        .map(|mut s| {
            if s.in_class(&class) {
                let status = entries.get(&s.id).copied().unwrap_or(AttendanceStatus::Present);
                s.record_attendance(&date, status);
                saved += 1;
            }
            s
        })
        .collect::<Vec<_>>();

    store
        .write_logged(
            SchoolPatch {
                students: Some(students),
                ..Default::default()
            },
            format!("Attendance saved for {} on {}.", class, date),
            &now_rfc3339(),
        )
        .map_err(update_failed)?;
    info!(class = %class, date = %date, saved, "attendance saved");
    Ok(json!({
        "class": class,
        "date": date,
        "saved": saved,
        "message": "Attendance saved successfully!"
    }))
}

fn handle_for_class(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let class = get_required_str(&req.params, "class")?;
    let date = parse_date(&req.params)?;
    let data = RecordStore::new(conn).read().map_err(query_failed)?;
    let mut students = data
        .students
        .iter()
        .filter(|s| s.in_class(&class))
        .collect::<Vec<_>>();
    students.sort_by(|a, b| a.roll_no.cmp(&b.roll_no));

    let rows = students
        .into_iter()
        .map(|s| {
            let status = s
                .attendance
                .iter()
                .find(|a| a.date == date)
                .map(|a| a.status)
                .unwrap_or(AttendanceStatus::Present);
            json!({
                "studentId": s.id,
                "name": s.name,
                "rollNo": s.roll_no,
                "status": status
            })
        })
        .collect::<Vec<_>>();
    Ok(json!({ "class": class, "date": date, "students": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "attendance.save" => handle_save(state, req),
        "attendance.forClass" => handle_for_class(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
