use super::setup::import_max_rows;
use crate::import::{
    self, merge_marks, merge_students, valid_records, Parsed, PreviewRow, STUDENT_TEMPLATE,
    STUDENT_TEMPLATE_FILE_NAME,
};
use crate::ipc::helpers::{
    get_optional_str, get_required_str, query_failed, require_db, resolve_class_target, respond,
    update_failed, ClassTarget, HandlerErr,
};
use crate::ipc::types::{AppState, PendingMarkImport, PendingStudentImport, Request};
use crate::model::SchoolPatch;
use crate::store::{now_rfc3339, RecordStore};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// File text plus a label for where it came from. `inPath` wins over inline `text`.
fn read_source(params: &Value) -> Result<(String, String), HandlerErr> {
    if let Some(in_path) = get_optional_str(params, "inPath") {
        let text = import::read_import_file(Path::new(&in_path))
            .map_err(|e| HandlerErr::from(e).with_details(json!({ "path": in_path })))?;
        return Ok((text, in_path));
    }
    match params.get("text").and_then(|v| v.as_str()) {
        Some(text) => Ok((text.to_string(), "inline".to_string())),
        None => Err(HandlerErr::bad_params("missing inPath or text")),
    }
}

fn to_json<T: Serialize>(v: &T) -> Result<Value, HandlerErr> {
    serde_json::to_value(v).map_err(|e| HandlerErr::new("internal", e.to_string()))
}

/// Every row carries the raw cells. Valid rows add their typed fields on top
/// (`score` for marks, the canonical `feeStatus` for students).
fn preview_row_json<V: Serialize, R: Serialize>(
    row: &PreviewRow<Parsed<V, R>>,
) -> Result<Value, HandlerErr> {
    let (mut out, error) = match &row.record {
        Parsed::Valid { raw, value } => {
            let mut out = to_json(raw)?;
            if let (Some(cells), Value::Object(typed)) = (out.as_object_mut(), to_json(value)?) {
                cells.extend(typed);
            }
            (out, None)
        }
        Parsed::Invalid { raw, error } => (to_json(raw)?, Some(error)),
    };
    out["line"] = json!(row.line);
    match error {
        None => out["status"] = json!("ok"),
        Some(e) => {
            out["status"] = json!("error");
            out["errorCode"] = json!(e.code());
            out["error"] = json!(e.to_string());
        }
    }
    Ok(out)
}

fn preview_json<V: Serialize, R: Serialize>(
    preview_id: &str,
    source: &str,
    rows: &[PreviewRow<Parsed<V, R>>],
) -> Result<Value, HandlerErr> {
    let valid = rows.iter().filter(|r| r.record.valid().is_some()).count();
    let rendered = rows
        .iter()
        .map(preview_row_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({
        "previewId": preview_id,
        "source": source,
        "rowsParsed": rows.len(),
        "valid": valid,
        "invalid": rows.len() - valid,
        "rows": rendered
    }))
}

fn max_rows(conn: &Connection) -> Result<usize, HandlerErr> {
    import_max_rows(conn).map_err(query_failed)
}

fn structural(e: import::ImportError, kind: &str) -> HandlerErr {
    warn!(kind, error = %e, "import rejected");
    HandlerErr::from(e)
}

fn handle_template(req: &Request) -> Result<Value, HandlerErr> {
    let mut out = json!({
        "fileName": STUDENT_TEMPLATE_FILE_NAME,
        "text": STUDENT_TEMPLATE
    });
    if let Some(out_path) = get_optional_str(&req.params, "outPath") {
        let path = PathBuf::from(&out_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                HandlerErr::new("io_failed", e.to_string()).with_details(json!({ "path": out_path }))
            })?;
        }
        std::fs::write(&path, STUDENT_TEMPLATE).map_err(|e| {
            HandlerErr::new("io_failed", e.to_string()).with_details(json!({ "path": out_path }))
        })?;
        out["path"] = json!(out_path);
    }
    Ok(out)
}

fn handle_students_preview(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let limit = max_rows(conn)?;
    let (text, source) = read_source(&req.params)?;
    let rows = import::parse_student_import(&text, limit).map_err(|e| structural(e, "students"))?;

    let preview_id = Uuid::new_v4().to_string();
    let out = preview_json(&preview_id, &source, &rows)?;
    info!(preview_id = %preview_id, rows = rows.len(), "student import previewed");
    state.pending.students = Some(PendingStudentImport {
        preview_id,
        source,
        rows,
    });
    Ok(out)
}

fn handle_students_apply(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let preview_id = get_required_str(&req.params, "previewId")?;
    let conn = require_db(&state.db)?;
    let Some(pending) = state
        .pending
        .students
        .as_ref()
        .filter(|p| p.preview_id == preview_id)
    else {
        return Err(HandlerErr::new("preview_not_found", "no student import with that previewId"));
    };

    let records = valid_records(&pending.rows);
    if records.is_empty() {
        return Ok(json!({
            "committed": false,
            "added": 0,
            "skipped": 0,
            "message": "No valid students to upload."
        }));
    }

    let store = RecordStore::new(conn);
    let current = store.read().map_err(query_failed)?;
    let (students, outcome) = merge_students(&current.students, &records);
    if outcome.added == 0 {
        return Ok(json!({
            "committed": false,
            "added": 0,
            "skipped": outcome.skipped,
            "message": "No new students to add (all already exist)."
        }));
    }

    let now = now_rfc3339();
    store
        .write_logged(
            SchoolPatch {
                students: Some(students),
                ..Default::default()
            },
            format!("Bulk upload added {} students from {}.", outcome.added, pending.source),
            &now,
        )
        .map_err(update_failed)?;
    info!(added = outcome.added, skipped = outcome.skipped, "student import committed");
    state.pending.students = None;

    Ok(json!({
        "committed": true,
        "added": outcome.added,
        "skipped": outcome.skipped,
        "message": format!("Successfully added {} new students.", outcome.added)
    }))
}

fn handle_marks_preview(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let data = RecordStore::new(conn).read().map_err(query_failed)?;
    let ClassTarget { class, subject, .. } = resolve_class_target(&data, &req.params)?;
    let limit = max_rows(conn)?;
    let (text, source) = read_source(&req.params)?;
    let rows = import::parse_mark_import(&text, limit).map_err(|e| structural(e, "marks"))?;

    let preview_id = Uuid::new_v4().to_string();
    let mut out = preview_json(&preview_id, &source, &rows)?;
    out["class"] = json!(class);
    out["subject"] = json!(subject);
    info!(preview_id = %preview_id, rows = rows.len(), class = %class, "marks import previewed");
    state.pending.marks = Some(PendingMarkImport {
        preview_id,
        source,
        class,
        subject,
        rows,
    });
    Ok(out)
}

fn handle_marks_apply(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let preview_id = get_required_str(&req.params, "previewId")?;
    let conn = require_db(&state.db)?;
    let Some(pending) = state
        .pending
        .marks
        .as_ref()
        .filter(|p| p.preview_id == preview_id)
    else {
        return Err(HandlerErr::new("preview_not_found", "no marks import with that previewId"));
    };

    let records = valid_records(&pending.rows);
    if records.is_empty() {
        return Ok(json!({
            "committed": false,
            "updated": 0,
            "added": 0,
            "unmatched": 0,
            "message": "No valid marks to upload."
        }));
    }

    let store = RecordStore::new(conn);
    let current = store.read().map_err(query_failed)?;
    let now = now_rfc3339();
    let (students, outcome) =
        merge_marks(&current.students, &pending.class, &pending.subject, &records, &now);
    store
        .write_logged(
            SchoolPatch {
                students: Some(students),
                ..Default::default()
            },
            format!(
                "Marks uploaded for {} students in {} ({}).",
                outcome.students_touched(),
                pending.class,
                pending.subject
            ),
            &now,
        )
        .map_err(update_failed)?;
    info!(
        updated = outcome.updated,
        added = outcome.added,
        unmatched = outcome.unmatched,
        "marks import committed"
    );
    state.pending.marks = None;

    Ok(json!({
        "committed": true,
        "updated": outcome.updated,
        "added": outcome.added,
        "unmatched": outcome.unmatched,
        "message": format!("Successfully uploaded marks for {} students.", outcome.students_touched())
    }))
}

fn handle_cancel(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let preview_id = get_required_str(&req.params, "previewId")?;
    let pending = &mut state.pending;
    if pending.students.as_ref().is_some_and(|p| p.preview_id == preview_id) {
        pending.students = None;
        return Ok(json!({ "cancelled": "students" }));
    }
    if pending.marks.as_ref().is_some_and(|p| p.preview_id == preview_id) {
        pending.marks = None;
        return Ok(json!({ "cancelled": "marks" }));
    }
    Err(HandlerErr::new("preview_not_found", "no import with that previewId"))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "students.importTemplate" => handle_template(req),
        "students.previewImport" => handle_students_preview(state, req),
        "students.applyImport" => handle_students_apply(state, req),
        "marks.previewImport" => handle_marks_preview(state, req),
        "marks.applyImport" => handle_marks_apply(state, req),
        "imports.cancel" => handle_cancel(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
