use crate::ipc::helpers::{
    get_form_str, get_optional_str, query_failed, require_db, resolve_class_target, respond,
    update_failed, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{next_id, Homework, SchoolPatch};
use crate::store::{now_rfc3339, today, RecordStore};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::info;

fn handle_create(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let store = RecordStore::new(conn);
    let data = store.read().map_err(query_failed)?;
    let target = resolve_class_target(&data, &req.params)?;

    let notes = get_form_str(&req.params, "notes")?;
    if notes.trim().is_empty() {
        return Err(HandlerErr::new("validation_failed", "Please enter homework content.")
            .with_details(json!({ "fields": { "notes": "Please enter homework content." } })));
    }
    let date = match get_optional_str(&req.params, "date") {
        None => today(),
        Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
            .map(|nd| nd.format("%Y-%m-%d").to_string())
            .map_err(|_| HandlerErr::bad_params("date must be YYYY-MM-DD"))?,
    };

    let now = now_rfc3339();
    let homework = Homework {
        id: next_id(data.homework.iter().map(|h| h.id)),
        class: target.class,
        date,
        subject: target.subject,
        notes,
        teacher_name: target.teacher_name,
        timestamp: now.clone(),
    };
    let mut all = data.homework;
    all.push(homework.clone());
    store
        .write(
            SchoolPatch {
                homework: Some(all),
                ..Default::default()
            },
            &now,
        )
        .map_err(update_failed)?;
    info!(id = homework.id, class = %homework.class, "homework uploaded");
    Ok(json!({
        "homework": homework,
        "message": "Homework uploaded successfully!"
    }))
}

/// Newest date first.
fn handle_list(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let class = get_optional_str(&req.params, "class");
    let mut homework = RecordStore::new(conn)
        .read()
        .map_err(query_failed)?
        .homework
        .into_iter()
        .filter(|h| class.as_deref().map_or(true, |c| h.class == c))
        .collect::<Vec<_>>();
    homework.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    Ok(json!({ "homework": homework }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "homework.create" => handle_create(state, req),
        "homework.list" => handle_list(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
