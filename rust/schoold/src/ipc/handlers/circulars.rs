use crate::ipc::helpers::{
    get_optional_str, get_required_str, query_failed, require_db, respond, update_failed,
    HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{next_id, Circular, SchoolPatch};
use crate::store::{now_rfc3339, today, RecordStore};
use serde_json::{json, Value};

fn handle_list(state: &mut AppState, _req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let mut circulars = RecordStore::new(conn).read().map_err(query_failed)?.circulars;
    circulars.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(json!({ "circulars": circulars }))
}

fn handle_create(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let title = get_required_str(&req.params, "title")?;
    let text = get_required_str(&req.params, "text")?;
    let date = get_optional_str(&req.params, "date").unwrap_or_else(today);

    let store = RecordStore::new(conn);
    let mut circulars = store.read().map_err(query_failed)?.circulars;
    let circular = Circular {
        id: next_id(circulars.iter().map(|c| c.id)),
        title,
        date,
        text,
    };
    circulars.push(circular.clone());

    let now = now_rfc3339();
    store
        .write_logged(
            SchoolPatch {
                circulars: Some(circulars),
                ..Default::default()
            },
            format!("Circular \"{}\" published.", circular.title),
            &now,
        )
        .map_err(update_failed)?;
    Ok(json!({ "circular": circular }))
}

fn handle_logs_list(state: &mut AppState, _req: &Request) -> Result<Value, HandlerErr> {
    let conn = require_db(&state.db)?;
    let logs = RecordStore::new(conn).read().map_err(query_failed)?.logs;
    Ok(json!({ "logs": logs }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "circulars.list" => handle_list(state, req),
        "circulars.create" => handle_create(state, req),
        "logs.list" => handle_logs_list(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
