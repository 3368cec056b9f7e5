use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{query_failed, require_db, respond};
use crate::ipc::types::{AppState, Request};
use crate::store::{now_rfc3339, RecordStore};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let conn = match db::open_db(&path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "workspace open failed");
            return err(&req.id, "db_open_failed", format!("{e:#}"), None);
        }
    };
    let seeded = match RecordStore::new(&conn).ensure_seeded(&now_rfc3339()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_update_failed", format!("{e:#}"), None),
    };

    info!(path = %path.display(), seeded, "workspace selected");
    state.workspace = Some(path.clone());
    state.db = Some(conn);
    state.pending.clear();
    ok(
        &req.id,
        json!({ "workspacePath": path.to_string_lossy(), "seeded": seeded }),
    )
}

fn handle_store_read(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(&state.db).and_then(|conn| {
        let data = RecordStore::new(conn).read().map_err(query_failed)?;
        Ok(json!({ "data": data }))
    });
    respond(req, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "store.read" => Some(handle_store_read(state, req)),
        _ => None,
    }
}
