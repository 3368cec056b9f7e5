use std::path::PathBuf;

use crate::import::{MarkPreview, StudentPreview};
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub pending: PendingImports,
}

/// Previewed batches waiting for apply or cancel. One per import kind.
#[derive(Default)]
pub struct PendingImports {
    pub students: Option<PendingStudentImport>,
    pub marks: Option<PendingMarkImport>,
}

impl PendingImports {
    pub fn clear(&mut self) {
        self.students = None;
        self.marks = None;
    }
}

pub struct PendingStudentImport {
    pub preview_id: String,
    pub source: String,
    pub rows: StudentPreview,
}

pub struct PendingMarkImport {
    pub preview_id: String,
    pub source: String,
    pub class: String,
    pub subject: String,
    pub rows: MarkPreview,
}
