use crate::db;
use crate::model::{LogEntry, SchoolData, SchoolPatch};
use anyhow::Context;
use rusqlite::Connection;
use tracing::{debug, info};

pub const SCHOOL_DATA_KEY: &str = "schoolData";

/// The shared record store: one JSON document kept in the workspace database.
///
/// Writes are read-modify-write with last writer wins. Callers serialize access by
/// holding the connection through `&mut AppState`.
pub struct RecordStore<'a> {
    conn: &'a Connection,
}

impl<'a> RecordStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Seed the document if this workspace has never held one. Returns true when seeded.
    pub fn ensure_seeded(&self, now: &str) -> anyhow::Result<bool> {
        if db::store_get_raw(self.conn, SCHOOL_DATA_KEY)?.is_some() {
            return Ok(false);
        }
        self.put(&SchoolData::seed(), now)?;
        info!("seeded school data");
        Ok(true)
    }

    pub fn read(&self) -> anyhow::Result<SchoolData> {
        match db::store_get_raw(self.conn, SCHOOL_DATA_KEY)? {
            Some(raw) => serde_json::from_str(&raw).context("stored school data is malformed"),
            None => Ok(SchoolData::default()),
        }
    }

    pub fn write(&self, patch: SchoolPatch, now: &str) -> anyhow::Result<SchoolData> {
        let mut data = self.read()?;
        data.apply(patch);
        self.put(&data, now)?;
        Ok(data)
    }

    /// Apply `patch` and prepend one audit entry, as a single document write.
    /// Either both land or neither does.
    pub fn write_logged(
        &self,
        patch: SchoolPatch,
        message: impl Into<String>,
        now: &str,
    ) -> anyhow::Result<SchoolData> {
        let mut data = self.read()?;
        data.apply(patch);
        data.logs.insert(
            0,
            LogEntry {
                timestamp: now.to_string(),
                message: message.into(),
            },
        );
        self.put(&data, now)?;
        Ok(data)
    }

    fn put(&self, data: &SchoolData, now: &str) -> anyhow::Result<()> {
        let raw = serde_json::to_string(data)?;
        debug!(bytes = raw.len(), "writing school data");
        db::store_put_raw(self.conn, SCHOOL_DATA_KEY, &raw, now)
    }
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}
