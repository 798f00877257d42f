use super::{lock, parse_ts, SharedConnection};
use crate::domain::entities::sync_log::SyncLogEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::sync_log_repository::SyncLogRepository;
use crate::domain::values::sync_status::{SyncStatus, SyncType};
use chrono::Utc;
use rusqlite::params;

pub struct SqliteSyncLogRepo {
    conn: SharedConnection,
}

impl SqliteSyncLogRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_entry(row: &rusqlite::Row) -> Result<SyncLogEntry, rusqlite::Error> {
        let sync_type: String = row.get(2)?;
        let status: String = row.get(3)?;
        let errors: String = row.get(8)?;
        let created: String = row.get(10)?;

        Ok(SyncLogEntry {
            id: row.get(0)?,
            broker_connection_id: row.get(1)?,
            sync_type: sync_type.parse().unwrap_or(SyncType::Manual),
            status: status.parse().unwrap_or(SyncStatus::Error),
            imported: row.get::<_, i64>(4)? as usize,
            updated: row.get::<_, i64>(5)? as usize,
            skipped: row.get::<_, i64>(6)? as usize,
            total_fetched: row.get::<_, i64>(7)? as usize,
            errors: serde_json::from_str(&errors).unwrap_or_default(),
            duration_ms: row.get::<_, i64>(9)? as u64,
            created_at: parse_ts(&created).unwrap_or_else(Utc::now),
        })
    }
}

impl SyncLogRepository for SqliteSyncLogRepo {
    fn append(&self, entry: &SyncLogEntry) -> Result<(), DomainError> {
        let errors = serde_json::to_string(&entry.errors)
            .map_err(|e| DomainError::Database(format!("Failed to encode sync errors: {e}")))?;
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO sync_logs (id, broker_connection_id, sync_type, status, imported, updated, skipped, total_fetched, errors, duration_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.id,
                entry.broker_connection_id,
                entry.sync_type.to_string(),
                entry.status.to_string(),
                entry.imported as i64,
                entry.updated as i64,
                entry.skipped as i64,
                entry.total_fetched as i64,
                errors,
                entry.duration_ms as i64,
                entry.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to write sync log: {e}")))?;
        Ok(())
    }

    fn list_by_connection(&self, broker_connection_id: &str, limit: usize) -> Result<Vec<SyncLogEntry>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, broker_connection_id, sync_type, status, imported, updated, skipped, total_fetched, errors, duration_ms, created_at
             FROM sync_logs WHERE broker_connection_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2",
        )?;
        let entries = stmt
            .query_map(params![broker_connection_id, limit as i64], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
