pub mod connection_repo;
pub mod migrations;
pub mod sync_log_repo;
pub mod trade_repo;

use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};
use migrations::run_migrations;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

/// One connection shared by every repository, so `:memory:` databases work.
pub type SharedConnection = Arc<Mutex<Connection>>;

pub fn open(db_path: &str) -> Result<SharedConnection, DomainError> {
    let conn = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| DomainError::Database(format!("Foreign key error: {e}")))?;
    run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub(crate) fn lock(conn: &SharedConnection) -> Result<MutexGuard<'_, Connection>, DomainError> {
    conn.lock().map_err(|e| DomainError::Database(e.to_string()))
}

pub(crate) fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
