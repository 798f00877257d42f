use super::{lock, parse_ts, SharedConnection};
use crate::domain::entities::broker_connection::{BrokerConnection, ConnectionSyncState};
use crate::domain::error::DomainError;
use crate::domain::ports::connection_repository::ConnectionRepository;
use crate::domain::values::connection_status::ConnectionStatus;
use crate::domain::values::source_kind::SourceKind;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::warn;

const COLUMNS: &str = "id, user_id, name, platform, source_kind, source_url, sync_interval_minutes, \
    auto_sync, status, balance, equity, last_sync_at, error_message, created_at";

pub struct SqliteConnectionRepo {
    conn: SharedConnection,
}

impl SqliteConnectionRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_connection(row: &rusqlite::Row) -> Result<BrokerConnection, rusqlite::Error> {
        let kind: String = row.get(4)?;
        let status: String = row.get(8)?;
        let last_sync: Option<String> = row.get(11)?;
        let created: String = row.get(13)?;

        Ok(BrokerConnection {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            platform: row.get(3)?,
            source_kind: kind.parse().unwrap_or_else(|_| {
                warn!(value = %kind, "invalid source kind in connection, defaulting to statement");
                SourceKind::Statement
            }),
            source_url: row.get(5)?,
            sync_interval_minutes: row.get(6)?,
            auto_sync: row.get(7)?,
            status: status.parse().unwrap_or(ConnectionStatus::Pending),
            balance: row.get(9)?,
            equity: row.get(10)?,
            last_sync_at: last_sync.as_deref().and_then(parse_ts),
            error_message: row.get(12)?,
            created_at: parse_ts(&created).unwrap_or_else(Utc::now),
        })
    }
}

impl ConnectionRepository for SqliteConnectionRepo {
    fn create(&self, c: &BrokerConnection) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            &format!(
                "INSERT INTO broker_connections ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                c.id,
                c.user_id,
                c.name,
                c.platform,
                c.source_kind.to_string(),
                c.source_url,
                c.sync_interval_minutes,
                c.auto_sync,
                c.status.to_string(),
                c.balance,
                c.equity,
                c.last_sync_at.map(|d| d.to_rfc3339()),
                c.error_message,
                c.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to add connection: {e}")))?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<BrokerConnection>, DomainError> {
        let conn = lock(&self.conn)?;
        let connection = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM broker_connections WHERE id = ?1"),
                params![id],
                Self::row_to_connection,
            )
            .optional()?;
        Ok(connection)
    }

    fn list(&self, user_id: Option<&str>) -> Result<Vec<BrokerConnection>, DomainError> {
        let conn = lock(&self.conn)?;
        let connections = match user_id {
            Some(user) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM broker_connections WHERE user_id = ?1 ORDER BY created_at"
                ))?;
                let rows = stmt.query_map(params![user], Self::row_to_connection)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM broker_connections ORDER BY created_at"))?;
                let rows = stmt.query_map([], Self::row_to_connection)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(connections)
    }

    fn update_sync_state(&self, id: &str, state: &ConnectionSyncState) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        let rows = conn
            .execute(
                "UPDATE broker_connections
                 SET status = ?1, balance = ?2, equity = ?3, last_sync_at = ?4, error_message = ?5
                 WHERE id = ?6",
                params![
                    state.status.to_string(),
                    state.balance,
                    state.equity,
                    state.last_sync_at.to_rfc3339(),
                    state.error_message,
                    id,
                ],
            )
            .map_err(|e| DomainError::Database(format!("Failed to update connection: {e}")))?;
        if rows == 0 {
            return Err(DomainError::NotFound(format!("Connection not found: {id}")));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        let rows = conn.execute("DELETE FROM broker_connections WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(DomainError::NotFound(format!("Connection not found: {id}")));
        }
        Ok(())
    }
}
