use crate::domain::error::DomainError;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS broker_connections (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            platform TEXT NOT NULL,
            source_kind TEXT NOT NULL,
            source_url TEXT NOT NULL,
            sync_interval_minutes INTEGER NOT NULL,
            auto_sync INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            balance REAL,
            equity REAL,
            last_sync_at TEXT,
            error_message TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS trades (
            id TEXT PRIMARY KEY,
            broker_connection_id TEXT NOT NULL
                REFERENCES broker_connections(id) ON DELETE CASCADE,
            broker_trade_id TEXT,
            symbol TEXT NOT NULL,
            side TEXT,
            entry_date TEXT,
            exit_date TEXT,
            entry_price REAL,
            exit_price REAL,
            quantity REAL NOT NULL DEFAULT 1,
            pnl REAL NOT NULL,
            commission REAL NOT NULL DEFAULT 0,
            swap REAL NOT NULL DEFAULT 0,
            stop_loss REAL,
            take_profit REAL,
            platform TEXT NOT NULL,
            instrument_type TEXT NOT NULL,
            import_source TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sync_logs (
            id TEXT PRIMARY KEY,
            broker_connection_id TEXT NOT NULL
                REFERENCES broker_connections(id) ON DELETE CASCADE,
            sync_type TEXT NOT NULL,
            status TEXT NOT NULL,
            imported INTEGER NOT NULL DEFAULT 0,
            updated INTEGER NOT NULL DEFAULT 0,
            skipped INTEGER NOT NULL DEFAULT 0,
            total_fetched INTEGER NOT NULL DEFAULT 0,
            errors TEXT NOT NULL DEFAULT '[]',
            duration_ms INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_trades_connection_broker_id
            ON trades(broker_connection_id, broker_trade_id);
        CREATE INDEX IF NOT EXISTS idx_trades_entry ON trades(broker_connection_id, entry_date);
        CREATE INDEX IF NOT EXISTS idx_connections_user ON broker_connections(user_id);
        CREATE INDEX IF NOT EXISTS idx_sync_logs_connection ON sync_logs(broker_connection_id, created_at);
        ",
    )
    .map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_rerunnable() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('broker_connections', 'trades', 'sync_logs')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }
}
