use super::{lock, parse_ts, SharedConnection};
use crate::domain::entities::persisted_trade::{PersistedTrade, TradePatch};
use crate::domain::error::DomainError;
use crate::domain::ports::trade_repository::TradeRepository;
use crate::domain::values::instrument_type::InstrumentType;
use chrono::Utc;
use rusqlite::{params, ErrorCode};
use tracing::warn;

const COLUMNS: &str = "id, broker_connection_id, broker_trade_id, symbol, side, entry_date, exit_date, \
    entry_price, exit_price, quantity, pnl, commission, swap, stop_loss, take_profit, platform, \
    instrument_type, import_source, created_at, updated_at";

pub struct SqliteTradeRepo {
    conn: SharedConnection,
}

impl SqliteTradeRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_trade(row: &rusqlite::Row) -> Result<PersistedTrade, rusqlite::Error> {
        let side: Option<String> = row.get(4)?;
        let entry: Option<String> = row.get(5)?;
        let exit: Option<String> = row.get(6)?;
        let instrument: String = row.get(16)?;
        let created: String = row.get(18)?;
        let updated: String = row.get(19)?;

        Ok(PersistedTrade {
            id: row.get(0)?,
            broker_connection_id: row.get(1)?,
            broker_trade_id: row.get(2)?,
            symbol: row.get(3)?,
            side: side.and_then(|s| s.parse().ok()),
            entry_date: entry.as_deref().and_then(parse_ts),
            exit_date: exit.as_deref().and_then(parse_ts),
            entry_price: row.get(7)?,
            exit_price: row.get(8)?,
            quantity: row.get(9)?,
            pnl: row.get(10)?,
            commission: row.get(11)?,
            swap: row.get(12)?,
            stop_loss: row.get(13)?,
            take_profit: row.get(14)?,
            platform: row.get(15)?,
            instrument_type: instrument.parse().unwrap_or_else(|_| {
                warn!(value = %instrument, "invalid instrument type in trade, defaulting to Stocks");
                InstrumentType::Stocks
            }),
            import_source: row.get(17)?,
            created_at: parse_ts(&created).unwrap_or_else(Utc::now),
            updated_at: parse_ts(&updated).unwrap_or_else(Utc::now),
        })
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl TradeRepository for SqliteTradeRepo {
    fn create(&self, trade: &PersistedTrade) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            &format!(
                "INSERT INTO trades ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
            ),
            params![
                trade.id,
                trade.broker_connection_id,
                trade.broker_trade_id,
                trade.symbol,
                trade.side.map(|s| s.to_string()),
                trade.entry_date.map(|d| d.to_rfc3339()),
                trade.exit_date.map(|d| d.to_rfc3339()),
                trade.entry_price,
                trade.exit_price,
                trade.quantity,
                trade.pnl,
                trade.commission,
                trade.swap,
                trade.stop_loss,
                trade.take_profit,
                trade.platform,
                trade.instrument_type.to_string(),
                trade.import_source,
                trade.created_at.to_rfc3339(),
                trade.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::Duplicate(trade.broker_trade_id.clone().unwrap_or_else(|| trade.id.clone()))
            } else {
                DomainError::Database(format!("Failed to add trade: {e}"))
            }
        })?;
        Ok(())
    }

    fn update(&self, id: &str, patch: &TradePatch) -> Result<(), DomainError> {
        let conn = lock(&self.conn)?;
        let rows = conn
            .execute(
                "UPDATE trades SET exit_date = ?1, exit_price = ?2, pnl = ?3, stop_loss = ?4, take_profit = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    patch.exit_date.map(|d| d.to_rfc3339()),
                    patch.exit_price,
                    patch.pnl,
                    patch.stop_loss,
                    patch.take_profit,
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )
            .map_err(|e| DomainError::Database(format!("Failed to update trade: {e}")))?;
        if rows == 0 {
            return Err(DomainError::NotFound(format!("Trade not found: {id}")));
        }
        Ok(())
    }

    fn list_by_connection(&self, broker_connection_id: &str) -> Result<Vec<PersistedTrade>, DomainError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM trades WHERE broker_connection_id = ?1 ORDER BY entry_date, created_at"
        ))?;
        let trades = stmt
            .query_map(params![broker_connection_id], Self::row_to_trade)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trades)
    }
}
