use crate::domain::entities::trade_record::TradeRecord;
use crate::domain::values::instrument_type::InstrumentType;
use crate::domain::values::side::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A trade as stored in the journal, scoped to one broker connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTrade {
    pub id: String,
    pub broker_connection_id: String,
    pub broker_trade_id: Option<String>,
    pub symbol: String,
    pub side: Option<Side>,
    pub entry_date: Option<DateTime<Utc>>,
    pub exit_date: Option<DateTime<Utc>>,
    pub entry_price: Option<f64>,
    pub exit_price: Option<f64>,
    pub quantity: f64,
    pub pnl: f64,
    pub commission: f64,
    pub swap: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub platform: String,
    pub instrument_type: InstrumentType,
    pub import_source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersistedTrade {
    pub fn from_record(record: &TradeRecord, broker_connection_id: &str, broker_trade_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            broker_connection_id: broker_connection_id.to_string(),
            broker_trade_id: Some(broker_trade_id),
            symbol: record.symbol.clone(),
            side: record.side,
            entry_date: record.entry_date,
            exit_date: record.exit_date,
            entry_price: record.entry_price,
            exit_price: record.exit_price,
            quantity: record.quantity,
            pnl: record.pnl,
            commission: record.commission,
            swap: record.swap,
            stop_loss: record.stop_loss,
            take_profit: record.take_profit,
            platform: record.platform.clone(),
            instrument_type: record.instrument_type,
            import_source: record.import_source.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields a re-synced trade may change. Entry fields are never patched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradePatch {
    pub exit_date: Option<DateTime<Utc>>,
    pub exit_price: Option<f64>,
    pub pnl: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl From<&TradeRecord> for TradePatch {
    fn from(record: &TradeRecord) -> Self {
        Self {
            exit_date: record.exit_date,
            exit_price: record.exit_price,
            pnl: record.pnl,
            stop_loss: record.stop_loss,
            take_profit: record.take_profit,
        }
    }
}
