use crate::domain::values::instrument_type::InstrumentType;
use crate::domain::values::side::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical, normalized trade produced by every parser.
///
/// A `TradeRecord` has no identity of its own: it is either turned into a
/// persisted trade, used to patch one, or dropped during reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
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
    pub broker_trade_id: Option<String>,
}

impl TradeRecord {
    /// Minimal closed trade; parsers fill the remaining fields.
    pub fn new(symbol: impl Into<String>, pnl: f64, instrument_type: InstrumentType) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            side: None,
            entry_date: None,
            exit_date: None,
            entry_price: None,
            exit_price: None,
            quantity: 1.0,
            pnl,
            commission: 0.0,
            swap: 0.0,
            stop_loss: None,
            take_profit: None,
            platform: String::new(),
            instrument_type,
            import_source: String::new(),
            broker_trade_id: None,
        }
    }
}
