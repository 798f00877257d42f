use crate::domain::entities::persisted_trade::{PersistedTrade, TradePatch};
use crate::domain::entities::trade_record::TradeRecord;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// P&L difference above which a re-synced trade is considered changed.
pub const PNL_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Patch every matched trade, whatever its P&L.
    pub force_refresh: bool,
    /// Prepended to synthetic ids of trades the broker gave no id.
    pub platform_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeCreate {
    /// Persisted as the trade's `broker_trade_id`.
    pub broker_trade_id: String,
    pub trade: TradeRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeUpdate {
    pub existing_id: String,
    pub broker_trade_id: String,
    pub symbol: String,
    pub patch: TradePatch,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconciliation {
    pub to_create: Vec<TradeCreate>,
    pub to_update: Vec<TradeUpdate>,
    pub to_skip: Vec<TradeRecord>,
}

/// Dedup key of a parsed trade: the broker's id, or one derived from symbol
/// and entry time.
pub fn effective_id(trade: &TradeRecord, platform_prefix: Option<&str>) -> String {
    if let Some(id) = trade.broker_trade_id.as_deref().filter(|id| !id.is_empty()) {
        return id.to_string();
    }
    let entry = trade
        .entry_date
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    match platform_prefix {
        Some(prefix) => format!("{}_{}_{}", prefix, trade.symbol, entry),
        None => format!("{}_{}", trade.symbol, entry),
    }
}

/// Partition parsed trades against the persisted trades of one connection.
///
/// Pure: the same inputs always give the same partition, and a trade id is
/// created or updated at most once per call.
pub fn reconcile(
    parsed: &[TradeRecord],
    existing: &[PersistedTrade],
    options: &ReconcileOptions,
) -> Reconciliation {
    let by_id: HashMap<&str, &PersistedTrade> = existing
        .iter()
        .filter_map(|t| t.broker_trade_id.as_deref().map(|id| (id, t)))
        .collect();

    let mut seen = HashSet::new();
    let mut out = Reconciliation::default();

    for trade in parsed {
        let id = effective_id(trade, options.platform_prefix.as_deref());
        if !seen.insert(id.clone()) {
            out.to_skip.push(trade.clone());
            continue;
        }
        match by_id.get(id.as_str()) {
            None => out.to_create.push(TradeCreate {
                broker_trade_id: id,
                trade: trade.clone(),
            }),
            Some(current) if options.force_refresh || (current.pnl - trade.pnl).abs() > PNL_EPSILON => {
                out.to_update.push(TradeUpdate {
                    existing_id: current.id.clone(),
                    broker_trade_id: id,
                    symbol: trade.symbol.clone(),
                    patch: TradePatch::from(trade),
                })
            }
            Some(_) => out.to_skip.push(trade.clone()),
        }
    }
    out
}
