//! Hybrid Funding dashboard scraper.
//!
//! Labeled account metrics are read from the raw page unconditionally. Trades
//! come from an ordered chain of strategies: the embedded
//! `window.__INITIAL_STATE__` JSON first, then a scan of HTML tables. The
//! chain stops at the first strategy that yields trades; a strategy that fails
//! only costs its own tier.

use super::html::{table_rows, tables, text_content};
use super::normalize::{normalize, parse_number, NormalizeContext, RawTrade};
use super::{ParseError, ParseResult};
use crate::domain::entities::account_metrics::{total_pnl, AccountMetrics};
use crate::domain::entities::trade_record::TradeRecord;
use crate::domain::values::side::Side;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const HYBRID_FUNDING_LABEL: &str = "Hybrid Funding Dashboard";

const STATE_MARKER: &str = "__INITIAL_STATE__";

/// Minimum cells for a trades-table row (through the profit column).
const MIN_TABLE_CELLS: usize = 10;

/// Result of scraping one dashboard page.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardScrape {
    pub metrics: AccountMetrics,
    pub trades: Vec<TradeRecord>,
    pub errors: Vec<ParseError>,
    /// Strategy that produced the trades, if any did.
    pub trade_source: Option<&'static str>,
}

impl DashboardScrape {
    pub fn into_parse_result(self) -> ParseResult {
        ParseResult {
            trades: self.trades,
            errors: self.errors,
            format: HYBRID_FUNDING_LABEL.to_string(),
        }
    }
}

/// What a single trade strategy found.
#[derive(Debug, Clone, Default)]
pub struct StrategyOutput {
    pub trades: Vec<TradeRecord>,
    pub errors: Vec<ParseError>,
    /// Account figures the strategy could read; these win over regex metrics.
    pub metrics: Option<AccountMetrics>,
}

pub trait TradeStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, html: &str, ctx: &NormalizeContext) -> Result<StrategyOutput, String>;
}

/// Embedded application state, the highest-fidelity source when present.
pub struct InitialStateJson;

/// Positional scan of the first table that looks like a trade history.
pub struct TradesTable;

pub const DEFAULT_STRATEGIES: &[&dyn TradeStrategy] = &[&InitialStateJson, &TradesTable];

pub fn dashboard_context() -> NormalizeContext {
    NormalizeContext {
        platform: "Hybrid Funding".into(),
        import_source: HYBRID_FUNDING_LABEL.into(),
        instrument_override: None,
    }
}

pub fn scrape_dashboard(html: &str) -> DashboardScrape {
    scrape_with(html, DEFAULT_STRATEGIES)
}

pub fn scrape_with(html: &str, strategies: &[&dyn TradeStrategy]) -> DashboardScrape {
    let mut metrics = extract_labeled_metrics(html);
    let ctx = dashboard_context();
    let mut trades = Vec::new();
    let mut errors = Vec::new();
    let mut trade_source = None;

    for strategy in strategies {
        match strategy.extract(html, &ctx) {
            Ok(out) => {
                if let Some(mut found) = out.metrics {
                    found.merge_missing(&metrics);
                    metrics = found;
                }
                errors.extend(out.errors);
                if !out.trades.is_empty() {
                    debug!(strategy = strategy.name(), count = out.trades.len(), "dashboard trades extracted");
                    trades = out.trades;
                    trade_source = Some(strategy.name());
                    break;
                }
            }
            Err(e) => warn!(strategy = strategy.name(), error = %e, "dashboard strategy failed"),
        }
    }

    metrics.total_profit_loss = total_pnl(&trades);
    DashboardScrape {
        metrics,
        trades,
        errors,
        trade_source,
    }
}

const METRIC_LABELS: &[(&str, MetricField)] = &[
    (r"(?:Account\s+)?Balance", MetricField::Balance),
    (r"Equity", MetricField::Equity),
    (r"Profit\s+Target", MetricField::ProfitTarget),
    (r"(?:Daily\s+Loss\s+Limit|Max(?:imum)?\s+Daily\s+Loss)", MetricField::DailyLossLimit),
    (r"Max(?:imum)?\s+(?:Overall\s+)?Drawdown", MetricField::MaxDrawdown),
];

#[derive(Debug, Clone, Copy)]
enum MetricField {
    Balance,
    Equity,
    ProfitTarget,
    DailyLossLimit,
    MaxDrawdown,
}

fn metric_regexes() -> &'static [(Regex, MetricField)] {
    static RES: OnceLock<Vec<(Regex, MetricField)>> = OnceLock::new();
    RES.get_or_init(|| {
        METRIC_LABELS
            .iter()
            .filter_map(|(label, field)| {
                // Label, optional colon, any tags in between, then a dollar amount.
                let pattern = format!(r"(?i)\b{label}\s*:?\s*(?:<[^>]*>\s*)*(-?\s*\$?\s*-?[\d,]+(?:\.\d+)?)");
                Regex::new(&pattern).ok().map(|re| (re, *field))
            })
            .collect()
    })
}

/// Read `Label: $1,234.56` style figures straight from the page source.
/// Missing labels stay `None`; `total_profit_loss` is left at 0.
pub fn extract_labeled_metrics(html: &str) -> AccountMetrics {
    let mut metrics = AccountMetrics::default();
    for (re, field) in metric_regexes() {
        let value = re
            .captures(html)
            .and_then(|c| c.get(1))
            .and_then(|m| parse_number(&m.as_str().replace(' ', "")));
        let Some(value) = value else { continue };
        let slot = match field {
            MetricField::Balance => &mut metrics.balance,
            MetricField::Equity => &mut metrics.equity,
            MetricField::ProfitTarget => &mut metrics.profit_target,
            MetricField::DailyLossLimit => &mut metrics.daily_loss_limit,
            MetricField::MaxDrawdown => &mut metrics.max_drawdown,
        };
        *slot = Some(value);
    }
    metrics
}

impl TradeStrategy for InitialStateJson {
    fn name(&self) -> &'static str {
        "initial_state_json"
    }

    fn extract(&self, html: &str, ctx: &NormalizeContext) -> Result<StrategyOutput, String> {
        let Some(blob) = find_state_blob(html)? else {
            return Ok(StrategyOutput::default());
        };
        let state: Value = serde_json::from_str(blob).map_err(|e| format!("Invalid initial state JSON: {e}"))?;

        let mut out = StrategyOutput {
            metrics: state.get("account").map(account_metrics),
            ..Default::default()
        };

        let trades = [
            state.get("trades"),
            state.get("account").and_then(|a| a.get("trades")),
            state.get("history"),
            state.get("closedTrades"),
        ]
        .into_iter()
        .flatten()
        .find_map(Value::as_array);

        for (idx, item) in trades.into_iter().flatten().enumerate() {
            let raw = json_trade(item);
            if !raw.has_required_cells() {
                continue;
            }
            match normalize(raw, ctx) {
                Ok(trade) => out.trades.push(trade),
                Err(e) => out.errors.push(ParseError::new(idx + 1, e)),
            }
        }
        Ok(out)
    }
}

/// Locate the object literal assigned to `window.__INITIAL_STATE__`.
/// `Ok(None)` when the page has no such assignment.
fn find_state_blob(html: &str) -> Result<Option<&str>, String> {
    let Some(marker) = html.find(STATE_MARKER) else {
        return Ok(None);
    };
    let rest = &html[marker + STATE_MARKER.len()..];
    let Some(open) = rest.find('{') else {
        return Err("Initial state has no object literal".into());
    };
    let body = &rest[open..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(&body[..=i]));
                }
            }
            _ => {}
        }
    }
    Err("Unterminated initial state object".into())
}

fn json_text(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn json_number(obj: &Value, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn account_metrics(account: &Value) -> AccountMetrics {
    AccountMetrics {
        balance: json_number(account, "balance"),
        equity: json_number(account, "equity"),
        profit_target: json_number(account, "profitTarget"),
        daily_loss_limit: json_number(account, "dailyLossLimit"),
        max_drawdown: json_number(account, "maxDrawdown"),
        total_profit_loss: 0.0,
    }
}

fn json_trade(item: &Value) -> RawTrade {
    let symbol = json_text(item, &["symbol", "instrument"]);
    let entry_date = json_text(item, &["openTime", "openDate", "open_time", "entryTime"]);
    let trade_id = json_text(item, &["dealId", "deal_id", "ticket", "positionId", "id"])
        .or_else(|| fallback_deal_id(symbol.as_deref(), entry_date.as_deref()));
    RawTrade {
        trade_id,
        side: json_text(item, &["type", "side", "direction"]).and_then(|s| Side::infer(&s)),
        exit_date: json_text(item, &["closeTime", "closeDate", "close_time", "exitTime"]),
        entry_price: json_text(item, &["openPrice", "entryPrice", "open_price"]),
        exit_price: json_text(item, &["closePrice", "exitPrice", "close_price"]),
        quantity: json_text(item, &["lots", "volume", "quantity", "size"]),
        pnl: json_text(item, &["profit", "pnl", "netProfit"]),
        stop_loss: json_text(item, &["stopLoss", "sl"]),
        take_profit: json_text(item, &["takeProfit", "tp"]),
        commission: json_text(item, &["commission"]),
        swap: json_text(item, &["swap"]),
        symbol,
        entry_date,
        platform: None,
    }
}

fn fallback_deal_id(symbol: Option<&str>, open_date: Option<&str>) -> Option<String> {
    let symbol = symbol?.trim().to_uppercase();
    Some(format!("{}_{}", symbol, open_date.unwrap_or("").trim()))
}

impl TradeStrategy for TradesTable {
    fn name(&self) -> &'static str {
        "trades_table"
    }

    fn extract(&self, html: &str, ctx: &NormalizeContext) -> Result<StrategyOutput, String> {
        let mut out = StrategyOutput::default();
        let Some(table) = tables(html).into_iter().find(|t| looks_like_trades(t)) else {
            return Ok(out);
        };

        // symbol, open date, open price, close date, close price, type, SL, TP,
        // lots, profit, duration, deal id
        for (idx, c) in table_rows(table).into_iter().enumerate() {
            if c.len() < MIN_TABLE_CELLS || c[0].trim().is_empty() || parse_number(&c[9]).is_none() {
                continue;
            }
            let trade_id = c
                .get(11)
                .filter(|id| !id.trim().is_empty())
                .cloned()
                .or_else(|| fallback_deal_id(Some(&c[0]), Some(&c[1])));
            let raw = RawTrade {
                trade_id,
                symbol: Some(c[0].clone()),
                entry_date: Some(c[1].clone()),
                entry_price: Some(c[2].clone()),
                exit_date: Some(c[3].clone()),
                exit_price: Some(c[4].clone()),
                side: Side::infer(&c[5]),
                stop_loss: Some(c[6].clone()),
                take_profit: Some(c[7].clone()),
                quantity: Some(c[8].clone()),
                pnl: Some(c[9].clone()),
                ..Default::default()
            };
            match normalize(raw, ctx) {
                Ok(trade) => out.trades.push(trade),
                Err(e) => out.errors.push(ParseError::new(idx + 1, e)),
            }
        }
        Ok(out)
    }
}

fn looks_like_trades(table: &str) -> bool {
    let text = text_content(table).to_lowercase();
    text.contains("symbol") && (text.contains("profit") || text.contains("p&l"))
}
