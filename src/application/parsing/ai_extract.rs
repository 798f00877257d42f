//! Structured extraction through an LLM for documents no text parser can read.
//!
//! Whatever the service returns is treated as untrusted: every item is
//! validated and defaulted here, never deserialized straight into a trade.

use super::normalize::{infer_instrument_type, parse_number, parse_timestamp};
use super::{Document, ParseError, ParseResult};
use crate::domain::entities::trade_record::TradeRecord;
use crate::domain::ports::structured_extractor::{Attachment, StructuredExtractor};
use crate::domain::values::side::Side;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{info, warn};

pub const AI_LABEL: &str = "AI Extraction";
const AI_IMPORT_SOURCE: &str = "AI Statement Import";
const DEFAULT_PLATFORM: &str = "Other";

pub const NO_TRADES_MESSAGE: &str = "No completed trades found in document";

pub const EXTRACTION_PROMPT: &str = "\
You are reading a broker account statement or trade history export.
Extract every COMPLETED trade. When the statement lists opening and closing
transactions separately, pair them into a single trade. Ignore deposits,
withdrawals, balance adjustments and positions that are still open.
Use ISO-8601 timestamps. Report losses as negative pnl values. Use the
broker's ticket, deal or position id as trade_id when one is shown. Set
platform to the trading platform or broker name if the document states it.";

/// JSON schema the extraction service must answer with.
pub fn response_schema() -> Value {
    let nullable_number = json!({ "type": ["number", "null"] });
    let nullable_string = json!({ "type": ["string", "null"] });
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["platform", "trades"],
        "properties": {
            "platform": nullable_string,
            "trades": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": [
                        "symbol", "side", "entry_date", "exit_date", "entry_price", "exit_price",
                        "quantity", "pnl", "commission", "swap", "stop_loss", "take_profit", "trade_id"
                    ],
                    "properties": {
                        "symbol": { "type": "string" },
                        "side": { "type": ["string", "null"], "enum": ["Long", "Short", null] },
                        "entry_date": nullable_string,
                        "exit_date": nullable_string,
                        "entry_price": nullable_number,
                        "exit_price": nullable_number,
                        "quantity": nullable_number,
                        "pnl": { "type": "number" },
                        "commission": nullable_number,
                        "swap": nullable_number,
                        "stop_loss": nullable_number,
                        "take_profit": nullable_number,
                        "trade_id": nullable_string
                    }
                }
            }
        }
    })
}

/// Send the document to the extraction service and validate the answer.
/// A failing service yields a single document-level error.
pub async fn extract_via_ai(extractor: &dyn StructuredExtractor, doc: &Document) -> ParseResult {
    let attachments = [Attachment {
        file_name: doc.filename.clone(),
        mime_type: doc.mime_type().to_string(),
        data: doc.bytes.clone(),
    }];
    match extractor
        .invoke(EXTRACTION_PROMPT, &response_schema(), &attachments)
        .await
    {
        Ok(value) => {
            let result = interpret_response(&value, Utc::now());
            info!(
                extractor = extractor.name(),
                trades = result.trades.len(),
                errors = result.errors.len(),
                "AI extraction finished"
            );
            result
        }
        Err(e) => {
            warn!(extractor = extractor.name(), error = %e, "AI extraction failed");
            let mut result = ParseResult::new(AI_LABEL);
            result
                .errors
                .push(ParseError::document(format!("AI extraction failed: {e}")));
            result
        }
    }
}

/// Validate and default the extraction payload. Missing dates become `now`.
///
/// A trade with neither a broker id nor an entry date gets an id built from
/// symbol, side, P&L and its ordinal among identical trades, so the same
/// document yields the same ids on every import.
pub fn interpret_response(value: &Value, now: DateTime<Utc>) -> ParseResult {
    let mut result = ParseResult::new(AI_LABEL);
    let platform = value
        .get("platform")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PLATFORM);

    let mut seen: HashMap<String, usize> = HashMap::new();
    let items = value.get("trades").and_then(Value::as_array);
    for (idx, item) in items.into_iter().flatten().enumerate() {
        match to_trade(item, platform, now) {
            Ok(mut trade) => {
                if trade.broker_trade_id.is_none() && date(item, "entry_date").is_none() {
                    let key = stable_key(&trade);
                    let n = seen.entry(key.clone()).or_default();
                    *n += 1;
                    trade.broker_trade_id = Some(format!("{key}_{n}"));
                }
                result.trades.push(trade);
            }
            Err(e) => result.errors.push(ParseError::new(idx + 1, e)),
        }
    }

    if result.trades.is_empty() {
        result.errors.push(ParseError::document(NO_TRADES_MESSAGE));
    }
    result
}

fn to_trade(item: &Value, platform: &str, now: DateTime<Utc>) -> Result<TradeRecord, String> {
    let symbol = text(item, "symbol")
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing symbol".to_string())?;
    let pnl = number(item, "pnl").ok_or_else(|| format!("Missing or invalid pnl for {symbol}"))?;

    let side = match text(item, "side").map(|s| s.trim().to_lowercase()) {
        Some(s) if s == "long" || s == "buy" => Side::Long,
        _ => Side::Short,
    };

    let instrument_type = infer_instrument_type(&symbol);
    let mut trade = TradeRecord::new(symbol, pnl, instrument_type);
    trade.side = Some(side);
    trade.entry_date = Some(date(item, "entry_date").unwrap_or(now));
    trade.exit_date = Some(date(item, "exit_date").unwrap_or(now));
    trade.entry_price = number(item, "entry_price");
    trade.exit_price = number(item, "exit_price");
    trade.quantity = number(item, "quantity").unwrap_or(1.0);
    trade.commission = number(item, "commission").unwrap_or(0.0);
    trade.swap = number(item, "swap").unwrap_or(0.0);
    trade.stop_loss = number(item, "stop_loss").filter(|v| *v != 0.0);
    trade.take_profit = number(item, "take_profit").filter(|v| *v != 0.0);
    trade.platform = platform.to_string();
    trade.import_source = AI_IMPORT_SOURCE.to_string();
    trade.broker_trade_id = text(item, "trade_id")
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    Ok(trade)
}

fn stable_key(trade: &TradeRecord) -> String {
    let side = trade.side.map(|s| s.to_string()).unwrap_or_default();
    format!("ai_{}_{}_{:.2}", trade.symbol, side, trade.pnl)
}

fn text(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(item: &Value, key: &str) -> Option<f64> {
    match item.get(key)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn date(item: &Value, key: &str) -> Option<DateTime<Utc>> {
    text(item, key).as_deref().and_then(parse_timestamp)
}
