use super::normalize::RawTrade;
use crate::domain::values::side::Side;

/// Canonical field a header can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeField {
    TradeId,
    Symbol,
    StopLoss,
    TakeProfit,
    Side,
    EntryPrice,
    ExitPrice,
    /// Generic price column; lands in `entry_price` if nothing more specific did.
    Price,
    Quantity,
    Pnl,
    EntryDate,
    ExitDate,
    /// Generic date/time column; lands in `entry_date` if still unset.
    Date,
    Commission,
    Swap,
    Platform,
}

/// One entry of the header rule table: a lower-cased header matching
/// `matches` feeds `field`.
pub struct ColumnRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub field: TradeField,
}

fn any_of(h: &str, words: &[&str]) -> bool {
    words.iter().any(|w| h.contains(w))
}

/// Evaluated top to bottom; the first rule that matches a header claims it.
/// Stop-loss and take-profit sit above the P&L and price rules so that
/// "Take Profit" or "S/L Price" never feed P&L or entry price.
pub const COLUMN_RULES: &[ColumnRule] = &[
    ColumnRule {
        name: "trade_id",
        matches: |h| {
            h == "id" || any_of(h, &["ticket", "deal", "position id", "trade id", "order id"])
        },
        field: TradeField::TradeId,
    },
    ColumnRule {
        name: "symbol",
        matches: |h| any_of(h, &["symbol", "instrument", "ticker", "market"]),
        field: TradeField::Symbol,
    },
    ColumnRule {
        name: "stop_loss",
        matches: |h| h.contains("stop") || h == "sl" || h == "s / l" || h == "s/l",
        field: TradeField::StopLoss,
    },
    ColumnRule {
        name: "take_profit",
        matches: |h| (h.contains("take") && h.contains("profit")) || h == "tp" || h == "t / p" || h == "t/p",
        field: TradeField::TakeProfit,
    },
    ColumnRule {
        name: "side",
        matches: |h| any_of(h, &["side", "direction", "type", "action"]),
        field: TradeField::Side,
    },
    ColumnRule {
        name: "entry_price",
        matches: |h| h.contains("price") && (h.contains("entry") || h.contains("open")),
        field: TradeField::EntryPrice,
    },
    ColumnRule {
        name: "exit_price",
        matches: |h| h.contains("price") && (h.contains("exit") || h.contains("clos")),
        field: TradeField::ExitPrice,
    },
    ColumnRule {
        name: "price",
        matches: |h| h.contains("price"),
        field: TradeField::Price,
    },
    ColumnRule {
        name: "quantity",
        matches: |h| any_of(h, &["quantity", "volume", "lots", "size", "contracts", "qty"]),
        field: TradeField::Quantity,
    },
    ColumnRule {
        name: "pnl",
        matches: |h| any_of(h, &["profit", "pnl", "p&l", "p/l", "realized"]),
        field: TradeField::Pnl,
    },
    ColumnRule {
        name: "entry_date",
        matches: |h| (h.contains("entry") || h.contains("open")) && (h.contains("date") || h.contains("time")),
        field: TradeField::EntryDate,
    },
    ColumnRule {
        name: "exit_date",
        matches: |h| (h.contains("exit") || h.contains("clos")) && (h.contains("date") || h.contains("time")),
        field: TradeField::ExitDate,
    },
    ColumnRule {
        name: "date",
        matches: |h| h.contains("date") || h.contains("time"),
        field: TradeField::Date,
    },
    ColumnRule {
        name: "commission",
        matches: |h| h.contains("commission") || h.contains("fee"),
        field: TradeField::Commission,
    },
    ColumnRule {
        name: "swap",
        matches: |h| h.contains("swap") || h.contains("rollover"),
        field: TradeField::Swap,
    },
    ColumnRule {
        name: "platform",
        matches: |h| any_of(h, &["platform", "broker", "account"]),
        field: TradeField::Platform,
    },
];

/// Field claimed by a header, if any rule matches.
pub fn classify_header(header: &str) -> Option<TradeField> {
    let h = header.trim().to_lowercase();
    COLUMN_RULES.iter().find(|r| (r.matches)(&h)).map(|r| r.field)
}

/// Map one row onto a `RawTrade` using header heuristics.
///
/// A field set by an earlier header is never overwritten, and empty cells
/// never set anything. Validation of required fields happens in the caller.
pub fn map_row(headers: &[String], values: &[String]) -> RawTrade {
    let mut raw = RawTrade::default();
    for (header, value) in headers.iter().zip(values) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if let Some(field) = classify_header(header) {
            assign(&mut raw, field, value);
        }
    }
    raw
}

fn assign(raw: &mut RawTrade, field: TradeField, value: &str) {
    fn set(slot: &mut Option<String>, value: &str) {
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }
    match field {
        TradeField::TradeId => set(&mut raw.trade_id, value),
        TradeField::Symbol => {
            if raw.symbol.is_none() {
                raw.symbol = Some(value.to_uppercase());
            }
        }
        TradeField::StopLoss => set(&mut raw.stop_loss, value),
        TradeField::TakeProfit => set(&mut raw.take_profit, value),
        TradeField::Side => {
            if raw.side.is_none() {
                raw.side = Side::infer(value);
            }
        }
        TradeField::EntryPrice | TradeField::Price => set(&mut raw.entry_price, value),
        TradeField::ExitPrice => set(&mut raw.exit_price, value),
        TradeField::Quantity => set(&mut raw.quantity, value),
        TradeField::Pnl => set(&mut raw.pnl, value),
        TradeField::EntryDate | TradeField::Date => set(&mut raw.entry_date, value),
        TradeField::ExitDate => set(&mut raw.exit_date, value),
        TradeField::Commission => set(&mut raw.commission, value),
        TradeField::Swap => set(&mut raw.swap, value),
        TradeField::Platform => set(&mut raw.platform, value),
    }
}
