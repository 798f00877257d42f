use crate::domain::entities::trade_record::TradeRecord;
use crate::domain::values::instrument_type::InstrumentType;
use crate::domain::values::side::Side;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// A trade as pulled out of a row, before any coercion.
/// Numeric and date cells stay as the raw text the broker wrote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrade {
    pub trade_id: Option<String>,
    pub symbol: Option<String>,
    pub side: Option<Side>,
    pub entry_price: Option<String>,
    pub exit_price: Option<String>,
    pub quantity: Option<String>,
    pub pnl: Option<String>,
    pub entry_date: Option<String>,
    pub exit_date: Option<String>,
    pub stop_loss: Option<String>,
    pub take_profit: Option<String>,
    pub commission: Option<String>,
    pub swap: Option<String>,
    pub platform: Option<String>,
}

impl RawTrade {
    /// Rows without both a symbol and a P&L cell are not trades.
    pub fn has_required_cells(&self) -> bool {
        is_present(&self.symbol) && is_present(&self.pnl)
    }
}

fn is_present(v: &Option<String>) -> bool {
    v.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Provenance stamped onto every trade a parser emits.
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    pub platform: String,
    pub import_source: String,
    pub instrument_override: Option<InstrumentType>,
}

/// Coerce a raw row into a `TradeRecord`.
///
/// Fails only when the symbol is empty or the P&L does not parse; every other
/// field degrades to its default (0, 1 or `None`).
pub fn normalize(raw: RawTrade, ctx: &NormalizeContext) -> Result<TradeRecord, String> {
    let symbol = raw
        .symbol
        .as_deref()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing symbol".to_string())?;

    let pnl_raw = raw.pnl.as_deref().unwrap_or("");
    let pnl = parse_number(pnl_raw).ok_or_else(|| format!("Invalid P&L value '{pnl_raw}' for {symbol}"))?;

    let instrument_type = ctx
        .instrument_override
        .unwrap_or_else(|| infer_instrument_type(&symbol));

    let platform = raw
        .platform
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .unwrap_or_else(|| ctx.platform.clone());

    Ok(TradeRecord {
        side: raw.side,
        entry_date: raw.entry_date.as_deref().and_then(parse_timestamp),
        exit_date: raw.exit_date.as_deref().and_then(parse_timestamp),
        entry_price: opt_number(&raw.entry_price),
        exit_price: opt_number(&raw.exit_price),
        quantity: opt_number(&raw.quantity).unwrap_or(1.0),
        pnl,
        commission: opt_number(&raw.commission).unwrap_or(0.0),
        swap: opt_number(&raw.swap).unwrap_or(0.0),
        stop_loss: opt_number(&raw.stop_loss).filter(|v| *v != 0.0),
        take_profit: opt_number(&raw.take_profit).filter(|v| *v != 0.0),
        platform,
        instrument_type,
        import_source: ctx.import_source.clone(),
        broker_trade_id: raw
            .trade_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()),
        symbol,
    })
}

fn opt_number(v: &Option<String>) -> Option<f64> {
    v.as_deref().and_then(parse_number)
}

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

fn plain_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d{1,3}(?:[, ]\d{3})+|\d+)?(?:\.\d*)?$").expect("valid number regex")
    })
}

fn decimal_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+,\d{1,2}$").expect("valid decimal-comma regex"))
}

/// Numeric coercion for broker cells: `$1,234.50`, `-12.5 USD`, `1 234.50`,
/// `(45.00)` and `\u{2212}3` for negatives, `12,5` as a decimal comma.
///
/// Only currency markers and thousands separators are dropped. Anything else
/// left around the number (`12.50 (2 lots)`, `5 USD / 3 EUR`) makes the cell
/// unparsable. NaN and infinities are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim().replace('\u{2212}', "-");
    let (negative, s) = match s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, s.as_str()),
    };
    let without_symbols: String = s.chars().filter(|c| !CURRENCY_SYMBOLS.contains(c)).collect();
    let number = without_symbols
        .split_whitespace()
        .filter(|token| !CURRENCIES.iter().any(|code| token.eq_ignore_ascii_case(code)))
        .collect::<Vec<_>>()
        .join(" ");

    let canonical = if decimal_comma_re().is_match(&number) {
        number.replace(',', ".")
    } else if plain_number_re().is_match(&number) {
        number.replace([',', ' '], "")
    } else {
        return None;
    };
    if !canonical.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: f64 = canonical.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y"];

/// Parse the timestamp styles brokers export. Naive times are taken as UTC.
/// Ambiguous `xx/yy/yyyy` dates are read day-first.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
        }
    }
    if s.len() >= 10 && s.chars().all(|c| c.is_ascii_digit()) {
        let n: i64 = s.parse().ok()?;
        return if s.len() >= 13 {
            Utc.timestamp_millis_opt(n).single()
        } else {
            Utc.timestamp_opt(n, 0).single()
        };
    }
    None
}

const CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "AUD", "NZD", "CAD", "CHF", "SEK", "NOK", "DKK", "SGD", "HKD",
    "ZAR", "MXN", "TRY", "PLN", "CNH",
];

const CRYPTO_PREFIXES: &[&str] = &[
    "BTC", "XBT", "ETH", "SOL", "XRP", "LTC", "DOGE", "ADA", "BNB", "DOT", "AVAX", "LINK", "MATIC",
];

const CFD_MARKERS: &[&str] = &[
    "XAU", "XAG", "XPT", "GOLD", "SILVER", "OIL", "WTI", "BRENT", "USOIL", "UKOIL", "NATGAS",
    "US30", "US100", "US500", "NAS100", "NAS", "SPX500", "SPX", "GER30", "GER40", "DE40", "DAX",
    "UK100", "JP225", "HK50", "AUS200", "FRA40", "EU50",
];

const FUTURES_ROOTS: &[&str] = &[
    "MNQ", "MES", "MYM", "M2K", "MGC", "MCL", "NQ", "ES", "YM", "RTY", "CL", "GC", "SI", "HG",
    "NG", "ZB", "ZN", "ZF", "ZC", "ZS", "ZW", "6E", "6B", "6J",
];

fn occ_option_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{1,6}\d{6}[CP]\d{8}$").expect("valid OCC regex"))
}

fn futures_contract_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[FGHJKMNQUVXZ]\d{1,2}$").expect("valid month-code regex"))
}

/// Keyword scan over a symbol. Order: options, crypto, forex, CFD, futures,
/// and `Stocks` when nothing matches.
pub fn infer_instrument_type(symbol: &str) -> InstrumentType {
    let upper = symbol.trim().to_uppercase();
    let words: Vec<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let compact: String = upper.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

    if words.iter().any(|w| *w == "CALL" || *w == "PUT") || occ_option_re().is_match(&compact) {
        return InstrumentType::Options;
    }
    if upper.contains("CRYPTO") || CRYPTO_PREFIXES.iter().any(|p| compact.starts_with(p)) {
        return InstrumentType::Crypto;
    }
    if is_currency_pair(&compact) {
        return InstrumentType::Forex;
    }
    if CFD_MARKERS.iter().any(|m| compact.starts_with(m)) {
        return InstrumentType::Cfd;
    }
    if is_futures_contract(&compact, &words) {
        return InstrumentType::Futures;
    }
    InstrumentType::Stocks
}

fn is_currency_pair(compact: &str) -> bool {
    // Brokers append suffixes such as EURUSDm or EURUSD.raw; look at the first six letters.
    if compact.len() < 6 || !compact.is_char_boundary(6) {
        return false;
    }
    let (base, quote) = (&compact[..3], &compact[3..6]);
    base != quote && CURRENCIES.contains(&base) && CURRENCIES.contains(&quote)
}

fn is_futures_contract(compact: &str, words: &[&str]) -> bool {
    let first = words.first().copied().unwrap_or(compact);
    FUTURES_ROOTS.iter().any(|root| {
        if first == *root {
            return true;
        }
        match compact.strip_prefix(root) {
            Some(rest) => futures_contract_re().is_match(rest),
            None => false,
        }
    })
}
