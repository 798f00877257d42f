use super::column_map::map_row;
use super::normalize::{normalize, NormalizeContext, RawTrade};
use super::tokenizer::{numbered_lines, tokenize_line};
use super::{ParseError, ParseResult};
use crate::domain::values::instrument_type::InstrumentType;
use crate::domain::values::side::Side;

/// Per-format metadata for header-driven CSV exports that share one pipeline.
#[derive(Debug, Clone, Copy)]
pub struct CsvFormat {
    pub label: &'static str,
    pub platform: &'static str,
    pub import_source: &'static str,
    pub instrument_override: Option<InstrumentType>,
}

impl CsvFormat {
    fn context(&self) -> NormalizeContext {
        NormalizeContext {
            platform: self.platform.to_string(),
            import_source: self.import_source.to_string(),
            instrument_override: self.instrument_override,
        }
    }
}

pub const GENERIC_CSV: CsvFormat = CsvFormat {
    label: "Generic CSV",
    platform: "Other",
    import_source: "CSV Import",
    instrument_override: None,
};

pub const DXTRADE_CSV: CsvFormat = CsvFormat {
    label: "DXTrade CSV",
    platform: "DXTrade",
    import_source: "DXTrade CSV Export",
    instrument_override: None,
};

pub const MATCHTRADER_CSV: CsvFormat = CsvFormat {
    label: "MatchTrader CSV",
    platform: "MatchTrader",
    import_source: "MatchTrader CSV Export",
    instrument_override: None,
};

pub const RITHMIC_CSV: CsvFormat = CsvFormat {
    label: "Rithmic CSV",
    platform: "Rithmic",
    import_source: "Rithmic CSV Export",
    instrument_override: Some(InstrumentType::Futures),
};

pub const TRADINGVIEW_CSV: CsvFormat = CsvFormat {
    label: "TradingView CSV",
    platform: "TradingView",
    import_source: "TradingView CSV Export",
    instrument_override: None,
};

/// Tokenize, map headers, keep rows with a symbol and P&L, normalize.
pub fn parse_csv(text: &str, format: &CsvFormat) -> ParseResult {
    let mut result = ParseResult::new(format.label);
    let mut lines = numbered_lines(text);
    let Some((_, header_line)) = lines.next() else {
        result.errors.push(ParseError::document("Empty document"));
        return result;
    };
    let headers = tokenize_line(header_line);
    let ctx = format.context();

    for (line_no, line) in lines {
        let values = tokenize_line(line);
        let raw = map_row(&headers, &values);
        if !raw.has_required_cells() {
            continue;
        }
        match normalize(raw, &ctx) {
            Ok(trade) => result.trades.push(trade),
            Err(e) => result.errors.push(ParseError::new(line_no, e)),
        }
    }
    result
}

pub const MT4_CSV_LABEL: &str = "MT4/MT5 CSV";

/// Column count of the MetaTrader account-history export:
/// Ticket, Open Time, Type, Size, Item, Price, S/L, T/P, Close Time, Price,
/// Commission, Taxes, Swap, Profit.
const MT4_COLUMNS: usize = 14;

/// Positional MT4/MT5 history export. Rows whose type is neither buy nor sell
/// (deposits, balance corrections) are skipped.
pub fn parse_mt4_csv(text: &str) -> ParseResult {
    let mut result = ParseResult::new(MT4_CSV_LABEL);
    let ctx = NormalizeContext {
        platform: "MT4/MT5".into(),
        import_source: "MT4/5 CSV Export".into(),
        instrument_override: None,
    };

    for (line_no, line) in numbered_lines(text).skip(1) {
        let f = tokenize_line(line);
        let kind = f.get(2).map(|t| t.to_lowercase()).unwrap_or_default();
        if !kind.contains("buy") && !kind.contains("sell") {
            continue;
        }
        if f.len() < MT4_COLUMNS {
            result.errors.push(ParseError::new(
                line_no,
                format!("Expected {MT4_COLUMNS} columns, found {}", f.len()),
            ));
            continue;
        }
        let raw = RawTrade {
            trade_id: Some(f[0].clone()),
            entry_date: Some(f[1].clone()),
            side: Side::infer(&f[2]),
            quantity: Some(f[3].clone()),
            symbol: Some(f[4].clone()),
            entry_price: Some(f[5].clone()),
            stop_loss: Some(f[6].clone()),
            take_profit: Some(f[7].clone()),
            exit_date: Some(f[8].clone()),
            exit_price: Some(f[9].clone()),
            commission: Some(f[10].clone()),
            swap: Some(f[12].clone()),
            pnl: Some(f[13].clone()),
            platform: None,
        };
        match normalize(raw, &ctx) {
            Ok(trade) => result.trades.push(trade),
            Err(e) => result.errors.push(ParseError::new(line_no, e)),
        }
    }
    result
}

pub const CTRADER_LABEL: &str = "cTrader CSV";

/// Column positions located by header keywords, so reordered exports still parse.
#[derive(Debug, Default)]
struct CTraderColumns {
    id: Option<usize>,
    symbol: Option<usize>,
    direction: Option<usize>,
    entry_price: Option<usize>,
    close_price: Option<usize>,
    quantity: Option<usize>,
    profit: Option<usize>,
    open_time: Option<usize>,
    close_time: Option<usize>,
    commission: Option<usize>,
    swap: Option<usize>,
}

impl CTraderColumns {
    fn locate(headers: &[String]) -> Self {
        let lower: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let find = |pred: &dyn Fn(&str) -> bool| lower.iter().position(|h| pred(h.as_str()));
        Self {
            id: find(&|h| h.contains("position id")).or_else(|| find(&|h| h == "id")),
            symbol: find(&|h| h.contains("symbol")),
            direction: find(&|h| h.contains("direction") || h.contains("side") || h == "type"),
            entry_price: find(&|h| h.contains("entry") && h.contains("price")),
            close_price: find(&|h| h.contains("clos") && h.contains("price")),
            quantity: find(&|h| h.contains("quantity") || h.contains("volume") || h.contains("lots")),
            profit: find(&|h| h.contains("net") && h.contains("profit"))
                .or_else(|| find(&|h| h.contains("profit") || h.contains("pnl"))),
            open_time: find(&|h| (h.contains("open") || h.contains("entry")) && h.contains("time")),
            close_time: find(&|h| h.contains("clos") && h.contains("time")),
            commission: find(&|h| h.contains("commission")),
            swap: find(&|h| h.contains("swap")),
        }
    }
}

fn cell(values: &[String], idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| values.get(i)).cloned()
}

pub fn parse_ctrader(text: &str) -> ParseResult {
    let mut result = ParseResult::new(CTRADER_LABEL);
    let mut lines = numbered_lines(text);
    let Some((_, header_line)) = lines.next() else {
        result.errors.push(ParseError::document("Empty document"));
        return result;
    };
    let cols = CTraderColumns::locate(&tokenize_line(header_line));
    if cols.symbol.is_none() || cols.profit.is_none() {
        result.errors.push(ParseError::document(
            "cTrader export is missing a symbol or profit column",
        ));
        return result;
    }
    let ctx = NormalizeContext {
        platform: "cTrader".into(),
        import_source: "cTrader CSV Export".into(),
        instrument_override: None,
    };

    for (line_no, line) in lines {
        let values = tokenize_line(line);
        let raw = RawTrade {
            trade_id: cell(&values, cols.id),
            symbol: cell(&values, cols.symbol),
            side: cell(&values, cols.direction).and_then(|d| Side::infer(&d)),
            entry_price: cell(&values, cols.entry_price),
            exit_price: cell(&values, cols.close_price),
            quantity: cell(&values, cols.quantity),
            pnl: cell(&values, cols.profit),
            entry_date: cell(&values, cols.open_time),
            exit_date: cell(&values, cols.close_time),
            commission: cell(&values, cols.commission),
            swap: cell(&values, cols.swap),
            ..Default::default()
        };
        if raw.symbol.as_deref().map_or(true, |s| s.trim().is_empty()) {
            continue;
        }
        match normalize(raw, &ctx) {
            Ok(trade) => result.trades.push(trade),
            Err(e) => result.errors.push(ParseError::new(line_no, e)),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERIC: &str = "symbol,side,entry_price,exit_price,quantity,pnl\n\
        EURUSD,buy,1.1000,1.1050,1,50\n\
        GBPUSD,sell,1.3000,1.2950,1,50";

    #[test]
    fn test_generic_two_rows() {
        let result = parse_csv(GENERIC, &GENERIC_CSV);
        assert_eq!(result.format, "Generic CSV");
        assert!(result.errors.is_empty());
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].side, Some(Side::Long));
        assert_eq!(result.trades[1].side, Some(Side::Short));
        assert!(result.trades.iter().all(|t| t.pnl == 50.0));
        assert_eq!(result.trades[0].entry_price, Some(1.1));
        assert_eq!(result.trades[0].instrument_type, InstrumentType::Forex);
        assert_eq!(result.trades[0].platform, "Other");
    }

    #[test]
    fn test_one_malformed_row_among_valid() {
        let text = "symbol,side,pnl\nES,buy,10\nNQ,sell,oops\nYM,buy,-5\n";
        let result = parse_csv(text, &GENERIC_CSV);
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, 3);
    }

    #[test]
    fn test_rows_without_pnl_are_skipped_silently() {
        let text = "symbol,side,pnl\nES,buy,10\nTotal,,\n";
        let result = parse_csv(text, &GENERIC_CSV);
        assert_eq!(result.trades.len(), 1);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_rithmic_forces_futures() {
        let text = "Symbol,Buy/Sell,Qty,P&L\nEURUSD,B,1,12.5\n";
        let result = parse_csv(text, &RITHMIC_CSV);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].instrument_type, InstrumentType::Futures);
        assert_eq!(result.trades[0].platform, "Rithmic");
    }

    #[test]
    fn test_empty_document() {
        let result = parse_csv("\n\n", &GENERIC_CSV);
        assert!(result.trades.is_empty());
        assert_eq!(result.errors[0].line, 0);
    }

    const MT4: &str = "Ticket,Open Time,Type,Size,Item,Price,S / L,T / P,Close Time,Price,Commission,Taxes,Swap,Profit\n\
        1001,2024.03.01 10:00:00,buy,1.00,eurusd,1.08000,1.07500,0.00000,2024.03.01 12:00:00,1.08200,-7.00,0.00,0.00,200.00\n\
        1002,2024.03.02 09:00:00,balance,,,,,,,,,,,5000.00\n\
        1003,2024.03.03 09:00:00,sell,0.50,GBPUSD,1.27000";

    #[test]
    fn test_mt4_csv_positional() {
        let result = parse_mt4_csv(MT4);
        assert_eq!(result.trades.len(), 1);
        let t = &result.trades[0];
        assert_eq!(t.broker_trade_id.as_deref(), Some("1001"));
        assert_eq!(t.symbol, "EURUSD");
        assert_eq!(t.side, Some(Side::Long));
        assert_eq!(t.pnl, 200.0);
        assert_eq!(t.commission, -7.0);
        assert_eq!(t.stop_loss, Some(1.075));
        assert_eq!(t.take_profit, None);
        assert!(t.exit_date.is_some());

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, 4);
    }

    #[test]
    fn test_ctrader_reordered_columns() {
        let text = "Net Profit,Symbol,Position ID,Direction,Closing Price,Entry Price,Volume,Gross Profit\n\
            -12.40,XAUUSD,55501,Sell,2010.5,2005.1,0.1,-12.00\n\
            15.00,,55502,Buy,1,1,1,15\n";
        let result = parse_ctrader(text);
        assert!(result.errors.is_empty());
        assert_eq!(result.trades.len(), 1);
        let t = &result.trades[0];
        assert_eq!(t.pnl, -12.4);
        assert_eq!(t.broker_trade_id.as_deref(), Some("55501"));
        assert_eq!(t.side, Some(Side::Short));
        assert_eq!(t.entry_price, Some(2005.1));
        assert_eq!(t.exit_price, Some(2010.5));
        assert_eq!(t.platform, "cTrader");
        assert_eq!(t.instrument_type, InstrumentType::Cfd);
    }

    #[test]
    fn test_ctrader_missing_profit_column() {
        let result = parse_ctrader("Symbol,Direction\nEURUSD,Buy\n");
        assert!(result.trades.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, 0);
    }
}
