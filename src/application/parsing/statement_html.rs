use super::html::{first_table, table_rows};
use super::normalize::{normalize, parse_number, NormalizeContext, RawTrade};
use super::{ParseError, ParseResult};
use crate::domain::values::side::Side;

pub const MT4_HTML_LABEL: &str = "MT4/MT5 HTML Statement";

/// Fewer cells than this is a summary, header or balance row.
const MIN_CELLS: usize = 8;

/// Cells in a full MetaTrader "Closed Transactions" row.
const FULL_ROW_CELLS: usize = 14;

/// Parse the closed-transactions table of an MT4/MT5 HTML statement.
///
/// Only the first table is read. Rows with fewer than eight cells or whose
/// last cell is not a number are skipped without an error.
pub fn parse_mt4_html(html: &str) -> ParseResult {
    let mut result = ParseResult::new(MT4_HTML_LABEL);
    let Some(table) = first_table(html) else {
        result
            .errors
            .push(ParseError::document("No trade table found in statement"));
        return result;
    };
    let ctx = NormalizeContext {
        platform: "MT4/MT5".into(),
        import_source: "MT4/5 HTML Statement".into(),
        instrument_override: None,
    };

    for (idx, cells) in table_rows(table).into_iter().enumerate() {
        if cells.len() < MIN_CELLS {
            continue;
        }
        let profit = &cells[cells.len() - 1];
        if parse_number(profit).is_none() {
            continue;
        }
        let raw = row_to_raw(&cells);
        match normalize(raw, &ctx) {
            Ok(trade) => result.trades.push(trade),
            Err(e) => result.errors.push(ParseError::new(idx + 1, e)),
        }
    }
    result
}

fn row_to_raw(c: &[String]) -> RawTrade {
    let get = |i: usize| c.get(i).cloned();
    let mut raw = RawTrade {
        trade_id: get(0),
        entry_date: get(1),
        side: c.get(2).and_then(|t| Side::infer(t)),
        quantity: get(3),
        symbol: get(4),
        entry_price: get(5),
        pnl: c.last().cloned(),
        ..Default::default()
    };
    if c.len() >= FULL_ROW_CELLS {
        raw.stop_loss = get(6);
        raw.take_profit = get(7);
        raw.exit_date = get(8);
        raw.exit_price = get(9);
        raw.commission = get(10);
        raw.swap = get(12);
    } else {
        // Compact layout: ticket, open time, type, size, item, price, close price, ..., profit
        raw.exit_price = get(6);
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(rows: &str) -> String {
        format!(
            "<html><body><div>Account: 123</div><table>\
             <tr><td>Ticket</td><td>Open Time</td><td>Type</td><td>Size</td><td>Item</td>\
             <td>Price</td><td>S / L</td><td>T / P</td><td>Close Time</td><td>Price</td>\
             <td>Commission</td><td>Taxes</td><td>Swap</td><td>Profit</td></tr>{rows}</table></body></html>"
        )
    }

    #[test]
    fn test_full_row() {
        let html = statement(
            "<tr><td>5001</td><td>2024.04.01 08:00</td><td>sell</td><td>0.50</td><td>gbpusd</td>\
             <td>1.26000</td><td>1.26500</td><td>1.25000</td><td>2024.04.01 16:00</td><td>1.25500</td>\
             <td>-3.50</td><td>0.00</td><td>-1.20</td><td>250.00</td></tr>",
        );
        let result = parse_mt4_html(&html);
        assert!(result.errors.is_empty());
        assert_eq!(result.trades.len(), 1);
        let t = &result.trades[0];
        assert_eq!(t.symbol, "GBPUSD");
        assert_eq!(t.side, Some(Side::Short));
        assert_eq!(t.entry_price, Some(1.26));
        assert_eq!(t.exit_price, Some(1.255));
        assert_eq!(t.pnl, 250.0);
        assert_eq!(t.swap, -1.2);
        assert_eq!(t.broker_trade_id.as_deref(), Some("5001"));
        assert_eq!(t.import_source, "MT4/5 HTML Statement");
    }

    #[test]
    fn test_short_row_is_skipped_without_error() {
        let html = statement("<tr><td>5002</td><td>x</td><td>buy</td><td>1</td><td>EURUSD</td></tr>");
        let result = parse_mt4_html(&html);
        assert!(result.trades.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_compact_row() {
        let html = statement(
            "<tr><td>7</td><td>2024.04.02 10:00</td><td>buy</td><td>2</td><td>US30</td>\
             <td>39000</td><td>39100</td><td>-40.5</td></tr>",
        );
        let result = parse_mt4_html(&html);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].exit_price, Some(39100.0));
        assert_eq!(result.trades[0].pnl, -40.5);
    }

    #[test]
    fn test_entity_encoded_loss_keeps_sign() {
        let html = statement(
            "<tr><td>9</td><td>2024.04.02 10:00</td><td>buy</td><td>2</td><td>US30</td>\
             <td>39000</td><td>38980</td><td>&#45;40.50</td></tr>",
        );
        let result = parse_mt4_html(&html);
        assert!(result.errors.is_empty());
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].pnl, -40.5);
    }

    #[test]
    fn test_missing_symbol_is_row_error() {
        let html = statement(
            "<tr><td>8</td><td>2024.04.02 10:00</td><td>buy</td><td>2</td><td></td>\
             <td>1</td><td>2</td><td>5</td></tr>",
        );
        let result = parse_mt4_html(&html);
        assert!(result.trades.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, 2);
    }

    #[test]
    fn test_no_table_is_document_error() {
        let result = parse_mt4_html("<html><body>Nothing here</body></html>");
        assert!(result.trades.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, 0);
    }
}
