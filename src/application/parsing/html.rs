//! Minimal, regex-based HTML table scraping for broker statements.
//!
//! Statements and dashboards are machine-generated and flat, so tables are
//! located by tag scanning rather than a DOM. Nested tables are not supported.

use regex::Regex;
use std::sync::OnceLock;

fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>").expect("valid table regex"))
}

fn row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)(?:</tr\s*>|$)").expect("valid row regex"))
}

fn cell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td\s*>").expect("valid cell regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"))
}

/// Inner HTML of every `<table>` in document order.
pub fn tables(html: &str) -> Vec<&str> {
    table_re()
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Inner HTML of the first `<table>`, if any.
pub fn first_table(html: &str) -> Option<&str> {
    table_re()
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Text of each `<td>` cell, row by row. Rows built only from `<th>` come back empty.
pub fn table_rows(table: &str) -> Vec<Vec<String>> {
    row_re()
        .captures_iter(table)
        .filter_map(|c| c.get(1))
        .map(|row| {
            cell_re()
                .captures_iter(row.as_str())
                .filter_map(|c| c.get(1))
                .map(|cell| text_content(cell.as_str()))
                .collect()
        })
        .collect()
}

/// Tag-stripped, entity-decoded, whitespace-collapsed text.
pub fn text_content(fragment: &str) -> String {
    let stripped = tag_re().replace_all(fragment, " ");
    let decoded = html_escape::decode_html_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_and_cells() {
        let html = r#"<html><TABLE class="x"><tr><th>A</th></tr>
            <tr align=right><td><b>1</b></td><td>P&amp;L&nbsp;</td></tr></TABLE></html>"#;
        let table = first_table(html).unwrap();
        let rows = table_rows(table);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1], vec!["1", "P&L"]);
    }

    #[test]
    fn test_numeric_entities_are_decoded() {
        assert_eq!(text_content("<b>&#45;40.50</b>"), "-40.50");
        assert_eq!(text_content("&#x24;1&#44;000&#160;USD"), "$1,000 USD");
    }

    #[test]
    fn test_unclosed_row_is_still_read() {
        let rows = table_rows("<tr><td>a</td><td>b</td>");
        assert_eq!(rows, vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[test]
    fn test_multiple_tables() {
        let html = "<table><tr><td>1</td></tr></table><p/><table><tr><td>2</td></tr></table>";
        assert_eq!(tables(html).len(), 2);
        assert!(first_table("<div>none</div>").is_none());
    }
}
