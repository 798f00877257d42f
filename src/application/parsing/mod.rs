//! Statement parsing: format detection, per-format parsers and the AI fallback.
//!
//! Parsers never fail as a whole. Each returns a [`ParseResult`] holding the
//! trades it could read and one [`ParseError`] per row it could not.

pub mod ai_extract;
pub mod column_map;
pub mod csv_formats;
pub mod dashboard;
pub mod detect;
pub mod html;
pub mod normalize;
pub mod statement_html;
pub mod tokenizer;

use crate::domain::entities::account_metrics::{total_pnl, AccountMetrics};
use crate::domain::entities::trade_record::TradeRecord;
use crate::domain::ports::structured_extractor::StructuredExtractor;
use crate::domain::values::format_tag::FormatTag;
use serde::{Deserialize, Serialize};
use tracing::debug;

use csv_formats::{
    parse_csv, parse_ctrader, parse_mt4_csv, DXTRADE_CSV, GENERIC_CSV, MATCHTRADER_CSV, RITHMIC_CSV,
    TRADINGVIEW_CSV,
};

pub const PDF_LABEL: &str = "PDF Statement";

/// A row (or, with `line == 0`, the whole document) that could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    pub line: usize,
    pub error: String,
}

impl ParseError {
    pub fn new(line: usize, error: impl Into<String>) -> Self {
        Self {
            line,
            error: error.into(),
        }
    }

    pub fn document(error: impl Into<String>) -> Self {
        Self::new(0, error)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseResult {
    pub trades: Vec<TradeRecord>,
    pub errors: Vec<ParseError>,
    /// Human-readable label of the parser that produced this result.
    pub format: String,
}

impl ParseResult {
    pub fn new(format: &str) -> Self {
        Self {
            trades: Vec::new(),
            errors: Vec::new(),
            format: format.to_string(),
        }
    }
}

/// Raw statement bytes plus the name they arrived under.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn is_pdf(&self) -> bool {
        self.filename.to_lowercase().ends_with(".pdf") || self.bytes.starts_with(b"%PDF")
    }

    pub fn mime_type(&self) -> &'static str {
        let name = self.filename.to_lowercase();
        if self.is_pdf() {
            "application/pdf"
        } else if name.ends_with(".html") || name.ends_with(".htm") {
            "text/html"
        } else if name.ends_with(".csv") {
            "text/csv"
        } else {
            "text/plain"
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Skip detection and use this parser.
    pub format_override: Option<FormatTag>,
    /// Retry through the extraction service when a text format yields no trades.
    pub ai_fallback: bool,
}

/// Parse output together with the account figures found alongside the trades.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedDocument {
    pub format_tag: FormatTag,
    pub result: ParseResult,
    pub metrics: AccountMetrics,
}

/// Dispatch text to the parser for `format`. PDFs cannot be parsed as text
/// and come back as a single document error.
pub fn parse_text(format: FormatTag, text: &str) -> ParseResult {
    match format {
        FormatTag::Csv => parse_csv(text, &GENERIC_CSV),
        FormatTag::DxTrade => parse_csv(text, &DXTRADE_CSV),
        FormatTag::MatchTrader => parse_csv(text, &MATCHTRADER_CSV),
        FormatTag::Rithmic => parse_csv(text, &RITHMIC_CSV),
        FormatTag::TradingView => parse_csv(text, &TRADINGVIEW_CSV),
        FormatTag::Mt4Csv => parse_mt4_csv(text),
        FormatTag::CTrader => parse_ctrader(text),
        FormatTag::Mt4Html => statement_html::parse_mt4_html(text),
        FormatTag::HybridFunding => dashboard::scrape_dashboard(text).into_parse_result(),
        FormatTag::Pdf => {
            let mut result = ParseResult::new(PDF_LABEL);
            result
                .errors
                .push(ParseError::document("PDF statements require AI extraction"));
            result
        }
    }
}

/// Like [`parse_text`], also collecting labeled account metrics from HTML sources.
pub fn parse_with_metrics(format: FormatTag, text: &str) -> ParsedDocument {
    let (result, mut metrics) = match format {
        FormatTag::HybridFunding => {
            let scrape = dashboard::scrape_dashboard(text);
            let metrics = scrape.metrics.clone();
            (scrape.into_parse_result(), metrics)
        }
        FormatTag::Mt4Html => (
            statement_html::parse_mt4_html(text),
            dashboard::extract_labeled_metrics(text),
        ),
        _ => (parse_text(format, text), AccountMetrics::default()),
    };
    metrics.total_profit_loss = total_pnl(&result.trades);
    ParsedDocument {
        format_tag: format,
        result,
        metrics,
    }
}

/// Detect (unless overridden) and parse a document, routing PDFs and, when
/// enabled, empty text results through the structured extractor.
pub async fn parse_document(
    doc: &Document,
    options: &ParseOptions,
    extractor: &dyn StructuredExtractor,
) -> ParsedDocument {
    let text = doc.text();
    let format = options
        .format_override
        .unwrap_or_else(|| detect::detect(&doc.filename, &text));
    debug!(file = %doc.filename, format = %format, "parsing document");

    if format == FormatTag::Pdf {
        let result = ai_extract::extract_via_ai(extractor, doc).await;
        return ParsedDocument {
            format_tag: format,
            metrics: AccountMetrics::from_trades(&result.trades),
            result,
        };
    }

    let mut parsed = parse_with_metrics(format, &text);
    if options.ai_fallback && parsed.result.trades.is_empty() {
        debug!(format = %format, "no trades from text parser, trying AI extraction");
        let ai = ai_extract::extract_via_ai(extractor, doc).await;
        if !ai.trades.is_empty() {
            parsed.metrics.total_profit_loss = total_pnl(&ai.trades);
            parsed.result = ai;
        }
    }
    parsed
}
