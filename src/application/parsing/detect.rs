use crate::domain::values::format_tag::FormatTag;

/// Lines of the preamble scanned for platform fingerprints.
const FINGERPRINT_LINES: usize = 10;

/// Platform fingerprints, checked in order against the lower-cased preamble.
const FINGERPRINTS: &[(&[&str], FormatTag)] = &[
    (&["metatrader", "ticket"], FormatTag::Mt4Csv),
    (&["ctrader", "position id"], FormatTag::CTrader),
    (&["dxtrade", "devexperts"], FormatTag::DxTrade),
    (&["match-trader"], FormatTag::MatchTrader),
    (&["rithmic"], FormatTag::Rithmic),
    (&["tradingview", "paper trading"], FormatTag::TradingView),
];

/// Classify a document from its filename and the start of its content.
///
/// Best-effort: fingerprints are plain substring matches over the first lines,
/// so a note that mentions another platform can steer the result. Never fails;
/// no match means generic CSV.
pub fn detect(filename: &str, sample: &str) -> FormatTag {
    let name = filename.trim().to_lowercase();
    let head = sample.trim_start_matches('\u{feff}').trim_start();

    if name.ends_with(".pdf") || head.starts_with("%PDF") {
        return FormatTag::Pdf;
    }

    let lower = head.to_lowercase();
    if name.ends_with(".html") || name.ends_with(".htm") || lower.contains("<table") || lower.contains("<html") {
        return FormatTag::Mt4Html;
    }

    let preamble = lower
        .lines()
        .take(FINGERPRINT_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    FINGERPRINTS
        .iter()
        .find(|(keys, _)| keys.iter().any(|k| preamble.contains(k)))
        .map(|(_, tag)| *tag)
        .unwrap_or(FormatTag::Csv)
}
