use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of statement formats the parsers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatTag {
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "mt4Csv")]
    Mt4Csv,
    #[serde(rename = "mt4Html")]
    Mt4Html,
    #[serde(rename = "ctrader")]
    CTrader,
    #[serde(rename = "dxtrade")]
    DxTrade,
    #[serde(rename = "matchtrader")]
    MatchTrader,
    #[serde(rename = "rithmic")]
    Rithmic,
    #[serde(rename = "tradingview")]
    TradingView,
    #[serde(rename = "pdf")]
    Pdf,
    /// Scraped Hybrid Funding dashboard; chosen by connection kind, never detected.
    #[serde(rename = "hybridFunding")]
    HybridFunding,
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTag::Csv => write!(f, "csv"),
            FormatTag::Mt4Csv => write!(f, "mt4Csv"),
            FormatTag::Mt4Html => write!(f, "mt4Html"),
            FormatTag::CTrader => write!(f, "ctrader"),
            FormatTag::DxTrade => write!(f, "dxtrade"),
            FormatTag::MatchTrader => write!(f, "matchtrader"),
            FormatTag::Rithmic => write!(f, "rithmic"),
            FormatTag::TradingView => write!(f, "tradingview"),
            FormatTag::Pdf => write!(f, "pdf"),
            FormatTag::HybridFunding => write!(f, "hybridFunding"),
        }
    }
}

impl FromStr for FormatTag {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(FormatTag::Csv),
            "mt4csv" | "mt5csv" => Ok(FormatTag::Mt4Csv),
            "mt4html" | "mt5html" => Ok(FormatTag::Mt4Html),
            "ctrader" => Ok(FormatTag::CTrader),
            "dxtrade" => Ok(FormatTag::DxTrade),
            "matchtrader" | "match-trader" => Ok(FormatTag::MatchTrader),
            "rithmic" => Ok(FormatTag::Rithmic),
            "tradingview" => Ok(FormatTag::TradingView),
            "pdf" => Ok(FormatTag::Pdf),
            "hybridfunding" => Ok(FormatTag::HybridFunding),
            _ => Err(format!("Unknown format: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parses_back() {
        for tag in [
            FormatTag::Csv,
            FormatTag::Mt4Csv,
            FormatTag::Mt4Html,
            FormatTag::CTrader,
            FormatTag::DxTrade,
            FormatTag::MatchTrader,
            FormatTag::Rithmic,
            FormatTag::TradingView,
            FormatTag::Pdf,
            FormatTag::HybridFunding,
        ] {
            assert_eq!(tag.to_string().parse::<FormatTag>(), Ok(tag));
        }
    }
}
