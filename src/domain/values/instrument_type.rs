use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentType {
    Forex,
    Futures,
    Stocks,
    Options,
    Crypto,
    #[serde(rename = "CFD")]
    Cfd,
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentType::Forex => write!(f, "Forex"),
            InstrumentType::Futures => write!(f, "Futures"),
            InstrumentType::Stocks => write!(f, "Stocks"),
            InstrumentType::Options => write!(f, "Options"),
            InstrumentType::Crypto => write!(f, "Crypto"),
            InstrumentType::Cfd => write!(f, "CFD"),
        }
    }
}

impl FromStr for InstrumentType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forex" | "fx" => Ok(InstrumentType::Forex),
            "futures" | "future" => Ok(InstrumentType::Futures),
            "stocks" | "stock" | "equity" => Ok(InstrumentType::Stocks),
            "options" | "option" => Ok(InstrumentType::Options),
            "crypto" => Ok(InstrumentType::Crypto),
            "cfd" => Ok(InstrumentType::Cfd),
            _ => Err(format!("Unknown instrument type: {s}")),
        }
    }
}
