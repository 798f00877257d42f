use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a broker connection's trade history comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Scraped prop-firm dashboard page.
    HybridFunding,
    /// A statement document (CSV/HTML/PDF) published at a URL.
    Statement,
}

impl SourceKind {
    /// Prefix used when synthesizing trade ids for trades without a broker id.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            SourceKind::HybridFunding => "hf",
            SourceKind::Statement => "stmt",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::HybridFunding => write!(f, "hybrid_funding"),
            SourceKind::Statement => write!(f, "statement"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "hybrid_funding" | "hybridfunding" => Ok(SourceKind::HybridFunding),
            "statement" => Ok(SourceKind::Statement),
            _ => Err(format!("Unknown source kind: {s}")),
        }
    }
}
