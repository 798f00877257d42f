use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Binary side classifier used for broker exports: anything mentioning
    /// buy/long is `Long`, any other non-empty token is `Short`.
    pub fn infer(token: &str) -> Option<Side> {
        let t = token.trim().to_lowercase();
        if t.is_empty() {
            return None;
        }
        if t.contains("buy") || t.contains("long") {
            Some(Side::Long)
        } else {
            Some(Side::Short)
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "Long"),
            Side::Short => write!(f, "Short"),
        }
    }
}

impl FromStr for Side {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" | "buy" => Ok(Side::Long),
            "short" | "sell" => Ok(Side::Short),
            _ => Err(format!("Unknown side: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_buy_and_long() {
        assert_eq!(Side::infer("BUY"), Some(Side::Long));
        assert_eq!(Side::infer("Long"), Some(Side::Long));
        assert_eq!(Side::infer("buy limit"), Some(Side::Long));
    }

    #[test]
    fn test_infer_everything_else_is_short() {
        assert_eq!(Side::infer("sell"), Some(Side::Short));
        assert_eq!(Side::infer("flat"), Some(Side::Short));
        assert_eq!(Side::infer("close"), Some(Side::Short));
    }

    #[test]
    fn test_infer_empty_is_none() {
        assert_eq!(Side::infer("   "), None);
    }
}
