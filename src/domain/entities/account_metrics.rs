use crate::domain::entities::trade_record::TradeRecord;
use serde::{Deserialize, Serialize};

/// Account-level figures scraped alongside trades.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetrics {
    pub balance: Option<f64>,
    pub equity: Option<f64>,
    pub profit_target: Option<f64>,
    pub daily_loss_limit: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub total_profit_loss: f64,
}

impl AccountMetrics {
    pub fn from_trades(trades: &[TradeRecord]) -> Self {
        Self {
            total_profit_loss: total_pnl(trades),
            ..Self::default()
        }
    }

    /// Fill any missing value from `other`, keeping what is already known.
    pub fn merge_missing(&mut self, other: &AccountMetrics) {
        self.balance = self.balance.or(other.balance);
        self.equity = self.equity.or(other.equity);
        self.profit_target = self.profit_target.or(other.profit_target);
        self.daily_loss_limit = self.daily_loss_limit.or(other.daily_loss_limit);
        self.max_drawdown = self.max_drawdown.or(other.max_drawdown);
    }
}

pub fn total_pnl(trades: &[TradeRecord]) -> f64 {
    let sum: f64 = trades.iter().map(|t| t.pnl).sum();
    (sum * 100.0).round() / 100.0
}
