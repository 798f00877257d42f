use crate::domain::entities::persisted_trade::{PersistedTrade, TradePatch};
use crate::domain::error::DomainError;

pub trait TradeRepository: Send + Sync {
    /// Insert a trade. Fails with `DomainError::Duplicate` when the connection
    /// already holds a trade with the same broker trade id.
    fn create(&self, trade: &PersistedTrade) -> Result<(), DomainError>;
    fn update(&self, id: &str, patch: &TradePatch) -> Result<(), DomainError>;
    fn list_by_connection(&self, broker_connection_id: &str) -> Result<Vec<PersistedTrade>, DomainError>;
}
