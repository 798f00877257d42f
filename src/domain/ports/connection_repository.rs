use crate::domain::entities::broker_connection::{BrokerConnection, ConnectionSyncState};
use crate::domain::error::DomainError;

pub trait ConnectionRepository: Send + Sync {
    fn create(&self, connection: &BrokerConnection) -> Result<(), DomainError>;
    fn get(&self, id: &str) -> Result<Option<BrokerConnection>, DomainError>;
    /// All connections, optionally restricted to one user.
    fn list(&self, user_id: Option<&str>) -> Result<Vec<BrokerConnection>, DomainError>;
    fn update_sync_state(&self, id: &str, state: &ConnectionSyncState) -> Result<(), DomainError>;
    fn delete(&self, id: &str) -> Result<(), DomainError>;
}
