use crate::domain::entities::sync_log::SyncLogEntry;
use crate::domain::error::DomainError;

pub trait SyncLogRepository: Send + Sync {
    fn append(&self, entry: &SyncLogEntry) -> Result<(), DomainError>;
    /// Most recent first.
    fn list_by_connection(&self, broker_connection_id: &str, limit: usize) -> Result<Vec<SyncLogEntry>, DomainError>;
}
