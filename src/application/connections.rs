use crate::domain::entities::broker_connection::BrokerConnection;
use crate::domain::entities::persisted_trade::PersistedTrade;
use crate::domain::entities::sync_log::SyncLogEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::connection_repository::ConnectionRepository;
use crate::domain::ports::sync_log_repository::SyncLogRepository;
use crate::domain::ports::trade_repository::TradeRepository;
use crate::domain::values::source_kind::SourceKind;
use std::sync::Arc;

pub const DEFAULT_SYNC_INTERVAL_MINUTES: u32 = 60;

#[derive(Debug, Clone)]
pub struct NewConnection {
    pub user_id: String,
    pub name: String,
    pub platform: String,
    pub source_kind: SourceKind,
    pub source_url: String,
    pub sync_interval_minutes: u32,
    pub auto_sync: bool,
}

pub struct ConnectionUseCase {
    connections: Arc<dyn ConnectionRepository>,
    trades: Arc<dyn TradeRepository>,
    logs: Arc<dyn SyncLogRepository>,
}

impl ConnectionUseCase {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        trades: Arc<dyn TradeRepository>,
        logs: Arc<dyn SyncLogRepository>,
    ) -> Self {
        Self {
            connections,
            trades,
            logs,
        }
    }

    pub fn add(&self, new: NewConnection) -> Result<BrokerConnection, DomainError> {
        if new.user_id.trim().is_empty() {
            return Err(DomainError::InvalidInput("user id must not be empty".into()));
        }
        if new.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("name must not be empty".into()));
        }
        if new.auto_sync && new.source_url.trim().is_empty() {
            return Err(DomainError::InvalidInput("auto sync needs a source URL".into()));
        }
        if new.sync_interval_minutes == 0 {
            return Err(DomainError::InvalidInput("sync interval must be at least one minute".into()));
        }
        let connection = BrokerConnection::new(
            new.user_id.trim().to_string(),
            new.name.trim().to_string(),
            new.platform.trim().to_string(),
            new.source_kind,
            new.source_url.trim().to_string(),
            new.sync_interval_minutes,
            new.auto_sync,
        );
        self.connections.create(&connection)?;
        Ok(connection)
    }

    pub fn get(&self, id: &str) -> Result<BrokerConnection, DomainError> {
        self.connections
            .get(id)?
            .ok_or_else(|| DomainError::NotFound(format!("Connection {id}")))
    }

    pub fn list(&self, user_id: Option<&str>) -> Result<Vec<BrokerConnection>, DomainError> {
        self.connections.list(user_id)
    }

    /// Removes the connection together with its trades and sync history.
    pub fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.get(id)?;
        self.connections.delete(id)
    }

    pub fn trades(&self, id: &str) -> Result<Vec<PersistedTrade>, DomainError> {
        self.get(id)?;
        self.trades.list_by_connection(id)
    }

    pub fn logs(&self, id: &str, limit: usize) -> Result<Vec<SyncLogEntry>, DomainError> {
        self.get(id)?;
        self.logs.list_by_connection(id, limit)
    }
}
