use crate::application::sync::{SyncOptions, SyncOutcome, SyncUseCase};
use crate::domain::entities::broker_connection::BrokerConnection;
use crate::domain::error::DomainError;
use crate::domain::ports::connection_repository::ConnectionRepository;
use crate::domain::values::sync_status::SyncType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Connections with auto sync enabled whose interval has elapsed at `now`.
pub fn due_connections(connections: &[BrokerConnection], now: DateTime<Utc>) -> Vec<&BrokerConnection> {
    connections.iter().filter(|c| c.is_due(now)).collect()
}

#[derive(Debug, Serialize)]
pub struct AutoSyncReport {
    pub checked: usize,
    pub results: Vec<AutoSyncResult>,
}

#[derive(Debug, Serialize)]
pub struct AutoSyncResult {
    pub connection_id: String,
    pub name: String,
    pub outcome: Option<SyncOutcome>,
    pub error: Option<String>,
}

pub struct AutoSyncUseCase {
    connections: Arc<dyn ConnectionRepository>,
    sync: Arc<SyncUseCase>,
}

impl AutoSyncUseCase {
    pub fn new(connections: Arc<dyn ConnectionRepository>, sync: Arc<SyncUseCase>) -> Self {
        Self { connections, sync }
    }

    /// Sync every due connection, one at a time. A failing connection does
    /// not stop the others; its error is reported in its result.
    pub async fn run_due(&self, now: DateTime<Utc>) -> Result<AutoSyncReport, DomainError> {
        let all = self.connections.list(None)?;
        let due = due_connections(&all, now);
        info!(checked = all.len(), due = due.len(), "auto sync tick");

        let options = SyncOptions {
            sync_type: SyncType::Auto,
            ..Default::default()
        };
        let mut results = Vec::with_capacity(due.len());
        for connection in due {
            let result = match self.sync.run_sync(&connection.id, &options).await {
                Ok(outcome) => AutoSyncResult {
                    connection_id: connection.id.clone(),
                    name: connection.name.clone(),
                    outcome: Some(outcome),
                    error: None,
                },
                Err(e) => AutoSyncResult {
                    connection_id: connection.id.clone(),
                    name: connection.name.clone(),
                    outcome: None,
                    error: Some(e.to_string()),
                },
            };
            results.push(result);
        }

        Ok(AutoSyncReport {
            checked: all.len(),
            results,
        })
    }
}
