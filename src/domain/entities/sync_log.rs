use crate::domain::values::sync_status::{SyncStatus, SyncType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A per-trade failure recorded during a sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub error: String,
}

/// Audit record of one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: String,
    pub broker_connection_id: String,
    pub sync_type: SyncType,
    pub status: SyncStatus,
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
    pub total_fetched: usize,
    pub errors: Vec<TradeError>,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl SyncLogEntry {
    pub fn new(broker_connection_id: &str, sync_type: SyncType, status: SyncStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            broker_connection_id: broker_connection_id.to_string(),
            sync_type,
            status,
            imported: 0,
            updated: 0,
            skipped: 0,
            total_fetched: 0,
            errors: Vec::new(),
            duration_ms: 0,
            created_at: Utc::now(),
        }
    }
}
