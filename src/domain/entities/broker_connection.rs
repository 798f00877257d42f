use crate::domain::values::connection_status::ConnectionStatus;
use crate::domain::values::source_kind::SourceKind;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One linked brokerage or prop-firm account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConnection {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub platform: String,
    pub source_kind: SourceKind,
    pub source_url: String,
    pub sync_interval_minutes: u32,
    pub auto_sync: bool,
    pub status: ConnectionStatus,
    pub balance: Option<f64>,
    pub equity: Option<f64>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BrokerConnection {
    pub fn new(
        user_id: String,
        name: String,
        platform: String,
        source_kind: SourceKind,
        source_url: String,
        sync_interval_minutes: u32,
        auto_sync: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            name,
            platform,
            source_kind,
            source_url,
            sync_interval_minutes,
            auto_sync,
            status: ConnectionStatus::Pending,
            balance: None,
            equity: None,
            last_sync_at: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    /// Whether an automatic sync should run at `now`. Never-synced connections are due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.auto_sync {
            return false;
        }
        match self.last_sync_at {
            None => true,
            Some(last) => last + Duration::minutes(self.sync_interval_minutes as i64) <= now,
        }
    }
}

/// Cached state written back to a connection after each sync attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSyncState {
    pub status: ConnectionStatus,
    pub balance: Option<f64>,
    pub equity: Option<f64>,
    pub last_sync_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(auto_sync: bool, interval: u32) -> BrokerConnection {
        BrokerConnection::new(
            "user-1".into(),
            "HF 50k".into(),
            "MT5".into(),
            SourceKind::HybridFunding,
            "https://example.test/dashboard".into(),
            interval,
            auto_sync,
        )
    }

    #[test]
    fn test_never_synced_is_due() {
        assert!(connection(true, 15).is_due(Utc::now()));
    }

    #[test]
    fn test_manual_connections_are_never_due() {
        assert!(!connection(false, 15).is_due(Utc::now()));
    }

    #[test]
    fn test_due_after_interval_elapsed() {
        let now = Utc::now();
        let mut conn = connection(true, 15);
        conn.last_sync_at = Some(now - Duration::minutes(10));
        assert!(!conn.is_due(now));
        conn.last_sync_at = Some(now - Duration::minutes(15));
        assert!(conn.is_due(now));
    }
}
