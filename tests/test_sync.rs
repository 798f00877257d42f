mod common;

use common::{add_connection, setup, FakeExtractor, FakeFetcher, GENERIC_CSV};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tradesync::application::parsing::Document;
use tradesync::application::sync::{SyncOptions, SyncUseCase};
use tradesync::domain::entities::broker_connection::BrokerConnection;
use tradesync::domain::entities::persisted_trade::{PersistedTrade, TradePatch};
use tradesync::domain::entities::trade_record::TradeRecord;
use tradesync::domain::error::DomainError;
use tradesync::domain::ports::connection_repository::ConnectionRepository;
use tradesync::domain::ports::sync_log_repository::SyncLogRepository;
use tradesync::domain::ports::trade_repository::TradeRepository;
use tradesync::domain::values::instrument_type::InstrumentType;
use tradesync::domain::values::connection_status::ConnectionStatus;
use tradesync::domain::values::source_kind::SourceKind;
use tradesync::domain::values::sync_status::{SyncStatus, SyncType};
use tradesync::infrastructure::sqlite;
use tradesync::infrastructure::sqlite::connection_repo::SqliteConnectionRepo;
use tradesync::infrastructure::sqlite::sync_log_repo::SqliteSyncLogRepo;

const URL: &str = "https://broker.test/export/trades.csv";

#[tokio::test]
async fn test_first_sync_imports_everything() {
    let h = setup();
    h.fetcher.serve(URL, 200, GENERIC_CSV);
    let conn = add_connection(&h.ts, "u1", SourceKind::Statement, URL, false);

    let outcome = h.ts.sync(&conn.id, &SyncOptions::default()).await.unwrap();
    assert_eq!(outcome.status, SyncStatus::Success);
    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.total_fetched, 2);
    assert_eq!(outcome.metrics.total_profit_loss, 100.0);

    let trades = h.ts.trades(&conn.id).unwrap();
    assert_eq!(trades.len(), 2);
    assert!(trades
        .iter()
        .all(|t| t.broker_trade_id.as_deref().is_some_and(|id| id.starts_with("stmt_"))));

    let logs = h.ts.logs(&conn.id, 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, SyncStatus::Success);
    assert_eq!(logs[0].sync_type, SyncType::Manual);
    assert_eq!(logs[0].imported, 2);

    let stored = h.ts.connection(&conn.id).unwrap();
    assert_eq!(stored.status, ConnectionStatus::Connected);
    assert!(stored.last_sync_at.is_some());

    let (_, headers) = &h.fetcher.calls()[0];
    assert!(headers.iter().any(|(k, _)| k == "User-Agent"));
}

#[tokio::test]
async fn test_resync_is_idempotent() {
    let h = setup();
    h.fetcher.serve(URL, 200, GENERIC_CSV);
    let conn = add_connection(&h.ts, "u1", SourceKind::Statement, URL, false);

    h.ts.sync(&conn.id, &SyncOptions::default()).await.unwrap();
    let second = h.ts.sync(&conn.id, &SyncOptions::default()).await.unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(h.ts.trades(&conn.id).unwrap().len(), 2);
}

#[tokio::test]
async fn test_changed_pnl_is_patched_and_force_refresh_patches_all() {
    let h = setup();
    let v1 = "ticket,symbol,side,pnl,exit price\nD1,EURUSD,buy,70,1.10\nD2,GBPUSD,sell,20,1.30\n";
    let v2 = "ticket,symbol,side,pnl,exit price\nD1,EURUSD,buy,75,1.11\nD2,GBPUSD,sell,20.005,1.30\n";
    h.fetcher.serve(URL, 200, v1);
    let conn = add_connection(&h.ts, "u1", SourceKind::Statement, URL, false);
    h.ts.sync(&conn.id, &SyncOptions::default()).await.unwrap();

    h.fetcher.serve(URL, 200, v2);
    let outcome = h.ts.sync(&conn.id, &SyncOptions::default()).await.unwrap();
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.skipped, 1);

    let trades = h.ts.trades(&conn.id).unwrap();
    let d1 = trades.iter().find(|t| t.broker_trade_id.as_deref() == Some("D1")).unwrap();
    assert_eq!(d1.pnl, 75.0);
    assert_eq!(d1.exit_price, Some(1.11));

    let forced = h
        .ts
        .sync(
            &conn.id,
            &SyncOptions {
                force_refresh: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(forced.updated, 2);
    assert_eq!(forced.skipped, 0);
}

#[tokio::test]
async fn test_row_errors_make_the_sync_partial() {
    let h = setup();
    h.fetcher.serve(URL, 200, "symbol,side,pnl\nEURUSD,buy,10\nGBPUSD,sell,n/a\n");
    let conn = add_connection(&h.ts, "u1", SourceKind::Statement, URL, false);

    let outcome = h.ts.sync(&conn.id, &SyncOptions::default()).await.unwrap();
    assert_eq!(outcome.status, SyncStatus::Partial);
    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].line, Some(3));

    let logs = h.ts.logs(&conn.id, 1).unwrap();
    assert_eq!(logs[0].status, SyncStatus::Partial);
    assert_eq!(logs[0].errors, outcome.errors);
}

#[tokio::test]
async fn test_non_2xx_is_fatal_and_logged() {
    let h = setup();
    h.fetcher.serve(URL, 503, "maintenance");
    let conn = add_connection(&h.ts, "u1", SourceKind::Statement, URL, false);

    let err = h.ts.sync(&conn.id, &SyncOptions::default()).await.unwrap_err();
    assert_eq!(err.fetch_status(), Some(503));

    let logs = h.ts.logs(&conn.id, 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, SyncStatus::Error);
    assert!(logs[0].errors[0].error.contains("503"));

    let stored = h.ts.connection(&conn.id).unwrap();
    assert_eq!(stored.status, ConnectionStatus::Error);
    assert!(stored.error_message.is_some());
    assert!(h.ts.trades(&conn.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_transport_failure_is_fatal() {
    let h = setup();
    let conn = add_connection(&h.ts, "u1", SourceKind::Statement, "https://down.test/x.csv", false);
    let err = h.ts.sync(&conn.id, &SyncOptions::default()).await.unwrap_err();
    assert!(matches!(err, DomainError::Fetch { status: None, .. }));
    assert_eq!(h.ts.logs(&conn.id, 10).unwrap()[0].status, SyncStatus::Error);
}

#[tokio::test]
async fn test_unknown_connection() {
    let h = setup();
    let err = h.ts.sync("missing", &SyncOptions::default()).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn test_dashboard_sync_caches_balance() {
    let h = setup();
    let url = "https://hybrid.test/dashboard";
    let page = r#"<div>Balance: $50,000.00</div><div>Equity: $50,120.00</div>
        <script>window.__INITIAL_STATE__ = {"trades":[{"symbol":"EURUSD","type":"buy","openTime":"2024-05-01T10:00:00Z","profit":120}]};</script>"#;
    h.fetcher.serve(url, 200, page);
    let conn = add_connection(&h.ts, "u1", SourceKind::HybridFunding, url, true);

    let outcome = h.ts.sync(&conn.id, &SyncOptions::default()).await.unwrap();
    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.format, "Hybrid Funding Dashboard");
    assert_eq!(outcome.metrics.balance, Some(50000.0));

    let stored = h.ts.connection(&conn.id).unwrap();
    assert_eq!(stored.balance, Some(50000.0));
    assert_eq!(stored.equity, Some(50120.0));

    let trades = h.ts.trades(&conn.id).unwrap();
    assert_eq!(
        trades[0].broker_trade_id.as_deref(),
        Some("EURUSD_2024-05-01T10:00:00Z")
    );
}

#[tokio::test]
async fn test_import_file() {
    let h = setup();
    let conn = add_connection(&h.ts, "u1", SourceKind::Statement, "", false);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(GENERIC_CSV.as_bytes()).unwrap();
    let bytes = std::fs::read(file.path()).unwrap();

    let options = SyncOptions {
        sync_type: SyncType::Import,
        ..Default::default()
    };
    let outcome = h
        .ts
        .import(&conn.id, Document::new("trades.csv", bytes), &options)
        .await
        .unwrap();
    assert_eq!(outcome.imported, 2);
    assert!(h.fetcher.calls().is_empty());
    assert_eq!(h.ts.logs(&conn.id, 1).unwrap()[0].sync_type, SyncType::Import);
}

#[tokio::test]
async fn test_on_disk_database_persists_between_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sync.db");
    let path = path.to_str().unwrap();
    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.serve(URL, 200, GENERIC_CSV);

    let id = {
        let ts = tradesync::TradeSync::with_providers(
            path,
            fetcher.clone(),
            Arc::new(FakeExtractor::failing()),
        )
        .unwrap();
        let conn = add_connection(&ts, "u1", SourceKind::Statement, URL, false);
        ts.sync(&conn.id, &SyncOptions::default()).await.unwrap();
        conn.id
    };

    let ts = tradesync::TradeSync::with_providers(path, fetcher, Arc::new(FakeExtractor::failing()))
        .unwrap();
    assert_eq!(ts.trades(&id).unwrap().len(), 2);
    let again = ts.sync(&id, &SyncOptions::default()).await.unwrap();
    assert_eq!(again.imported, 0);
}

/// Trade store whose GBPUSD insert fails, USDJPY insert collides and
/// listed symbols fail to update.
struct FlakyTradeRepo {
    existing: Vec<PersistedTrade>,
    update_failures: Vec<&'static str>,
    created: Mutex<Vec<String>>,
    updated: Mutex<Vec<String>>,
}

impl TradeRepository for FlakyTradeRepo {
    fn create(&self, trade: &PersistedTrade) -> Result<(), DomainError> {
        match trade.symbol.as_str() {
            "GBPUSD" => return Err(DomainError::Database("disk full".into())),
            "USDJPY" => return Err(DomainError::Duplicate("T3".into())),
            _ => {}
        }
        self.created.lock().unwrap().push(trade.symbol.clone());
        Ok(())
    }

    fn update(&self, id: &str, _patch: &TradePatch) -> Result<(), DomainError> {
        let trade = self.existing.iter().find(|t| t.id == id).unwrap();
        if self.update_failures.contains(&trade.symbol.as_str()) {
            return Err(DomainError::Database("disk I/O error".into()));
        }
        self.updated.lock().unwrap().push(trade.symbol.clone());
        Ok(())
    }

    fn list_by_connection(&self, _broker_connection_id: &str) -> Result<Vec<PersistedTrade>, DomainError> {
        Ok(self.existing.clone())
    }
}

#[tokio::test]
async fn test_write_failures_are_row_errors_and_duplicates_are_skipped() {
    let db = sqlite::open(":memory:").unwrap();
    let connections = Arc::new(SqliteConnectionRepo::new(db.clone()));
    let logs = Arc::new(SqliteSyncLogRepo::new(db));
    let connection = BrokerConnection::new(
        "u1".into(),
        "acct".into(),
        "MT5".into(),
        SourceKind::Statement,
        URL.into(),
        60,
        false,
    );
    connections.create(&connection).unwrap();

    let stored = |symbol: &str, ticket: &str| {
        PersistedTrade::from_record(
            &TradeRecord::new(symbol, 1.0, InstrumentType::Forex),
            &connection.id,
            ticket.to_string(),
        )
    };
    let trades = Arc::new(FlakyTradeRepo {
        existing: vec![stored("AUDUSD", "T4"), stored("NZDUSD", "T5")],
        update_failures: vec!["AUDUSD"],
        created: Mutex::new(Vec::new()),
        updated: Mutex::new(Vec::new()),
    });

    let fetcher = Arc::new(FakeFetcher::default());
    fetcher.serve(
        URL,
        200,
        "ticket,symbol,side,pnl\n\
         T1,EURUSD,buy,10\n\
         T2,GBPUSD,buy,20\n\
         T3,USDJPY,sell,30\n\
         T4,AUDUSD,buy,40\n\
         T5,NZDUSD,sell,50",
    );
    let sync = SyncUseCase::new(
        connections.clone(),
        trades.clone(),
        logs.clone(),
        fetcher,
        Arc::new(FakeExtractor::failing()),
    );

    let outcome = sync.run_sync(&connection.id, &SyncOptions::default()).await.unwrap();
    assert_eq!(outcome.status, SyncStatus::Partial);
    assert_eq!(outcome.total_fetched, 5);
    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(*trades.created.lock().unwrap(), vec!["EURUSD"]);
    assert_eq!(*trades.updated.lock().unwrap(), vec!["NZDUSD"]);

    let failed: Vec<Option<&str>> = outcome.errors.iter().map(|e| e.symbol.as_deref()).collect();
    assert_eq!(failed, vec![Some("GBPUSD"), Some("AUDUSD")]);
    assert!(outcome.errors[0].error.contains("disk full"));
    assert!(outcome.errors[1].error.contains("disk I/O error"));

    let log = &logs.list_by_connection(&connection.id, 1).unwrap()[0];
    assert_eq!(log.status, SyncStatus::Partial);
    assert_eq!(log.skipped, 1);
    assert_eq!(log.errors, outcome.errors);

    let state = connections.get(&connection.id).unwrap().unwrap();
    assert_eq!(state.status, ConnectionStatus::Connected);
}
