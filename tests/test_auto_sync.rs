mod common;

use chrono::{Duration, Utc};
use common::{add_connection, setup, GENERIC_CSV};
use tradesync::domain::values::source_kind::SourceKind;
use tradesync::domain::values::sync_status::{SyncStatus, SyncType};

#[tokio::test]
async fn test_run_due_syncs_only_auto_connections() {
    let h = setup();
    h.fetcher.serve("https://a.test/s.csv", 200, GENERIC_CSV);
    let auto = add_connection(&h.ts, "u1", SourceKind::Statement, "https://a.test/s.csv", true);
    let manual = add_connection(&h.ts, "u1", SourceKind::Statement, "https://a.test/s.csv", false);

    let report = h.ts.run_due(Utc::now()).await.unwrap();
    assert_eq!(report.checked, 2);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].connection_id, auto.id);
    assert_eq!(report.results[0].outcome.as_ref().unwrap().imported, 2);

    let logs = h.ts.logs(&auto.id, 5).unwrap();
    assert_eq!(logs[0].sync_type, SyncType::Auto);
    assert!(h.ts.logs(&manual.id, 5).unwrap().is_empty());
}

#[tokio::test]
async fn test_recently_synced_connection_waits_for_interval() {
    let h = setup();
    h.fetcher.serve("https://a.test/s.csv", 200, GENERIC_CSV);
    add_connection(&h.ts, "u1", SourceKind::Statement, "https://a.test/s.csv", true);

    let now = Utc::now();
    assert_eq!(h.ts.run_due(now).await.unwrap().results.len(), 1);
    assert!(h.ts.run_due(now + Duration::minutes(30)).await.unwrap().results.is_empty());
    assert_eq!(h.ts.run_due(now + Duration::minutes(61)).await.unwrap().results.len(), 1);
}

#[tokio::test]
async fn test_failing_connection_does_not_stop_others() {
    let h = setup();
    h.fetcher.serve("https://ok.test/s.csv", 200, GENERIC_CSV);
    let broken = add_connection(&h.ts, "u1", SourceKind::Statement, "https://down.test/s.csv", true);
    let ok = add_connection(&h.ts, "u2", SourceKind::Statement, "https://ok.test/s.csv", true);

    let report = h.ts.run_due(Utc::now()).await.unwrap();
    assert_eq!(report.results.len(), 2);
    let failed = report.results.iter().find(|r| r.connection_id == broken.id).unwrap();
    assert!(failed.error.is_some());
    let good = report.results.iter().find(|r| r.connection_id == ok.id).unwrap();
    assert_eq!(good.outcome.as_ref().unwrap().status, SyncStatus::Success);
}
