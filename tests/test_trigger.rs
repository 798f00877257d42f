mod common;

use common::{add_connection, setup, GENERIC_CSV};
use tradesync::domain::values::source_kind::SourceKind;

const URL: &str = "https://broker.test/s.csv";

fn has_cors(headers: &[(String, String)]) -> bool {
    headers
        .iter()
        .any(|(k, v)| k == "Access-Control-Allow-Origin" && v == "*")
}

#[tokio::test]
async fn test_preflight() {
    let h = setup();
    let resp = h.ts.trigger("OPTIONS", None, "").await;
    assert_eq!(resp.status, 200);
    assert!(has_cors(&resp.headers));
}

#[tokio::test]
async fn test_anonymous_caller_is_rejected() {
    let h = setup();
    let resp = h.ts.trigger("POST", None, r#"{"connectionId":"x"}"#).await;
    assert_eq!(resp.status, 401);
    assert_eq!(resp.body["success"], false);
    assert!(has_cors(&resp.headers));
}

#[tokio::test]
async fn test_bad_requests() {
    let h = setup();
    assert_eq!(h.ts.trigger("POST", Some("u1"), "not json").await.status, 400);
    assert_eq!(h.ts.trigger("POST", Some("u1"), "{}").await.status, 400);
    assert_eq!(h.ts.trigger("POST", Some("u1"), r#"{"connectionId":""}"#).await.status, 400);
    assert_eq!(h.ts.trigger("GET", Some("u1"), "{}").await.status, 405);
}

#[tokio::test]
async fn test_unknown_and_foreign_connections() {
    let h = setup();
    let conn = add_connection(&h.ts, "owner", SourceKind::Statement, URL, false);

    let resp = h.ts.trigger("POST", Some("owner"), r#"{"connectionId":"nope"}"#).await;
    assert_eq!(resp.status, 404);

    let body = format!(r#"{{"connectionId":"{}"}}"#, conn.id);
    let resp = h.ts.trigger("POST", Some("intruder"), &body).await;
    assert_eq!(resp.status, 403);
    assert!(h.fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_successful_trigger() {
    let h = setup();
    h.fetcher.serve(URL, 200, GENERIC_CSV);
    let conn = add_connection(&h.ts, "owner", SourceKind::Statement, URL, false);

    // Legacy clients send accountId.
    let body = format!(r#"{{"accountId":"{}","forceRefresh":false}}"#, conn.id);
    let resp = h.ts.trigger("POST", Some("owner"), &body).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["success"], true);
    assert_eq!(resp.body["imported"], 2);
    assert_eq!(resp.body["totalTrades"], 2);
    assert_eq!(resp.body["metrics"]["totalProfitLoss"], 100.0);
    assert!(resp.body.get("errors").is_none());
    assert!(resp.body.get("durationMs").is_some());
}

#[tokio::test]
async fn test_fatal_sync_failure_reports_upstream_status() {
    let h = setup();
    h.fetcher.serve(URL, 403, "denied");
    let conn = add_connection(&h.ts, "owner", SourceKind::Statement, URL, false);

    let body = format!(r#"{{"connectionId":"{}"}}"#, conn.id);
    let resp = h.ts.trigger("POST", Some("owner"), &body).await;
    assert_eq!(resp.status, 500);
    assert_eq!(resp.body["success"], false);
    assert_eq!(resp.body["status"], 403);
    assert!(resp.body["error"].as_str().unwrap().contains("403"));
}
