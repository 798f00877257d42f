//! Request/response surface for "sync this connection now" calls coming from
//! a web client. Transport-agnostic: the caller supplies the method, the
//! authenticated user (if any) and the raw body.

use crate::application::sync::{SyncOptions, SyncUseCase};
use crate::domain::error::DomainError;
use crate::domain::ports::connection_repository::ConnectionRepository;
use crate::domain::values::sync_status::SyncType;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::warn;

pub const CORS_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Headers",
        "authorization, x-client-info, apikey, content-type",
    ),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
];

#[derive(Debug, Clone, Serialize)]
pub struct TriggerResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl TriggerResponse {
    fn new(status: u16, body: Value) -> Self {
        let mut headers: Vec<(String, String)> = CORS_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        headers.push(("Content-Type".into(), "application/json".into()));
        Self { status, headers, body }
    }

    fn failure(status: u16, error: impl Into<String>) -> Self {
        Self::new(status, json!({ "success": false, "error": error.into() }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerRequest {
    connection_id: Option<String>,
    /// Older clients send the connection id under this name.
    account_id: Option<String>,
    #[serde(default)]
    force_refresh: bool,
}

pub struct SyncTrigger {
    connections: Arc<dyn ConnectionRepository>,
    sync: Arc<SyncUseCase>,
}

impl SyncTrigger {
    pub fn new(connections: Arc<dyn ConnectionRepository>, sync: Arc<SyncUseCase>) -> Self {
        Self { connections, sync }
    }

    /// `caller` is the authenticated user id, `None` when the request carried
    /// no valid credentials.
    pub async fn handle(&self, method: &str, caller: Option<&str>, body: &str) -> TriggerResponse {
        if method.eq_ignore_ascii_case("OPTIONS") {
            return TriggerResponse::new(200, Value::Null);
        }
        if !method.eq_ignore_ascii_case("POST") {
            return TriggerResponse::failure(405, "Method not allowed");
        }
        let Some(user_id) = caller.filter(|c| !c.trim().is_empty()) else {
            return TriggerResponse::failure(401, "Unauthorized");
        };

        let request: TriggerRequest = match serde_json::from_str(body) {
            Ok(r) => r,
            Err(e) => return TriggerResponse::failure(400, format!("Invalid request body: {e}")),
        };
        let Some(connection_id) = request
            .connection_id
            .or(request.account_id)
            .filter(|id| !id.trim().is_empty())
        else {
            return TriggerResponse::failure(400, "connectionId is required");
        };

        let connection = match self.connections.get(&connection_id) {
            Ok(Some(c)) => c,
            Ok(None) => return TriggerResponse::failure(404, "Connection not found"),
            Err(e) => return TriggerResponse::failure(500, e.to_string()),
        };
        if connection.user_id != user_id {
            warn!(connection = %connection_id, user = %user_id, "sync requested for another user's connection");
            return TriggerResponse::failure(403, "Forbidden");
        }

        let options = SyncOptions {
            force_refresh: request.force_refresh,
            sync_type: SyncType::Manual,
            ..Default::default()
        };
        match self.sync.run_sync(&connection_id, &options).await {
            Ok(outcome) => {
                let mut body = Map::new();
                body.insert("success".into(), json!(true));
                body.insert("imported".into(), json!(outcome.imported));
                body.insert("updated".into(), json!(outcome.updated));
                body.insert("skipped".into(), json!(outcome.skipped));
                body.insert("totalTrades".into(), json!(outcome.total_fetched));
                body.insert("metrics".into(), json!(outcome.metrics));
                if !outcome.errors.is_empty() {
                    body.insert("errors".into(), json!(outcome.errors));
                }
                body.insert("durationMs".into(), json!(outcome.duration_ms));
                TriggerResponse::new(200, Value::Object(body))
            }
            Err(e) => failure_body(&e),
        }
    }
}

fn failure_body(err: &DomainError) -> TriggerResponse {
    let mut body = json!({ "success": false, "error": err.to_string() });
    if let Some(status) = err.fetch_status() {
        body["status"] = json!(status);
    }
    TriggerResponse::new(500, body)
}
