//! Shared test helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tradesync::application::connections::{NewConnection, DEFAULT_SYNC_INTERVAL_MINUTES};
use tradesync::domain::entities::broker_connection::BrokerConnection;
use tradesync::domain::error::DomainError;
use tradesync::domain::ports::document_fetcher::{DocumentFetcher, FetchedDocument};
use tradesync::domain::ports::structured_extractor::{Attachment, StructuredExtractor};
use tradesync::domain::values::source_kind::SourceKind;
use tradesync::TradeSync;

pub const GENERIC_CSV: &str = "symbol,side,entry_price,exit_price,quantity,pnl\n\
    EURUSD,buy,1.1000,1.1050,1,50\n\
    GBPUSD,sell,1.3000,1.2950,1,50";

/// Serves canned responses by URL; unknown URLs fail like a dropped connection.
#[derive(Default)]
pub struct FakeFetcher {
    responses: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeFetcher {
    pub fn serve(&self, url: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.as_bytes().to_vec()));
    }

    pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<FetchedDocument, DomainError> {
        self.calls.lock().unwrap().push((url.to_string(), headers.to_vec()));
        match self.responses.lock().unwrap().get(url) {
            Some((status, body)) => Ok(FetchedDocument {
                status: *status,
                body: body.clone(),
            }),
            None => Err(DomainError::Fetch {
                status: None,
                message: format!("connection refused: {url}"),
            }),
        }
    }
}

/// Returns the same payload (or failure) for every call and counts calls.
pub struct FakeExtractor {
    response: Mutex<Result<Value, String>>,
    calls: Mutex<usize>,
}

impl FakeExtractor {
    pub fn new(response: Result<Value, String>) -> Self {
        Self {
            response: Mutex::new(response),
            calls: Mutex::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::new(Err("extraction unavailable".into()))
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl StructuredExtractor for FakeExtractor {
    fn name(&self) -> &str {
        "fake"
    }

    async fn invoke(&self, _prompt: &str, _schema: &Value, _attachments: &[Attachment]) -> Result<Value, DomainError> {
        *self.calls.lock().unwrap() += 1;
        self.response.lock().unwrap().clone().map_err(DomainError::Extraction)
    }
}

pub struct Harness {
    pub ts: TradeSync,
    pub fetcher: Arc<FakeFetcher>,
    pub extractor: Arc<FakeExtractor>,
}

pub fn setup() -> Harness {
    setup_with_extractor(FakeExtractor::failing())
}

pub fn setup_with_extractor(extractor: FakeExtractor) -> Harness {
    let fetcher = Arc::new(FakeFetcher::default());
    let extractor = Arc::new(extractor);
    let ts = TradeSync::with_providers(":memory:", fetcher.clone(), extractor.clone()).unwrap();
    Harness { ts, fetcher, extractor }
}

pub fn add_connection(ts: &TradeSync, user: &str, kind: SourceKind, url: &str, auto_sync: bool) -> BrokerConnection {
    ts.add_connection(NewConnection {
        user_id: user.to_string(),
        name: format!("{user} account"),
        platform: "MT5".to_string(),
        source_kind: kind,
        source_url: url.to_string(),
        sync_interval_minutes: DEFAULT_SYNC_INTERVAL_MINUTES,
        auto_sync,
    })
    .unwrap()
}
