use crate::application::parsing::{parse_document, Document, ParseOptions, ParsedDocument};
use crate::application::reconcile::{reconcile, ReconcileOptions};
use crate::domain::entities::account_metrics::AccountMetrics;
use crate::domain::entities::broker_connection::{BrokerConnection, ConnectionSyncState};
use crate::domain::entities::persisted_trade::PersistedTrade;
use crate::domain::entities::sync_log::{SyncLogEntry, TradeError};
use crate::domain::error::DomainError;
use crate::domain::ports::connection_repository::ConnectionRepository;
use crate::domain::ports::document_fetcher::DocumentFetcher;
use crate::domain::ports::structured_extractor::StructuredExtractor;
use crate::domain::ports::sync_log_repository::SyncLogRepository;
use crate::domain::ports::trade_repository::TradeRepository;
use crate::domain::values::connection_status::ConnectionStatus;
use crate::domain::values::format_tag::FormatTag;
use crate::domain::values::source_kind::SourceKind;
use crate::domain::values::sync_status::{SyncStatus, SyncType};
use chrono::Utc;
use reqwest::Url;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Headers sent with every source fetch; some dashboards refuse non-browser clients.
pub fn browser_headers() -> Vec<(String, String)> {
    [
        ("User-Agent", USER_AGENT),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,text/csv,application/pdf,*/*;q=0.8",
        ),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Cache-Control", "no-cache"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub force_refresh: bool,
    pub sync_type: SyncType,
    /// Applies to statement sources; dashboards always use the dashboard scraper.
    pub parse: ParseOptions,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            force_refresh: false,
            sync_type: SyncType::Manual,
            parse: ParseOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub connection_id: String,
    pub status: SyncStatus,
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
    pub total_fetched: usize,
    pub errors: Vec<TradeError>,
    pub duration_ms: u64,
    pub metrics: AccountMetrics,
    pub format: String,
}

pub struct SyncUseCase {
    connections: Arc<dyn ConnectionRepository>,
    trades: Arc<dyn TradeRepository>,
    logs: Arc<dyn SyncLogRepository>,
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn StructuredExtractor>,
}

impl SyncUseCase {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        trades: Arc<dyn TradeRepository>,
        logs: Arc<dyn SyncLogRepository>,
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn StructuredExtractor>,
    ) -> Self {
        Self {
            connections,
            trades,
            logs,
            fetcher,
            extractor,
        }
    }

    /// Fetch the connection's source, parse it, reconcile against stored
    /// trades and persist the difference.
    ///
    /// Only fatal failures (unknown connection, transport error, non-2xx
    /// response, storage unavailable) return `Err`; each is also written to
    /// the sync log and the connection's status. Row-level problems end up in
    /// `SyncOutcome::errors`.
    pub async fn run_sync(&self, connection_id: &str, options: &SyncOptions) -> Result<SyncOutcome, DomainError> {
        let started = Instant::now();
        let connection = self.load(connection_id)?;
        info!(connection = %connection.id, kind = %connection.source_kind, sync_type = %options.sync_type, "sync started");

        let doc = match self.fetch_source(&connection).await {
            Ok(doc) => doc,
            Err(e) => return Err(self.record_failure(&connection, options.sync_type, started, e)),
        };

        let parse_options = match connection.source_kind {
            SourceKind::HybridFunding => ParseOptions {
                format_override: Some(FormatTag::HybridFunding),
                ai_fallback: false,
            },
            SourceKind::Statement => options.parse,
        };
        let parsed = parse_document(&doc, &parse_options, self.extractor.as_ref()).await;
        self.persist(&connection, parsed, options, started)
    }

    /// Same pipeline as [`run_sync`](Self::run_sync) for a document the user
    /// uploaded, without fetching anything.
    pub async fn import_document(
        &self,
        connection_id: &str,
        doc: Document,
        options: &SyncOptions,
    ) -> Result<SyncOutcome, DomainError> {
        let started = Instant::now();
        let connection = self.load(connection_id)?;
        info!(connection = %connection.id, file = %doc.filename, "statement import started");
        let parsed = parse_document(&doc, &options.parse, self.extractor.as_ref()).await;
        self.persist(&connection, parsed, options, started)
    }

    fn load(&self, connection_id: &str) -> Result<BrokerConnection, DomainError> {
        self.connections
            .get(connection_id)?
            .ok_or_else(|| DomainError::NotFound(format!("Connection {connection_id}")))
    }

    async fn fetch_source(&self, connection: &BrokerConnection) -> Result<Document, DomainError> {
        let url = connection.source_url.trim();
        if url.is_empty() {
            return Err(DomainError::InvalidInput("Connection has no source URL".into()));
        }
        let response = self.fetcher.fetch(url, &browser_headers()).await?;
        if !response.is_success() {
            return Err(DomainError::Fetch {
                status: Some(response.status),
                message: format!("Failed to fetch {url}"),
            });
        }
        debug!(url, bytes = response.body.len(), "source fetched");
        Ok(Document::new(filename_from_url(url), response.body))
    }

    fn persist(
        &self,
        connection: &BrokerConnection,
        parsed: ParsedDocument,
        options: &SyncOptions,
        started: Instant,
    ) -> Result<SyncOutcome, DomainError> {
        let existing = match self.trades.list_by_connection(&connection.id) {
            Ok(trades) => trades,
            Err(e) => return Err(self.record_failure(connection, options.sync_type, started, e)),
        };

        let ParsedDocument { result, metrics, .. } = parsed;
        let plan = reconcile(
            &result.trades,
            &existing,
            &ReconcileOptions {
                force_refresh: options.force_refresh,
                platform_prefix: Some(connection.source_kind.id_prefix().to_string()),
            },
        );

        let mut errors: Vec<TradeError> = result
            .errors
            .iter()
            .map(|e| TradeError {
                symbol: None,
                line: Some(e.line),
                error: e.error.clone(),
            })
            .collect();
        let mut imported = 0;
        let mut updated = 0;
        let mut skipped = plan.to_skip.len();

        for create in &plan.to_create {
            let trade = PersistedTrade::from_record(&create.trade, &connection.id, create.broker_trade_id.clone());
            match self.trades.create(&trade) {
                Ok(()) => imported += 1,
                // Inserted concurrently since the snapshot was taken.
                Err(DomainError::Duplicate(_)) => skipped += 1,
                Err(e) => {
                    warn!(symbol = %create.trade.symbol, error = %e, "failed to create trade");
                    errors.push(TradeError {
                        symbol: Some(create.trade.symbol.clone()),
                        line: None,
                        error: e.to_string(),
                    });
                }
            }
        }

        for update in &plan.to_update {
            match self.trades.update(&update.existing_id, &update.patch) {
                Ok(()) => updated += 1,
                Err(e) => {
                    warn!(symbol = %update.symbol, error = %e, "failed to update trade");
                    errors.push(TradeError {
                        symbol: Some(update.symbol.clone()),
                        line: None,
                        error: e.to_string(),
                    });
                }
            }
        }

        let status = SyncStatus::from_error_count(errors.len());
        let duration_ms = started.elapsed().as_millis() as u64;

        let state = ConnectionSyncState {
            status: ConnectionStatus::Connected,
            balance: metrics.balance.or(connection.balance),
            equity: metrics.equity.or(connection.equity),
            last_sync_at: Utc::now(),
            error_message: None,
        };
        if let Err(e) = self.connections.update_sync_state(&connection.id, &state) {
            warn!(connection = %connection.id, error = %e, "failed to update connection state");
        }

        let mut entry = SyncLogEntry::new(&connection.id, options.sync_type, status);
        entry.imported = imported;
        entry.updated = updated;
        entry.skipped = skipped;
        entry.total_fetched = result.trades.len();
        entry.errors = errors.clone();
        entry.duration_ms = duration_ms;
        if let Err(e) = self.logs.append(&entry) {
            warn!(connection = %connection.id, error = %e, "failed to write sync log");
        }

        info!(
            connection = %connection.id,
            status = %status,
            imported,
            updated,
            skipped,
            errors = errors.len(),
            duration_ms,
            "sync finished"
        );

        Ok(SyncOutcome {
            connection_id: connection.id.clone(),
            status,
            imported,
            updated,
            skipped,
            total_fetched: result.trades.len(),
            errors,
            duration_ms,
            metrics,
            format: result.format,
        })
    }

    /// Mark the connection as failed and log the run, handing the error back.
    fn record_failure(
        &self,
        connection: &BrokerConnection,
        sync_type: SyncType,
        started: Instant,
        err: DomainError,
    ) -> DomainError {
        error!(connection = %connection.id, error = %err, "sync failed");
        let message = err.to_string();

        let state = ConnectionSyncState {
            status: ConnectionStatus::Error,
            balance: connection.balance,
            equity: connection.equity,
            last_sync_at: Utc::now(),
            error_message: Some(message.clone()),
        };
        if let Err(e) = self.connections.update_sync_state(&connection.id, &state) {
            warn!(connection = %connection.id, error = %e, "failed to update connection state");
        }

        let mut entry = SyncLogEntry::new(&connection.id, sync_type, SyncStatus::Error);
        entry.errors = vec![TradeError {
            symbol: None,
            line: None,
            error: message,
        }];
        entry.duration_ms = started.elapsed().as_millis() as u64;
        if let Err(e) = self.logs.append(&entry) {
            warn!(connection = %connection.id, error = %e, "failed to write sync log");
        }
        err
    }
}

/// Last non-empty path segment of a URL, used as the document's filename
/// for detection. Falls back to `statement`.
pub fn filename_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            let last = u.path_segments()?.filter(|s| !s.is_empty()).last()?.to_owned();
            Some(last)
        })
        .unwrap_or_else(|| "statement".to_string())
}
