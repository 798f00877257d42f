pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::auto_sync::{AutoSyncReport, AutoSyncUseCase};
use crate::application::connections::{ConnectionUseCase, NewConnection};
use crate::application::parsing::{parse_document, Document, ParseOptions, ParsedDocument};
use crate::application::sync::{SyncOptions, SyncOutcome, SyncUseCase};
use crate::application::trigger::{SyncTrigger, TriggerResponse};
use crate::config::{AppConfig, LlmProvider};
use crate::domain::entities::broker_connection::BrokerConnection;
use crate::domain::entities::persisted_trade::PersistedTrade;
use crate::domain::entities::sync_log::SyncLogEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::connection_repository::ConnectionRepository;
use crate::domain::ports::document_fetcher::DocumentFetcher;
use crate::domain::ports::structured_extractor::StructuredExtractor;
use crate::domain::ports::sync_log_repository::SyncLogRepository;
use crate::domain::ports::trade_repository::TradeRepository;
use crate::infrastructure::extractors::noop::NoopExtractor;
use crate::infrastructure::extractors::openai::OpenAiExtractor;
use crate::infrastructure::http::browser_fetcher::BrowserFetcher;
use crate::infrastructure::sqlite;
use crate::infrastructure::sqlite::connection_repo::SqliteConnectionRepo;
use crate::infrastructure::sqlite::sync_log_repo::SqliteSyncLogRepo;
use crate::infrastructure::sqlite::trade_repo::SqliteTradeRepo;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

pub struct TradeSync {
    connection_uc: ConnectionUseCase,
    sync_uc: Arc<SyncUseCase>,
    auto_sync_uc: AutoSyncUseCase,
    trigger: SyncTrigger,
    extractor: Arc<dyn StructuredExtractor>,
}

impl TradeSync {
    pub fn new(config: &AppConfig) -> Result<Self, DomainError> {
        let extractor: Arc<dyn StructuredExtractor> = match config.llm_provider {
            LlmProvider::OpenAi => {
                if config.llm_api_key.is_empty() {
                    warn!("TRADESYNC_LLM_PROVIDER is openai but TRADESYNC_LLM_API_KEY is not set");
                }
                Arc::new(OpenAiExtractor::new(
                    config.llm_api_key.clone(),
                    config.llm_model.clone(),
                    config.llm_base_url.clone(),
                    config.http_timeout,
                ))
            }
            LlmProvider::Noop => Arc::new(NoopExtractor),
        };
        let fetcher: Arc<dyn DocumentFetcher> = Arc::new(BrowserFetcher::new(config.http_timeout));

        Self::with_providers(&config.db_path, fetcher, extractor)
    }

    pub fn with_providers(
        db_path: &str,
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn StructuredExtractor>,
    ) -> Result<Self, DomainError> {
        let conn = sqlite::open(db_path)?;

        let connection_repo: Arc<dyn ConnectionRepository> = Arc::new(SqliteConnectionRepo::new(conn.clone()));
        let trade_repo: Arc<dyn TradeRepository> = Arc::new(SqliteTradeRepo::new(conn.clone()));
        let log_repo: Arc<dyn SyncLogRepository> = Arc::new(SqliteSyncLogRepo::new(conn));

        let sync_uc = Arc::new(SyncUseCase::new(
            connection_repo.clone(),
            trade_repo.clone(),
            log_repo.clone(),
            fetcher,
            extractor.clone(),
        ));

        Ok(Self {
            connection_uc: ConnectionUseCase::new(connection_repo.clone(), trade_repo, log_repo),
            auto_sync_uc: AutoSyncUseCase::new(connection_repo.clone(), sync_uc.clone()),
            trigger: SyncTrigger::new(connection_repo, sync_uc.clone()),
            sync_uc,
            extractor,
        })
    }

    // Delegating methods
    pub fn add_connection(&self, new: NewConnection) -> Result<BrokerConnection, DomainError> {
        self.connection_uc.add(new)
    }

    pub fn connection(&self, id: &str) -> Result<BrokerConnection, DomainError> {
        self.connection_uc.get(id)
    }

    pub fn connections(&self, user_id: Option<&str>) -> Result<Vec<BrokerConnection>, DomainError> {
        self.connection_uc.list(user_id)
    }

    pub fn delete_connection(&self, id: &str) -> Result<(), DomainError> {
        self.connection_uc.delete(id)
    }

    pub fn trades(&self, connection_id: &str) -> Result<Vec<PersistedTrade>, DomainError> {
        self.connection_uc.trades(connection_id)
    }

    pub fn logs(&self, connection_id: &str, limit: usize) -> Result<Vec<SyncLogEntry>, DomainError> {
        self.connection_uc.logs(connection_id, limit)
    }

    pub async fn sync(&self, connection_id: &str, options: &SyncOptions) -> Result<SyncOutcome, DomainError> {
        self.sync_uc.run_sync(connection_id, options).await
    }

    pub async fn import(
        &self,
        connection_id: &str,
        doc: Document,
        options: &SyncOptions,
    ) -> Result<SyncOutcome, DomainError> {
        self.sync_uc.import_document(connection_id, doc, options).await
    }

    /// Parse without touching storage.
    pub async fn parse(&self, doc: &Document, options: &ParseOptions) -> ParsedDocument {
        parse_document(doc, options, self.extractor.as_ref()).await
    }

    pub async fn run_due(&self, now: DateTime<Utc>) -> Result<AutoSyncReport, DomainError> {
        self.auto_sync_uc.run_due(now).await
    }

    pub async fn trigger(&self, method: &str, caller: Option<&str>, body: &str) -> TriggerResponse {
        self.trigger.handle(method, caller, body).await
    }
}
