pub mod connection_repository;
pub mod document_fetcher;
pub mod structured_extractor;
pub mod sync_log_repository;
pub mod trade_repository;
