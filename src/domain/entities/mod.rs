pub mod account_metrics;
pub mod broker_connection;
pub mod persisted_trade;
pub mod sync_log;
pub mod trade_record;
