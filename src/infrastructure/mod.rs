pub mod extractors;
pub mod http;
pub mod sqlite;
