use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    /// A row with the same `(broker_connection_id, broker_trade_id)` already exists.
    #[error("Duplicate trade: {0}")]
    Duplicate(String),

    #[error("Fetch error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Fetch { status: Option<u16>, message: String },

    #[error("Extraction error: {0}")]
    Extraction(String),
}

impl DomainError {
    /// HTTP status carried by a failed fetch, if any.
    pub fn fetch_status(&self) -> Option<u16> {
        match self {
            DomainError::Fetch { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Database(e.to_string())
    }
}
