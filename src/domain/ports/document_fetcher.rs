use crate::domain::error::DomainError;
use async_trait::async_trait;

/// Raw HTTP response for a fetched statement or dashboard page.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchedDocument {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests for statement sources.
/// Transport failures are errors; non-2xx responses are returned as-is.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<FetchedDocument, DomainError>;
}
