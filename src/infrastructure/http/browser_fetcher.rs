use crate::domain::error::DomainError;
use crate::domain::ports::document_fetcher::{DocumentFetcher, FetchedDocument};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// GETs statement sources with a real browser user agent. Non-2xx responses
/// are handed back unchanged so the caller can report the status.
pub struct BrowserFetcher {
    client: Client,
}

impl BrowserFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .user_agent(
                    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                     AppleWebKit/537.36 (KHTML, like Gecko) \
                     Chrome/124.0.0.0 Safari/537.36",
                )
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl DocumentFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<FetchedDocument, DomainError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let resp = request.send().await.map_err(|e| DomainError::Fetch {
            status: e.status().map(|s| s.as_u16()),
            message: format!("Request to {url} failed: {e}"),
        })?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| DomainError::Fetch {
            status: Some(status),
            message: format!("Failed to read body from {url}: {e}"),
        })?;

        Ok(FetchedDocument {
            status,
            body: body.to_vec(),
        })
    }
}
