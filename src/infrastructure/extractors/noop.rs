use crate::domain::error::DomainError;
use crate::domain::ports::structured_extractor::{Attachment, StructuredExtractor};

/// Used when no extraction service is configured; every call fails, which
/// surfaces as a document-level parse error.
pub struct NoopExtractor;

#[async_trait::async_trait]
impl StructuredExtractor for NoopExtractor {
    fn name(&self) -> &str {
        "noop"
    }

    async fn invoke(
        &self,
        _prompt: &str,
        _response_schema: &serde_json::Value,
        _attachments: &[Attachment],
    ) -> Result<serde_json::Value, DomainError> {
        Err(DomainError::Extraction(
            "no extraction service configured (set TRADESYNC_LLM_PROVIDER)".into(),
        ))
    }
}
