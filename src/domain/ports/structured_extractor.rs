use crate::domain::error::DomainError;
use async_trait::async_trait;

/// A document handed to the extraction service alongside the prompt.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// LLM-backed structured extraction: prompt + JSON schema in, JSON out.
///
/// Output is best-effort and non-deterministic. Callers validate the shape of
/// whatever comes back instead of trusting the schema.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(
        &self,
        prompt: &str,
        response_schema: &serde_json::Value,
        attachments: &[Attachment],
    ) -> Result<serde_json::Value, DomainError>;
}
