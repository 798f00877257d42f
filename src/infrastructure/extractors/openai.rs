use crate::domain::error::DomainError;
use crate::domain::ports::structured_extractor::{Attachment, StructuredExtractor};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Structured extraction over an OpenAI-compatible chat completions API.
pub struct OpenAiExtractor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Value>,
    response_format: Value,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiExtractor {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// Content parts for one attachment: PDFs go as base64 file parts, anything
/// else is inlined as text.
fn attachment_part(attachment: &Attachment) -> Value {
    if attachment.mime_type == "application/pdf" {
        json!({
            "type": "file",
            "file": {
                "filename": attachment.file_name,
                "file_data": format!("data:application/pdf;base64,{}", STANDARD.encode(&attachment.data)),
            }
        })
    } else {
        json!({
            "type": "text",
            "text": format!(
                "File {}:\n{}",
                attachment.file_name,
                String::from_utf8_lossy(&attachment.data)
            ),
        })
    }
}

/// Models sometimes wrap JSON in a markdown fence despite the schema.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait::async_trait]
impl StructuredExtractor for OpenAiExtractor {
    fn name(&self) -> &str {
        "openai"
    }

    async fn invoke(
        &self,
        prompt: &str,
        response_schema: &Value,
        attachments: &[Attachment],
    ) -> Result<Value, DomainError> {
        let mut content = vec![json!({ "type": "text", "text": prompt })];
        content.extend(attachments.iter().map(attachment_part));

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![json!({ "role": "user", "content": content })],
            response_format: json!({
                "type": "json_schema",
                "json_schema": { "name": "trade_extraction", "strict": true, "schema": response_schema },
            }),
            temperature: 0.0,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::Extraction(format!("OpenAI API error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Extraction(format!("OpenAI API {status}: {body}")));
        }

        let result: ChatResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Extraction(format!("Parse error: {e}")))?;
        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::Extraction("OpenAI returned no content".into()))?;

        serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| DomainError::Extraction(format!("Response is not valid JSON: {e}")))
    }
}
