use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "./tradesync.db";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Noop,
}

/// Runtime settings, read once from `TRADESYNC_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub llm_provider: LlmProvider,
    pub llm_api_key: String,
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            llm_provider: LlmProvider::Noop,
            llm_api_key: String::new(),
            llm_model: None,
            llm_base_url: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let llm_provider = match get("TRADESYNC_LLM_PROVIDER").map(|p| p.to_lowercase()).as_deref() {
            Some("openai") => LlmProvider::OpenAi,
            _ => LlmProvider::Noop,
        };
        let http_timeout = get("TRADESYNC_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        Self {
            db_path: get("TRADESYNC_DB").unwrap_or(defaults.db_path),
            llm_provider,
            llm_api_key: get("TRADESYNC_LLM_API_KEY").unwrap_or_default(),
            llm_model: get("TRADESYNC_LLM_MODEL"),
            llm_base_url: get("TRADESYNC_LLM_BASE_URL"),
            http_timeout,
        }
    }
}
