//! Language model configuration

use serde::{Deserialize, Serialize};

/// Instructions sent as the system role with every request
const DEFAULT_SYSTEM_PROMPT: &str = "Ты — ассистент кафедры, отвечающий на вопросы студентов и сотрудников. \
Отвечай на русском языке, кратко и по делу, опираясь только на предоставленный контекст. \
Если ответа в контексте нет, так и скажи — не придумывай факты. \
Когда уместно, указывай источник (URL страницы).";

/// Chat completion configuration.
///
/// Targets OpenRouter's OpenAI-compatible API by default; any server
/// exposing `/v1/chat/completions` works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat completions endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// API key (falls back to the OPENROUTER_API_KEY environment variable)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Answer length cap in tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Request timeout in seconds (covers the whole non-streaming answer)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// System prompt framing every answer
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "stepfun/step-3.5-flash:free".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> usize {
    800
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            system_prompt: default_system_prompt(),
        }
    }
}
