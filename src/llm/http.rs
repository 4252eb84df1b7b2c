//! Chat completion client for OpenAI-compatible APIs.
//!
//! Targets OpenRouter by default but works against any server exposing
//! the `/v1/chat/completions` shape, including streaming via SSE.

use super::{LanguageModel, LlmError, LlmResult, TokenStream};
use crate::config::LlmConfig;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

/// Chat completion client
#[derive(Debug)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

/// OpenAI chat completion request format
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: usize,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// OpenAI chat completion response format
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

/// One SSE chunk of a streaming completion
#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI error response format
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// What a single SSE line contributed to the answer
#[derive(Debug, PartialEq)]
enum StreamLine {
    Token(String),
    Done,
    Skip,
}

impl LlmClient {
    /// Create a new chat client from its config section.
    ///
    /// Fails when no API key is available from the config or the
    /// `OPENROUTER_API_KEY` environment variable.
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        info!(
            "Initializing LLM client: endpoint={}, model={}",
            config.endpoint, config.model
        );

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .ok_or_else(|| {
                LlmError::Config(
                    "No API key: set llm.api_key or the OPENROUTER_API_KEY environment variable"
                        .to_string(),
                )
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = format!("Bearer {}", api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| LlmError::Config(format!("Invalid API key format: {}", e)))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn build_messages(&self, question: &str, context: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system",
                content: self.config.system_prompt.clone(),
            },
            ChatMessage {
                role: "user",
                content: format!("Контекст:\n{}\n\nВопрос: {}", context, question),
            },
        ]
    }

    async fn send_request(
        &self,
        question: &str,
        context: &str,
        stream: bool,
    ) -> LlmResult<reqwest::Response> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: self.build_messages(question, context),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream,
        };

        debug!(
            "Sending chat request to {} (stream={})",
            self.config.endpoint, stream
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| s * 1000);

            return Err(LlmError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                return Err(LlmError::CompletionFailed(format!(
                    "API error ({}): {}",
                    status, error_response.error.message
                )));
            }

            return Err(LlmError::CompletionFailed(format!(
                "HTTP error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl LanguageModel for LlmClient {
    async fn answer(&self, question: &str, context: &str) -> LlmResult<String> {
        let response = self.send_request(question, context, false).await?;

        let completion: ChatResponse = response.json().await.map_err(|e| {
            LlmError::CompletionFailed(format!("Failed to parse response: {}", e))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::CompletionFailed("No completion choices returned".to_string()))?;

        Ok(choice.message.content.trim().to_string())
    }

    async fn answer_stream(&self, question: &str, context: &str) -> LlmResult<TokenStream> {
        let response = self.send_request(question, context, true).await?;

        let (tx, rx) = mpsc::channel::<LlmResult<String>>(32);

        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            // SSE lines are newline-terminated; multi-byte characters can
            // straddle network chunks, so buffer raw bytes and split on '\n'
            let mut buffer: Vec<u8> = Vec::new();

            'outer: while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(LlmError::Network(e))).await;
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line_bytes: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line_bytes);
                    match parse_stream_line(&line) {
                        StreamLine::Token(token) => {
                            if tx.send(Ok(token)).await.is_err() {
                                // Receiver dropped, stop reading
                                return;
                            }
                        }
                        StreamLine::Done => break 'outer,
                        StreamLine::Skip => {}
                    }
                }
            }

            if !buffer.is_empty() {
                let line = String::from_utf8_lossy(&buffer).into_owned();
                if let StreamLine::Token(token) = parse_stream_line(&line) {
                    let _ = tx.send(Ok(token)).await;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Classify one SSE line from a streaming completion
fn parse_stream_line(line: &str) -> StreamLine {
    let line = line.trim();

    // SSE comments (": OPENROUTER PROCESSING") and blank separators
    let Some(payload) = line.strip_prefix("data:") else {
        return StreamLine::Skip;
    };
    let payload = payload.trim();

    if payload == "[DONE]" {
        return StreamLine::Done;
    }

    match serde_json::from_str::<ChatStreamChunk>(payload) {
        Ok(chunk) => {
            let token = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta.content);
            match token {
                Some(token) if !token.is_empty() => StreamLine::Token(token),
                _ => StreamLine::Skip,
            }
        }
        Err(e) => {
            debug!("Skipping unparseable SSE line: {}", e);
            StreamLine::Skip
        }
    }
}
