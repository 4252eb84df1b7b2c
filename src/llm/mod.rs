//! Answer generation through an OpenAI-compatible chat API.
//!
//! The `LanguageModel` trait is the seam the ask pipeline talks through;
//! `LlmClient` is the production implementation speaking the
//! `/chat/completions` wire format (OpenRouter, OpenAI, vLLM).

mod http;

pub use http::LlmClient;

use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Errors from answer generation
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Completion failed: {0}")]
    CompletionFailed(String),

    #[error("Rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

/// Stream of answer tokens as the model produces them
pub type TokenStream = Pin<Box<dyn Stream<Item = LlmResult<String>> + Send>>;

/// Abstraction over the chat model so pipelines can be tested
/// without a network
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync + std::fmt::Debug {
    /// Generate a complete answer for the question grounded in the context
    async fn answer(&self, question: &str, context: &str) -> LlmResult<String>;

    /// Generate an answer as a token stream
    async fn answer_stream(&self, question: &str, context: &str) -> LlmResult<TokenStream>;

    /// Model identifier used for completions
    fn model(&self) -> &str;
}
