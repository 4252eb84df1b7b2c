//! Ask pipeline: retrieve, format context, generate an answer.
//!
//! Ties the hybrid retriever to the language model. Construction is
//! plain dependency injection so every piece can be swapped in tests.

use crate::llm::{LanguageModel, LlmError, TokenStream};
use crate::retrieval::{HybridRetriever, SearchError};
use crate::types::{Category, RetrievedDocument};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the ask pipeline
#[derive(Debug, Error)]
pub enum AskError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Complete answer together with the documents it was grounded in
#[derive(Debug)]
pub struct RagResponse {
    pub answer: String,
    pub sources: Vec<RetrievedDocument>,
    pub query: String,
}

/// Retrieval-augmented question answering over the page corpus
pub struct AskPipeline {
    retriever: Arc<HybridRetriever>,
    llm: Arc<dyn LanguageModel>,
}

impl AskPipeline {
    /// Create a new pipeline
    pub fn new(retriever: Arc<HybridRetriever>, llm: Arc<dyn LanguageModel>) -> Self {
        Self { retriever, llm }
    }

    /// Identifier of the model answers are generated with
    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Full cycle: search, build context, generate the answer
    pub async fn ask(
        &self,
        question: &str,
        top_k: usize,
        category: Option<Category>,
    ) -> Result<RagResponse, AskError> {
        let alpha = self.retriever.config().alpha;
        let sources = self.retriever.search(question, top_k, category, alpha).await?;
        let context = format_context(&sources);

        debug!(
            "built context of {} chars from {} documents",
            context.chars().count(),
            sources.len()
        );

        let answer = self.llm.answer(question, &context).await?;

        info!(
            "answered with {} source documents via {}",
            sources.len(),
            self.llm.model()
        );

        Ok(RagResponse {
            answer,
            sources,
            query: question.to_string(),
        })
    }

    /// Streaming cycle: search first, then stream answer tokens.
    ///
    /// Sources come back immediately so callers can show them before
    /// the first token arrives.
    pub async fn ask_stream(
        &self,
        question: &str,
        top_k: usize,
        category: Option<Category>,
    ) -> Result<(Vec<RetrievedDocument>, TokenStream), AskError> {
        let alpha = self.retriever.config().alpha;
        let sources = self.retriever.search(question, top_k, category, alpha).await?;
        let context = format_context(&sources);
        let tokens = self.llm.answer_stream(question, &context).await?;

        Ok((sources, tokens))
    }
}

/// Format retrieved documents into the grounding context for the model.
///
/// Each document becomes a numbered source block with full page text;
/// blocks are separated by a 40-character rule.
pub fn format_context(docs: &[RetrievedDocument]) -> String {
    if docs.is_empty() {
        return "Контекст не найден.".to_string();
    }

    let parts: Vec<String> = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "[Источник {}] {}\nURL: {}\n\n{}",
                i + 1,
                doc.title,
                doc.url,
                doc.full_text
            )
        })
        .collect();

    let separator = format!("{}\n\n", "=".repeat(40));
    format!("\n\n{}", parts.join(&separator))
}
