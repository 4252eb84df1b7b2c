//! Integration tests for deskribe
//!
//! These tests verify end-to-end functionality of the system: snapshot
//! building, hybrid retrieval, degraded mode, and the ask pipeline.

use deskribe::{
    chunking::TextSplitter,
    config::{ChunkingConfig, RetrievalConfig},
    embedding::{Embedder, EmbeddingResult},
    llm::{LanguageModel, LlmResult, TokenStream},
    pipeline::AskPipeline,
    retrieval::{HybridRetriever, LexicalIndex},
    store::{build_snapshot, DocumentStore},
    types::{
        Category, Document, Embedding, MatchKind, Passage, RetrievedDocument, SemanticHit,
        MISSING_TEXT_SENTINEL,
    },
    vector::{VectorBackend, VectorStoreError, VectorStoreResult},
};
use futures::StreamExt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Test doubles
// ============================================================================

/// Embedder that answers instantly with a fixed vector
#[derive(Debug)]
struct StubEmbedder;

#[async_trait::async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, _text: &str) -> EmbeddingResult<Embedding> {
        Ok(vec![0.6, 0.8])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Backend that serves a fixed hit list, or refuses every call
#[derive(Debug)]
struct StubBackend {
    hits: Vec<SemanticHit>,
    fail: bool,
}

impl StubBackend {
    fn with_hits(hits: Vec<SemanticHit>) -> Self {
        Self { hits, fail: false }
    }

    fn failing() -> Self {
        Self {
            hits: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait::async_trait]
impl VectorBackend for StubBackend {
    async fn query(
        &self,
        _vector: &[f32],
        limit: usize,
        category: Option<Category>,
    ) -> VectorStoreResult<Vec<SemanticHit>> {
        if self.fail {
            return Err(VectorStoreError::Backend("stub offline".to_string()));
        }
        Ok(self
            .hits
            .iter()
            .filter(|h| category.map_or(true, |c| h.category == c))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn recreate_collection(&self, _dimensions: usize) -> VectorStoreResult<()> {
        Ok(())
    }

    async fn upsert(&self, _passages: &[Passage], _vectors: &[Embedding]) -> VectorStoreResult<()> {
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        !self.fail
    }
}

/// Answers with a fixed string and records the context it was given
#[derive(Debug)]
struct FixedLlm {
    seen_context: Mutex<Option<String>>,
}

impl FixedLlm {
    fn new() -> Self {
        Self {
            seen_context: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl LanguageModel for FixedLlm {
    async fn answer(&self, _question: &str, context: &str) -> LlmResult<String> {
        *self.seen_context.lock().unwrap() = Some(context.to_string());
        Ok("Сотрудники получили грант на нейронные сети.".to_string())
    }

    async fn answer_stream(&self, _question: &str, context: &str) -> LlmResult<TokenStream> {
        *self.seen_context.lock().unwrap() = Some(context.to_string());
        let tokens = vec![
            Ok("Сотрудники ".to_string()),
            Ok("получили ".to_string()),
            Ok("грант".to_string()),
        ];
        Ok(Box::pin(futures::stream::iter(tokens)))
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}

// ============================================================================
// Fixtures
// ============================================================================

const MAIN_URL: &str = "https://dept.example/";
const NEWS_URL: &str = "https://dept.example/news/grant";
const PEOPLE_URL: &str = "https://dept.example/people/ivanov";

fn corpus() -> Vec<Document> {
    vec![
        Document::new(
            MAIN_URL,
            "Общие сведения и история кафедры прикладной математики.",
        )
        .with_title("О кафедре"),
        Document::new(
            NEWS_URL,
            "Сотрудники кафедры получили грант на исследование нейронных сетей.",
        )
        .with_title("Грант на исследование")
        .with_category(Category::News),
        Document::new(
            PEOPLE_URL,
            "Иванов Пётр Алексеевич, профессор, читает курс алгебры.",
        )
        .with_title("Иванов П. А.")
        .with_category(Category::People),
    ]
}

fn retriever_with(backend: StubBackend) -> HybridRetriever {
    let docs = corpus();
    let index = Arc::new(LexicalIndex::from_documents(&docs));
    let store = Arc::new(DocumentStore::from_documents(docs));
    HybridRetriever::new(
        index,
        store,
        Arc::new(StubEmbedder),
        Arc::new(backend),
        RetrievalConfig::default(),
    )
}

fn sem_hit(url: &str, title: &str, category: Category, similarity: f32) -> SemanticHit {
    SemanticHit {
        url: url.to_string(),
        title: title.to_string(),
        category,
        similarity,
    }
}

fn find<'a>(results: &'a [RetrievedDocument], url: &str) -> &'a RetrievedDocument {
    results
        .iter()
        .find(|d| d.url == url)
        .unwrap_or_else(|| panic!("expected {} in results", url))
}

fn write_page(dir: &Path, rel: &str, url: &str, title: &str, content: &str) {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let json = serde_json::json!({ "url": url, "title": title, "content": content });
    std::fs::write(path, serde_json::to_string(&json).unwrap()).unwrap();
}

// ============================================================================
// Hybrid retrieval
// ============================================================================

/// Both paths contribute: a lexical-only and a semantic-only document
/// appear together, each with its own match kind and full page text.
#[tokio::test]
async fn test_hybrid_search_merges_both_paths() {
    let retriever = retriever_with(StubBackend::with_hits(vec![sem_hit(
        PEOPLE_URL,
        "Иванов П. А.",
        Category::People,
        0.8,
    )]));

    let results = retriever
        .search("грант на исследование", 5, None, 0.5)
        .await
        .unwrap();

    let news = find(&results, NEWS_URL);
    assert_eq!(news.match_kind, MatchKind::Lexical);
    assert!(news.bm25_norm > 0.0, "lexical path should score the page");
    assert_eq!(news.sem_norm, 0.0);

    let person = find(&results, PEOPLE_URL);
    assert_eq!(person.match_kind, MatchKind::Semantic);
    assert_eq!(person.sem_norm, 0.8);
    assert_eq!(
        person.full_text,
        "Иванов Пётр Алексеевич, профессор, читает курс алгебры.",
        "semantic hits resolve to full page text from the snapshot"
    );
}

/// A document found by both paths is marked hybrid and outranks a
/// document with a single comparable signal.
#[tokio::test]
async fn test_agreeing_paths_rank_hybrid_first() {
    let retriever = retriever_with(StubBackend::with_hits(vec![
        sem_hit(NEWS_URL, "Грант на исследование", Category::News, 0.9),
        sem_hit(MAIN_URL, "О кафедре", Category::Main, 0.85),
    ]));

    let results = retriever
        .search("грант на исследование", 5, None, 0.5)
        .await
        .unwrap();

    assert_eq!(results[0].url, NEWS_URL);
    assert_eq!(results[0].match_kind, MatchKind::Hybrid);
    assert!(
        results[0].hybrid_score >= 0.9,
        "agreement bonus must not lower the stronger signal, got {}",
        results[0].hybrid_score
    );

    let main = find(&results, MAIN_URL);
    assert_eq!(main.match_kind, MatchKind::Semantic);
    assert!(results[0].hybrid_score > main.hybrid_score);
}

/// A ranked URL missing from the snapshot still comes back, with a
/// placeholder body instead of an error.
#[tokio::test]
async fn test_unknown_url_resolves_to_placeholder() {
    let retriever = retriever_with(StubBackend::with_hits(vec![sem_hit(
        "https://dept.example/gone",
        "Удалённая страница",
        Category::Main,
        0.7,
    )]));

    let results = retriever.search("грант", 5, None, 0.5).await.unwrap();

    let gone = find(&results, "https://dept.example/gone");
    assert_eq!(gone.full_text, MISSING_TEXT_SENTINEL);
    assert_eq!(gone.match_kind, MatchKind::Semantic);
}

/// Category filter applies to both paths.
#[tokio::test]
async fn test_category_filter_restricts_results() {
    let retriever = retriever_with(StubBackend::with_hits(vec![
        sem_hit(PEOPLE_URL, "Иванов П. А.", Category::People, 0.8),
        sem_hit(NEWS_URL, "Грант на исследование", Category::News, 0.9),
    ]));

    // "кафедры" occurs on the main page and the news page
    let results = retriever
        .search("кафедры", 5, Some(Category::News), 0.5)
        .await
        .unwrap();

    assert!(!results.is_empty());
    for doc in &results {
        assert_eq!(doc.category, Category::News);
    }
}

// ============================================================================
// Degraded mode
// ============================================================================

/// A dead vector backend must not fail the query; the lexical path
/// still answers on its own.
#[tokio::test]
async fn test_backend_failure_degrades_to_lexical_only() {
    let retriever = retriever_with(StubBackend::failing());

    let results = retriever
        .search("грант на исследование", 5, None, 0.5)
        .await
        .unwrap();

    assert!(!results.is_empty(), "lexical path should still answer");
    for doc in &results {
        assert_eq!(doc.match_kind, MatchKind::Lexical);
        assert_eq!(doc.sem_norm, 0.0);
    }
}

// ============================================================================
// Snapshot lifecycle
// ============================================================================

/// Build a snapshot from a tree of cleaned pages, persist it, reload it,
/// and search over the reloaded corpus.
#[tokio::test]
async fn test_snapshot_build_save_load_and_search() {
    let temp_dir = TempDir::new().unwrap();
    let cleaned_dir = temp_dir.path().join("cleaned");

    write_page(
        &cleaned_dir,
        "index.json",
        MAIN_URL,
        "О кафедре",
        "Общие сведения и история кафедры прикладной математики.",
    );
    write_page(
        &cleaned_dir,
        "news/2024/grant.json",
        NEWS_URL,
        "Грант на исследование",
        "Сотрудники кафедры получили грант на исследование нейронных сетей.",
    );
    write_page(
        &cleaned_dir,
        "people/ivanov.json",
        PEOPLE_URL,
        "Иванов П. А.",
        "Иванов Пётр Алексеевич, профессор, читает курс алгебры.",
    );

    let built = build_snapshot(&cleaned_dir).unwrap();
    assert_eq!(built.len(), 3);
    assert_eq!(built.get(NEWS_URL).unwrap().category, Category::News);
    assert_eq!(built.get(PEOPLE_URL).unwrap().category, Category::People);

    // Parent directories are created on save
    let snapshot_path = temp_dir.path().join("chunks/doc_texts.json");
    built.save(&snapshot_path).unwrap();

    let store = Arc::new(DocumentStore::load(&snapshot_path).unwrap());
    assert_eq!(store.len(), 3);

    let documents: Vec<Document> = store.documents().collect();
    let index = Arc::new(LexicalIndex::from_documents(&documents));
    let retriever = HybridRetriever::new(
        index,
        store,
        Arc::new(StubEmbedder),
        Arc::new(StubBackend::with_hits(Vec::new())),
        RetrievalConfig::default(),
    );

    let results = retriever.search("профессор алгебры", 5, None, 0.5).await.unwrap();
    assert_eq!(results[0].url, PEOPLE_URL);
    assert_eq!(results[0].category, Category::People);
}

// ============================================================================
// Chunking
// ============================================================================

/// Long pages split into multiple passages carrying stable ids and the
/// source page's metadata.
#[test]
fn test_document_chunking_for_indexing() {
    let config = ChunkingConfig {
        chunk_size: 120,
        chunk_overlap: 30,
        min_chunk_size: 20,
    };
    let splitter = TextSplitter::new(config);

    let text = "Кафедра прикладной математики основана в 1967 году. \
                На кафедре работают двадцать преподавателей и три лаборанта. \
                Студенты изучают математический анализ, алгебру и программирование. \
                Выпускники работают в исследовательских институтах и компаниях. \
                Кафедра ведёт приём в магистратуру и аспирантуру каждый год.";
    let document = Document::new("https://dept.example/about", text).with_title("О кафедре");

    let passages = splitter.split_document(&document);

    assert!(passages.len() > 1, "long page should yield several passages");
    for (i, passage) in passages.iter().enumerate() {
        assert_eq!(passage.chunk_id, format!("https://dept.example/about#{}", i));
        assert_eq!(passage.chunk_index, i);
        assert_eq!(passage.total_chunks, passages.len());
        assert_eq!(passage.url, "https://dept.example/about");
        assert_eq!(passage.title, "О кафедре");
        assert_eq!(passage.category, Category::Main);
        assert!(!passage.text.is_empty());
    }
}

// ============================================================================
// Ask pipeline
// ============================================================================

fn pipeline_over(llm: Arc<FixedLlm>) -> AskPipeline {
    let docs = corpus();
    let index = Arc::new(LexicalIndex::from_documents(&docs));
    let store = Arc::new(DocumentStore::from_documents(docs));
    let retriever = Arc::new(HybridRetriever::new(
        index,
        store,
        Arc::new(StubEmbedder),
        Arc::new(StubBackend::with_hits(Vec::new())),
        RetrievalConfig::default(),
    ));
    AskPipeline::new(retriever, llm)
}

/// The full ask cycle: retrieve sources, ground the model in their full
/// text, return the answer alongside the sources.
#[tokio::test]
async fn test_ask_grounds_answer_in_retrieved_pages() {
    let llm = Arc::new(FixedLlm::new());
    let pipeline = pipeline_over(llm.clone());

    let response = pipeline
        .ask("Какой грант получили сотрудники?", 5, None)
        .await
        .unwrap();

    assert_eq!(response.answer, "Сотрудники получили грант на нейронные сети.");
    assert_eq!(response.query, "Какой грант получили сотрудники?");
    assert!(!response.sources.is_empty());
    assert_eq!(response.sources[0].url, NEWS_URL);

    let context = llm.seen_context.lock().unwrap().clone().unwrap();
    assert!(context.contains("[Источник 1]"));
    assert!(context.contains(NEWS_URL));
    assert!(context.contains("получили грант на исследование нейронных сетей"));
}

/// Streaming returns sources up front, then the token stream.
#[tokio::test]
async fn test_ask_stream_yields_sources_then_tokens() {
    let llm = Arc::new(FixedLlm::new());
    let pipeline = pipeline_over(llm.clone());

    let (sources, mut tokens) = pipeline
        .ask_stream("Какой грант получили сотрудники?", 5, None)
        .await
        .unwrap();

    assert!(!sources.is_empty());
    assert_eq!(sources[0].url, NEWS_URL);

    let mut answer = String::new();
    while let Some(token) = tokens.next().await {
        answer.push_str(&token.unwrap());
    }
    assert_eq!(answer, "Сотрудники получили грант");
}

/// Input validation fails the call before any backend is consulted.
#[tokio::test]
async fn test_ask_rejects_invalid_input() {
    let llm = Arc::new(FixedLlm::new());
    let pipeline = pipeline_over(llm.clone());

    assert!(pipeline.ask("", 5, None).await.is_err());
    assert!(pipeline.ask("вопрос", 0, None).await.is_err());
    assert!(
        llm.seen_context.lock().unwrap().is_none(),
        "model must not be called for rejected input"
    );
}
