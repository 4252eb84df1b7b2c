//! Deskribe: Hybrid Retrieval Service for Departmental Documentation
//!
//! Serves question answering over a scraped page corpus, combining BM25
//! and passage-level semantic search.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deskribe::{
    chunking::TextSplitter,
    config::Config,
    embedding::{Embedder, HttpEmbedder},
    llm::{LanguageModel, LlmClient},
    pipeline::AskPipeline,
    retrieval::{HybridRetriever, LexicalIndex},
    server::{AppState, HttpServer},
    store::{build_snapshot, DocumentStore},
    types::{Category, Document},
    vector::{QdrantBackend, VectorBackend},
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "deskribe")]
#[command(about = "Hybrid retrieval service for departmental documentation")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "deskribe.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve {
        /// Listen address
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Run a hybrid search against the corpus
    Search {
        /// Search query
        query: String,

        /// Number of results (defaults to retrieval.top_k)
        #[arg(short, long)]
        top_k: Option<usize>,

        /// Restrict results to a category (main, news, people)
        #[arg(long)]
        category: Option<String>,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Ask a question and print the generated answer
    Ask {
        /// Question text
        question: String,

        /// Number of source documents (defaults to retrieval.top_k)
        #[arg(short, long)]
        top_k: Option<usize>,

        /// Restrict sources to a category (main, news, people)
        #[arg(long)]
        category: Option<String>,
    },

    /// Build the document snapshot and push passage vectors to the backend
    Index,

    /// Show corpus statistics
    Stats,

    /// Initialize a new Deskribe configuration
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load config, falling back to defaults when no file exists
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Serve { listen } => serve(config, listen).await,
        Commands::Search {
            query,
            top_k,
            category,
            format,
        } => search(config, query, top_k, category, format).await,
        Commands::Ask {
            question,
            top_k,
            category,
        } => ask(config, question, top_k, category).await,
        Commands::Index => index_corpus(config).await,
        Commands::Stats => show_stats(config).await,
        Commands::Init { path } => init_config(path).await,
    }
}

/// Load the snapshot and assemble the retrieval stack.
///
/// The vector backend comes back separately because the HTTP health
/// endpoint probes it directly.
fn build_retriever(config: &Config) -> Result<(Arc<HybridRetriever>, Arc<dyn VectorBackend>)> {
    let store = Arc::new(DocumentStore::load(&config.store.snapshot_path).with_context(|| {
        format!(
            "Failed to load document snapshot from {} (run `deskribe index` first)",
            config.store.snapshot_path.display()
        )
    })?);

    let documents: Vec<Document> = store.documents().collect();
    let index = Arc::new(LexicalIndex::from_documents(&documents));

    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(config.embedding.clone())?);
    let vectors: Arc<dyn VectorBackend> = Arc::new(QdrantBackend::new(&config.vector)?);

    info!(
        "Retrieval stack ready: {} pages, {} terms",
        store.len(),
        index.term_count()
    );

    let retriever = Arc::new(HybridRetriever::new(
        index,
        store,
        embedder,
        vectors.clone(),
        config.retrieval.clone(),
    ));

    Ok((retriever, vectors))
}

async fn serve(mut config: Config, listen: Option<String>) -> Result<()> {
    if let Some(addr) = listen {
        config.server.listen_addr = addr;
    }

    info!("Starting Deskribe service...");

    let (retriever, vectors) = build_retriever(&config)?;
    let llm: Arc<dyn LanguageModel> = Arc::new(LlmClient::new(config.llm.clone())?);
    let pipeline = Arc::new(AskPipeline::new(retriever, llm));

    let state = AppState { pipeline, vectors };
    let server = HttpServer::new(config.server.clone(), state);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let server_handle = tokio::spawn(async move {
        match server.run(shutdown_rx).await {
            Ok(()) => info!("HTTP server shut down cleanly"),
            Err(e) => error!("HTTP server failed: {}", e),
        }
    });

    // Wait for shutdown signal (Ctrl+C or SIGTERM)
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = wait_for_sigterm() => {
            info!("Received SIGTERM, shutting down");
        }
    }

    let _ = shutdown_tx.send(());

    // Wait for the server to stop, aborting if it does not shut down in time
    let server_abort = server_handle.abort_handle();
    if tokio::time::timeout(Duration::from_secs(5), server_handle)
        .await
        .is_err()
    {
        warn!("HTTP server did not shut down within 5s, aborting");
        server_abort.abort();
    }

    Ok(())
}

async fn search(
    config: Config,
    query: String,
    top_k: Option<usize>,
    category: Option<String>,
    format: String,
) -> Result<()> {
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let category = parse_category(category)?;
    let alpha = config.retrieval.alpha;

    let (retriever, _vectors) = build_retriever(&config)?;

    info!("Searching for: {}", query);

    let results = retriever.search(&query, top_k, category, alpha).await?;

    match format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&results)?;
            println!("{}", json);
        }
        _ => {
            println!("\nSearch Results ({} found):\n", results.len());
            for (i, doc) in results.iter().enumerate() {
                println!("{}. [Score: {:.4}] {}", i + 1, doc.hybrid_score, doc.title);
                println!("   URL: {}", doc.url);
                println!("   Category: {}", doc.category);
                println!("   Matched by: {}", doc.match_kind);
                println!(
                    "   BM25: {:.4}  Semantic: {:.4}",
                    doc.bm25_norm, doc.sem_norm
                );
                println!("   Text: {}...", truncate_content(&doc.full_text, 200));
                println!();
            }
        }
    }

    Ok(())
}

async fn ask(
    config: Config,
    question: String,
    top_k: Option<usize>,
    category: Option<String>,
) -> Result<()> {
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let category = parse_category(category)?;

    let (retriever, _vectors) = build_retriever(&config)?;
    let llm: Arc<dyn LanguageModel> = Arc::new(LlmClient::new(config.llm.clone())?);
    let pipeline = AskPipeline::new(retriever, llm);

    info!("Asking: {}", question);

    let response = pipeline.ask(&question, top_k, category).await?;

    println!("\n{}\n", response.answer);

    if !response.sources.is_empty() {
        println!("Sources:");
        for (i, doc) in response.sources.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, doc.title, doc.url);
        }
    }

    Ok(())
}

async fn index_corpus(config: Config) -> Result<()> {
    info!(
        "Building document snapshot from {}",
        config.store.cleaned_dir.display()
    );

    let store = build_snapshot(&config.store.cleaned_dir)?;
    if store.is_empty() {
        anyhow::bail!(
            "No cleaned pages found under {}",
            config.store.cleaned_dir.display()
        );
    }

    store.save(&config.store.snapshot_path)?;
    info!(
        "Snapshot of {} pages written to {}",
        store.len(),
        config.store.snapshot_path.display()
    );

    // Split pages into passages
    let splitter = TextSplitter::new(config.chunking.clone());
    let documents: Vec<Document> = store.documents().collect();
    let mut passages = Vec::new();
    for doc in &documents {
        passages.extend(splitter.split_document(doc));
    }
    info!(
        "Created {} passages from {} pages",
        passages.len(),
        documents.len()
    );

    // Embed and push to the vector backend
    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(config.embedding.clone())?);
    let vectors: Arc<dyn VectorBackend> = Arc::new(QdrantBackend::new(&config.vector)?);

    vectors.recreate_collection(embedder.dimensions()).await?;

    let batch_size = config.embedding.batch_size.max(1);
    let mut indexed = 0usize;
    for batch in passages.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        vectors.upsert(batch, &embeddings).await?;
        indexed += batch.len();
        info!("Indexed {}/{} passages", indexed, passages.len());
    }

    println!(
        "Indexed {} passages from {} pages",
        passages.len(),
        documents.len()
    );

    Ok(())
}

async fn show_stats(config: Config) -> Result<()> {
    let store = DocumentStore::load(&config.store.snapshot_path).with_context(|| {
        format!(
            "Failed to load document snapshot from {} (run `deskribe index` first)",
            config.store.snapshot_path.display()
        )
    })?;

    let documents: Vec<Document> = store.documents().collect();
    let index = LexicalIndex::from_documents(&documents);

    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for doc in &documents {
        *by_category.entry(doc.category.as_str()).or_insert(0) += 1;
    }
    let total_chars: usize = documents.iter().map(|d| d.text.chars().count()).sum();

    println!("\nDeskribe Statistics:");
    println!("====================");
    println!("Snapshot: {}", config.store.snapshot_path.display());
    println!("Total pages: {}", store.len());
    for (category, count) in &by_category {
        println!("  {}: {}", category, count);
    }
    println!("Index terms: {}", index.term_count());
    println!(
        "Average page length: {:.1} tokens",
        index.average_doc_length()
    );
    println!("Total text: {} chars", total_chars);
    println!("Embedding model: {}", config.embedding.model);
    println!("Embedding dimensions: {}", config.embedding.dimensions);
    println!("Vector collection: {}", config.vector.collection);
    println!("LLM model: {}", config.llm.model);

    Ok(())
}

async fn init_config(path: PathBuf) -> Result<()> {
    let config = Config::default();
    let config_path = path.join("deskribe.toml");

    // Generate TOML config
    let toml_content = format!(
        r#"# Deskribe Configuration

[server]
listen_addr = "{}"
cors_enabled = {}

[retrieval]
top_k = {}
semantic_top_k = {}
keyword_top_k = {}
alpha = {}
max_top_k = {}
max_query_len = {}
semantic_timeout_secs = {}

[chunking]
chunk_size = {}
chunk_overlap = {}
min_chunk_size = {}

[embedding]
endpoint = "{}"
model = "{}"
dimensions = {}
timeout_secs = {}
batch_size = {}

[vector]
url = "{}"
collection = "{}"
timeout_secs = {}

[llm]
endpoint = "{}"
model = "{}"
temperature = {}
max_tokens = {}
timeout_secs = {}

[store]
snapshot_path = "{}"
cleaned_dir = "{}"
"#,
        config.server.listen_addr,
        config.server.cors_enabled,
        config.retrieval.top_k,
        config.retrieval.semantic_top_k,
        config.retrieval.keyword_top_k,
        config.retrieval.alpha,
        config.retrieval.max_top_k,
        config.retrieval.max_query_len,
        config.retrieval.semantic_timeout_secs,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
        config.chunking.min_chunk_size,
        config.embedding.endpoint,
        config.embedding.model,
        config.embedding.dimensions,
        config.embedding.timeout_secs,
        config.embedding.batch_size,
        config.vector.url,
        config.vector.collection,
        config.vector.timeout_secs,
        config.llm.endpoint,
        config.llm.model,
        config.llm.temperature,
        config.llm.max_tokens,
        config.llm.timeout_secs,
        config.store.snapshot_path.display(),
        config.store.cleaned_dir.display(),
    );

    std::fs::write(&config_path, toml_content)?;
    println!("Created configuration file: {}", config_path.display());

    Ok(())
}

/// Map a raw category argument to a filter, rejecting unknown values
fn parse_category(raw: Option<String>) -> Result<Option<Category>> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match Category::parse(trimmed) {
                Some(category) => Ok(Some(category)),
                None => anyhow::bail!(
                    "Unknown category '{}': expected 'main', 'news', or 'people'",
                    trimmed
                ),
            }
        }
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}. Falling back to pending future.", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    // On non-Unix, just wait forever (Ctrl+C will still work)
    std::future::pending::<()>().await
}

fn truncate_content(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ");
    if s.len() > max_len {
        // Find a valid char boundary at or before max_len
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        s[..end].to_string()
    } else {
        s
    }
}
