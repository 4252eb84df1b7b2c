//! Deskribe: Hybrid Retrieval Service for Departmental Documentation
//!
//! Answers questions over a scraped documentation corpus, featuring:
//! - Hand-rolled in-memory BM25 over whole pages (Latin + Cyrillic tokens)
//! - Passage-level semantic search via an external vector backend
//! - Score fusion favoring a single strong signal over two mediocre ones
//! - Whole-page context assembly for LLM answering
//! - HTTP API with streaming answers (SSE)

pub mod chunking;
pub mod config;
pub mod embedding;
pub mod llm;
pub mod pipeline;
pub mod retrieval;
pub mod server;
pub mod store;
pub mod types;
pub mod vector;

pub use config::Config;
pub use types::*;
