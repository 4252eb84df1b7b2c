//! Document chunking system
//!
//! Features:
//! - Sentence-preserving text splitting
//! - Configurable chunk sizes with overlap
//! - Short-fragment merging

mod splitter;

pub use splitter::*;
