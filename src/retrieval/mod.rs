//! Hybrid retrieval system
//!
//! Combines:
//! - BM25 lexical search over whole pages
//! - Dense passage search through the vector backend
//! - Sigmoid normalization and max-plus-bonus fusion

mod fusion;
mod hybrid;
mod lexical;
mod normalize;
mod tokenizer;

pub use fusion::*;
pub use hybrid::*;
pub use lexical::*;
pub use normalize::*;
pub use tokenizer::*;
