//! Document splitting into sentence-preserving passages

use crate::config::ChunkingConfig;
use crate::types::{Document, Passage};
use tracing::debug;

/// Text splitter that packs whole sentences into fixed-size passages
pub struct TextSplitter {
    config: ChunkingConfig,
}

impl TextSplitter {
    /// Create a new text splitter
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split a document into passages with stable ids of the form `{url}#{index}`
    pub fn split_document(&self, document: &Document) -> Vec<Passage> {
        let content = document.text.trim();
        if content.is_empty() {
            return Vec::new();
        }

        let texts = self.split_text(content);
        let total_chunks = texts.len();

        let passages: Vec<Passage> = texts
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Passage {
                chunk_id: format!("{}#{}", document.url, chunk_index),
                url: document.url.clone(),
                title: document.title.clone(),
                category: document.category,
                chunk_index,
                total_chunks,
                text,
            })
            .collect();

        debug!("split '{}' into {} passages", document.url, passages.len());

        passages
    }

    /// Split text into chunks of roughly `chunk_size` characters without
    /// cutting inside a sentence.
    ///
    /// Adjacent chunks share trailing sentences up to `chunk_overlap`
    /// characters so context survives the cut. Chunks shorter than
    /// `min_chunk_size` are merged into a neighbor afterwards.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let sentences = split_into_sentences(text);
        if sentences.is_empty() {
            return Vec::new();
        }

        let chunk_size = self.config.chunk_size;
        let mut chunks: Vec<String> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0usize;

        for sentence in sentences {
            let sentence_len = sentence.chars().count();

            // A sentence longer than the target stays whole as its own chunk
            if sentence_len > chunk_size && current.is_empty() {
                chunks.push(sentence);
                continue;
            }

            if current_len + sentence_len > chunk_size && !current.is_empty() {
                chunks.push(current.join(" "));

                // Carry trailing sentences into the next chunk as overlap
                let mut overlap: Vec<String> = Vec::new();
                let mut overlap_len = 0usize;
                for s in current.iter().rev() {
                    let s_len = s.chars().count();
                    if overlap_len + s_len > self.config.chunk_overlap {
                        break;
                    }
                    overlap.insert(0, s.clone());
                    overlap_len += s_len;
                }
                current = overlap;
                current_len = overlap_len;
            }

            current_len += sentence_len;
            current.push(sentence);
        }

        if !current.is_empty() {
            let tail = current.join(" ");
            // The overlap can reproduce the previous chunk verbatim; skip it
            if chunks.last() != Some(&tail) {
                chunks.push(tail);
            }
        }

        self.merge_short(chunks)
    }

    /// Glue chunks shorter than `min_chunk_size` to a neighbor.
    ///
    /// Fragments like a bare list item or a street address are useless as
    /// standalone passages. A short chunk is prepended to the next one; a
    /// short final chunk is appended to the previous one.
    fn merge_short(&self, chunks: Vec<String>) -> Vec<String> {
        let min = self.config.min_chunk_size;
        let mut merged: Vec<String> = Vec::new();
        let mut carry = String::new();

        for chunk in chunks {
            let chunk = if carry.is_empty() {
                chunk
            } else {
                let glued = format!("{carry} {chunk}");
                carry.clear();
                glued
            };

            if chunk.chars().count() < min {
                carry = chunk;
            } else {
                merged.push(chunk);
            }
        }

        if !carry.is_empty() {
            match merged.last_mut() {
                Some(last) => {
                    last.push(' ');
                    last.push_str(&carry);
                }
                None => merged.push(carry),
            }
        }

        merged
    }
}

/// Split text into sentences.
///
/// A boundary is a whitespace run that follows `.`, `!` or `?` and precedes
/// an uppercase letter, a digit, `«`, `"` or `(`. Dots inside abbreviations
/// survive because the next character after the space is lowercase.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        let run_start = i;
        let mut run_end = i;
        while run_end < chars.len() && chars[run_end].is_whitespace() {
            run_end += 1;
        }

        let boundary = run_start > 0
            && matches!(chars[run_start - 1], '.' | '!' | '?')
            && run_end < chars.len()
            && is_sentence_starter(chars[run_end]);

        if boundary {
            push_sentence(&chars[start..run_start], &mut sentences);
            start = run_end;
        }
        i = run_end;
    }

    push_sentence(&chars[start..], &mut sentences);
    sentences
}

fn push_sentence(chars: &[char], sentences: &mut Vec<String>) {
    let piece: String = chars.iter().collect();
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece.to_string());
    }
}

/// Characters a new sentence may start with
fn is_sentence_starter(c: char) -> bool {
    matches!(c, 'А'..='Я' | 'A'..='Z' | '0'..='9' | '«' | '"' | '(')
}
