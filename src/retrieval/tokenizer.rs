//! Tokenizer shared by indexing and query parsing.
//!
//! Lowercases the input and extracts maximal runs of Latin letters, Cyrillic
//! letters, and digits. Tokens shorter than two characters are discarded.
//! There is no stop-word list and no stemming; term rarity is handled
//! entirely by the IDF component of the scorer.

/// Minimum token length, in characters
const MIN_TOKEN_CHARS: usize = 2;

fn is_token_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | 'а'..='я' | 'ё')
}

/// Tokenize text: lowercase, split into alphanumeric runs, drop short tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for c in lower.chars() {
        if is_token_char(c) {
            current.push(c);
            current_chars += 1;
        } else {
            if current_chars >= MIN_TOKEN_CHARS {
                tokens.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            current_chars = 0;
        }
    }
    if current_chars >= MIN_TOKEN_CHARS {
        tokens.push(current);
    }

    tokens
}
