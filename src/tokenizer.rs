//! Text normalization and tokenization
//!
//! The indexer and the querier must agree byte-for-byte on what a token is,
//! otherwise query terms can never match index terms. The rules are
//! deliberately minimal: ASCII lowercase, every non-alphanumeric byte is a
//! separator, digits and single-character tokens are kept, no stopword
//! removal, no stemming.

/// Normalize text: lowercase ASCII letters, replace every non-alphanumeric
/// byte with a single space.
pub fn normalize(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for b in text.bytes() {
        if b.is_ascii_alphanumeric() {
            result.push(b.to_ascii_lowercase() as char);
        } else if !result.ends_with(' ') && !result.is_empty() {
            result.push(' ');
        }
    }
    result
}

/// Split text into normalized tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_ascii_whitespace()
        .map(|t| t.to_string())
        .collect()
}

/// Compute term frequencies for a single document.
pub fn term_frequencies(text: &str) -> std::collections::HashMap<String, u32> {
    let mut freqs = std::collections::HashMap::new();
    for token in tokenize(text) {
        *freqs.entry(token).or_insert(0) += 1;
    }
    freqs
}
