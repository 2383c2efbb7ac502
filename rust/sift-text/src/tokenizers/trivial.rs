//! Whole-value tokenizer.

use std::option;

use super::{
    DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Tokenizer, TokenizerKind, truncate_str,
};

/// Returns the raw value, trimmed of surrounding whitespace, as one term.
///
/// Suited to identifier-like string fields (SKUs, country codes, GUIDs) where a
/// filter should only match the complete value.
pub struct TrivialTokenizer {
    max_len: usize,
    min_len: usize,
}

impl TrivialTokenizer {
    pub fn new() -> Self {
        Self::with_lengths(DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH)
    }

    /// Values shorter than `min_len` bytes produce no term.
    pub fn with_lengths(max_len: usize, min_len: usize) -> Self {
        TrivialTokenizer { max_len, min_len }
    }
}

impl Default for TrivialTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for TrivialTokenizer {
    type TokenIter<'a> = option::IntoIter<&'a str>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        let value = input.trim();
        let keep = !value.is_empty() && value.len() >= self.min_len;
        keep.then(|| truncate_str(value, self.max_len)).into_iter()
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::Trivial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_value_is_one_term() {
        let tokenizer = TrivialTokenizer::new();
        let terms: Vec<&str> = tokenizer.tokenize("  SKU-1234/blue ").collect();
        assert_eq!(terms, vec!["SKU-1234/blue"]);
        assert_eq!(tokenizer.name(), "trivial");
    }

    #[test]
    fn test_blank_input_yields_nothing() {
        let tokenizer = TrivialTokenizer::new();
        assert_eq!(tokenizer.tokenize("").count(), 0);
        assert_eq!(tokenizer.tokenize("   ").count(), 0);
    }

    #[test]
    fn test_length_bounds() {
        let tokenizer = TrivialTokenizer::with_lengths(4, 2);
        assert_eq!(tokenizer.tokenize("a").count(), 0);
        let terms: Vec<&str> = tokenizer.tokenize("abcdef").collect();
        assert_eq!(terms, vec!["abcd"]);
        // byte 4 falls inside the second 'é'
        let terms: Vec<&str> = tokenizer.tokenize("nééé").collect();
        assert_eq!(terms, vec!["né"]);
    }
}
