//! Term extraction for string fields.
//!
//! The same tokenizer runs when a document is indexed and when a filter value is
//! resolved against the term dictionary, so both sides agree on what a term is.
//! A filter value matches only if every term it produces is present in the field.
//!
//! Tokens are borrowed slices of the input; case folding happens afterwards in
//! [`normalize_term`].

pub mod trivial;
pub mod unicode_word;

use std::str::FromStr;

use sift_common::{Result, error::Error};
pub use trivial::TrivialTokenizer;
pub use unicode_word::UnicodeWordTokenizer;

/// Longest term kept, in bytes. Longer terms are cut at a char boundary.
pub const DEFAULT_MAX_TERM_LENGTH: usize = 128;

pub const DEFAULT_MIN_TERM_LENGTH: usize = 1;

/// Splits a string value into terms.
pub trait Tokenizer: Send + Sync {
    type TokenIter<'a>: Iterator<Item = &'a str>
    where
        Self: 'a;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a>;

    fn kind(&self) -> TokenizerKind;

    /// Name under which the tokenizer is configured in a field schema.
    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Character-level knobs shared by the word tokenizers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Non-alphanumeric characters that are kept as part of a term (e.g. `+` for "c++").
    pub symbols_to_index: Vec<char>,
    /// Characters that always split terms, even if they would otherwise be indexed.
    pub token_separators: Vec<char>,
}

impl TokenizerOptions {
    /// Returns true if `ch` belongs to a term under these options.
    #[inline]
    pub fn is_term_char(&self, ch: char) -> bool {
        if self.token_separators.contains(&ch) {
            return false;
        }
        ch.is_alphanumeric() || self.symbols_to_index.contains(&ch)
    }
}

/// Builds the tokenizer configured for a field by `name`.
///
/// `options` only affect the word tokenizer. Fails with an invalid argument
/// error for names other than `"trivial"` and `"unicode-word"`.
pub fn create_tokenizer(name: &str, options: &TokenizerOptions) -> Result<FieldTokenizer> {
    let tokenizer = match name.parse()? {
        TokenizerKind::Trivial => FieldTokenizer::Trivial(TrivialTokenizer::new()),
        TokenizerKind::UnicodeWord => {
            FieldTokenizer::UnicodeWord(UnicodeWordTokenizer::with_options(options.clone()))
        }
    };
    Ok(tokenizer)
}

/// Case-folds a term so that indexed terms and filter terms compare equal
/// regardless of letter case.
pub fn normalize_term(term: &str) -> String {
    if term.chars().all(|ch| !ch.is_uppercase()) {
        term.to_string()
    } else {
        term.to_lowercase()
    }
}

pub(crate) fn truncate_str(input: &str, max_len: usize) -> &str {
    if input.len() <= max_len {
        return input;
    }
    let end = (0..=max_len)
        .rev()
        .find(|&pos| input.is_char_boundary(pos))
        .unwrap_or(0);
    &input[..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerKind {
    /// The whole value is one term.
    Trivial,
    /// Runs of term characters.
    UnicodeWord,
}

impl TokenizerKind {
    const fn name(&self) -> &'static str {
        match self {
            TokenizerKind::Trivial => "trivial",
            TokenizerKind::UnicodeWord => "unicode-word",
        }
    }
}

impl FromStr for TokenizerKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        [TokenizerKind::Trivial, TokenizerKind::UnicodeWord]
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| {
                Error::invalid_arg("tokenizer", format!("unknown tokenizer `{name}`"))
            })
    }
}

/// Tokenizer held by an index for one string field.
pub enum FieldTokenizer {
    Trivial(TrivialTokenizer),
    UnicodeWord(UnicodeWordTokenizer),
}

impl Tokenizer for FieldTokenizer {
    type TokenIter<'a> = Box<dyn Iterator<Item = &'a str> + 'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        match self {
            FieldTokenizer::Trivial(inner) => Box::new(inner.tokenize(input)),
            FieldTokenizer::UnicodeWord(inner) => Box::new(inner.tokenize(input)),
        }
    }

    fn kind(&self) -> TokenizerKind {
        match self {
            FieldTokenizer::Trivial(_) => TokenizerKind::Trivial,
            FieldTokenizer::UnicodeWord(_) => TokenizerKind::UnicodeWord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tokenizer() {
        let options = TokenizerOptions::default();
        assert!(create_tokenizer("unicode-log", &options).is_err());
        assert!(create_tokenizer("Trivial", &options).is_err());

        assert_eq!(
            create_tokenizer("unicode-word", &options).unwrap().name(),
            "unicode-word"
        );
        assert_eq!(create_tokenizer("trivial", &options).unwrap().name(), "trivial");
    }

    #[test]
    fn test_options_are_forwarded() {
        let options = TokenizerOptions {
            symbols_to_index: vec!['+'],
            token_separators: vec![],
        };
        let tokenizer = create_tokenizer("unicode-word", &options).unwrap();
        let terms: Vec<&str> = tokenizer.tokenize("c++ and rust").collect();
        assert_eq!(terms, vec!["c++", "and", "rust"]);
    }

    #[test]
    fn test_normalize_term() {
        assert_eq!(normalize_term("South"), "south");
        assert_eq!(normalize_term("already"), "already");
        assert_eq!(normalize_term("ÄRGER"), "ärger");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("sneaker", 100), "sneaker");
        assert_eq!(truncate_str("sneaker", 5), "sneak");
        // 'é' occupies bytes 3..5
        assert_eq!(truncate_str("café", 4), "caf");
        assert_eq!(truncate_str("é", 1), "");

        let long = "x".repeat(300);
        assert_eq!(truncate_str(&long, DEFAULT_MAX_TERM_LENGTH).len(), 128);
    }

    #[test]
    fn test_unknown_tokenizer_message() {
        let err = "whitespace".parse::<TokenizerKind>().unwrap_err();
        assert!(err.to_string().contains("unknown tokenizer `whitespace`"));
    }
}
