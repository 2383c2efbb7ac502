//! Text handling for inverted indexes: tokenization and posting lists.
//!
//! # Tokenizers
//!
//! - **Trivial Tokenizer** (`"trivial"`): the whole value is one term, useful for exact matches
//! - **Unicode Word Tokenizer** (`"unicode-word"`): extracts alphanumeric words, with
//!   configurable extra symbols and separators
//!
//! ```rust
//! use sift_text::{Tokenizer, TokenizerOptions, create_tokenizer};
//!
//! let tokenizer = create_tokenizer("unicode-word", &TokenizerOptions::default()).unwrap();
//! let terms: Vec<&str> = tokenizer.tokenize("South Africa").collect();
//! assert_eq!(terms, vec!["South", "Africa"]);
//! ```
//!
//! # Posting lists
//!
//! See [`posting`] for the compact and expanded representations, forward-only
//! cursors, group intersection and exact-match checks.

pub mod posting;
mod tokenizers;

pub use posting::{Posting, PostingCursor, PostingList, TokenOffset};
pub use tokenizers::{
    FieldTokenizer, Tokenizer, TokenizerKind, TokenizerOptions, create_tokenizer, normalize_term,
};
