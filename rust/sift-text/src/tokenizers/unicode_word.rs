//! Word tokenizer over Unicode alphanumerics.

use std::str::CharIndices;

use super::{
    DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Tokenizer, TokenizerKind, TokenizerOptions,
    truncate_str,
};

/// Emits every maximal run of term characters as a term.
///
/// A term character is an alphanumeric character or one of the configured
/// `symbols_to_index`, unless it is listed in `token_separators`. Runs shorter
/// than the minimum length are dropped and long ones are truncated.
pub struct UnicodeWordTokenizer {
    max_len: usize,
    min_len: usize,
    options: TokenizerOptions,
}

impl UnicodeWordTokenizer {
    pub fn new() -> Self {
        Self::with_options(TokenizerOptions::default())
    }

    pub fn with_options(options: TokenizerOptions) -> Self {
        UnicodeWordTokenizer {
            max_len: DEFAULT_MAX_TERM_LENGTH,
            min_len: DEFAULT_MIN_TERM_LENGTH,
            options,
        }
    }

    pub fn with_lengths(max_len: usize, min_len: usize) -> Self {
        UnicodeWordTokenizer {
            max_len,
            min_len,
            ..Self::new()
        }
    }
}

impl Default for UnicodeWordTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Words<'a> {
    input: &'a str,
    chars: CharIndices<'a>,
    tokenizer: &'a UnicodeWordTokenizer,
}

impl Words<'_> {
    /// Byte range of the next run of term characters.
    fn next_run(&mut self) -> Option<(usize, usize)> {
        let options = &self.tokenizer.options;
        let (start, _) = self.chars.find(|&(_, ch)| options.is_term_char(ch))?;
        let end = self
            .chars
            .find(|&(_, ch)| !options.is_term_char(ch))
            .map_or(self.input.len(), |(pos, _)| pos);
        Some((start, end))
    }
}

impl<'a> Iterator for Words<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while let Some((start, end)) = self.next_run() {
            if end - start >= self.tokenizer.min_len {
                return Some(truncate_str(&self.input[start..end], self.tokenizer.max_len));
            }
        }
        None
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    type TokenIter<'a> = Words<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Words<'a> {
        Words {
            input,
            chars: input.char_indices(),
            tokenizer: self,
        }
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::UnicodeWord
    }
}
