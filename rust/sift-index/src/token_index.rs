use std::collections::BTreeMap;

use sift_text::{Posting, TokenOffset};

/// Term dictionary of one string field: normalized term → posting.
#[derive(Debug, Clone, Default)]
pub struct TokenIndex {
    terms: BTreeMap<String, Posting>,
}

impl TokenIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact term lookup.
    pub fn lookup(&self, term: &str) -> Option<&Posting> {
        self.terms.get(term)
    }

    pub fn upsert(
        &mut self,
        term: &str,
        id: u32,
        offsets: &[TokenOffset],
        compact_threshold: usize,
    ) {
        match self.terms.get_mut(term) {
            Some(posting) => posting.upsert(id, offsets, compact_threshold),
            None => {
                let mut posting = Posting::default();
                posting.upsert(id, offsets, compact_threshold);
                self.terms.insert(term.to_string(), posting);
            }
        }
    }

    /// Removes `id` from the posting of `term`, dropping the term once unused.
    pub fn erase(&mut self, term: &str, id: u32) {
        if let Some(posting) = self.terms.get_mut(term) {
            posting.erase(id);
            if posting.num_ids() == 0 {
                self.terms.remove(term);
            }
        }
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }
}
