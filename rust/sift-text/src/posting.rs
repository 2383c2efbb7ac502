//! Posting lists: the documents (and token offsets) in which a term occurs.
//!
//! A term's posting starts out in a flat, compact `u32` encoding and is promoted
//! to an expanded [`PostingList`] once it grows past a configured threshold.
//! Expanded lists live behind an `Arc` so that readers can hold cursors over them
//! without borrowing the index. Compact postings must be expanded before cursors
//! can be opened on them; [`to_expanded`] produces lists that are owned by the
//! caller and released when the caller drops its cursors.
//!
//! # Exact matches
//!
//! Every occurrence of a term in a document is recorded as a [`TokenOffset`]: the
//! array element the term appeared in (always 0 for scalar fields), its token
//! position inside that element, and whether it was the element's final token.
//! A group of cursors (one per filter token, in order) is an *exact match* when
//! some element consists of precisely those tokens: token `i` sits at position `i`
//! and the last token carries the `last` marker.

use std::sync::Arc;

/// One occurrence of a term inside a document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TokenOffset {
    /// Array element index, 0 for scalar fields.
    pub element: u32,
    /// Token position within the element.
    pub position: u32,
    /// The token is the final token of the element.
    pub last: bool,
}

impl TokenOffset {
    pub fn new(element: u32, position: u32, last: bool) -> Self {
        Self {
            element,
            position,
            last,
        }
    }
}

/// Expanded posting list: sorted document ids with their token offsets.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    ids: Vec<u32>,
    offsets: Vec<Vec<TokenOffset>>,
}

impl PostingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Offsets recorded for the document at `index` (not the document id).
    pub fn offsets_at(&self, index: usize) -> &[TokenOffset] {
        &self.offsets[index]
    }

    /// Adds `id` with the given offsets, merging into an existing entry.
    pub fn upsert(&mut self, id: u32, offsets: &[TokenOffset]) {
        match self.ids.binary_search(&id) {
            Ok(index) => {
                let entry = &mut self.offsets[index];
                entry.extend_from_slice(offsets);
                entry.sort_unstable();
                entry.dedup();
            }
            Err(index) => {
                let mut entry = offsets.to_vec();
                entry.sort_unstable();
                entry.dedup();
                self.ids.insert(index, id);
                self.offsets.insert(index, entry);
            }
        }
    }

    /// Removes `id` from the list. Returns false if it was not present.
    pub fn erase(&mut self, id: u32) -> bool {
        match self.ids.binary_search(&id) {
            Ok(index) => {
                self.ids.remove(index);
                self.offsets.remove(index);
                true
            }
            Err(_) => false,
        }
    }
}

/// Flat encoding for short posting lists.
///
/// Each document occupies `3 * n + 2` words: the number of offset words `3 * n`,
/// then `n` `(element, position, last)` triples, then the document id. Entries are
/// ordered by document id.
#[derive(Debug, Clone, Default)]
pub struct CompactPostingList {
    data: Vec<u32>,
    num_ids: usize,
}

impl CompactPostingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_ids(&self) -> usize {
        self.num_ids
    }

    /// Decodes the list into its expanded form.
    pub fn to_posting_list(&self) -> PostingList {
        let mut list = PostingList::new();
        let mut i = 0;
        while i < self.data.len() {
            let words = self.data[i] as usize;
            let offsets = self.data[i + 1..i + 1 + words]
                .chunks_exact(3)
                .map(|t| TokenOffset::new(t[0], t[1], t[2] != 0))
                .collect::<Vec<_>>();
            let id = self.data[i + words + 1];
            list.ids.push(id);
            list.offsets.push(offsets);
            i += words + 2;
        }
        list
    }

    fn from_posting_list(list: &PostingList) -> Self {
        let mut data = Vec::new();
        for (id, offsets) in list.ids.iter().zip(&list.offsets) {
            data.push((offsets.len() * 3) as u32);
            for offset in offsets {
                data.extend_from_slice(&[offset.element, offset.position, offset.last as u32]);
            }
            data.push(*id);
        }
        Self {
            data,
            num_ids: list.len(),
        }
    }
}

/// A term's posting in either representation.
#[derive(Debug, Clone)]
pub enum Posting {
    Compact(CompactPostingList),
    Expanded(Arc<PostingList>),
}

impl Default for Posting {
    fn default() -> Self {
        Posting::Compact(CompactPostingList::new())
    }
}

impl Posting {
    pub fn num_ids(&self) -> usize {
        match self {
            Posting::Compact(list) => list.num_ids(),
            Posting::Expanded(list) => list.len(),
        }
    }

    pub fn is_compact(&self) -> bool {
        matches!(self, Posting::Compact(_))
    }

    /// Adds `id` to the posting. A compact posting is promoted to the expanded
    /// form once it holds more than `compact_threshold` documents.
    pub fn upsert(&mut self, id: u32, offsets: &[TokenOffset], compact_threshold: usize) {
        match self {
            Posting::Compact(compact) => {
                let mut list = compact.to_posting_list();
                list.upsert(id, offsets);
                *self = if list.len() > compact_threshold {
                    Posting::Expanded(Arc::new(list))
                } else {
                    Posting::Compact(CompactPostingList::from_posting_list(&list))
                };
            }
            Posting::Expanded(list) => Arc::make_mut(list).upsert(id, offsets),
        }
    }

    /// Removes `id`. Returns false if the posting did not contain it.
    pub fn erase(&mut self, id: u32) -> bool {
        match self {
            Posting::Compact(compact) => {
                let mut list = compact.to_posting_list();
                let erased = list.erase(id);
                if erased {
                    *compact = CompactPostingList::from_posting_list(&list);
                }
                erased
            }
            Posting::Expanded(list) => Arc::make_mut(list).erase(id),
        }
    }

    /// Allocation-free cursor over the document ids of this posting.
    pub fn id_cursor(&self) -> IdCursor<'_> {
        match self {
            Posting::Compact(list) => IdCursor::Compact {
                data: &list.data,
                index: 0,
            },
            Posting::Expanded(list) => IdCursor::Expanded {
                ids: list.ids(),
                pos: 0,
            },
        }
    }

    pub fn ids(&self) -> Vec<u32> {
        let mut ids = Vec::with_capacity(self.num_ids());
        let mut cursor = self.id_cursor();
        while cursor.valid() {
            ids.push(cursor.id());
            cursor.next();
        }
        ids
    }
}

/// Returns one expanded list per posting, in order.
///
/// Already expanded postings are shared with the index; compact postings are
/// decoded into fresh lists that only the caller references.
pub fn to_expanded(postings: &[&Posting]) -> Vec<Arc<PostingList>> {
    postings
        .iter()
        .map(|posting| match posting {
            Posting::Compact(list) => Arc::new(list.to_posting_list()),
            Posting::Expanded(list) => Arc::clone(list),
        })
        .collect()
}

/// Forward-only cursor over an expanded posting list.
#[derive(Debug, Clone)]
pub struct PostingCursor {
    list: Arc<PostingList>,
    pos: usize,
}

impl PostingCursor {
    pub fn new(list: Arc<PostingList>) -> Self {
        Self { list, pos: 0 }
    }

    #[inline]
    pub fn valid(&self) -> bool {
        self.pos < self.list.len()
    }

    /// Current document id. Must only be called while [`valid`](Self::valid).
    #[inline]
    pub fn id(&self) -> u32 {
        self.list.ids[self.pos]
    }

    /// Offsets of the current document.
    pub fn offsets(&self) -> &[TokenOffset] {
        self.list.offsets_at(self.pos)
    }

    #[inline]
    pub fn next(&mut self) {
        if self.valid() {
            self.pos += 1;
        }
    }

    /// Moves to the first document `>= id`. Never moves backward.
    pub fn skip_to(&mut self, id: u32) {
        if !self.valid() || self.id() >= id {
            return;
        }
        let remaining = &self.list.ids[self.pos..];
        self.pos += remaining.partition_point(|&doc| doc < id);
    }
}

/// Advances every cursor of the group to the next id present in all of them.
///
/// Returns false (leaving at least one cursor exhausted) when no common id is left.
/// An empty group never matches.
pub fn intersect(cursors: &mut [PostingCursor]) -> bool {
    if cursors.is_empty() {
        return false;
    }
    loop {
        let mut target = 0;
        for cursor in cursors.iter() {
            if !cursor.valid() {
                return false;
            }
            target = target.max(cursor.id());
        }
        if cursors.iter().all(|cursor| cursor.id() == target) {
            return true;
        }
        for cursor in cursors.iter_mut() {
            cursor.skip_to(target);
        }
    }
}

/// Checks whether the tokens of the group, all positioned on the same document,
/// form a complete field value (or a complete array element when
/// `field_is_array` is set).
pub fn has_exact_match(cursors: &[PostingCursor], field_is_array: bool) -> bool {
    let Some(first) = cursors.first() else {
        return false;
    };
    let last_index = cursors.len() - 1;

    first
        .offsets()
        .iter()
        .filter(|offset| offset.position == 0 && (field_is_array || offset.element == 0))
        .any(|start| {
            cursors.iter().enumerate().all(|(i, cursor)| {
                cursor.offsets().iter().any(|offset| {
                    offset.element == start.element
                        && offset.position == i as u32
                        && (i != last_index || offset.last)
                })
            })
        })
}

/// Id-only cursor over either posting representation, without decoding offsets.
pub enum IdCursor<'a> {
    Compact { data: &'a [u32], index: usize },
    Expanded { ids: &'a [u32], pos: usize },
}

impl IdCursor<'_> {
    pub fn valid(&self) -> bool {
        match self {
            IdCursor::Compact { data, index } => *index < data.len(),
            IdCursor::Expanded { ids, pos } => *pos < ids.len(),
        }
    }

    /// Current document id. Must only be called while [`valid`](Self::valid).
    pub fn id(&self) -> u32 {
        match self {
            IdCursor::Compact { data, index } => data[*index + data[*index] as usize + 1],
            IdCursor::Expanded { ids, pos } => ids[*pos],
        }
    }

    pub fn next(&mut self) {
        if !self.valid() {
            return;
        }
        match self {
            IdCursor::Compact { data, index } => *index += data[*index] as usize + 2,
            IdCursor::Expanded { pos, .. } => *pos += 1,
        }
    }

    /// Moves to the first document `>= id`.
    pub fn skip_to(&mut self, id: u32) {
        if let IdCursor::Expanded { ids, pos } = self {
            *pos += ids[(*pos).min(ids.len())..].partition_point(|&doc| doc < id);
            return;
        }
        while self.valid() && self.id() < id {
            self.next();
        }
    }
}
