//! Lazy evaluation of string filters over posting-list cursors.

use sift_index::{Comparator, FieldSchema, Index};
use sift_text::{Posting, PostingCursor, posting};

use crate::FilterExpr;

/// Cursor groups of one string filter: a group per filter value whose tokens
/// all resolved to a posting, one cursor per token.
///
/// Values are ORed together and the tokens of a value are ANDed.
pub(super) struct TokenMatcher {
    groups: Vec<Vec<PostingCursor>>,
    exact: bool,
    field_is_array: bool,
}

impl TokenMatcher {
    pub fn new(index: &Index, expr: &FilterExpr, field: &FieldSchema) -> Self {
        let mut groups = Vec::with_capacity(expr.values.len());

        if let Some(terms) = index.token_index(&field.name) {
            for value in &expr.values {
                let tokens = index.tokenize(&field.name, value);
                if tokens.is_empty() {
                    continue;
                }

                let postings: Option<Vec<&Posting>> =
                    tokens.iter().map(|token| terms.lookup(token)).collect();
                let Some(postings) = postings else {
                    log::trace!("`{}`: value `{value}` has unknown tokens", field.name);
                    continue;
                };

                let group = posting::to_expanded(&postings)
                    .into_iter()
                    .map(PostingCursor::new)
                    .collect();
                groups.push(group);
            }
        }

        Self {
            groups,
            exact: expr
                .comparators
                .first()
                .is_some_and(|comparator| comparator.requires_exact_match()),
            field_is_array: field.is_array,
        }
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Positions every group on its next match and returns the lowest matching id.
    pub fn current_match(&mut self) -> Option<u32> {
        let (exact, field_is_array) = (self.exact, self.field_is_array);
        let mut lowest: Option<u32> = None;

        for group in &mut self.groups {
            let matched = if exact {
                loop {
                    if !posting::intersect(group) {
                        break false;
                    }
                    if posting::has_exact_match(group, field_is_array) {
                        break true;
                    }
                    group.iter_mut().for_each(PostingCursor::next);
                }
            } else {
                posting::intersect(group)
            };

            if matched {
                let id = group[0].id();
                lowest = Some(lowest.map_or(id, |lowest| lowest.min(id)));
            }
        }
        lowest
    }

    /// True when some group has all of its cursors on one id.
    pub fn is_aligned(&self) -> bool {
        self.groups.iter().any(|group| {
            group.first().is_some_and(|head| {
                head.valid()
                    && group
                        .iter()
                        .all(|cursor| cursor.valid() && cursor.id() == head.id())
            })
        })
    }

    /// Steps every group positioned on `id` past it.
    pub fn advance_from(&mut self, id: u32) {
        for group in &mut self.groups {
            if group[0].valid() && group[0].id() == id {
                group.iter_mut().for_each(PostingCursor::next);
            }
        }
    }

    pub fn skip_to(&mut self, id: u32) {
        for cursor in self.groups.iter_mut().flatten() {
            cursor.skip_to(id);
        }
    }
}

/// String leaf state: either the positive matcher itself or its complement
/// over the dense id range `[0, last_id]`.
pub(super) struct TokenLeaf {
    matcher: TokenMatcher,
    complement: Option<Complement>,
}

struct Complement {
    /// Largest id of the collection, `None` when it holds no documents.
    last_id: Option<u32>,
    /// Current positive match, the next id the complement must step over.
    next_excluded: Option<u32>,
}

impl TokenLeaf {
    pub fn new(index: &Index, expr: &FilterExpr, field: &FieldSchema) -> Self {
        let matcher = TokenMatcher::new(index, expr, field);
        log::trace!(
            "`{}`: {} of {} values resolved to postings",
            field.name,
            matcher.num_groups(),
            expr.values.len()
        );

        // A NotEquals comparator and the leaf toggle both select the complement.
        let negated =
            expr.apply_not_equals || expr.comparators.first() == Some(&Comparator::NotEquals);
        let seq_ids = index.seq_ids();
        let complement = negated.then(|| Complement {
            last_id: (seq_ids.num_ids() > 0).then(|| seq_ids.last_id()),
            next_excluded: None,
        });

        Self {
            matcher,
            complement,
        }
    }

    /// First position of the leaf.
    pub fn init(&mut self) -> Option<u32> {
        let first = self.matcher.current_match();
        match &mut self.complement {
            None => first,
            Some(complement) => {
                complement.next_excluded = first;
                complement.settle(&mut self.matcher, 0)
            }
        }
    }

    /// Position following `current`.
    pub fn next(&mut self, current: u32) -> Option<u32> {
        match &mut self.complement {
            None => {
                self.matcher.advance_from(current);
                self.matcher.current_match()
            }
            Some(complement) => complement.settle(&mut self.matcher, current.checked_add(1)?),
        }
    }

    /// First position `>= id`; `id` must be past `current`.
    pub fn skip_to(&mut self, id: u32) -> Option<u32> {
        match &mut self.complement {
            None => {
                self.matcher.skip_to(id);
                self.matcher.current_match()
            }
            Some(complement) => complement.settle(&mut self.matcher, id),
        }
    }

    /// Re-checks the current position without moving any cursor.
    pub fn valid(&self) -> bool {
        match &self.complement {
            None => self.matcher.is_aligned(),
            Some(complement) => complement.last_id.is_some(),
        }
    }
}

impl Complement {
    /// Smallest complement id `>= candidate`, stepping over runs of positive
    /// matches.
    fn settle(&mut self, matcher: &mut TokenMatcher, mut candidate: u32) -> Option<u32> {
        let last_id = self.last_id?;
        loop {
            if candidate > last_id {
                return None;
            }
            match self.next_excluded {
                Some(excluded) if excluded <= candidate => {
                    if excluded == candidate {
                        candidate = candidate.checked_add(1)?;
                    }
                    matcher.skip_to(candidate);
                    self.next_excluded = matcher.current_match();
                }
                _ => return Some(candidate),
            }
        }
    }
}
