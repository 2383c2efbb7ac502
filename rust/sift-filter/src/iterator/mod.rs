//! Pull-based evaluation of a filter tree.
//!
//! [`FilterResultIterator`] mirrors the shape of the [`FilterNode`] it was built
//! from: operator nodes own two child iterators and leaves either hold an eagerly
//! computed [`FilterResult`] (ids, all documents, numeric fields, joins) or a set of
//! posting-list cursors (string fields) that are advanced on demand.
//!
//! Every node exposes the same cursor: while [`is_valid`](FilterResultIterator::is_valid)
//! holds, [`seq_id`](FilterResultIterator::seq_id) is the current matching document
//! and positions only ever move forward until [`reset`](FilterResultIterator::reset).
//!
//! Problems such as an unknown referenced collection or a malformed numeric value
//! do not abort construction. The affected leaf becomes permanently invalid and the
//! error is kept for [`init_status`](FilterResultIterator::init_status).

mod eager;
mod tokens;

use std::cmp::Ordering;

use sift_common::{Result, error::Error};
use sift_index::Index;
use sift_text::Posting;

use crate::{
    CollectionLookup, FilterExpr, FilterNode, FilterOperator, FilterResult, ID_FIELD, References,
    array_ops,
};
use tokens::TokenLeaf;

/// Outcome of probing an iterator for a specific id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// No match is possible at or after the probed id.
    Exhausted,
    /// The probed id does not match, but later ids may.
    NoMatch,
    /// The iterator is positioned on the probed id.
    Match,
}

impl Validity {
    fn and(self, other: Validity) -> Validity {
        match (self, other) {
            (Validity::Exhausted, _) | (_, Validity::Exhausted) => Validity::Exhausted,
            (Validity::Match, Validity::Match) => Validity::Match,
            _ => Validity::NoMatch,
        }
    }

    fn or(self, other: Validity) -> Validity {
        match (self, other) {
            (Validity::Match, _) | (_, Validity::Match) => Validity::Match,
            (Validity::Exhausted, Validity::Exhausted) => Validity::Exhausted,
            _ => Validity::NoMatch,
        }
    }
}

enum NodeState<'a> {
    Operator {
        op: FilterOperator,
        left: Box<FilterResultIterator<'a>>,
        right: Box<FilterResultIterator<'a>>,
    },
    Materialized {
        result: FilterResult,
        index: usize,
    },
    Tokens(TokenLeaf),
    /// A leaf that can never match.
    Unmatched,
}

pub struct FilterResultIterator<'a> {
    collection_name: String,
    index: &'a Index,
    filter_node: &'a FilterNode,
    lookup: &'a dyn CollectionLookup,
    state: NodeState<'a>,
    seq_id: u32,
    is_valid: bool,
    reference: References,
    status: Option<Error>,
}

impl<'a> FilterResultIterator<'a> {
    /// Builds the iterator tree for `filter_node` over `index` and positions it on
    /// the first match.
    pub fn new(
        collection_name: impl Into<String>,
        index: &'a Index,
        filter_node: &'a FilterNode,
        lookup: &'a dyn CollectionLookup,
    ) -> Self {
        let collection_name = collection_name.into();
        let state = match filter_node {
            FilterNode::Operator { op, left, right } => NodeState::Operator {
                op: *op,
                left: Box::new(Self::new(collection_name.as_str(), index, left, lookup)),
                right: Box::new(Self::new(collection_name.as_str(), index, right, lookup)),
            },
            FilterNode::Leaf(_) => NodeState::Unmatched,
        };

        let mut iterator = Self {
            collection_name,
            index,
            filter_node,
            lookup,
            state,
            seq_id: 0,
            is_valid: true,
            reference: References::new(),
            status: None,
        };
        iterator.init();
        iterator
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Current matching document. Meaningful only while [`is_valid`](Self::is_valid).
    pub fn seq_id(&self) -> u32 {
        self.seq_id
    }

    /// Whether the iterator sits on a match, as of the last move.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Foreign ids matched by the current document, by referenced collection.
    pub fn reference(&self) -> &References {
        &self.reference
    }

    /// First error hit while building the tree, searching left subtrees first.
    pub fn init_status(&self) -> Result<()> {
        if let NodeState::Operator { left, right, .. } = &self.state {
            return left.init_status().and_then(|()| right.init_status());
        }
        match &self.status {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn init(&mut self) {
        let node = self.filter_node;
        match node {
            FilterNode::Operator { .. } => self.compose(),
            FilterNode::Leaf(expr) => self.init_leaf(expr),
        }
    }

    fn init_leaf(&mut self, expr: &FilterExpr) {
        self.state = match self.build_leaf(expr) {
            Ok(state) => state,
            Err(err) => {
                log::warn!("filter on `{}` failed: {err}", expr.field_name);
                self.status = Some(err);
                NodeState::Unmatched
            }
        };

        self.is_valid = true;
        self.reference.clear();
        match &mut self.state {
            NodeState::Materialized { .. } => self.load_materialized(),
            NodeState::Tokens(leaf) => match leaf.init() {
                Some(id) => self.seq_id = id,
                None => self.is_valid = false,
            },
            NodeState::Operator { .. } | NodeState::Unmatched => self.is_valid = false,
        }
    }

    fn build_leaf(&self, expr: &FilterExpr) -> Result<NodeState<'a>> {
        if expr.is_reference() {
            let result = eager::reference_filter(self.lookup, expr, &self.collection_name)?;
            return Ok(materialized(result));
        }

        if expr.field_name == ID_FIELD {
            return eager::id_filter(self.index, expr).map(materialized);
        }
        if expr.field_name == Index::SEQ_IDS_FIELD {
            return Ok(materialized(eager::seq_ids_filter(self.index)));
        }

        let field = match self.index.field(&expr.field_name) {
            Some(field) if self.index.field_is_indexed(&field.name) => field,
            _ => {
                log::debug!("field `{}` is not indexed", expr.field_name);
                return Ok(NodeState::Unmatched);
            }
        };

        if field.is_string() {
            Ok(NodeState::Tokens(TokenLeaf::new(self.index, expr, field)))
        } else {
            eager::numeric_filter(self.index, expr, field).map(materialized)
        }
    }

    /// Positions a materialized leaf on its current result index.
    fn load_materialized(&mut self) {
        let NodeState::Materialized { result, index } = &self.state else {
            return;
        };
        if *index < result.count() {
            self.seq_id = result.docs()[*index];
            result.copy_references_at(*index, &mut self.reference);
        } else {
            self.is_valid = false;
        }
    }

    /// Recomputes the position of an operator node from its children.
    fn compose(&mut self) {
        let NodeState::Operator { op, left, right } = &mut self.state else {
            return;
        };
        let matched = match op {
            FilterOperator::And => and_filter_iterators(left, right, &mut self.reference),
            FilterOperator::Or => or_filter_iterators(left, right, &mut self.reference),
        };
        match matched {
            Some(id) => self.seq_id = id,
            None => self.is_valid = false,
        }
    }

    /// Moves to the next match.
    pub fn next(&mut self) {
        if !self.is_valid {
            return;
        }

        match &mut self.state {
            NodeState::Operator { op, left, right } => {
                match op {
                    FilterOperator::And => {
                        left.next();
                        right.next();
                    }
                    FilterOperator::Or => {
                        let seq_id = self.seq_id;
                        if left.is_valid && left.seq_id == seq_id {
                            left.next();
                        }
                        if right.is_valid && right.seq_id == seq_id {
                            right.next();
                        }
                    }
                }
                self.compose();
            }
            NodeState::Materialized { index, .. } => {
                *index += 1;
                self.load_materialized();
            }
            NodeState::Tokens(leaf) => match leaf.next(self.seq_id) {
                Some(id) => self.seq_id = id,
                None => self.is_valid = false,
            },
            NodeState::Unmatched => self.is_valid = false,
        }
    }

    /// Re-validates the current position against the children or leaf state.
    pub fn valid(&mut self) -> bool {
        if !self.is_valid {
            return false;
        }

        self.is_valid = match &mut self.state {
            NodeState::Operator { op, left, right } => match op {
                FilterOperator::And => left.valid() && right.valid(),
                FilterOperator::Or => left.valid() || right.valid(),
            },
            NodeState::Materialized { result, index } => *index < result.count(),
            NodeState::Tokens(leaf) => leaf.valid(),
            NodeState::Unmatched => false,
        };
        self.is_valid
    }

    /// Moves to the first match `>= id`. Never moves backward.
    pub fn skip_to(&mut self, id: u32) {
        if !self.is_valid || id <= self.seq_id {
            return;
        }

        match &mut self.state {
            NodeState::Operator { left, right, .. } => {
                left.skip_to(id);
                right.skip_to(id);
                self.compose();
            }
            NodeState::Materialized { result, index } => {
                *index += result.docs()[*index..].partition_point(|&doc| doc < id);
                self.load_materialized();
            }
            NodeState::Tokens(leaf) => match leaf.skip_to(id) {
                Some(next) => self.seq_id = next,
                None => self.is_valid = false,
            },
            NodeState::Unmatched => self.is_valid = false,
        }
    }

    /// Probes `id`, moving the iterator to the first match `>= id`.
    pub fn valid_at(&mut self, id: u32) -> Validity {
        if !self.is_valid {
            return Validity::Exhausted;
        }

        if let NodeState::Operator { op, left, right } = &mut self.state {
            let (left_valid, right_valid) = (left.valid_at(id), right.valid_at(id));
            let combined = match op {
                FilterOperator::And => left_valid.and(right_valid),
                FilterOperator::Or => left_valid.or(right_valid),
            };
            self.compose();
            return if self.is_valid {
                combined
            } else {
                Validity::Exhausted
            };
        }

        self.skip_to(id);
        if !self.is_valid {
            Validity::Exhausted
        } else if self.seq_id == id {
            Validity::Match
        } else {
            Validity::NoMatch
        }
    }

    /// Returns to the first match. String leaves release their cursors and
    /// rebuild them.
    pub fn reset(&mut self) {
        self.is_valid = true;
        self.reference.clear();

        match &mut self.state {
            NodeState::Operator { left, right, .. } => {
                left.reset();
                right.reset();
                self.compose();
            }
            NodeState::Materialized { index, .. } => {
                *index = 0;
                self.load_materialized();
            }
            NodeState::Tokens(_) => {
                let node = self.filter_node;
                if let FilterNode::Leaf(expr) = node {
                    self.init_leaf(expr);
                }
            }
            NodeState::Unmatched => self.is_valid = false,
        }
    }

    /// Iterates over the remaining matches, advancing this iterator.
    pub fn ids(&mut self) -> impl Iterator<Item = u32> + '_ {
        std::iter::from_fn(move || {
            if !self.is_valid {
                return None;
            }
            let id = self.seq_id;
            self.next();
            Some(id)
        })
    }

    /// Drains the remaining matches into a sorted array.
    pub fn to_filter_id_array(&mut self) -> Vec<u32> {
        if !self.is_valid {
            return Vec::new();
        }

        if let NodeState::Materialized { result, index } = &mut self.state {
            let ids = result.docs()[*index..].to_vec();
            *index = result.count();
            self.is_valid = false;
            return ids;
        }

        self.ids().collect()
    }

    /// Intersects the remaining matches with the sorted array `ids`.
    ///
    /// Materialized leaves are left in place; other nodes are advanced by probing
    /// each element of `ids`.
    pub fn and_scalar(&mut self, ids: &[u32]) -> Vec<u32> {
        if !self.is_valid {
            return Vec::new();
        }

        if let NodeState::Materialized { result, index } = &self.state {
            return array_ops::and_scalar(ids, &result.docs()[*index..]);
        }

        let mut matches = Vec::new();
        for &id in ids {
            match self.valid_at(id) {
                Validity::Exhausted => break,
                Validity::Match => matches.push(id),
                Validity::NoMatch => {}
            }
        }
        matches
    }

    /// Appends up to `n` matches to `results`, advancing past them.
    pub fn get_n_ids(&mut self, n: usize, results: &mut Vec<u32>) {
        if !self.is_valid {
            return;
        }

        if let NodeState::Materialized { result, index } = &mut self.state {
            let end = index.saturating_add(n).min(result.count());
            results.extend_from_slice(&result.docs()[*index..end]);
            *index = end;
            self.load_materialized();
            return;
        }

        results.extend(self.ids().take(n));
    }

    /// Checks whether any remaining match also appears in `posting`, advancing
    /// whichever side lags.
    pub fn contains_atleast_one(&mut self, posting: &Posting) -> bool {
        let mut cursor = posting.id_cursor();
        while cursor.valid() && self.is_valid {
            let id = cursor.id();
            match id.cmp(&self.seq_id) {
                Ordering::Equal => return true,
                Ordering::Less => cursor.skip_to(self.seq_id),
                Ordering::Greater => self.skip_to(id),
            }
        }
        false
    }
}

fn materialized<'a>(result: FilterResult) -> NodeState<'a> {
    log::trace!("materialized {} ids", result.count());
    NodeState::Materialized { result, index: 0 }
}

/// Advances the lagging child until both children agree on an id.
fn and_filter_iterators(
    left: &mut FilterResultIterator,
    right: &mut FilterResultIterator,
    reference: &mut References,
) -> Option<u32> {
    while left.is_valid && right.is_valid {
        match left.seq_id.cmp(&right.seq_id) {
            Ordering::Less => left.skip_to(right.seq_id),
            Ordering::Greater => right.skip_to(left.seq_id),
            Ordering::Equal => {
                merge_references(reference, &left.reference, Some(&right.reference));
                return Some(left.seq_id);
            }
        }
    }
    None
}

/// Takes the smaller id of the valid children.
fn or_filter_iterators(
    left: &FilterResultIterator,
    right: &FilterResultIterator,
    reference: &mut References,
) -> Option<u32> {
    match (left.is_valid, right.is_valid) {
        (true, true) => match left.seq_id.cmp(&right.seq_id) {
            Ordering::Less => {
                merge_references(reference, &left.reference, None);
                Some(left.seq_id)
            }
            Ordering::Greater => {
                merge_references(reference, &right.reference, None);
                Some(right.seq_id)
            }
            Ordering::Equal => {
                merge_references(reference, &left.reference, Some(&right.reference));
                Some(left.seq_id)
            }
        },
        (true, false) => {
            merge_references(reference, &left.reference, None);
            Some(left.seq_id)
        }
        (false, true) => {
            merge_references(reference, &right.reference, None);
            Some(right.seq_id)
        }
        (false, false) => None,
    }
}

/// Replaces `into` with `first`, overwritten by `second` on shared collections.
fn merge_references(into: &mut References, first: &References, second: Option<&References>) {
    into.clear();
    for (name, refs) in first.iter().chain(second.into_iter().flatten()) {
        into.insert(name.clone(), refs.clone());
    }
}
