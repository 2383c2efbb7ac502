//! Materialized filter results and their merge-join algebra.
//!
//! A [`FilterResult`] is a strictly ascending array of sequence ids plus, for every
//! referenced collection that contributed to it, an index-aligned array of
//! [`ReferenceFilterResult`]s recording which foreign documents matched each id.

use std::cmp::Ordering;

use ahash::AHashMap;
use sift_common::{Result, error::Error};

/// Foreign document ids that matched on behalf of one local document.
///
/// An empty result marks a document that carries no match from that collection,
/// which happens when a union combines it with a side that has no reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFilterResult {
    pub docs: Vec<u32>,
}

impl ReferenceFilterResult {
    pub fn new(docs: Vec<u32>) -> Self {
        Self { docs }
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Per-document reference annotations: collection name → matched foreign ids.
pub type References = AHashMap<String, ReferenceFilterResult>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterResult {
    docs: Vec<u32>,
    reference_filter_results: AHashMap<String, Vec<ReferenceFilterResult>>,
}

impl FilterResult {
    /// Wraps an id array with no reference annotations.
    ///
    /// Fails unless `docs` is strictly ascending.
    pub fn new(docs: Vec<u32>) -> Result<Self> {
        Self::with_references(docs, AHashMap::new())
    }

    /// Wraps ids already known to be strictly ascending.
    pub(crate) fn from_sorted(docs: Vec<u32>) -> Self {
        debug_assert!(is_strictly_ascending(&docs));
        Self {
            docs,
            reference_filter_results: AHashMap::new(),
        }
    }

    /// Wraps ids together with per-collection annotations, each of which must be
    /// aligned with `docs`.
    pub fn with_references(
        docs: Vec<u32>,
        reference_filter_results: AHashMap<String, Vec<ReferenceFilterResult>>,
    ) -> Result<Self> {
        if !is_strictly_ascending(&docs) {
            return Err(Error::invalid_arg("docs", "ids must be strictly ascending"));
        }
        if let Some((name, refs)) = reference_filter_results
            .iter()
            .find(|(_, refs)| refs.len() != docs.len())
        {
            return Err(Error::invalid_arg(
                name.as_str(),
                format!("{} references for {} documents", refs.len(), docs.len()),
            ));
        }
        Ok(Self {
            docs,
            reference_filter_results,
        })
    }

    pub fn count(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn docs(&self) -> &[u32] {
        &self.docs
    }

    pub fn into_docs(self) -> Vec<u32> {
        self.docs
    }

    /// Annotations of collection `name`, aligned with [`docs`](Self::docs).
    pub fn references(&self, name: &str) -> Option<&[ReferenceFilterResult]> {
        self.reference_filter_results.get(name).map(Vec::as_slice)
    }

    pub fn referenced_collections(&self) -> impl Iterator<Item = &str> {
        self.reference_filter_results.keys().map(String::as_str)
    }

    pub fn has_references(&self) -> bool {
        !self.reference_filter_results.is_empty()
    }

    /// Annotations of the document at `index` from every collection.
    pub fn references_at(&self, index: usize) -> References {
        let mut references = References::with_capacity(self.reference_filter_results.len());
        self.copy_references_at(index, &mut references);
        references
    }

    /// Replaces the contents of `out` with the annotations of the document at `index`.
    pub(crate) fn copy_references_at(&self, index: usize, out: &mut References) {
        out.clear();
        for (name, refs) in &self.reference_filter_results {
            out.insert(name.clone(), refs[index].clone());
        }
    }

    /// Intersection of `a` and `b`.
    ///
    /// Each output document carries the annotations of both inputs; on a
    /// collection present in both, `b`'s annotation wins.
    pub fn and_filter_results(a: &FilterResult, b: &FilterResult) -> FilterResult {
        if a.is_empty() || b.is_empty() {
            return FilterResult::default();
        }

        let capacity = a.count().min(b.count());
        let mut result = FilterResult::merge_target(a, b, capacity);
        let (mut i, mut j) = (0, 0);

        while i < a.count() && j < b.count() {
            match a.docs[i].cmp(&b.docs[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    result.push_doc(a.docs[i]);
                    result.copy_last_references(a, i);
                    result.copy_last_references(b, j);
                    i += 1;
                    j += 1;
                }
            }
        }

        result.shrink_to_fit();
        result
    }

    /// Duplicate-free union of `a` and `b`.
    ///
    /// Each output document carries the annotations of whichever inputs hold it;
    /// when both do, `b`'s annotation wins on a shared collection.
    pub fn or_filter_results(a: &FilterResult, b: &FilterResult) -> FilterResult {
        if a.is_empty() {
            return b.clone();
        }
        if b.is_empty() {
            return a.clone();
        }

        let mut result = FilterResult::merge_target(a, b, a.count() + b.count());
        let (mut i, mut j) = (0, 0);

        while i < a.count() && j < b.count() {
            match a.docs[i].cmp(&b.docs[j]) {
                Ordering::Less => {
                    result.append_unique(a, i);
                    i += 1;
                }
                Ordering::Greater => {
                    result.append_unique(b, j);
                    j += 1;
                }
                Ordering::Equal => {
                    result.append_unique(a, i);
                    result.copy_last_references(b, j);
                    i += 1;
                    j += 1;
                }
            }
        }
        for i in i..a.count() {
            result.append_unique(a, i);
        }
        for j in j..b.count() {
            result.append_unique(b, j);
        }

        result.shrink_to_fit();
        result
    }

    /// Empty result with a reference array for every collection of `a` and `b`.
    fn merge_target(a: &FilterResult, b: &FilterResult, capacity: usize) -> FilterResult {
        let mut result = FilterResult {
            docs: Vec::with_capacity(capacity),
            reference_filter_results: AHashMap::new(),
        };
        for name in a.referenced_collections().chain(b.referenced_collections()) {
            result
                .reference_filter_results
                .entry(name.to_string())
                .or_insert_with(|| Vec::with_capacity(capacity));
        }
        result
    }

    fn push_doc(&mut self, id: u32) {
        self.docs.push(id);
        for refs in self.reference_filter_results.values_mut() {
            refs.push(ReferenceFilterResult::default());
        }
    }

    /// Appends `source.docs[index]` unless it equals the last appended id, then
    /// copies its annotations into the last slot.
    fn append_unique(&mut self, source: &FilterResult, index: usize) {
        let id = source.docs[index];
        if self.docs.last() != Some(&id) {
            self.push_doc(id);
        }
        self.copy_last_references(source, index);
    }

    fn copy_last_references(&mut self, source: &FilterResult, index: usize) {
        let slot = self.docs.len() - 1;
        for (name, refs) in &source.reference_filter_results {
            if let Some(target) = self.reference_filter_results.get_mut(name) {
                target[slot] = refs[index].clone();
            }
        }
    }

    fn shrink_to_fit(&mut self) {
        self.docs.shrink_to_fit();
        for refs in self.reference_filter_results.values_mut() {
            refs.shrink_to_fit();
        }
    }
}

fn is_strictly_ascending(docs: &[u32]) -> bool {
    docs.windows(2).all(|w| w[0] < w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotated(docs: &[u32], name: &str, foreign: &[u32]) -> FilterResult {
        let refs = foreign
            .iter()
            .map(|&id| ReferenceFilterResult::new(vec![id]))
            .collect();
        let mut map = AHashMap::new();
        map.insert(name.to_string(), refs);
        FilterResult::with_references(docs.to_vec(), map).unwrap()
    }

    fn foreign_ids(result: &FilterResult, name: &str) -> Vec<Vec<u32>> {
        result
            .references(name)
            .unwrap()
            .iter()
            .map(|r| r.docs.clone())
            .collect()
    }

    #[test]
    fn test_and_plain() {
        let a = FilterResult::from_sorted(vec![1, 3, 5, 7, 9]);
        let b = FilterResult::from_sorted(vec![2, 3, 4, 9, 10]);
        let result = FilterResult::and_filter_results(&a, &b);
        assert_eq!(result.docs(), &[3, 9]);
        assert!(!result.has_references());

        let disjoint = FilterResult::from_sorted(vec![100]);
        assert!(FilterResult::and_filter_results(&a, &disjoint).is_empty());
        assert!(FilterResult::and_filter_results(&a, &FilterResult::default()).is_empty());
    }

    #[test]
    fn test_and_references() {
        let a = annotated(&[1, 2, 3], "r", &[10, 20, 30]);
        let mut b = annotated(&[2, 3, 4], "r", &[21, 31, 41]);
        b.reference_filter_results.insert(
            "s".to_string(),
            vec![
                ReferenceFilterResult::new(vec![7]),
                ReferenceFilterResult::default(),
                ReferenceFilterResult::new(vec![8]),
            ],
        );

        let result = FilterResult::and_filter_results(&a, &b);
        assert_eq!(result.docs(), &[2, 3]);
        assert_eq!(foreign_ids(&result, "r"), vec![vec![21], vec![31]]);
        assert_eq!(foreign_ids(&result, "s"), vec![vec![7], vec![]]);
    }

    #[test]
    fn test_or_references_right_wins() {
        let a = annotated(&[1, 3, 5], "r", &[10, 11, 12]);
        let b = annotated(&[3, 4], "r", &[99, 20]);
        let result = FilterResult::or_filter_results(&a, &b);
        assert_eq!(result.docs(), &[1, 3, 4, 5]);
        assert_eq!(
            foreign_ids(&result, "r"),
            vec![vec![10], vec![99], vec![20], vec![12]]
        );
    }

    #[test]
    fn test_or_fills_missing_collections() {
        let a = annotated(&[1, 4], "r", &[10, 40]);
        let b = annotated(&[2, 4], "s", &[20, 41]);
        let result = FilterResult::or_filter_results(&a, &b);
        assert_eq!(result.docs(), &[1, 2, 4]);
        assert_eq!(foreign_ids(&result, "r"), vec![vec![10], vec![], vec![40]]);
        assert_eq!(foreign_ids(&result, "s"), vec![vec![], vec![20], vec![41]]);

        let refs = result.references_at(2);
        assert_eq!(refs["r"].docs, vec![40]);
        assert_eq!(refs["s"].docs, vec![41]);
    }

    #[test]
    fn test_or_with_empty_side_copies_other() {
        let a = annotated(&[1, 2], "r", &[5, 6]);
        let result = FilterResult::or_filter_results(&a, &FilterResult::default());
        assert_eq!(result, a);
        let result = FilterResult::or_filter_results(&FilterResult::default(), &a);
        assert_eq!(result, a);
    }

    #[test]
    fn test_or_tails_and_exact_size() {
        let a = FilterResult::from_sorted(vec![1, 2, 3]);
        let b = FilterResult::from_sorted(vec![3, 8, 9, 10]);
        let result = FilterResult::or_filter_results(&a, &b);
        assert_eq!(result.docs(), &[1, 2, 3, 8, 9, 10]);
        assert_eq!(result.docs.capacity(), result.count());
    }

    #[test]
    fn test_misaligned_references_are_rejected() {
        let mut map = AHashMap::new();
        map.insert("r".to_string(), vec![ReferenceFilterResult::default()]);
        assert!(FilterResult::with_references(vec![1, 2], map).is_err());
        assert!(FilterResult::with_references(vec![2, 1], AHashMap::new()).is_err());
    }

    #[test]
    fn test_unordered_ids_are_rejected() {
        let err = FilterResult::new(vec![5, 1, 3]).unwrap_err();
        assert_eq!(err.code(), 400);
        assert!(FilterResult::new(vec![1, 3, 3]).is_err());
        assert!(FilterResult::new(vec![]).unwrap().is_empty());
        assert_eq!(FilterResult::new(vec![1, 3, 5]).unwrap().docs(), &[1, 3, 5]);
    }

    #[test]
    fn test_randomized_against_btree_sets() {
        use std::collections::BTreeSet;

        fastrand::seed(7_341_019);
        for _ in 0..200 {
            let a: BTreeSet<u32> = (0..fastrand::usize(0..40))
                .map(|_| fastrand::u32(0..100))
                .collect();
            let b: BTreeSet<u32> = (0..fastrand::usize(0..40))
                .map(|_| fastrand::u32(0..100))
                .collect();
            let ra = FilterResult::from_sorted(a.iter().copied().collect());
            let rb = FilterResult::from_sorted(b.iter().copied().collect());

            let and = FilterResult::and_filter_results(&ra, &rb);
            let expected: Vec<u32> = a.intersection(&b).copied().collect();
            assert_eq!(and.docs(), expected.as_slice());

            let or = FilterResult::or_filter_results(&ra, &rb);
            let expected: Vec<u32> = a.union(&b).copied().collect();
            assert_eq!(or.docs(), expected.as_slice());
        }
    }
}
