//! Ordered numeric index: canonical `i64` value → ids of the documents holding it.
//!
//! Integer, float and bool fields all share this representation. Floats go through
//! [`float_to_i64`] and bools are stored as 0/1 before reaching the tree.

use std::collections::BTreeMap;
use std::ops::Bound;

use roaring::RoaringBitmap;

use crate::Comparator;

/// Maps an `f32` to an `i64` whose ordering matches the float ordering.
///
/// The sign bit of a negative float is kept while its magnitude bits are
/// inverted, so more negative values map to smaller integers. `-0.0` sorts just
/// below `0.0`.
pub fn float_to_i64(value: f32) -> i64 {
    let bits = value.to_bits() as i32;
    (bits ^ ((bits >> 31) & i32::MAX)) as i64
}

#[derive(Debug, Clone, Default)]
pub struct NumTree {
    values: BTreeMap<i64, RoaringBitmap>,
}

impl NumTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: i64, id: u32) {
        self.values.entry(value).or_default().insert(id);
    }

    pub fn remove(&mut self, value: i64, id: u32) {
        if let Some(ids) = self.values.get_mut(&value) {
            ids.remove(id);
            if ids.is_empty() {
                self.values.remove(&value);
            }
        }
    }

    /// Number of distinct values in the tree.
    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// Sorted, duplicate-free ids of the documents whose value satisfies
    /// `field <comparator> value`.
    pub fn search(&self, comparator: Comparator, value: i64) -> Vec<u32> {
        use Bound::*;
        match comparator {
            Comparator::Equals | Comparator::Contains | Comparator::RangeInclusive => self
                .values
                .get(&value)
                .map(|ids| ids.iter().collect())
                .unwrap_or_default(),
            Comparator::LessThan => self.collect_range((Unbounded, Excluded(value))),
            Comparator::LessThanEquals => self.collect_range((Unbounded, Included(value))),
            Comparator::GreaterThan => self.collect_range((Excluded(value), Unbounded)),
            Comparator::GreaterThanEquals => self.collect_range((Included(value), Unbounded)),
            Comparator::NotEquals => {
                let mut ids = RoaringBitmap::new();
                for (_, bitmap) in self.values.iter().filter(|(v, _)| **v != value) {
                    ids |= bitmap;
                }
                ids.iter().collect()
            }
        }
    }

    /// Ids of the documents whose value lies in `[low, high]`.
    pub fn range_inclusive_search(&self, low: i64, high: i64) -> Vec<u32> {
        if low > high {
            return Vec::new();
        }
        self.collect_range((Bound::Included(low), Bound::Included(high)))
    }

    fn collect_range(&self, range: (Bound<i64>, Bound<i64>)) -> Vec<u32> {
        let mut ids = RoaringBitmap::new();
        for (_, bitmap) in self.values.range(range) {
            ids |= bitmap;
        }
        ids.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NumTree {
        // id -> value: 0->10, 1->20, 2->10, 3->-5, 4->30, 5->20
        let mut tree = NumTree::new();
        for (id, value) in [10, 20, 10, -5, 30, 20].into_iter().enumerate() {
            tree.insert(value, id as u32);
        }
        tree
    }

    #[test]
    fn test_comparators() {
        let tree = sample();
        assert_eq!(tree.search(Comparator::Equals, 10), vec![0, 2]);
        assert_eq!(tree.search(Comparator::Equals, 11), Vec::<u32>::new());
        assert_eq!(tree.search(Comparator::LessThan, 20), vec![0, 2, 3]);
        assert_eq!(tree.search(Comparator::LessThanEquals, 20), vec![0, 1, 2, 3, 5]);
        assert_eq!(tree.search(Comparator::GreaterThan, 20), vec![4]);
        assert_eq!(tree.search(Comparator::GreaterThanEquals, 20), vec![1, 4, 5]);
        assert_eq!(tree.search(Comparator::NotEquals, 20), vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_range_inclusive() {
        let tree = sample();
        assert_eq!(tree.range_inclusive_search(-5, 10), vec![0, 2, 3]);
        assert_eq!(tree.range_inclusive_search(11, 19), Vec::<u32>::new());
        assert_eq!(tree.range_inclusive_search(30, 10), Vec::<u32>::new());
    }

    #[test]
    fn test_remove() {
        let mut tree = sample();
        tree.remove(30, 4);
        tree.remove(30, 4);
        assert_eq!(tree.num_values(), 3);
        assert!(tree.search(Comparator::GreaterThan, 20).is_empty());
    }

    #[test]
    fn test_float_encoding_preserves_order() {
        let values = [
            f32::NEG_INFINITY,
            -1000.5,
            -2.0,
            -1.0,
            -0.25,
            0.0,
            0.25,
            1.0,
            2.0,
            1e20,
            f32::INFINITY,
        ];
        for pair in values.windows(2) {
            assert!(
                float_to_i64(pair[0]) < float_to_i64(pair[1]),
                "{} should sort before {}",
                pair[0],
                pair[1]
            );
        }
        assert!(float_to_i64(-0.0) < float_to_i64(0.0));
    }
}
