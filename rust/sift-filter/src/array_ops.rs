//! Set operations over strictly ascending id streams.

use std::{cmp::Ordering, iter::Peekable};

/// Creates an iterator over the set-intersection of two strictly ascending streams.
///
/// Complexity: O(len(a) + len(b)) comparisons, constant extra memory.
pub fn intersect<T, L, R>(a: L, b: R) -> Intersection<L::IntoIter, R::IntoIter>
where
    T: Ord,
    L: IntoIterator<Item = T>,
    R: IntoIterator<Item = T>,
{
    Intersection {
        a: a.into_iter().peekable(),
        b: b.into_iter().peekable(),
    }
}

/// Creates an iterator over the items of `a` that are absent from `b`.
///
/// Both inputs must be strictly ascending. Complexity: O(len(a) + len(b)).
pub fn difference<T, L, R>(a: L, b: R) -> Difference<L::IntoIter, R::IntoIter>
where
    T: Ord,
    L: IntoIterator<Item = T>,
    R: IntoIterator<Item = T>,
{
    Difference {
        a: a.into_iter(),
        b: b.into_iter().peekable(),
    }
}

/// Sorted intersection of two sorted id arrays.
pub fn and_scalar(a: &[u32], b: &[u32]) -> Vec<u32> {
    intersect(a.iter().copied(), b.iter().copied()).collect()
}

/// Ids of `all` that do not appear in `excluded`.
pub fn exclude_scalar(all: &[u32], excluded: &[u32]) -> Vec<u32> {
    difference(all.iter().copied(), excluded.iter().copied()).collect()
}

/// Iterator adapter implementing [`intersect`].
pub struct Intersection<I: Iterator, J: Iterator> {
    a: Peekable<I>,
    b: Peekable<J>,
}

impl<I, J, T> Iterator for Intersection<I, J>
where
    I: Iterator<Item = T>,
    J: Iterator<Item = T>,
    T: Ord,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            let ordering = match (self.a.peek(), self.b.peek()) {
                (Some(a), Some(b)) => a.cmp(b),
                _ => return None,
            };
            match ordering {
                Ordering::Less => {
                    self.a.next();
                }
                Ordering::Greater => {
                    self.b.next();
                }
                Ordering::Equal => {
                    self.b.next();
                    return self.a.next();
                }
            }
        }
    }
}

/// Iterator adapter implementing [`difference`].
pub struct Difference<I: Iterator, J: Iterator> {
    a: I,
    b: Peekable<J>,
}

impl<I, J, T> Iterator for Difference<I, J>
where
    I: Iterator<Item = T>,
    J: Iterator<Item = T>,
    T: Ord,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        'outer: for item in self.a.by_ref() {
            while let Some(excluded) = self.b.peek() {
                match excluded.cmp(&item) {
                    Ordering::Less => {
                        self.b.next();
                    }
                    Ordering::Equal => continue 'outer,
                    Ordering::Greater => break,
                }
            }
            return Some(item);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_scalar() {
        assert_eq!(and_scalar(&[1, 3, 5, 7, 9], &[0, 3, 4, 9, 12]), vec![3, 9]);
        assert_eq!(and_scalar(&[], &[1, 2]), Vec::<u32>::new());
        assert_eq!(and_scalar(&[1, 2], &[3, 4]), Vec::<u32>::new());
        assert_eq!(and_scalar(&[5], &[5]), vec![5]);
    }

    #[test]
    fn test_exclude_scalar() {
        let all: Vec<u32> = (0..10).collect();
        assert_eq!(exclude_scalar(&all, &[3, 7]), vec![0, 1, 2, 4, 5, 6, 8, 9]);
        assert_eq!(exclude_scalar(&all, &[]), all);
        assert_eq!(exclude_scalar(&[2, 4], &[0, 1, 2, 3, 4, 5]), Vec::<u32>::new());
        // excluded ids outside of `all` are ignored
        assert_eq!(exclude_scalar(&[10, 20, 30], &[15, 20, 99]), vec![10, 30]);
    }

    #[test]
    fn test_generic_streams() {
        let out: Vec<&str> = intersect(["a", "c", "e"], ["b", "c", "e"]).collect();
        assert_eq!(out, vec!["c", "e"]);
        let out: Vec<&str> = difference(["a", "c", "e"], ["c"]).collect();
        assert_eq!(out, vec!["a", "e"]);
    }
}
