use roaring::RoaringBitmap;

/// Compressed set of the sequence ids present in a collection.
#[derive(Debug, Clone, Default)]
pub struct SeqIdSet {
    ids: RoaringBitmap,
}

impl SeqIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u32) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: u32) -> bool {
        self.ids.remove(id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(id)
    }

    pub fn num_ids(&self) -> u32 {
        self.ids.len() as u32
    }

    /// Largest id in the set, 0 when empty.
    pub fn last_id(&self) -> u32 {
        self.ids.max().unwrap_or(0)
    }

    /// Decompresses the set into a sorted id array owned by the caller.
    pub fn uncompress(&self) -> Vec<u32> {
        self.ids.iter().collect()
    }
}

impl FromIterator<u32> for SeqIdSet {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_id_set() {
        let mut set: SeqIdSet = [9, 2, 5].into_iter().collect();
        assert_eq!(set.num_ids(), 3);
        assert_eq!(set.last_id(), 9);
        assert!(set.insert(0));
        assert!(!set.insert(5));
        assert!(set.remove(9));
        assert_eq!(set.uncompress(), vec![0, 2, 5]);
        assert_eq!(SeqIdSet::new().last_id(), 0);
    }
}
