//! Cross-collection lookup used by join filters.
//!
//! A join leaf names another collection and a filter to run there. The iterator
//! resolves the collection through a [`CollectionLookup`] handed to it at
//! construction and asks it which documents of the requesting collection are
//! referenced by the documents matching that filter.

use std::sync::Arc;

use ahash::AHashMap;
use sift_common::Result;

use crate::FilterResult;

/// A collection that can evaluate filters on behalf of the collections
/// referencing it.
pub trait ReferenceCollection: Send + Sync + 'static {
    /// Name under which the collection is registered.
    fn name(&self) -> &str;

    /// Evaluates `filter_query` on this collection and returns the ids of the
    /// `requesting_collection` documents that reference a matching document.
    ///
    /// The result carries, for every returned id, the matching foreign ids under
    /// this collection's name.
    fn get_reference_filter_ids(
        &self,
        filter_query: &str,
        requesting_collection: &str,
    ) -> Result<FilterResult>;
}

/// Resolves collections by name.
pub trait CollectionLookup {
    fn get_collection(&self, name: &str) -> Option<Arc<dyn ReferenceCollection>>;
}

/// Explicit name → collection map.
#[derive(Default, Clone)]
pub struct CollectionRegistry {
    collections: AHashMap<String, Arc<dyn ReferenceCollection>>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `collection` under its own name, replacing any previous entry.
    pub fn add(&mut self, collection: impl Into<Arc<dyn ReferenceCollection>>) {
        let collection = collection.into();
        let name = collection.name().to_string();
        if self.collections.insert(name.clone(), collection).is_some() {
            log::debug!("replaced registered collection `{name}`");
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn ReferenceCollection>> {
        self.collections.remove(name)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

impl CollectionLookup for CollectionRegistry {
    fn get_collection(&self, name: &str) -> Option<Arc<dyn ReferenceCollection>> {
        self.collections.get(name).cloned()
    }
}
