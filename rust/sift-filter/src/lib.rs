//! Lazy evaluation of filter expressions over an in-memory [`sift_index::Index`].
//!
//! A [`FilterNode`] tree of AND/OR operators over field predicates is turned into a
//! [`FilterResultIterator`], a pull cursor producing matching sequence ids in
//! ascending order:
//!
//! ```rust
//! use serde_json::json;
//! use sift_filter::{CollectionRegistry, FilterExpr, FilterNode, FilterResultIterator};
//! use sift_index::{Comparator, FieldKind, FieldSchema, Index, IndexOptions, Schema};
//!
//! let schema = Schema::new(vec![
//!     FieldSchema::new("title", FieldKind::String),
//!     FieldSchema::new("stock", FieldKind::Int32),
//! ])
//! .unwrap();
//! let mut index = Index::new(schema, IndexOptions::default()).unwrap();
//! index.index_document(0, &json!({"title": "red shoes", "stock": 3})).unwrap();
//! index.index_document(1, &json!({"title": "blue shoes", "stock": 0})).unwrap();
//! index.index_document(2, &json!({"title": "red hat", "stock": 8})).unwrap();
//!
//! let filter = FilterNode::and(
//!     FilterExpr::single("title", Comparator::Contains, "red"),
//!     FilterExpr::single("stock", Comparator::GreaterThan, "0"),
//! );
//! let collections = CollectionRegistry::new();
//! let mut iterator = FilterResultIterator::new("products", &index, &filter, &collections);
//! assert!(iterator.init_status().is_ok());
//! assert_eq!(iterator.to_filter_id_array(), vec![0, 2]);
//! ```
//!
//! Fully materialized results are combined with [`FilterResult::and_filter_results`]
//! and [`FilterResult::or_filter_results`].

pub mod array_ops;
mod filter;
mod iterator;
mod reference;
mod result;

pub use filter::{FilterExpr, FilterNode, FilterOperator, ID_FIELD};
pub use iterator::{FilterResultIterator, Validity};
pub use reference::{CollectionLookup, CollectionRegistry, ReferenceCollection};
pub use result::{FilterResult, ReferenceFilterResult, References};
