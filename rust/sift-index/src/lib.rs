//! In-memory index structures consulted by filter evaluation.
//!
//! An [`Index`] holds, for one collection:
//!
//! - a [`NumTree`] per numeric, float and bool field, answering comparator and
//!   inclusive range searches with sorted id arrays;
//! - a [`TokenIndex`] per string field, mapping normalized terms to postings;
//! - the [`SeqIdSet`] of every document id in the collection.
//!
//! Documents are added as JSON objects and validated against the [`Schema`]
//! before any structure is modified.

mod comparator;
mod index;
mod num_tree;
mod schema;
mod seq_ids;
mod token_index;

pub use comparator::Comparator;
pub use index::{Index, IndexOptions};
pub use num_tree::{NumTree, float_to_i64};
pub use schema::{FieldKind, FieldSchema, Schema};
pub use seq_ids::SeqIdSet;
pub use token_index::TokenIndex;
