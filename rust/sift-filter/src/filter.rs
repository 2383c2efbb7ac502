//! Parsed filter expression tree.

use sift_common::{Result, verify_arg};
use sift_index::{Comparator, Index};

/// Field name of filters over raw document ids.
pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    And,
    Or,
}

/// A single predicate on one field.
///
/// `comparators[i]` applies to `values[i]`. A [`Comparator::RangeInclusive`] at
/// position `i` takes `values[i]` and `values[i + 1]` as its bounds.
///
/// For join filters (`referenced_collection_name` non-empty) `field_name` holds
/// the filter to evaluate on the referenced collection, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpr {
    pub field_name: String,
    pub referenced_collection_name: String,
    pub comparators: Vec<Comparator>,
    pub values: Vec<String>,
    /// Complement the whole predicate after the values are evaluated.
    pub apply_not_equals: bool,
}

impl FilterExpr {
    pub fn new<V: Into<String>>(
        field_name: impl Into<String>,
        comparators: Vec<Comparator>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        verify_arg!(comparators, comparators.len() == values.len());
        Ok(Self {
            field_name: field_name.into(),
            referenced_collection_name: String::new(),
            comparators,
            values,
            apply_not_equals: false,
        })
    }

    /// `field <comparator> value`.
    pub fn single(
        field_name: impl Into<String>,
        comparator: Comparator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            referenced_collection_name: String::new(),
            comparators: vec![comparator],
            values: vec![value.into()],
            apply_not_equals: false,
        }
    }

    /// `field` equal to any of `values`.
    pub fn any_of<V: Into<String>>(
        field_name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        Self {
            field_name: field_name.into(),
            referenced_collection_name: String::new(),
            comparators: vec![Comparator::Equals; values.len()],
            values,
            apply_not_equals: false,
        }
    }

    /// `field` within `[low, high]`.
    pub fn range(
        field_name: impl Into<String>,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            referenced_collection_name: String::new(),
            comparators: vec![Comparator::RangeInclusive; 2],
            values: vec![low.into(), high.into()],
            apply_not_equals: false,
        }
    }

    /// Documents whose sequence id is one of `ids`.
    pub fn ids(ids: impl IntoIterator<Item = u32>) -> Self {
        Self::any_of(ID_FIELD, ids.into_iter().map(|id| id.to_string()))
    }

    /// Every document of the collection.
    pub fn all_seq_ids() -> Self {
        Self::any_of(Index::SEQ_IDS_FIELD, std::iter::empty::<String>())
    }

    /// Documents referenced by the documents of `collection` that match `filter_query`.
    pub fn reference(collection: impl Into<String>, filter_query: impl Into<String>) -> Self {
        Self {
            field_name: filter_query.into(),
            referenced_collection_name: collection.into(),
            comparators: Vec::new(),
            values: Vec::new(),
            apply_not_equals: false,
        }
    }

    /// Turns on the NOT-EQUALS toggle for the whole predicate.
    pub fn negate(mut self) -> Self {
        self.apply_not_equals = true;
        self
    }

    pub fn is_reference(&self) -> bool {
        !self.referenced_collection_name.is_empty()
    }
}

/// Binary filter tree; each operator node owns its two children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterNode {
    Operator {
        op: FilterOperator,
        left: Box<FilterNode>,
        right: Box<FilterNode>,
    },
    Leaf(FilterExpr),
}

impl FilterNode {
    pub fn and(left: impl Into<FilterNode>, right: impl Into<FilterNode>) -> Self {
        Self::operator(FilterOperator::And, left.into(), right.into())
    }

    pub fn or(left: impl Into<FilterNode>, right: impl Into<FilterNode>) -> Self {
        Self::operator(FilterOperator::Or, left.into(), right.into())
    }

    fn operator(op: FilterOperator, left: FilterNode, right: FilterNode) -> Self {
        FilterNode::Operator {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, FilterNode::Operator { .. })
    }

    /// Number of leaves in the tree.
    pub fn num_leaves(&self) -> usize {
        match self {
            FilterNode::Operator { left, right, .. } => left.num_leaves() + right.num_leaves(),
            FilterNode::Leaf(_) => 1,
        }
    }
}

impl From<FilterExpr> for FilterNode {
    fn from(expr: FilterExpr) -> Self {
        FilterNode::Leaf(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_arity_is_checked() {
        assert!(FilterExpr::new("age", vec![Comparator::Equals], ["1"]).is_ok());
        let err = FilterExpr::new("age", vec![Comparator::Equals], ["1", "2"]).unwrap_err();
        assert!(err.to_string().starts_with("invalid argument comparators"));
    }

    #[test]
    fn test_tree_construction() {
        let tree = FilterNode::and(
            FilterExpr::ids([3, 1]),
            FilterNode::or(
                FilterExpr::range("age", "10", "20"),
                FilterExpr::single("title", Comparator::Equals, "shoes").negate(),
            ),
        );
        assert!(tree.is_operator());
        assert_eq!(tree.num_leaves(), 3);

        let FilterNode::Operator { left, .. } = &tree else {
            panic!("expected operator");
        };
        let FilterNode::Leaf(ids) = left.as_ref() else {
            panic!("expected leaf");
        };
        assert_eq!(ids.field_name, ID_FIELD);
        assert_eq!(ids.values, vec!["3", "1"]);
        assert_eq!(ids.comparators.len(), 2);
    }

    #[test]
    fn test_reference_expr() {
        let expr = FilterExpr::reference("customers", "country: = Norway");
        assert!(expr.is_reference());
        assert!(!FilterExpr::all_seq_ids().is_reference());
        assert_eq!(FilterExpr::all_seq_ids().field_name, Index::SEQ_IDS_FIELD);
    }
}
