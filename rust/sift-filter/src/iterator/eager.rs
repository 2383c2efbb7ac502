//! Leaves evaluated up front into a [`FilterResult`].

use std::str::FromStr;

use sift_common::{Result, error::Error};
use sift_index::{Comparator, FieldSchema, Index, float_to_i64};

use crate::{CollectionLookup, FilterExpr, FilterResult, array_ops};

/// Documents whose id is listed in the filter values.
pub(super) fn id_filter(index: &Index, expr: &FilterExpr) -> Result<FilterResult> {
    let mut ids = expr
        .values
        .iter()
        .map(|value| parse_value::<u32>(expr, value))
        .collect::<Result<Vec<_>>>()?;
    ids.sort_unstable();
    ids.dedup();

    if expr.apply_not_equals {
        ids = array_ops::exclude_scalar(&index.seq_ids().uncompress(), &ids);
    }
    Ok(FilterResult::from_sorted(ids))
}

/// Every document of the collection.
pub(super) fn seq_ids_filter(index: &Index) -> FilterResult {
    FilterResult::from_sorted(index.seq_ids().uncompress())
}

/// Numeric, float and bool fields.
///
/// The comparator/value pairs are applied left to right and each one replaces the
/// result of the previous one. The leaf-level negation is applied last.
pub(super) fn numeric_filter(
    index: &Index,
    expr: &FilterExpr,
    field: &FieldSchema,
) -> Result<FilterResult> {
    let Some(tree) = index.numeric_index(&field.name) else {
        return Ok(FilterResult::default());
    };

    let mut docs = Vec::new();
    let mut i = 0;
    while i < expr.values.len() {
        let Some(&comparator) = expr.comparators.get(i) else {
            return Err(Error::invalid_arg(
                "comparators",
                format!("no comparator for value {i} of `{}`", field.name),
            ));
        };
        let value = canonical_value(expr, field, &expr.values[i])?;

        docs = match comparator {
            Comparator::RangeInclusive if i + 1 < expr.values.len() => {
                i += 1;
                let high = canonical_value(expr, field, &expr.values[i])?;
                tree.range_inclusive_search(value, high)
            }
            Comparator::NotEquals => array_ops::exclude_scalar(
                &index.seq_ids().uncompress(),
                &tree.search(Comparator::Equals, value),
            ),
            comparator => tree.search(comparator, value),
        };
        i += 1;
    }

    if expr.apply_not_equals {
        docs = array_ops::exclude_scalar(&index.seq_ids().uncompress(), &docs);
    }
    Ok(FilterResult::from_sorted(docs))
}

/// Ids of this collection referenced by the documents of another collection
/// matching the leaf's filter.
pub(super) fn reference_filter(
    lookup: &dyn CollectionLookup,
    expr: &FilterExpr,
    collection_name: &str,
) -> Result<FilterResult> {
    let name = &expr.referenced_collection_name;
    let collection = lookup
        .get_collection(name)
        .ok_or_else(|| Error::collection_not_found(name.as_str()))?;

    collection
        .get_reference_filter_ids(&expr.field_name, collection_name)
        .map_err(|err| Error::reference_filter(name.as_str(), err.to_string()))
}

/// Converts a filter value into the ordering key stored in the numeric tree.
fn canonical_value(expr: &FilterExpr, field: &FieldSchema, value: &str) -> Result<i64> {
    if field.is_bool() {
        Ok(i64::from(value == "1"))
    } else if field.is_float() {
        parse_value::<f32>(expr, value).map(float_to_i64)
    } else {
        parse_value::<i64>(expr, value)
    }
}

fn parse_value<T: FromStr>(expr: &FilterExpr, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_filter_value(expr.field_name.as_str(), value))
}
