use serde::{Deserialize, Serialize};

/// Comparison applied between a field and a filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    LessThan,
    LessThanEquals,
    Equals,
    NotEquals,
    /// Token containment for string fields, without exact-value matching.
    Contains,
    GreaterThan,
    GreaterThanEquals,
    /// Inclusive range; consumes two consecutive filter values as bounds.
    RangeInclusive,
}

impl Comparator {
    /// String comparators that require the tokens to form the complete value.
    pub fn requires_exact_match(self) -> bool {
        matches!(self, Comparator::Equals | Comparator::NotEquals)
    }
}
