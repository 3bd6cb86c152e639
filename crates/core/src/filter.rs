//! Row filtering by field/value predicates

use crate::value::Row;
use serde::{Deserialize, Serialize};

/// A single `field == value` test, optionally negated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub field: String,
    pub value: String,
    /// When true, rows matching the value are filtered out instead
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclude: bool,
}

impl FilterPredicate {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            exclude: false,
        }
    }

    pub fn excluding(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            exclude: true,
            ..Self::new(field, value)
        }
    }

    /// Whether a row passes this predicate. A missing field never equals.
    pub fn matches(&self, row: &Row) -> bool {
        let equal = row
            .get(&self.field)
            .is_some_and(|v| v.as_text() == self.value);
        equal != self.exclude
    }
}

/// Keep rows passing every predicate
pub fn filter_rows(rows: &[Row], predicates: &[FilterPredicate]) -> Vec<Row> {
    rows.iter()
        .filter(|row| predicates.iter().all(|p| p.matches(row)))
        .cloned()
        .collect()
}
