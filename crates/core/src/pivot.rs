//! Long-to-wide reshaping
//!
//! Rows like `(week, device, count)` become one row per week with a column
//! per device. Values landing on the same `(x, category)` cell are summed.

use crate::sort::order_by_x;
use crate::value::{number_of, text_of, Row, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Placeholder x value for empty input under the `prefix` transform
const EMPTY_LABEL: &str = "(empty)";

/// Named rewrite applied to x values before grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XKeyTransform {
    /// Keep the text before the first `:` ("Screenshot: Other" -> "Screenshot")
    Prefix,
    /// Unrecognized transform names leave x values untouched
    #[serde(other)]
    Identity,
}

impl XKeyTransform {
    pub fn apply(&self, raw: &str) -> String {
        match self {
            XKeyTransform::Prefix => match raw.find(':') {
                Some(pos) if pos > 0 => raw[..pos].trim().to_string(),
                _ if raw.is_empty() => EMPTY_LABEL.to_string(),
                _ => raw.to_string(),
            },
            XKeyTransform::Identity => raw.to_string(),
        }
    }
}

/// Result of pivoting: wide rows plus the sorted category (series) names
#[derive(Debug, Clone, PartialEq)]
pub struct Pivoted {
    pub rows: Vec<Row>,
    pub categories: Vec<String>,
}

/// Pivot `rows` so each distinct `category_key` value becomes a column.
///
/// Output rows are keyed by the (optionally transformed) x value and ordered
/// by `sort_order` when given, else by value comparison. A category named
/// like `x_key` would overwrite the x label, so it is dropped.
pub fn pivot(
    rows: &[Row],
    x_key: &str,
    y_key: &str,
    category_key: &str,
    transform: Option<XKeyTransform>,
    sort_order: &[String],
) -> Pivoted {
    let categories: Vec<String> = rows
        .iter()
        .filter_map(|row| row.get(category_key).map(Value::as_text))
        .filter(|category| category != x_key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut points: Vec<Row> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let raw = text_of(row, x_key);
        let x = match transform {
            Some(t) => t.apply(&raw),
            None => raw,
        };

        let slot = *index.entry(x.clone()).or_insert_with(|| {
            let mut point = Row::new();
            point.insert(x_key.to_string(), Value::Text(x));
            points.push(point);
            points.len() - 1
        });

        let Some(category) = row
            .get(category_key)
            .map(Value::as_text)
            .filter(|category| category != x_key)
        else {
            continue;
        };
        let point = &mut points[slot];
        let total = number_of(point, &category) + number_of(row, y_key);
        point.insert(category, Value::Number(total));
    }

    Pivoted {
        rows: order_by_x(points, x_key, sort_order),
        categories,
    }
}
