//! Row ordering along the x axis
//!
//! Two orderings exist:
//! - an explicit `sortOrder` list, where listed values come first in list
//!   order and unlisted values follow in their original relative order;
//! - value comparison, numeric when both sides are numbers (or both are pure
//!   numeric text) and lexicographic otherwise.
//!
//! [`sort_rows`] only applies value comparison to time-like x columns.
//! [`order_by_x`] always applies it and is what pivoted data uses.

use crate::value::{value_of, Row, Value};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Column-name fragments that mark an x axis as time-like
const TIME_LIKE_FRAGMENTS: [&str; 4] = ["date", "week", "month", "day"];

fn numeric_text_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("numeric text pattern is valid"))
}

/// Whether text is a plain signed integer or decimal (no exponent, no spaces)
pub fn is_numeric_text(s: &str) -> bool {
    numeric_text_regex().is_match(s)
}

/// Whether a column name looks like a date/time axis
pub fn is_time_like_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    TIME_LIKE_FRAGMENTS.iter().any(|f| lower.contains(f))
}

/// Compare two x values: numerically when both are numbers or both are
/// numeric text, otherwise as case-sensitive text.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Text(x), Value::Text(y)) if is_numeric_text(x) && is_numeric_text(y) => {
            let x: f64 = x.parse().unwrap_or(0.0);
            let y: f64 = y.parse().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => a.as_text().cmp(&b.as_text()),
    }
}

/// Order rows by the x column for display.
///
/// An explicit `sort_order` always applies. Without one, rows are only
/// reordered when the x column is time-like; other columns are assumed to be
/// in a meaningful order already.
pub fn sort_rows(rows: &[Row], x_key: &str, sort_order: &[String]) -> Vec<Row> {
    if sort_order.is_empty() && !is_time_like_key(x_key) {
        return rows.to_vec();
    }
    order_by_x(rows.to_vec(), x_key, sort_order)
}

/// Order rows by the x column unconditionally
pub fn order_by_x(rows: Vec<Row>, x_key: &str, sort_order: &[String]) -> Vec<Row> {
    if !sort_order.is_empty() {
        return sort_by_explicit_order(rows, x_key, sort_order);
    }
    stable_sort_by(rows, &|a: &Row, b: &Row| {
        compare_values(value_of(a, x_key), value_of(b, x_key))
    })
}

/// Stable sort by position in `sort_order`; unlisted values go last
pub fn sort_by_explicit_order(mut rows: Vec<Row>, x_key: &str, sort_order: &[String]) -> Vec<Row> {
    rows.sort_by_cached_key(|row| {
        let x = value_of(row, x_key).as_text();
        sort_order
            .iter()
            .position(|s| *s == x)
            .unwrap_or(sort_order.len())
    });
    rows
}

/// Stable merge sort.
///
/// Value comparison is not transitive across mixed number/text columns, and
/// the std sorts may panic on such comparators.
fn stable_sort_by<T, F>(items: Vec<T>, compare: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }

    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = stable_sort_by(left, compare);
    let right = stable_sort_by(right, compare);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        merged.extend(if take_right { right.next() } else { left.next() });
    }
    merged
}
