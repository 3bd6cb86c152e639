//! Cell values, rows and datasets
//!
//! Every cell is either a number or text. Pipeline stages never inspect the
//! variant directly; they go through [`Value::as_number`] and
//! [`Value::as_text`], which reproduce the coercions a browser applies to
//! loosely-typed report data (`Number(v)` and `String(v)`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

/// Shared empty-text value returned for missing columns
pub(crate) static EMPTY: Value = Value::Text(String::new());

impl Value {
    /// Classify a raw (already trimmed) CSV field.
    ///
    /// A field becomes a number only when it is non-empty and parses as a
    /// JavaScript numeric literal.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            return Value::Text(String::new());
        }
        match parse_js_number(field) {
            Some(n) => Value::Number(n),
            None => Value::Text(field.to_string()),
        }
    }

    /// Numeric coercion: numbers pass through, text is parsed, anything
    /// unparseable (or NaN) becomes 0.
    pub fn as_number(&self) -> f64 {
        let n = match self {
            Value::Number(n) => *n,
            Value::Text(s) => parse_js_number(s).unwrap_or(0.0),
        };
        if n.is_nan() {
            0.0
        } else {
            n
        }
    }

    /// Text coercion
    pub fn as_text(&self) -> String {
        match self {
            Value::Number(n) => format_js_number(*n),
            Value::Text(s) => s.clone(),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// True for empty text, which the CSV parser produces for blank fields
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_js_number(*n)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// One record: column name to value
pub type Row = BTreeMap<String, Value>;

/// Read a column as text; a missing column reads as empty text
pub fn text_of(row: &Row, key: &str) -> String {
    row.get(key).map(Value::as_text).unwrap_or_default()
}

/// Read a column as a number; a missing column reads as 0
pub fn number_of(row: &Row, key: &str) -> f64 {
    row.get(key).map(Value::as_number).unwrap_or(0.0)
}

/// Read a column, substituting empty text when missing
pub(crate) fn value_of<'a>(row: &'a Row, key: &str) -> &'a Value {
    row.get(key).unwrap_or(&EMPTY)
}

/// A parsed table: header columns plus rows in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Column names in header order
    pub columns: Vec<String>,
    /// Rows in source line order
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate a column's values in row order (missing cells are skipped)
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().filter_map(move |row| row.get(name))
    }
}

/// Parse text the way JavaScript's `Number()` does.
///
/// Returns `None` where `Number()` would yield NaN. Surrounding whitespace is
/// ignored and empty input is 0. Decimal and exponent forms, `Infinity`, and
/// unsigned `0x`/`0o`/`0b` literals are accepted.
pub fn parse_js_number(input: &str) -> Option<f64> {
    let s = input.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    match s {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &s[2..];
        if digits.is_empty() {
            return None;
        }
        return digits.chars().try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix)
                .map(|d| acc * f64::from(radix) + f64::from(d))
        });
    }

    // Rust's float parser also accepts "inf" and "nan"; JavaScript does not.
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Format a number the way JavaScript's `String(n)` does
pub fn format_js_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let abs = n.abs();
    if !(1e-6..1e21).contains(&abs) {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }
    format!("{}", n)
}
