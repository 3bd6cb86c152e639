//! CSV parser for query result data
//!
//! Input format:
//! ```text
//! date,device,count
//! 2024-01,"iOS, iPad",5
//! ```
//!
//! The first non-empty line is the header. Quoted fields may contain commas
//! and doubled quotes. Parsing never fails: malformed quoting degrades to a
//! best-effort split and short rows are padded with empty text.

use crate::value::{format_js_number, Dataset, Row, Value};

/// Parse CSV text into a dataset
pub fn parse(text: &str) -> Dataset {
    let mut lines = text.split('\n').map(str::trim).filter(|line| !line.is_empty());

    let header_line = match lines.next() {
        Some(line) => line,
        None => return Dataset::default(),
    };
    let headers = split_line(header_line);

    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    for header in &headers {
        if !columns.contains(header) {
            columns.push(header.clone());
        }
    }

    let rows: Vec<Row> = lines
        .map(|line| {
            let fields = split_line(line);
            let mut row = Row::new();
            for (index, header) in headers.iter().enumerate() {
                let field = fields.get(index).map(String::as_str).unwrap_or("");
                row.insert(header.clone(), Value::from_field(field));
            }
            row
        })
        .collect();

    if rows.is_empty() {
        return Dataset::default();
    }

    Dataset::new(columns, rows)
}

/// Split one line into trimmed fields, honoring double-quote quoting
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Serialize a dataset back to CSV text
///
/// Fields containing a comma or quote are quoted with embedded quotes
/// doubled, so `parse(&to_csv(&parse(text)))` reproduces the dataset.
pub fn to_csv(dataset: &Dataset) -> String {
    let mut out = String::new();

    let header: Vec<String> = dataset.columns.iter().map(|c| escape_field(c)).collect();
    out.push_str(&join_line(&header));

    for row in &dataset.rows {
        out.push('\n');
        let fields: Vec<String> = dataset
            .columns
            .iter()
            .map(|column| match row.get(column) {
                Some(Value::Number(n)) => format_js_number(*n),
                Some(Value::Text(s)) => escape_field(s),
                None => String::new(),
            })
            .collect();
        out.push_str(&join_line(&fields));
    }

    out
}

/// Join fields into a line; an empty line is written as `""` so the parser
/// does not skip it as blank
fn join_line(fields: &[String]) -> String {
    let line = fields.join(",");
    if line.is_empty() {
        "\"\"".to_string()
    } else {
        line
    }
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
