//! Display formatting for axis ticks, tooltips and tables

use crate::value::format_js_number;

/// Fixed-point rendering with half-up rounding (`2.5` -> `"3"`)
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return format_js_number(value);
    }
    let scale = 10f64.powi(digits as i32);
    let rounded = (value.abs() * scale + 0.5).floor() / scale;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{rounded:.digits$}")
}

/// Short axis label: `1.5M`, `12K`, or the plain number
pub fn format_compact(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{}M", to_fixed(value / 1_000_000.0, 1))
    } else if value >= 1_000.0 {
        format!("{}K", to_fixed(value / 1_000.0, 0))
    } else {
        format_js_number(value)
    }
}

/// Percentage with one decimal (`12.34` -> `12.3%`)
pub fn format_percent(value: f64) -> String {
    format!("{}%", to_fixed(value, 1))
}

/// Thousands-separated number with up to three fraction digits
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return format_js_number(value);
    }

    let fixed = to_fixed(value, 3);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if grouped == "0" && frac_part.is_empty() { "" } else { sign };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}
