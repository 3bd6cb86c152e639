//! Grouping rows by an x key and reducing value columns

use crate::value::{number_of, text_of, Row, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reduction applied to each value column within a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    #[default]
    Sum,
    /// Mean, rounded to two decimals
    Avg,
}

struct Group {
    point: Row,
    count: usize,
}

/// Collapse rows sharing an x value.
///
/// Output rows hold the x value as text plus one reduced number per y key,
/// ordered by the first y key descending. Groups with equal values keep the
/// order in which they were first seen.
pub fn aggregate(
    rows: &[Row],
    x_key: &str,
    y_keys: &[String],
    function: AggregateFunction,
) -> Vec<Row> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let x = text_of(row, x_key);
        let slot = *index.entry(x.clone()).or_insert_with(|| {
            let mut point = Row::new();
            point.insert(x_key.to_string(), Value::Text(x));
            for key in y_keys {
                point.insert(key.clone(), Value::Number(0.0));
            }
            groups.push(Group { point, count: 0 });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.count += 1;
        for key in y_keys {
            let total = number_of(&group.point, key) + number_of(row, key);
            group.point.insert(key.clone(), Value::Number(total));
        }
    }

    if function == AggregateFunction::Avg {
        for group in &mut groups {
            let count = group.count.max(1) as f64;
            for key in y_keys {
                let mean = number_of(&group.point, key) / count;
                group.point.insert(key.clone(), Value::Number(round_to_cents(mean)));
            }
        }
    }

    let mut points: Vec<Row> = groups.into_iter().map(|g| g.point).collect();
    if let Some(primary) = y_keys.first() {
        points.sort_by(|a, b| number_of(b, primary).total_cmp(&number_of(a, primary)));
    }
    points
}

/// Round half-up to two decimal places
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}
