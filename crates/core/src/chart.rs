//! Declarative chart configuration
//!
//! A [`ChartConfig`] is what report authors write (JSON, camelCase). Before
//! any data is touched it is compiled into a [`ChartPlan`], which selects
//! exactly one [`DataStrategy`] so conflicting option combinations never
//! reach the pipeline.

use crate::aggregate::AggregateFunction;
use crate::filter::FilterPredicate;
use crate::pivot::XKeyTransform;
use crate::window::Window;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visual kind of a chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartKind {
    Area,
    Bar,
    Line,
    Donut,
    /// Any other kind; rendered as a placeholder
    Unsupported(String),
}

impl ChartKind {
    pub fn as_str(&self) -> &str {
        match self {
            ChartKind::Area => "area",
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Donut => "donut",
            ChartKind::Unsupported(kind) => kind,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ChartKind::Unsupported(_))
    }
}

impl From<String> for ChartKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "area" => ChartKind::Area,
            "bar" => ChartKind::Bar,
            "line" => ChartKind::Line,
            "donut" => ChartKind::Donut,
            _ => ChartKind::Unsupported(kind),
        }
    }
}

impl From<ChartKind> for String {
    fn from(kind: ChartKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value column or an ordered list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YKey {
    Single(String),
    Many(Vec<String>),
}

impl YKey {
    pub fn keys(&self) -> Vec<String> {
        match self {
            YKey::Single(key) => vec![key.clone()],
            YKey::Many(keys) => keys.clone(),
        }
    }

    pub fn single(&self) -> Option<&str> {
        match self {
            YKey::Single(key) => Some(key),
            YKey::Many(_) => None,
        }
    }
}

/// A single predicate or a list of predicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartFilter {
    One(FilterPredicate),
    Many(Vec<FilterPredicate>),
}

impl ChartFilter {
    pub fn predicates(&self) -> Vec<FilterPredicate> {
        match self {
            ChartFilter::One(p) => vec![p.clone()],
            ChartFilter::Many(ps) => ps.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateLabel {
    pub angle: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_height: Option<f64>,
}

/// Tick formatting for a secondary axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisFormatter {
    Percent,
    Number,
}

/// Plot one y key against a second scale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryYAxis {
    pub y_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatter: Option<AxisFormatter>,
}

/// Review state of a chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaStatus {
    #[default]
    Pending,
    Passed,
    Failed,
    NeedsRepair,
}

/// Chart configuration as authored in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub x_key: String,
    pub y_key: YKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ChartFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_key_transform: Option<XKeyTransform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate_label_x: Option<RotateLabel>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub aggregate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_function: Option<AggregateFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "slice_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit: Option<i64>,
    #[serde(
        default,
        deserialize_with = "slice_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_y_axis: Option<SecondaryYAxis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa_status: Option<QaStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_screenshot_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa_issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa_fix: Option<String>,
}

/// Any JSON number, truncated toward zero the way `Array.slice` treats its
/// arguments (`10.0` and `10.7` both mean 10)
fn slice_index<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.map(|n| n.trunc() as i64))
}

/// How a chart's rows are shaped after filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataStrategy {
    /// Rows pass through, ordered by the sorter
    Plain { sort_order: Vec<String> },
    /// Rows collapse per x value
    Aggregated { function: AggregateFunction },
    /// Category values become series columns
    Pivoted {
        y_key: String,
        category_key: String,
        transform: Option<XKeyTransform>,
        sort_order: Vec<String>,
    },
    /// Donut slices: optionally aggregated, never pivoted, sorted or windowed
    Donut { aggregate: Option<AggregateFunction> },
}

/// A compiled chart configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPlan {
    pub x_key: String,
    pub y_keys: Vec<String>,
    pub filters: Vec<FilterPredicate>,
    pub strategy: DataStrategy,
    pub window: Window,
}

impl ChartConfig {
    /// All y keys in configured order
    pub fn y_keys(&self) -> Vec<String> {
        self.y_key.keys()
    }

    pub fn predicates(&self) -> Vec<FilterPredicate> {
        self.filter
            .as_ref()
            .map(ChartFilter::predicates)
            .unwrap_or_default()
    }

    pub fn qa_status(&self) -> QaStatus {
        self.qa_status.unwrap_or_default()
    }

    /// Whether an original screenshot should be offered for comparison
    pub fn has_original_screenshot(&self) -> bool {
        matches!(self.qa_status(), QaStatus::NeedsRepair | QaStatus::Failed)
            && self.original_screenshot_path.is_some()
    }

    /// The secondary axis, when it applies: line charts with exactly two y keys
    pub fn dual_axis(&self) -> Option<&SecondaryYAxis> {
        match (&self.kind, &self.y_key, &self.secondary_y_axis) {
            (ChartKind::Line, YKey::Many(keys), Some(axis)) if keys.len() == 2 => Some(axis),
            _ => None,
        }
    }

    /// Select the data strategy for this configuration
    pub fn strategy(&self) -> DataStrategy {
        let function = self.aggregate_function.unwrap_or_default();
        let sort_order = self.sort_order.clone().unwrap_or_default();

        if self.kind == ChartKind::Donut {
            return DataStrategy::Donut {
                aggregate: self.aggregate.then_some(function),
            };
        }

        match (&self.category_key, self.y_key.single()) {
            (Some(category_key), Some(y_key)) => DataStrategy::Pivoted {
                y_key: y_key.to_string(),
                category_key: category_key.clone(),
                transform: self.x_key_transform,
                sort_order,
            },
            _ if self.aggregate => DataStrategy::Aggregated { function },
            _ => DataStrategy::Plain { sort_order },
        }
    }

    /// Compile into an executable plan
    pub fn plan(&self) -> ChartPlan {
        ChartPlan {
            x_key: self.x_key.clone(),
            y_keys: self.y_keys(),
            filters: self.predicates(),
            strategy: self.strategy(),
            window: Window::new(self.offset, self.limit),
        }
    }
}
