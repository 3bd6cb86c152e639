//! Statistical profiling of a query result
//!
//! Produces per-column statistics, detected patterns (outliers, concentration,
//! trends, correlations, data quality) and follow-up recommendations.

use crate::error::{Error, Result};
use crate::value::{value_of, Dataset, Value};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const TOP_VALUES: usize = 10;
const DATE_FRAGMENTS: [&str; 3] = ["date", "week", "month"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Summary of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column_name: String,
    /// `int64`, `float64` or `object`
    pub dtype: String,
    pub non_null_count: usize,
    pub null_count: usize,
    pub null_rate: f64,
    pub unique_count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min_val: Option<f64>,
    pub max_val: Option<f64>,
    pub p25: Option<f64>,
    pub p75: Option<f64>,
    pub p90: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
    pub top_values: Option<Vec<ValueCount>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub row_count: usize,
    pub column_count: usize,
    pub date_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub column_stats: Vec<ColumnStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Outlier,
    Concentration,
    Pareto,
    TimeTrend,
    Correlation,
    DataQuality,
}

/// Ordered most to least important
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Significant,
    Notable,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternInsight {
    pub pattern_type: PatternType,
    pub description: String,
    pub severity: Severity,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub csv_path: String,
    pub dataset_stats: DatasetStats,
    pub patterns: Vec<PatternInsight>,
    pub recommendations: Vec<String>,
}

impl AnalysisResult {
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| Error::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// Default location of the analysis next to `csv_path`.
///
/// `foo_result.csv` becomes `foo_analysis.json`; other names get
/// `_analysis.json` appended to their stem.
pub fn analysis_output_path(csv_path: &Path) -> PathBuf {
    let name = csv_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let output = match name.strip_suffix("_result.csv") {
        Some(base) => format!("{base}_analysis.json"),
        None => {
            let stem = csv_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("{stem}_analysis.json")
        }
    };
    csv_path.with_file_name(output)
}

/// Load and analyze a CSV file
pub fn analyze_file(path: &Path) -> Result<AnalysisResult> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let dataset = crate::csv::parse(&content);
    Ok(analyze(&dataset, &path.display().to_string()))
}

/// Analyze a parsed dataset; `source` is recorded as the CSV path
pub fn analyze(dataset: &Dataset, source: &str) -> AnalysisResult {
    let profiles: Vec<ColumnProfile> = dataset
        .columns
        .iter()
        .map(|name| ColumnProfile::new(dataset, name))
        .collect();

    let column_stats: Vec<ColumnStats> = profiles.iter().map(ColumnProfile::stats).collect();
    let date_columns: Vec<String> = dataset
        .columns
        .iter()
        .filter(|name| {
            let lower = name.to_lowercase();
            DATE_FRAGMENTS.iter().any(|f| lower.contains(f))
        })
        .cloned()
        .collect();
    let numeric: Vec<&ColumnProfile> = profiles.iter().filter(|p| p.numeric).collect();
    let categorical: Vec<&ColumnProfile> = profiles.iter().filter(|p| !p.numeric).collect();

    let mut patterns = Vec::new();
    patterns.extend(detect_outliers(&numeric));
    patterns.extend(detect_concentration(&categorical, dataset.len()));
    patterns.extend(detect_pareto(&numeric));
    patterns.extend(detect_time_trends(dataset, &date_columns, &numeric));
    patterns.extend(detect_correlations(&numeric, dataset.len()));
    patterns.extend(detect_data_quality(&column_stats));
    patterns.sort_by_key(|p| p.severity);

    let recommendations = recommendations_for(&patterns);

    AnalysisResult {
        csv_path: source.to_string(),
        dataset_stats: DatasetStats {
            row_count: dataset.len(),
            column_count: dataset.columns.len(),
            date_columns,
            numeric_columns: numeric.iter().map(|p| p.name.clone()).collect(),
            categorical_columns: categorical.iter().map(|p| p.name.clone()).collect(),
            column_stats,
        },
        patterns,
        recommendations,
    }
}

/// Column cells split into present values, aligned to row positions
struct ColumnProfile {
    name: String,
    cells: Vec<Option<Value>>,
    numeric: bool,
}

impl ColumnProfile {
    fn new(dataset: &Dataset, name: &str) -> Self {
        let cells: Vec<Option<Value>> = dataset
            .rows
            .iter()
            .map(|row| {
                let value = value_of(row, name);
                (!value.is_blank()).then(|| value.clone())
            })
            .collect();
        let mut present = cells.iter().flatten().peekable();
        let numeric = present.peek().is_some() && present.all(Value::is_number);

        Self {
            name: name.to_string(),
            cells,
            numeric,
        }
    }

    /// Numbers by row position; `None` for null cells
    fn numbers(&self) -> Vec<Option<f64>> {
        self.cells
            .iter()
            .map(|cell| cell.as_ref().filter(|v| v.is_number()).map(Value::as_number))
            .collect()
    }

    fn present_numbers(&self) -> Vec<f64> {
        self.numbers().into_iter().flatten().collect()
    }

    /// Distinct present values by count, descending; ties in first-seen order
    fn value_counts(&self) -> Vec<ValueCount> {
        let mut counts: Vec<ValueCount> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for value in self.cells.iter().flatten() {
            let text = value.as_text();
            match index.get(&text) {
                Some(&slot) => counts[slot].count += 1,
                None => {
                    index.insert(text.clone(), counts.len());
                    counts.push(ValueCount {
                        value: text,
                        count: 1,
                    });
                }
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }

    fn stats(&self) -> ColumnStats {
        let total = self.cells.len();
        let non_null = self.cells.iter().flatten().count();
        let null_count = total - non_null;
        let counts = self.value_counts();

        let mut stats = ColumnStats {
            column_name: self.name.clone(),
            dtype: self.dtype().to_string(),
            non_null_count: non_null,
            null_count,
            null_rate: if total > 0 {
                round_to(null_count as f64 / total as f64, 4)
            } else {
                0.0
            },
            unique_count: counts.len(),
            mean: None,
            median: None,
            std: None,
            min_val: None,
            max_val: None,
            p25: None,
            p75: None,
            p90: None,
            p95: None,
            p99: None,
            top_values: None,
        };

        if !self.numeric {
            stats.top_values = Some(counts.into_iter().take(TOP_VALUES).collect());
            return stats;
        }

        let mut values = self.present_numbers();
        values.sort_by(f64::total_cmp);
        if values.is_empty() {
            return stats;
        }

        let q = |p: f64| Some(round_to(quantile(&values, p), 4));
        stats.mean = Some(round_to(mean(&values), 4));
        stats.median = q(0.5);
        stats.std = Some(if values.len() > 1 {
            round_to(sample_std(&values), 4)
        } else {
            0.0
        });
        stats.min_val = values.first().copied();
        stats.max_val = values.last().copied();
        stats.p25 = q(0.25);
        stats.p75 = q(0.75);
        stats.p90 = q(0.90);
        stats.p95 = q(0.95);
        stats.p99 = q(0.99);
        stats
    }

    fn dtype(&self) -> &'static str {
        if !self.numeric {
            "object"
        } else if self.present_numbers().iter().all(|n| n.fract() == 0.0) {
            "int64"
        } else {
            "float64"
        }
    }
}

fn detect_outliers(numeric: &[&ColumnProfile]) -> Vec<PatternInsight> {
    let mut patterns = Vec::new();
    for column in numeric {
        let mut values = column.present_numbers();
        if values.len() < 4 {
            continue;
        }
        values.sort_by(f64::total_cmp);

        let q1 = quantile(&values, 0.25);
        let q3 = quantile(&values, 0.75);
        let iqr = q3 - q1;
        let lower = q1 - 1.5 * iqr;
        let upper = q3 + 1.5 * iqr;

        let outliers: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| *v < lower || *v > upper)
            .collect();
        let pct = outliers.len() as f64 / values.len() as f64 * 100.0;
        if outliers.is_empty() || pct <= 1.0 {
            continue;
        }

        let min_outlier = outliers.iter().copied().fold(f64::INFINITY, f64::min);
        let max_outlier = outliers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        patterns.push(PatternInsight {
            pattern_type: PatternType::Outlier,
            description: format!(
                "Column '{}' has {} outliers ({:.1}% of values)",
                column.name,
                outliers.len(),
                pct
            ),
            severity: if pct > 5.0 {
                Severity::Significant
            } else {
                Severity::Notable
            },
            details: json!({
                "column": column.name,
                "outlier_count": outliers.len(),
                "outlier_pct": round_to(pct, 2),
                "lower_bound": round_to(lower, 2),
                "upper_bound": round_to(upper, 2),
                "min_outlier": round_to(min_outlier, 2),
                "max_outlier": round_to(max_outlier, 2),
            }),
        });
    }
    patterns
}

fn detect_concentration(categorical: &[&ColumnProfile], row_count: usize) -> Vec<PatternInsight> {
    let mut patterns = Vec::new();
    if row_count == 0 {
        return patterns;
    }

    for column in categorical {
        let counts = column.value_counts();
        if counts.len() < 3 {
            continue;
        }
        let top: Vec<&ValueCount> = counts.iter().take(3).collect();
        let top_sum: usize = top.iter().map(|c| c.count).sum();
        let pct = top_sum as f64 / row_count as f64 * 100.0;
        if pct <= 70.0 {
            continue;
        }

        patterns.push(PatternInsight {
            pattern_type: PatternType::Concentration,
            description: format!(
                "Column '{}' is highly concentrated: top 3 values represent {:.1}% of records",
                column.name, pct
            ),
            severity: Severity::Notable,
            details: json!({
                "column": column.name,
                "top_3_values": top,
                "top_3_pct": round_to(pct, 1),
                "total_unique": counts.len(),
            }),
        });
    }
    patterns
}

fn detect_pareto(numeric: &[&ColumnProfile]) -> Vec<PatternInsight> {
    let mut patterns = Vec::new();
    for column in numeric {
        let mut values = column.present_numbers();
        if values.len() < 5 {
            continue;
        }
        values.sort_by(|a, b| b.total_cmp(a));

        let top_n = ((values.len() as f64 * 0.2) as usize).max(1);
        let top_sum: f64 = values.iter().take(top_n).sum();
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            continue;
        }

        let ratio = top_sum / total * 100.0;
        if ratio > 65.0 {
            patterns.push(PatternInsight {
                pattern_type: PatternType::Pareto,
                description: format!(
                    "Column '{}' shows Pareto pattern: top 20% of values account for {:.1}% of total",
                    column.name, ratio
                ),
                severity: Severity::Info,
                details: json!({
                    "column": column.name,
                    "top_20_pct_of_total": round_to(ratio, 1),
                }),
            });
        }
    }
    patterns
}

/// Parse a date cell in one of the accepted layouts
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
        .or_else(|| NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d").ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn detect_time_trends(
    dataset: &Dataset,
    date_columns: &[String],
    numeric: &[&ColumnProfile],
) -> Vec<PatternInsight> {
    let mut patterns = Vec::new();

    for date_column in date_columns {
        let mut dated: Vec<(NaiveDateTime, usize)> = dataset
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| parse_date(&value_of(row, date_column).as_text()).map(|d| (d, i)))
            .collect();
        if dated.len() < 5 {
            continue;
        }
        dated.sort_by_key(|(date, _)| *date);

        for column in numeric {
            let numbers = column.numbers();
            let series: Vec<f64> = dated.iter().filter_map(|(_, i)| numbers[*i]).collect();
            if series.len() < 5 {
                continue;
            }

            let half = series.len() / 2;
            let first = mean(&series[..half]);
            let second = mean(&series[series.len() - half..]);
            if first <= 0.0 {
                continue;
            }

            let change = (second - first) / first * 100.0;
            if change.abs() <= 20.0 {
                continue;
            }

            let direction = if change > 0.0 { "increasing" } else { "decreasing" };
            patterns.push(PatternInsight {
                pattern_type: PatternType::TimeTrend,
                description: format!(
                    "Column '{}' shows {} trend over time ({:+.1}% change)",
                    column.name, direction, change
                ),
                severity: if change.abs() > 50.0 {
                    Severity::Notable
                } else {
                    Severity::Info
                },
                details: json!({
                    "column": column.name,
                    "date_column": date_column,
                    "pct_change": round_to(change, 1),
                    "first_half_mean": round_to(first, 2),
                    "second_half_mean": round_to(second, 2),
                }),
            });
        }
    }
    patterns
}

fn detect_correlations(numeric: &[&ColumnProfile], row_count: usize) -> Vec<PatternInsight> {
    let mut patterns = Vec::new();
    if numeric.len() < 2 {
        return patterns;
    }

    let columns: Vec<Vec<Option<f64>>> = numeric.iter().map(|c| c.numbers()).collect();
    let complete: Vec<usize> = (0..row_count)
        .filter(|&i| columns.iter().all(|col| col[i].is_some()))
        .collect();
    if complete.len() < 10 {
        return patterns;
    }

    let pick = |col: &[Option<f64>]| -> Vec<f64> { complete.iter().filter_map(|&i| col[i]).collect() };

    for i in 0..numeric.len() {
        for j in i + 1..numeric.len() {
            let Some(r) = pearson(&pick(&columns[i]), &pick(&columns[j])) else {
                continue;
            };
            if r.abs() <= 0.7 {
                continue;
            }

            let kind = if r > 0.0 { "positive" } else { "negative" };
            patterns.push(PatternInsight {
                pattern_type: PatternType::Correlation,
                description: format!(
                    "Strong {} correlation ({:.2}) between '{}' and '{}'",
                    kind, r, numeric[i].name, numeric[j].name
                ),
                severity: Severity::Notable,
                details: json!({
                    "column_1": numeric[i].name,
                    "column_2": numeric[j].name,
                    "correlation": round_to(r, 3),
                }),
            });
        }
    }
    patterns
}

fn detect_data_quality(column_stats: &[ColumnStats]) -> Vec<PatternInsight> {
    let mut patterns = Vec::new();
    for stats in column_stats {
        if stats.null_rate > 0.1 {
            patterns.push(PatternInsight {
                pattern_type: PatternType::DataQuality,
                description: format!(
                    "Column '{}' has high null rate ({:.1}%)",
                    stats.column_name,
                    stats.null_rate * 100.0
                ),
                severity: if stats.null_rate > 0.3 {
                    Severity::Significant
                } else {
                    Severity::Notable
                },
                details: json!({
                    "column": stats.column_name,
                    "null_rate": round_to(stats.null_rate * 100.0, 1),
                    "null_count": stats.null_count,
                }),
            });
        }

        if stats.unique_count == 1 && stats.non_null_count > 0 {
            patterns.push(PatternInsight {
                pattern_type: PatternType::DataQuality,
                description: format!("Column '{}' has only one unique value", stats.column_name),
                severity: Severity::Info,
                details: json!({
                    "column": stats.column_name,
                    "unique_count": stats.unique_count,
                }),
            });
        }
    }
    patterns
}

fn recommendations_for(patterns: &[PatternInsight]) -> Vec<String> {
    let has = |kind: PatternType| patterns.iter().any(|p| p.pattern_type == kind);
    let mut out = Vec::new();

    if has(PatternType::Outlier) {
        out.push("Investigate outliers to determine if they represent data quality issues or genuine extreme values");
    }
    if has(PatternType::Pareto) || has(PatternType::Concentration) {
        out.push("Consider segmenting analysis by high-concentration dimensions to understand behavior differences");
    }
    if has(PatternType::TimeTrend) {
        out.push("Time-based trends detected; consider analyzing what external factors may be driving changes");
    }
    if has(PatternType::Correlation) {
        out.push("Strong correlations found; verify if relationships are causal or coincidental before drawing conclusions");
    }
    if has(PatternType::DataQuality) {
        out.push("Address data quality issues (nulls, single values) before relying on affected columns for analysis");
    }

    out.into_iter().map(String::from).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Linear-interpolated quantile of sorted, non-empty values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn kinds(result: &AnalysisResult) -> Vec<PatternType> {
        result.patterns.iter().map(|p| p.pattern_type).collect()
    }

    #[test]
    fn test_column_classification() {
        let data = csv::parse("week,device,count\n2024-01,ios,5\n2024-02,web,\n2024-03,ios,7");
        let result = analyze(&data, "q.csv");
        let stats = &result.dataset_stats;

        assert_eq!(stats.row_count, 3);
        assert_eq!(stats.date_columns, vec!["week"]);
        assert_eq!(stats.numeric_columns, vec!["count"]);
        assert_eq!(stats.categorical_columns, vec!["week", "device"]);
        assert_eq!(stats.column_stats[2].dtype, "int64");
        assert_eq!(stats.column_stats[2].null_count, 1);
        assert_eq!(stats.column_stats[2].null_rate, 0.3333);
    }

    #[test]
    fn test_numeric_stats() {
        let data = csv::parse("v\n1\n2\n3\n4\n5");
        let stats = &analyze(&data, "v.csv").dataset_stats.column_stats[0];

        assert_eq!(stats.mean, Some(3.0));
        assert_eq!(stats.median, Some(3.0));
        assert_eq!(stats.std, Some(1.5811));
        assert_eq!(stats.min_val, Some(1.0));
        assert_eq!(stats.max_val, Some(5.0));
        assert_eq!(stats.p25, Some(2.0));
        assert_eq!(stats.p90, Some(4.6));
        assert_eq!(stats.top_values, None);
    }

    #[test]
    fn test_single_value_std_is_zero() {
        let data = csv::parse("v\n1.5");
        let stats = &analyze(&data, "v.csv").dataset_stats.column_stats[0];
        assert_eq!(stats.std, Some(0.0));
        assert_eq!(stats.dtype, "float64");
    }

    #[test]
    fn test_top_values() {
        let data = csv::parse("c\nb\na\nb\nc\na\nb");
        let stats = &analyze(&data, "c.csv").dataset_stats.column_stats[0];
        let top = stats.top_values.as_ref().unwrap();

        assert_eq!(top[0], ValueCount { value: "b".to_string(), count: 3 });
        assert_eq!(top[1], ValueCount { value: "a".to_string(), count: 2 });
        assert_eq!(top[2].value, "c");
    }

    #[test]
    fn test_outlier_detection() {
        let data = csv::parse("v\n10\n11\n12\n10\n11\n12\n10\n500");
        let result = analyze(&data, "v.csv");

        let outlier = &result.patterns[0];
        assert_eq!(outlier.pattern_type, PatternType::Outlier);
        assert_eq!(outlier.severity, Severity::Significant);
        assert_eq!(outlier.details["outlier_count"], 1);
        assert_eq!(outlier.details["max_outlier"], 500.0);
        assert!(result.recommendations[0].starts_with("Investigate outliers"));
    }

    #[test]
    fn test_concentration_and_pareto() {
        let data = csv::parse("c,v\na,100\na,1\nb,1\nc,1\na,1");
        let result = analyze(&data, "x.csv");

        assert!(kinds(&result).contains(&PatternType::Concentration));
        let pareto = result
            .patterns
            .iter()
            .find(|p| p.pattern_type == PatternType::Pareto)
            .unwrap();
        assert_eq!(pareto.details["top_20_pct_of_total"], 96.2);
    }

    #[test]
    fn test_time_trend() {
        let data = csv::parse(
            "date,v\n2024-01-05,30\n2024-01-01,10\n2024-01-02,10\n2024-01-04,30\n2024-01-03,20\n2024-01-06,30",
        );
        let result = analyze(&data, "t.csv");
        let trend = result
            .patterns
            .iter()
            .find(|p| p.pattern_type == PatternType::TimeTrend)
            .unwrap();

        assert_eq!(trend.severity, Severity::Notable);
        assert_eq!(trend.details["pct_change"], 125.0);
        assert!(trend.description.contains("increasing trend over time (+125.0% change)"));
    }

    #[test]
    fn test_correlation() {
        let mut text = String::from("a,b\n");
        for i in 1..=10 {
            text.push_str(&format!("{},{}\n", i, 20 - i * 2));
        }
        let result = analyze(&csv::parse(&text), "c.csv");
        let corr = result
            .patterns
            .iter()
            .find(|p| p.pattern_type == PatternType::Correlation)
            .unwrap();

        assert_eq!(corr.details["correlation"], -1.0);
        assert!(corr.description.starts_with("Strong negative correlation"));
    }

    #[test]
    fn test_data_quality_and_severity_order() {
        let data = csv::parse("a,b,c\n1,x,k\n,y,k\n,z,k\n4,w,k");
        let result = analyze(&data, "q.csv");

        let first = &result.patterns[0];
        assert_eq!(first.pattern_type, PatternType::DataQuality);
        assert_eq!(first.severity, Severity::Significant);
        let severities: Vec<Severity> = result.patterns.iter().map(|p| p.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort();
        assert_eq!(severities, sorted);
        assert!(result
            .patterns
            .iter()
            .any(|p| p.description == "Column 'c' has only one unique value"));
    }

    #[test]
    fn test_parse_date_layouts() {
        assert!(parse_date("2024-01-15").is_some());
        assert!(parse_date("2024-01-15 08:30:00").is_some());
        assert!(parse_date("2024/01/15").is_some());
        assert!(parse_date("2024-01").is_some());
        assert!(parse_date("January").is_none());
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            analysis_output_path(Path::new("out/q1_result.csv")),
            PathBuf::from("out/q1_analysis.json")
        );
        assert_eq!(
            analysis_output_path(Path::new("out/data.csv")),
            PathBuf::from("out/data_analysis.json")
        );
    }

    #[test]
    fn test_analyze_file_writes_snake_case() {
        let temp_dir = TempDir::new().unwrap();
        let csv_path = temp_dir.path().join("q_result.csv");
        std::fs::write(&csv_path, "x,y\na,1\nb,2").unwrap();

        let result = analyze_file(&csv_path).unwrap();
        let out = analysis_output_path(&csv_path);
        result.save_to_file(&out).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(json["dataset_stats"]["row_count"], 2);
        assert_eq!(json["dataset_stats"]["column_stats"][1]["min_val"], 1.0);
        assert_eq!(json["dataset_stats"]["column_stats"][0]["mean"], serde_json::Value::Null);
    }
}
