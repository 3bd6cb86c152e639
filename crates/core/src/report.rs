//! Report document model and storage

use crate::chart::ChartConfig;
use crate::csv;
use crate::nav::{TabLayout, TableDirectory};
use crate::value::{Dataset, Value};
use serde::{Deserialize, Serialize};

/// Report header information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub date_range: String,
}

/// Direction of a KPI change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// A headline metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiMetric {
    pub label: String,
    pub value: Value,
    /// Percentage change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Supported,
    Inconclusive,
    NotSupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchQuestion {
    pub question: String,
    #[serde(default)]
    pub findings: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    pub priority: Priority,
}

/// One query against a table: SQL, narrative, charts and result CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub sql: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub observations: Vec<String>,
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
    /// Raw CSV content of the query result
    #[serde(default)]
    pub csv_data: String,
    /// Display path of the CSV file
    #[serde(default)]
    pub csv_path: String,
}

impl QuerySection {
    /// Parse the query's result CSV
    pub fn dataset(&self) -> Dataset {
        csv::parse(&self.csv_data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Complete,
    Stale,
    Failed,
}

/// Analysis of a single source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableAnalysis {
    pub table_name: String,
    #[serde(default)]
    pub description: String,
    pub status: TableStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
    #[serde(default)]
    pub queries: Vec<QuerySection>,
}

/// The full report document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub metadata: ReportMetadata,
    #[serde(default)]
    pub kpis: Vec<KpiMetric>,
    #[serde(default)]
    pub executive_summary: Vec<String>,
    #[serde(default)]
    pub research_questions: Vec<ResearchQuestion>,
    #[serde(default)]
    pub tables: Vec<TableAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_analyses: Option<Vec<TableAnalysis>>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

/// A chart located within the report
#[derive(Debug, Clone, Copy)]
pub struct ChartLocation<'a> {
    pub table: &'a TableAnalysis,
    pub query: &'a QuerySection,
    pub chart: &'a ChartConfig,
}

impl Report {
    /// Parse a report from JSON text
    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a report from a JSON file
    pub fn load_from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::error::Error::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;

        Self::from_json(&content)
    }

    /// Save the report as pretty JSON
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| crate::error::Error::FileWriteError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| crate::error::Error::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Advanced analyses, empty when absent
    pub fn advanced(&self) -> &[TableAnalysis] {
        self.advanced_analyses.as_deref().unwrap_or(&[])
    }

    pub fn has_advanced(&self) -> bool {
        !self.advanced().is_empty()
    }

    /// Primary tabs shown for this report
    pub fn tab_layout(&self) -> TabLayout {
        TabLayout::new(self.has_advanced())
    }

    /// Table names per table-bearing tab, for URL addressing
    pub fn table_directory(&self) -> TableDirectory {
        TableDirectory::new(
            self.tables.iter().map(|t| t.table_name.clone()).collect(),
            self.advanced().iter().map(|t| t.table_name.clone()).collect(),
        )
    }

    /// Every chart in document order (initial tables, then advanced)
    pub fn charts(&self) -> impl Iterator<Item = ChartLocation<'_>> {
        self.tables
            .iter()
            .chain(self.advanced().iter())
            .flat_map(|table| {
                table.queries.iter().flat_map(move |query| {
                    query
                        .charts
                        .iter()
                        .map(move |chart| ChartLocation { table, query, chart })
                })
            })
    }

    /// Find a chart by id
    pub fn find_chart(&self, id: &str) -> Option<ChartLocation<'_>> {
        self.charts().find(|loc| loc.chart.id == id)
    }
}
