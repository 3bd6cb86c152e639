//! Chart export runner
//!
//! Walks the report's table-bearing tabs in display order and hands every
//! selected chart to a [`ChartCapture`] backend. A failing capture is logged
//! and skipped; the manifest lists what was written.

use crate::error::Result;
use crate::file_manager::{ensure_dir_exists, write_file};
use crate::html;
use chart_report_core::export::{ChartExport, ExportFilters, ExportLedger};
use chart_report_core::nav::PrimaryTab;
use chart_report_core::report::{ChartLocation, TableAnalysis};
use chart_report_core::value::Row;
use chart_report_core::{pipeline, Report};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Produces one artifact per chart
pub trait ChartCapture {
    /// File extension of the produced artifacts
    fn extension(&self) -> &'static str;

    fn capture(&mut self, target: &ChartLocation<'_>, path: &Path) -> Result<()>;
}

/// Standalone HTML page per chart
#[derive(Debug, Default)]
pub struct HtmlCapture;

impl ChartCapture for HtmlCapture {
    fn extension(&self) -> &'static str {
        "html"
    }

    fn capture(&mut self, target: &ChartLocation<'_>, path: &Path) -> Result<()> {
        let page = html::generate_chart_page(target)?;
        write_file(path, page.as_bytes())
    }
}

/// Render-ready series of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSnapshot {
    pub chart_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x_key: String,
    pub categories: Vec<String>,
    pub rows: Vec<Row>,
}

impl ChartSnapshot {
    pub fn from_location(target: &ChartLocation<'_>) -> Self {
        let chart = target.chart;
        let series = pipeline::build(chart, &target.query.dataset());
        Self {
            chart_id: chart.id.clone(),
            title: chart.title.clone(),
            kind: chart.kind.to_string(),
            x_key: chart.x_key.clone(),
            categories: series.categories,
            rows: series.rows,
        }
    }
}

/// Series data as pretty JSON per chart
#[derive(Debug, Default)]
pub struct JsonCapture;

impl ChartCapture for JsonCapture {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn capture(&mut self, target: &ChartLocation<'_>, path: &Path) -> Result<()> {
        let snapshot = ChartSnapshot::from_location(target);
        let content = serde_json::to_string_pretty(&snapshot)?;
        write_file(path, content.as_bytes())
    }
}

/// Result of an export run
#[derive(Debug)]
pub struct ExportOutcome {
    pub exports: Vec<ChartExport>,
    /// Written only when something was exported
    pub manifest_path: Option<PathBuf>,
}

/// Export the charts selected by `filters` into `output_dir`
pub fn run_export<C: ChartCapture>(
    report: &Report,
    filters: &ExportFilters,
    output_dir: &Path,
    capture: &mut C,
    exported_at: DateTime<Utc>,
) -> Result<ExportOutcome> {
    filters.validate()?;
    ensure_dir_exists(output_dir)?;

    info!("Exporting charts to: {}", output_dir.display());
    if let Some(ids) = &filters.chart_ids {
        info!("Chart IDs filter: {}", ids.join(", "));
    }
    if let Some(id) = &filters.chart_id {
        info!("Chart ID filter: {}", id);
    }
    if let Some(name) = &filters.table_name {
        info!("Table name: {}", name);
    } else if let Some(filter) = &filters.table_filter {
        info!("Table filter: {}", filter);
    }

    let mut ledger = ExportLedger::new();

    'tabs: for tab in report.tab_layout().tabs() {
        let tables = match tab {
            PrimaryTab::InitialAnalysis => &report.tables[..],
            PrimaryTab::AdvancedAnalysis => report.advanced(),
            _ => continue,
        };
        info!("Processing tab: {}", tab.label());

        for table in tables {
            if !filters.matches_table(&table.table_name) {
                debug!("Skipping table {}", table.table_name);
                continue;
            }
            info!("  Processing table: {}", table.table_name);

            export_table(table, filters, output_dir, capture, &mut ledger);

            if filters.is_single_chart() && !ledger.is_empty() {
                break 'tabs;
            }
        }
    }

    info!("Exported {} chart(s)", ledger.len());
    for export in ledger.exports() {
        info!(
            "  - {}: {} ({})",
            export.title,
            export.filename,
            export.chart_id.as_deref().unwrap_or("no-id")
        );
    }

    if ledger.is_empty() {
        return Ok(ExportOutcome {
            exports: Vec::new(),
            manifest_path: None,
        });
    }

    let manifest = ledger.into_manifest(filters, exported_at);
    let manifest_path = manifest.save_to_dir(output_dir)?;
    info!("Manifest saved to: {}", manifest_path.display());

    Ok(ExportOutcome {
        exports: manifest.charts,
        manifest_path: Some(manifest_path),
    })
}

fn export_table<C: ChartCapture>(
    table: &TableAnalysis,
    filters: &ExportFilters,
    output_dir: &Path,
    capture: &mut C,
    ledger: &mut ExportLedger,
) {
    for query in &table.queries {
        for chart in &query.charts {
            if ledger.contains(&chart.title) {
                continue;
            }

            let chart_id = Some(chart.id.as_str()).filter(|id| !id.is_empty());
            if !filters.accepts_chart(chart_id) {
                continue;
            }

            let export = ChartExport::new(&chart.title, chart_id, capture.extension());
            let path = output_dir.join(&export.filename);
            let target = ChartLocation { table, query, chart };

            match capture.capture(&target, &path) {
                Ok(()) => {
                    info!("Exported: {}", path.display());
                    ledger.record(export);
                }
                Err(e) => error!("Failed to export '{}': {}", chart.title, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const REPORT: &str = r#"{
        "metadata": {"title": "Export test"},
        "tables": [
            {"tableName": "fct_share_attempts", "status": "complete", "queries": [
                {"id": "q1", "title": "Q1", "csvData": "k,v\na,1\nb,2", "charts": [
                    {"id": "fct_share_attempts-1-chart-1", "title": "Shares by Week", "type": "bar", "xKey": "k", "yKey": "v"},
                    {"id": "fct_share_attempts-1-chart-2", "title": "Broken Chart", "type": "bar", "xKey": "k", "yKey": "v"},
                    {"id": "", "title": "Untracked", "type": "line", "xKey": "k", "yKey": "v"}
                ]}
            ]},
            {"tableName": "dim_users", "status": "complete", "queries": [
                {"id": "q2", "title": "Q2", "csvData": "k,v\na,1", "charts": [
                    {"id": "dim_users-1-chart-1", "title": "Shares by Week", "type": "bar", "xKey": "k", "yKey": "v"},
                    {"id": "dim_users-1-chart-2", "title": "Users", "type": "donut", "xKey": "k", "yKey": "v"}
                ]}
            ]}
        ],
        "advancedAnalyses": [
            {"tableName": "cohort_retention", "status": "complete", "queries": [
                {"id": "q3", "title": "Q3", "csvData": "day,r\n1,0.5", "charts": [
                    {"id": "cohort_retention-1-chart-1", "title": "Retention", "type": "line", "xKey": "day", "yKey": "r"}
                ]}
            ]}
        ]
    }"#;

    /// Records capture order; fails on titles listed in `fail`
    #[derive(Default)]
    struct RecordingCapture {
        captured: Vec<String>,
        fail: Vec<&'static str>,
    }

    impl ChartCapture for RecordingCapture {
        fn extension(&self) -> &'static str {
            "png"
        }

        fn capture(&mut self, target: &ChartLocation<'_>, path: &Path) -> Result<()> {
            if self.fail.contains(&target.chart.title.as_str()) {
                return Err(Error::FileWrite {
                    path: path.display().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "canvas not found"),
                });
            }
            std::fs::write(path, b"png").map_err(|e| Error::FileWrite {
                path: path.display().to_string(),
                source: e,
            })?;
            self.captured.push(target.chart.id.clone());
            Ok(())
        }
    }

    fn report() -> Report {
        Report::from_json(REPORT).unwrap()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_exports_all_in_order_and_dedupes_titles() {
        let dir = TempDir::new().unwrap();
        let mut capture = RecordingCapture {
            fail: vec!["Broken Chart"],
            ..Default::default()
        };

        let outcome = run_export(&report(), &ExportFilters::default(), dir.path(), &mut capture, at()).unwrap();

        assert_eq!(
            capture.captured,
            vec![
                "fct_share_attempts-1-chart-1",
                "",
                "dim_users-1-chart-2",
                "cohort_retention-1-chart-1"
            ]
        );
        let titles: Vec<&str> = outcome.exports.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Shares by Week", "Untracked", "Users", "Retention"]);
        assert_eq!(outcome.exports[1].chart_id, None);
        assert!(dir.path().join("shares_by_week.png").exists());
        assert!(!dir.path().join("broken_chart.png").exists());

        let manifest = std::fs::read_to_string(outcome.manifest_path.unwrap()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(json["exportedAt"], "2024-04-01T00:00:00.000Z");
        assert_eq!(json["charts"].as_array().unwrap().len(), 4);
        assert_eq!(json["charts"][0]["tableName"], "fct_share_attempts");
    }

    #[test]
    fn test_single_chart_stops_after_first_export() {
        let dir = TempDir::new().unwrap();
        let mut capture = RecordingCapture::default();
        let filters = ExportFilters {
            chart_id: Some("dim_users-1-chart-2".to_string()),
            table_name: Some("dim_users".to_string()),
            ..Default::default()
        };

        let outcome = run_export(&report(), &filters, dir.path(), &mut capture, at()).unwrap();
        assert_eq!(capture.captured, vec!["dim_users-1-chart-2"]);
        assert_eq!(outcome.exports.len(), 1);
    }

    #[test]
    fn test_invalid_filters_abort_before_capture() {
        let dir = TempDir::new().unwrap();
        let mut capture = RecordingCapture::default();
        let filters = ExportFilters {
            chart_id: Some("dim_users-1-chart-2".to_string()),
            ..Default::default()
        };

        let result = run_export(&report(), &filters, &dir.path().join("out"), &mut capture, at());
        assert!(matches!(result, Err(Error::Core(_))));
        assert!(capture.captured.is_empty());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_table_filter_and_id_list() {
        let dir = TempDir::new().unwrap();
        let mut capture = RecordingCapture::default();
        let filters = ExportFilters {
            table_filter: Some("SHARE-attempts".to_string()),
            chart_ids: Some(vec!["fct_share_attempts-1-chart-2".to_string()]),
            ..Default::default()
        };

        run_export(&report(), &filters, dir.path(), &mut capture, at()).unwrap();
        assert_eq!(capture.captured, vec!["fct_share_attempts-1-chart-2", ""]);
    }

    #[test]
    fn test_no_exports_writes_no_manifest() {
        let dir = TempDir::new().unwrap();
        let mut capture = RecordingCapture::default();
        let filters = ExportFilters {
            table_filter: Some("nothing_matches".to_string()),
            ..Default::default()
        };

        let outcome = run_export(&report(), &filters, dir.path(), &mut capture, at()).unwrap();
        assert!(outcome.exports.is_empty());
        assert!(outcome.manifest_path.is_none());
        assert!(!dir.path().join("manifest.json").exists());
    }

    #[test]
    fn test_json_and_html_captures() {
        let dir = TempDir::new().unwrap();
        let report = report();
        let target = report.find_chart("fct_share_attempts-1-chart-1").unwrap();

        let json_path = dir.path().join("c.json");
        JsonCapture.capture(&target, &json_path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["type"], "bar");
        assert_eq!(json["categories"], serde_json::json!(["v"]));
        assert_eq!(json["rows"][1]["v"], 2.0);

        let html_path = dir.path().join("c.html");
        HtmlCapture.capture(&target, &html_path).unwrap();
        assert!(std::fs::read_to_string(&html_path).unwrap().contains("Shares by Week"));
    }
}
