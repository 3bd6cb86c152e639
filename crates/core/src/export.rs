//! Chart export selection, naming and manifest

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

/// Manifest file name inside the export directory
pub const MANIFEST_FILE: &str = "manifest.json";

const MAX_FILENAME_LEN: usize = 100;

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex"))
}

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9_-]").expect("Invalid regex"))
}

/// File stem for a chart title.
///
/// Lowercases, turns whitespace runs into `_`, drops everything outside
/// `[a-z0-9_-]` and keeps at most 100 characters.
pub fn sanitize_filename(title: &str) -> String {
    let lower = title.to_lowercase();
    let underscored = whitespace_run().replace_all(&lower, "_");
    let cleaned = disallowed_chars().replace_all(&underscored, "");
    cleaned.chars().take(MAX_FILENAME_LEN).collect()
}

/// Table name encoded in a chart id of the form `{table}-{query}-chart-{n}`
pub fn table_name_from_chart_id(chart_id: &str) -> Option<String> {
    let parts: Vec<&str> = chart_id.split('-').collect();
    if parts.len() <= 3 {
        return None;
    }
    let table = parts[..parts.len() - 3].join("-").replace('-', "_");
    if table.is_empty() {
        None
    } else {
        Some(table)
    }
}

/// Comparison form of a table name: lowercase without `_`, `-` or whitespace
pub fn normalize_table_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Which charts an export run should capture
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFilters {
    /// Only these chart ids (charts without an id are not excluded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_ids: Option<Vec<String>>,
    /// Exactly this chart; requires `table_name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Substring match on table names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_filter: Option<String>,
}

impl ExportFilters {
    pub fn validate(&self) -> Result<()> {
        if self.chart_id.is_some() && self.table_name.is_none() {
            return Err(Error::ConfigError(
                "--chart-id requires --table-name to be specified \
                 (e.g. --table-name fct_share_attempts --chart-id fct_share_attempts-1-chart-1)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn effective_table_filter(&self) -> Option<&str> {
        self.table_name
            .as_deref()
            .or(self.table_filter.as_deref())
            .filter(|f| !f.is_empty())
    }

    /// Whether a table takes part in the run
    pub fn matches_table(&self, table_name: &str) -> bool {
        match self.effective_table_filter() {
            Some(filter) => {
                normalize_table_name(table_name).contains(&normalize_table_name(filter))
            }
            None => true,
        }
    }

    /// Whether a chart passes the id filters
    pub fn accepts_chart(&self, chart_id: Option<&str>) -> bool {
        if let Some(wanted) = self.chart_id.as_deref() {
            if chart_id != Some(wanted) {
                return false;
            }
        }

        match (self.chart_ids.as_deref(), chart_id) {
            (Some(ids), Some(id)) if !ids.is_empty() => ids.iter().any(|i| i == id),
            _ => true,
        }
    }

    /// Whether the run is after a single chart
    pub fn is_single_chart(&self) -> bool {
        self.chart_id.is_some()
    }
}

/// One exported chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartExport {
    pub title: String,
    pub filename: String,
    pub chart_id: Option<String>,
    pub table_name: Option<String>,
}

impl ChartExport {
    /// Describe the export of a chart titled `title` to a file with `extension`
    pub fn new(title: &str, chart_id: Option<&str>, extension: &str) -> Self {
        Self {
            title: title.to_string(),
            filename: format!("{}.{}", sanitize_filename(title), extension),
            chart_id: chart_id.map(str::to_string),
            table_name: chart_id.and_then(table_name_from_chart_id),
        }
    }
}

/// Exports of a run, at most one per title, in capture order
#[derive(Debug, Clone, Default)]
pub struct ExportLedger {
    titles: HashSet<String>,
    exports: Vec<ChartExport>,
}

impl ExportLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains(title)
    }

    /// Record an export; returns false when its title was already exported
    pub fn record(&mut self, export: ChartExport) -> bool {
        if !self.titles.insert(export.title.clone()) {
            return false;
        }
        self.exports.push(export);
        true
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    pub fn exports(&self) -> &[ChartExport] {
        &self.exports
    }

    pub fn into_manifest(self, filters: &ExportFilters, exported_at: DateTime<Utc>) -> ExportManifest {
        ExportManifest {
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            table_filter: filters.table_filter.clone(),
            table_name: filters.table_name.clone(),
            chart_id_filter: filters.chart_id.clone(),
            chart_ids_filter: filters.chart_ids.clone(),
            charts: self.exports,
        }
    }
}

/// Summary written next to the exported charts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportManifest {
    /// RFC 3339 timestamp, millisecond precision
    pub exported_at: String,
    pub table_filter: Option<String>,
    pub table_name: Option<String>,
    pub chart_id_filter: Option<String>,
    pub chart_ids_filter: Option<Vec<String>>,
    pub charts: Vec<ChartExport>,
}

impl ExportManifest {
    /// Write as pretty JSON to `dir/manifest.json`
    pub fn save_to_dir(&self, dir: &Path) -> Result<std::path::PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).map_err(|e| Error::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("Top Devices: iOS/Android (2024)"),
            "top_devices_iosandroid_2024"
        );
        assert_eq!(sanitize_filename("  Weekly\t\tShares  "), "_weekly_shares_");
        assert_eq!(sanitize_filename("a-b_c"), "a-b_c");
        assert_eq!(sanitize_filename(&"x".repeat(150)).len(), 100);
    }

    #[test]
    fn test_table_name_from_chart_id() {
        assert_eq!(
            table_name_from_chart_id("fct_share_attempts-1-chart-1").as_deref(),
            Some("fct_share_attempts")
        );
        assert_eq!(
            table_name_from_chart_id("share-attempts-2-chart-3").as_deref(),
            Some("share_attempts")
        );
        assert_eq!(table_name_from_chart_id("1-chart-1"), None);
        assert_eq!(table_name_from_chart_id("standalone"), None);
    }

    #[test]
    fn test_normalize_table_name() {
        assert_eq!(normalize_table_name("FCT_Share-Attempts v2"), "fctshareattemptsv2");
    }

    #[test]
    fn test_chart_id_requires_table_name() {
        let filters = ExportFilters {
            chart_id: Some("t-1-chart-1".to_string()),
            ..Default::default()
        };
        assert!(matches!(filters.validate(), Err(Error::ConfigError(_))));

        let filters = ExportFilters {
            chart_id: Some("t-1-chart-1".to_string()),
            table_name: Some("t".to_string()),
            ..Default::default()
        };
        assert!(filters.validate().is_ok());
        assert!(ExportFilters::default().validate().is_ok());
    }

    #[test]
    fn test_table_matching() {
        let filters = ExportFilters {
            table_filter: Some("share-attempts".to_string()),
            ..Default::default()
        };
        assert!(filters.matches_table("fct_share_attempts"));
        assert!(!filters.matches_table("dim_users"));

        // table name wins over the substring filter
        let filters = ExportFilters {
            table_name: Some("dim_users".to_string()),
            table_filter: Some("share".to_string()),
            ..Default::default()
        };
        assert_eq!(filters.effective_table_filter(), Some("dim_users"));
        assert!(filters.matches_table("DIM USERS"));
        assert!(!filters.matches_table("fct_share_attempts"));

        assert!(ExportFilters::default().matches_table("anything"));
    }

    #[test]
    fn test_chart_acceptance() {
        let filters = ExportFilters {
            chart_ids: Some(vec!["a-1-chart-1".to_string(), "a-1-chart-2".to_string()]),
            ..Default::default()
        };
        assert!(filters.accepts_chart(Some("a-1-chart-2")));
        assert!(!filters.accepts_chart(Some("a-1-chart-3")));
        assert!(filters.accepts_chart(None));

        let single = ExportFilters {
            chart_id: Some("a-1-chart-1".to_string()),
            table_name: Some("a".to_string()),
            ..Default::default()
        };
        assert!(single.accepts_chart(Some("a-1-chart-1")));
        assert!(!single.accepts_chart(Some("a-1-chart-2")));
        assert!(!single.accepts_chart(None));
    }

    #[test]
    fn test_ledger_dedupes_titles() {
        let mut ledger = ExportLedger::new();
        assert!(ledger.record(ChartExport::new("Shares", Some("t-1-chart-1"), "png")));
        assert!(!ledger.record(ChartExport::new("Shares", Some("t-2-chart-1"), "png")));
        assert!(ledger.record(ChartExport::new("Mix", None, "png")));

        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("Shares"));
        assert_eq!(ledger.exports()[0].chart_id.as_deref(), Some("t-1-chart-1"));
        assert_eq!(ledger.exports()[1].table_name, None);
    }

    #[test]
    fn test_manifest_written_as_camel_case() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = ExportLedger::new();
        ledger.record(ChartExport::new("Shares by Week", Some("fct_share-1-chart-1"), "png"));

        let filters = ExportFilters {
            table_filter: Some("share".to_string()),
            ..Default::default()
        };
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 12, 30, 0).unwrap();
        let manifest = ledger.into_manifest(&filters, at);
        let path = manifest.save_to_dir(temp_dir.path()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["exportedAt"], "2024-04-01T12:30:00.000Z");
        assert_eq!(json["tableFilter"], "share");
        assert_eq!(json["chartIdFilter"], serde_json::Value::Null);
        assert_eq!(json["charts"][0]["filename"], "shares_by_week.png");
        assert_eq!(json["charts"][0]["chartId"], "fct_share-1-chart-1");
        assert_eq!(json["charts"][0]["tableName"], "fct_share");
    }
}
