//! chart-report-core - Chart data pipeline for analysis reports
//!
//! Turns raw query-result CSV text into render-ready series for charts.
//! Everything here is synchronous and side-effect free apart from the
//! explicit file helpers, so the same code backs the CLI and its tests.
//!
//! # Features
//!
//! - Parse CSV text into typed rows
//! - Filter, aggregate, pivot, sort and window rows per chart configuration
//! - Address report tabs and tables through URL query parameters
//! - Select and name chart exports
//! - Profile a CSV for patterns worth charting

pub mod aggregate;
pub mod analyze;
pub mod chart;
pub mod csv;
pub mod error;
pub mod export;
pub mod filter;
pub mod format;
pub mod nav;
pub mod pipeline;
pub mod pivot;
pub mod report;
pub mod sort;
pub mod value;
pub mod window;

pub use aggregate::{aggregate, AggregateFunction};
pub use analyze::{analyze, analyze_file, AnalysisResult};
pub use chart::{ChartConfig, ChartKind, ChartPlan, DataStrategy};
pub use error::{Error, Result};
pub use export::{ChartExport, ExportFilters, ExportLedger, ExportManifest};
pub use filter::{filter_rows, FilterPredicate};
pub use nav::{AddressBar, NavState, Navigator, PrimaryTab, TabLayout, TableDirectory};
pub use pipeline::{build, Series};
pub use pivot::{pivot, Pivoted, XKeyTransform};
pub use report::{QuerySection, Report, TableAnalysis};
pub use sort::sort_rows;
pub use value::{Dataset, Row, Value};
pub use window::{window, Window};
