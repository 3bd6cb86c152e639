//! chart-report CLI - Render, inspect and export chart reports

use anyhow::{Context, Result};
use chart_report_core::analyze::analysis_output_path;
use chart_report_core::format::format_grouped;
use chart_report_core::nav::{self, PrimaryTab};
use chart_report_core::{analyze_file, pipeline, ExportFilters, Report, Value};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

mod error;
mod export;
mod file_manager;
mod html;
mod validation;

use export::{run_export, HtmlCapture, JsonCapture};
use html::RenderOptions;

/// chart-report: Render and export data-analysis chart reports
#[derive(Parser, Debug)]
#[command(name = "chart-report")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a report document to a standalone HTML page
    Render(RenderArgs),
    /// Print the render-ready series of one chart
    Series(SeriesArgs),
    /// Build or resolve tab/table query strings
    #[command(subcommand)]
    Url(UrlCommand),
    /// Export charts to individual files with a manifest
    Export(ExportArgs),
    /// Profile a CSV file and detect notable patterns
    Analyze(AnalyzeArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[arg(short, long, value_name = "FILE")]
    report: PathBuf,

    #[arg(short, long, default_value = "report-site")]
    output: PathBuf,

    /// Absolute URL the report is served from
    #[arg(long, env = "CHART_REPORT_BASE_URL")]
    base_url: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SeriesFormat {
    Json,
    Table,
}

#[derive(Parser, Debug)]
struct SeriesArgs {
    #[arg(short, long, value_name = "FILE")]
    report: PathBuf,

    #[arg(long)]
    chart_id: String,

    #[arg(long, value_enum, default_value = "table")]
    format: SeriesFormat,
}

#[derive(Subcommand, Debug)]
enum UrlCommand {
    /// Query string for a tab and optional table
    Encode(UrlEncodeArgs),
    /// Resolve a query string to tab and table selections
    Decode(UrlDecodeArgs),
}

#[derive(Parser, Debug)]
struct UrlEncodeArgs {
    #[arg(short, long, value_name = "FILE")]
    report: PathBuf,

    /// Tab slug (overview, research, initial-analysis, advanced-analysis, next-steps)
    #[arg(long, default_value = "overview")]
    tab: String,

    /// Table name or slug on the chosen tab
    #[arg(long)]
    table: Option<String>,

    #[arg(long, env = "CHART_REPORT_BASE_URL")]
    base_url: Option<String>,
}

#[derive(Parser, Debug)]
struct UrlDecodeArgs {
    #[arg(short, long, value_name = "FILE")]
    report: PathBuf,

    /// Query string, with or without the leading `?`
    query: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CaptureFormat {
    Html,
    Json,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[arg(short, long, value_name = "FILE")]
    report: PathBuf,

    #[arg(short, long, default_value = "./screenshots")]
    output: PathBuf,

    /// Comma-separated chart ids
    #[arg(long)]
    chart_ids: Option<String>,

    /// Single chart id; requires --table-name
    #[arg(long)]
    chart_id: Option<String>,

    /// Exact table to export from
    #[arg(long)]
    table_name: Option<String>,

    /// Substring filter on table names
    #[arg(long)]
    table: Option<String>,

    #[arg(long, value_enum, default_value = "html")]
    format: CaptureFormat,
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    #[arg(value_name = "CSV")]
    csv: PathBuf,

    /// Defaults to `<name>_analysis.json` next to the CSV
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Render(args) => render_command(args),
        Commands::Series(args) => series_command(args),
        Commands::Url(UrlCommand::Encode(args)) => url_encode_command(args),
        Commands::Url(UrlCommand::Decode(args)) => url_decode_command(args),
        Commands::Export(args) => export_command(args),
        Commands::Analyze(args) => analyze_command(args),
    }
}

fn load_report(path: &Path) -> Result<Report> {
    validation::validate_file_exists(path, "Report file")?;
    let report = Report::load_from_file(path)
        .with_context(|| format!("Failed to load report: {:?}", path))?;
    debug!(
        "Loaded report '{}' with {} table(s)",
        report.metadata.title,
        report.tables.len()
    );
    Ok(report)
}

fn render_command(args: RenderArgs) -> Result<()> {
    let report = load_report(&args.report)?;

    let base_url = args
        .base_url
        .as_deref()
        .map(validation::parse_base_url)
        .transpose()?;
    let options = RenderOptions { base_url };

    validation::validate_dir_writable(&args.output, "Output directory")?;
    let path = html::write_report(&report, &options, &args.output)
        .with_context(|| "Failed to render report")?;

    let charts = report.charts().count();
    info!("Rendered {} chart(s) to {:?}", charts, path);
    Ok(())
}

fn series_command(args: SeriesArgs) -> Result<()> {
    let report = load_report(&args.report)?;
    let location = report
        .find_chart(&args.chart_id)
        .with_context(|| format!("Chart '{}' not found", args.chart_id))?;

    let chart = location.chart;
    let series = pipeline::build(chart, &location.query.dataset());
    debug!(
        "Chart {} ({}) produced {} row(s)",
        chart.id,
        chart.kind,
        series.len()
    );

    match args.format {
        SeriesFormat::Json => {
            let output = serde_json::json!({
                "chartId": chart.id,
                "type": chart.kind.to_string(),
                "xKey": chart.x_key,
                "categories": series.categories,
                "rows": series.rows,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        SeriesFormat::Table => {
            println!("## {}\n", chart.title);
            let mut columns = vec![chart.x_key.as_str()];
            columns.extend(series.categories.iter().map(String::as_str));
            println!("{}", columns.join("\t"));

            for row in &series.rows {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|column| match row.get(*column) {
                        Some(Value::Number(n)) => format_grouped(*n),
                        Some(value) => value.as_text(),
                        None => "-".to_string(),
                    })
                    .collect();
                println!("{}", cells.join("\t"));
            }
        }
    }

    Ok(())
}

fn url_encode_command(args: UrlEncodeArgs) -> Result<()> {
    let report = load_report(&args.report)?;
    let tables = report.table_directory();
    let layout = tables.layout();

    let tab = PrimaryTab::from_slug(&args.tab)
        .with_context(|| format!("Unknown tab '{}'", args.tab))?;
    let primary_tab = layout
        .index_of(tab)
        .with_context(|| format!("Tab '{}' is not shown for this report", tab.slug()))?;

    let table_index = match args.table.as_deref() {
        Some(wanted) => {
            let slug = nav::table_slug(wanted);
            tables
                .tables_for(tab)
                .iter()
                .position(|name| nav::table_slug(name) == slug)
                .with_context(|| format!("Table '{}' not found on tab '{}'", wanted, tab))?
        }
        None => 0,
    };

    let query = nav::encode(primary_tab, table_index, &tables);
    match args.base_url.as_deref() {
        Some(raw) => {
            let base = validation::parse_base_url(raw)?;
            println!("{}", nav::href(&base, &query));
        }
        None if query.is_empty() => println!("?"),
        None => println!("?{}", query),
    }

    Ok(())
}

fn url_decode_command(args: UrlDecodeArgs) -> Result<()> {
    let report = load_report(&args.report)?;
    let tables = report.table_directory();
    let layout = tables.layout();

    let state = nav::decode(&args.query, &tables);
    let tab = layout.get(state.primary_tab).unwrap_or(PrimaryTab::Overview);
    let table = tables
        .tables_for(tab)
        .get(state.active_table(&layout))
        .cloned();

    let output = serde_json::json!({
        "state": state,
        "tab": tab.slug(),
        "table": table,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn export_command(args: ExportArgs) -> Result<()> {
    let report = load_report(&args.report)?;

    let filters = ExportFilters {
        chart_ids: args
            .chart_ids
            .as_deref()
            .map(validation::parse_id_list)
            .transpose()?,
        chart_id: args.chart_id,
        table_name: args.table_name,
        table_filter: args.table,
    };

    let outcome = match args.format {
        CaptureFormat::Html => run_export(&report, &filters, &args.output, &mut HtmlCapture, Utc::now()),
        CaptureFormat::Json => run_export(&report, &filters, &args.output, &mut JsonCapture, Utc::now()),
    }
    .with_context(|| "Chart export failed")?;

    if outcome.exports.is_empty() {
        warn!("No charts matched the export filters");
    }

    Ok(())
}

fn analyze_command(args: AnalyzeArgs) -> Result<()> {
    validation::validate_file_exists(&args.csv, "CSV file")?;
    info!("Analyzing {:?}", args.csv);

    let result = analyze_file(&args.csv)
        .with_context(|| format!("Failed to analyze {:?}", args.csv))?;

    let stats = &result.dataset_stats;
    println!(
        "Dataset: {} rows x {} columns",
        stats.row_count, stats.column_count
    );
    if !stats.date_columns.is_empty() {
        println!("  Date columns: {}", stats.date_columns.join(", "));
    }
    if !stats.numeric_columns.is_empty() {
        println!("  Numeric columns: {}", stats.numeric_columns.join(", "));
    }
    if !stats.categorical_columns.is_empty() {
        println!(
            "  Categorical columns: {}",
            stats.categorical_columns.join(", ")
        );
    }

    println!("\nPatterns ({}):", result.patterns.len());
    for pattern in &result.patterns {
        println!("  [{:?}] {}", pattern.severity, pattern.description);
    }

    if !result.recommendations.is_empty() {
        println!("\nRecommendations:");
        for recommendation in &result.recommendations {
            println!("  - {}", recommendation);
        }
    }

    let output = args
        .output
        .unwrap_or_else(|| analysis_output_path(&args.csv));
    result
        .save_to_file(&output)
        .with_context(|| "Failed to save analysis")?;
    info!("Saved analysis to {:?}", output);

    Ok(())
}
