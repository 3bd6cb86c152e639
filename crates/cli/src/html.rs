//! HTML report generator with Chart.js

use crate::error::Result;
use chart_report_core::chart::AxisFormatter;
use chart_report_core::export::sanitize_filename;
use chart_report_core::format::{format_grouped, format_percent};
use chart_report_core::nav::{self, PrimaryTab, TableDirectory};
use chart_report_core::report::{ChartLocation, KpiMetric, QuerySection, TableAnalysis};
use chart_report_core::value::{text_of, Value};
use chart_report_core::{pipeline, ChartConfig, ChartKind, Report, Series};
use minijinja::{context, Environment};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

const STYLE_TEMPLATE: &str = r#"<style>
    :root {
        --bg-primary: #0d1117;
        --bg-secondary: #161b22;
        --bg-tertiary: #21262d;
        --text-primary: #c9d1d9;
        --text-secondary: #8b949e;
        --text-muted: #6e7681;
        --border-color: #30363d;
        --accent-blue: #58a6ff;
        --accent-green: #3fb950;
        --accent-red: #f85149;
        --accent-purple: #a371f7;
        --accent-orange: #d29922;
    }

    * { margin: 0; padding: 0; box-sizing: border-box; }

    body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
        background: var(--bg-primary);
        color: var(--text-primary);
        line-height: 1.6;
        min-height: 100vh;
    }

    .container { max-width: 1400px; margin: 0 auto; padding: 2rem; }

    header {
        margin-bottom: 2rem;
        padding: 2rem;
        background: linear-gradient(135deg, var(--bg-secondary) 0%, var(--bg-tertiary) 100%);
        border-radius: 16px;
        border: 1px solid var(--border-color);
    }

    h1 { font-size: 2.25rem; font-weight: 600; color: var(--accent-blue); }
    h2 { font-size: 1.4rem; font-weight: 600; margin-bottom: 1rem; }
    h3 { font-size: 1.15rem; font-weight: 600; margin-bottom: 0.5rem; }
    .subtitle { color: var(--text-secondary); font-size: 1.1rem; }
    .meta { color: var(--text-muted); font-size: 0.9rem; margin-top: 0.75rem; }

    nav.tabs, nav.subtabs { display: flex; gap: 0.5rem; margin-bottom: 1.5rem; flex-wrap: wrap; }
    nav.tabs a, nav.subtabs a {
        padding: 0.5rem 1rem;
        border-radius: 8px;
        border: 1px solid var(--border-color);
        color: var(--text-secondary);
        text-decoration: none;
    }
    nav.tabs a.active, nav.subtabs a.active { color: var(--text-primary); border-color: var(--accent-blue); }

    .card {
        background: var(--bg-secondary);
        border: 1px solid var(--border-color);
        border-radius: 12px;
        padding: 1.5rem;
        margin-bottom: 1.5rem;
    }

    .kpis { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 1rem; margin-bottom: 1.5rem; }
    .kpi-value { font-size: 1.8rem; font-weight: 600; }
    .trend-up { color: var(--accent-green); }
    .trend-down { color: var(--accent-red); }
    .trend-neutral { color: var(--text-muted); }

    .badge { padding: 0.1rem 0.6rem; border-radius: 20px; font-size: 0.8rem; background: var(--bg-tertiary); }
    .priority-high, .status-failed, .verdict-not_supported { color: var(--accent-red); }
    .priority-medium, .status-stale, .verdict-inconclusive { color: var(--accent-orange); }
    .priority-low, .status-complete, .verdict-supported { color: var(--accent-green); }

    .chart-card { background: var(--bg-tertiary); border-radius: 10px; padding: 1rem; margin: 1rem 0; }
    .chart-container { height: 294px; position: relative; }
    .unsupported { color: var(--text-muted); font-style: italic; }
    .chart-download { display: inline-block; margin-top: 0.5rem; font-size: 0.85rem; color: var(--text-secondary); }

    ul { padding-left: 1.25rem; }
    pre { background: var(--bg-primary); padding: 1rem; border-radius: 8px; overflow-x: auto; font-size: 0.85rem; }
    table.data { width: 100%; border-collapse: collapse; font-size: 0.85rem; }
    table.data th, table.data td { padding: 0.4rem 0.75rem; text-align: left; border-top: 1px solid var(--border-color); }
    details { margin-top: 1rem; }
    summary { cursor: pointer; color: var(--text-secondary); }

    footer { text-align: center; color: var(--text-muted); font-size: 0.85rem; margin-top: 3rem; }
</style>"#;

const CHART_CARD_TEMPLATE: &str = r##"<div class="chart-card" data-chart-id="{{ chart.id }}">
    <h3>{{ chart.title }}</h3>
    {% if chart.description %}<p class="subtitle">{{ chart.description }}</p>{% endif %}
    {% if chart.supported %}
    <div class="chart-container"><canvas id="{{ chart.canvas_id }}"></canvas></div>
    <a class="chart-download" href="#" data-canvas="{{ chart.canvas_id }}" download="{{ chart.download_name }}">Download {{ chart.title }} as image</a>
    {% else %}
    <p class="unsupported">Unsupported chart type: {{ chart.kind }}</p>
    {% endif %}
    {% if chart.original_screenshot %}
    <details><summary>Original screenshot ({{ chart.qa_status }})</summary>
        <img src="{{ chart.original_screenshot }}" alt="Original {{ chart.title }}">
    </details>
    {% endif %}
</div>"##;

const SCRIPT_TEMPLATE: &str = r#"<script>
    window.CHART_CONFIGS = {{ charts_json | safe }};

    function formatCompact(value) {
        if (value >= 1000000) return (value / 1000000).toFixed(1) + 'M';
        if (value >= 1000) return (value / 1000).toFixed(0) + 'K';
        return String(value);
    }

    function formatPercent(value) {
        return Number(value).toFixed(1) + '%';
    }

    function renderCharts() {
        Object.entries(window.CHART_CONFIGS).forEach(([canvasId, config]) => {
            const canvas = document.getElementById(canvasId);
            if (!canvas) return;

            const formats = config.formats || {};
            delete config.formats;
            Object.entries(formats).forEach(([axis, kind]) => {
                const scale = config.options.scales[axis];
                scale.ticks = scale.ticks || {};
                scale.ticks.callback = kind === 'percent' ? formatPercent : formatCompact;
            });

            new Chart(canvas, config);
        });
    }

    function bindDownloads() {
        document.querySelectorAll('a.chart-download').forEach(link => {
            link.addEventListener('click', () => {
                const canvas = document.getElementById(link.dataset.canvas);
                if (canvas) link.href = canvas.toDataURL('image/png');
            });
        });
    }

    function applyLocation() {
        const params = new URLSearchParams(window.location.search);
        const panels = Array.from(document.querySelectorAll('section.panel'));
        if (panels.length === 0) return;

        const panel = panels.find(p => p.dataset.tab === params.get('tab')) || panels[0];
        panels.forEach(p => { p.hidden = p !== panel; });
        document.querySelectorAll('nav.tabs a').forEach(a => {
            a.classList.toggle('active', a.dataset.tab === panel.dataset.tab);
        });

        const tables = Array.from(panel.querySelectorAll('.table-panel'));
        if (tables.length === 0) return;
        const active = tables.find(t => t.dataset.table === params.get('table')) || tables[0];
        tables.forEach(t => { t.hidden = t !== active; });
        panel.querySelectorAll('nav.subtabs a').forEach(a => {
            a.classList.toggle('active', a.dataset.table === active.dataset.table);
        });
    }

    document.addEventListener('DOMContentLoaded', function() {
        document.querySelectorAll('nav.tabs a, nav.subtabs a').forEach(link => {
            link.addEventListener('click', event => {
                event.preventDefault();
                const href = link.getAttribute('href');
                window.history.replaceState({}, '', href === '?' ? window.location.pathname : href);
                applyLocation();
            });
        });
        applyLocation();
        renderCharts();
        bindDownloads();
    });
</script>"#;

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ report.title }}</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
    {% include "style.html" %}
</head>
<body>
    <div class="container">
        <header>
            <h1>{{ report.title }}</h1>
            {% if report.subtitle %}<p class="subtitle">{{ report.subtitle }}</p>{% endif %}
            <p class="meta">
                {% if report.dataset %}Dataset: {{ report.dataset }} · {% endif %}
                {% if report.date_range %}{{ report.date_range }} · {% endif %}
                Generated {{ report.generated_at }}
            </p>
        </header>

        <nav class="tabs">
            {% for tab in tabs %}
            <a href="{{ tab.href }}" data-tab="{{ tab.slug }}">{{ tab.label }}</a>
            {% endfor %}
        </nav>

        <section class="panel" data-tab="overview">
            {% if kpis %}
            <div class="kpis">
                {% for kpi in kpis %}
                <div class="card">
                    <p class="subtitle">{{ kpi.label }}</p>
                    <p class="kpi-value">{{ kpi.value }}</p>
                    {% if kpi.change %}<p class="trend-{{ kpi.trend }}">{{ kpi.change }}{% if kpi.change_label %} {{ kpi.change_label }}{% endif %}</p>{% endif %}
                </div>
                {% endfor %}
            </div>
            {% endif %}
            <div class="card">
                <h2>Executive Summary</h2>
                <ul>{% for line in executive_summary %}<li>{{ line }}</li>{% endfor %}</ul>
            </div>
        </section>

        <section class="panel" data-tab="research" hidden>
            {% for question in research_questions %}
            <div class="card">
                <h3>{{ question.question }}</h3>
                {% if question.verdict %}<span class="badge verdict-{{ question.verdict }}">{{ question.verdict }}</span>{% endif %}
                {% if question.findings %}<p class="meta">Findings</p><ul>{% for f in question.findings %}<li>{{ f }}</li>{% endfor %}</ul>{% endif %}
                {% if question.gaps %}<p class="meta">Gaps</p><ul>{% for g in question.gaps %}<li>{{ g }}</li>{% endfor %}</ul>{% endif %}
            </div>
            {% else %}
            <p class="meta">No research questions.</p>
            {% endfor %}
        </section>

        {% for group in table_groups %}
        <section class="panel" data-tab="{{ group.slug }}" hidden>
            <nav class="subtabs">
                {% for table in group.tables %}
                <a href="{{ table.href }}" data-tab="{{ group.slug }}" data-table="{{ table.slug }}">{{ table.name }}</a>
                {% endfor %}
            </nav>
            {% for table in group.tables %}
            <div class="table-panel" data-table="{{ table.slug }}" hidden>
                <div class="card">
                    <h2>{{ table.name }} <span class="badge status-{{ table.status }}">{{ table.status }}</span></h2>
                    <p class="subtitle">{{ table.description }}</p>
                    <p class="meta">
                        {% if table.row_count %}{{ table.row_count }} rows{% endif %}
                        {% if table.date_range %} · {{ table.date_range }}{% endif %}
                    </p>
                </div>
                {% for query in table.queries %}
                <div class="card" id="{{ query.id }}">
                    <h3>{{ query.title }}</h3>
                    <p class="subtitle">{{ query.summary }}</p>
                    {% for chart in query.charts %}{% include "chart_card.html" %}{% endfor %}
                    {% if query.observations %}<ul>{% for o in query.observations %}<li>{{ o }}</li>{% endfor %}</ul>{% endif %}
                    {% if query.sql %}<details><summary>SQL</summary><pre>{{ query.sql }}</pre></details>{% endif %}
                    {% if query.columns %}
                    <details><summary>Data{% if query.csv_path %} ({{ query.csv_path }}){% endif %}</summary>
                        <table class="data">
                            <thead><tr>{% for c in query.columns %}<th>{{ c }}</th>{% endfor %}</tr></thead>
                            <tbody>{% for row in query.rows %}<tr>{% for cell in row %}<td>{{ cell }}</td>{% endfor %}</tr>{% endfor %}</tbody>
                        </table>
                    </details>
                    {% endif %}
                </div>
                {% endfor %}
            </div>
            {% endfor %}
        </section>
        {% endfor %}

        <section class="panel" data-tab="next-steps" hidden>
            {% for rec in recommendations %}
            <div class="card">
                <h3>{{ rec.title }} <span class="badge priority-{{ rec.priority }}">{{ rec.priority }}</span></h3>
                <p>{{ rec.description }}</p>
                {% if rec.impact %}<p class="meta">Impact: {{ rec.impact }}</p>{% endif %}
            </div>
            {% else %}
            <p class="meta">No recommendations.</p>
            {% endfor %}
        </section>

        <footer>
            <p>Generated by chart-report</p>
        </footer>
    </div>

    {% include "script.html" %}
</body>
</html>
"#;

const CHART_PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{{ chart.title }}</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
    {% include "style.html" %}
</head>
<body>
    <div class="container">
        <p class="meta">{{ table_name }} · {{ query_title }}</p>
        {% include "chart_card.html" %}
    </div>
    {% include "script.html" %}
</body>
</html>
"#;

/// Report rendering options
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Absolute base URL for tab links; relative `?query` links otherwise
    pub base_url: Option<Url>,
}

#[derive(Debug, Clone, Serialize)]
struct HeaderView {
    title: String,
    subtitle: String,
    generated_at: String,
    dataset: String,
    date_range: String,
}

#[derive(Debug, Clone, Serialize)]
struct KpiView {
    label: String,
    value: String,
    change: Option<String>,
    change_label: Option<String>,
    trend: String,
}

#[derive(Debug, Clone, Serialize)]
struct TabView {
    slug: &'static str,
    label: &'static str,
    href: String,
}

#[derive(Debug, Clone, Serialize)]
struct TableGroupView {
    slug: &'static str,
    tables: Vec<TableView>,
}

#[derive(Debug, Clone, Serialize)]
struct TableView {
    name: String,
    slug: String,
    href: String,
    description: String,
    status: String,
    row_count: Option<String>,
    date_range: Option<String>,
    queries: Vec<QueryView>,
}

#[derive(Debug, Clone, Serialize)]
struct QueryView {
    id: String,
    title: String,
    summary: String,
    sql: String,
    observations: Vec<String>,
    csv_path: String,
    charts: Vec<ChartView>,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
struct ChartView {
    id: String,
    title: String,
    description: Option<String>,
    kind: String,
    supported: bool,
    canvas_id: String,
    download_name: String,
    qa_status: String,
    original_screenshot: Option<String>,
}

fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template("style.html", STYLE_TEMPLATE)?;
    env.add_template("script.html", SCRIPT_TEMPLATE)?;
    env.add_template("chart_card.html", CHART_CARD_TEMPLATE)?;
    env.add_template("report.html", REPORT_TEMPLATE)?;
    env.add_template("chart_page.html", CHART_PAGE_TEMPLATE)?;
    Ok(env)
}

/// Tremor palette names to hex; other values pass through
fn color_hex(name: &str) -> String {
    let hex = match name {
        "blue" => "#3b82f6",
        "cyan" => "#06b6d4",
        "indigo" => "#6366f1",
        "violet" => "#8b5cf6",
        "fuchsia" => "#d946ef",
        "emerald" => "#10b981",
        "green" => "#22c55e",
        "orange" => "#f97316",
        "red" => "#ef4444",
        "amber" => "#f59e0b",
        "gray" => "#6b7280",
        other => return other.to_string(),
    };
    hex.to_string()
}

fn palette(chart: &ChartConfig) -> Vec<String> {
    match chart.colors.as_deref() {
        Some(colors) if !colors.is_empty() => colors.iter().map(|c| color_hex(c)).collect(),
        _ => ["blue", "cyan", "indigo", "violet", "fuchsia"]
            .iter()
            .map(|c| color_hex(c))
            .collect(),
    }
}

fn axis_format(formatter: Option<AxisFormatter>) -> &'static str {
    match formatter {
        Some(AxisFormatter::Percent) => "percent",
        _ => "number",
    }
}

fn series_values(series: &Series, key: &str) -> Vec<serde_json::Value> {
    series
        .rows
        .iter()
        .map(|row| match row.get(key) {
            Some(value) => json!(value.as_number()),
            None => serde_json::Value::Null,
        })
        .collect()
}

/// Build the Chart.js configuration for a chart; `None` for unsupported kinds
pub fn chart_js_config(chart: &ChartConfig, series: &Series) -> Option<serde_json::Value> {
    let colors = palette(chart);
    let color = |i: usize| colors[i % colors.len()].clone();
    let labels: Vec<String> = series.rows.iter().map(|r| text_of(r, &chart.x_key)).collect();

    if chart.kind == ChartKind::Donut {
        let key = chart.y_keys().into_iter().next().unwrap_or_default();
        let slice_colors: Vec<String> = (0..labels.len()).map(color).collect();
        return Some(json!({
            "type": "pie",
            "data": {
                "labels": labels,
                "datasets": [{
                    "label": key,
                    "data": series_values(series, &key),
                    "backgroundColor": slice_colors,
                }],
            },
            "options": {
                "responsive": true,
                "maintainAspectRatio": false,
                "plugins": { "legend": { "position": "right" } },
            },
        }));
    }

    let (kind, fill) = match chart.kind {
        ChartKind::Area => ("line", true),
        ChartKind::Line => ("line", false),
        ChartKind::Bar => ("bar", false),
        _ => return None,
    };

    let mut formats = BTreeMap::new();
    formats.insert("y", "number");

    let datasets: Vec<serde_json::Value> = match chart.dual_axis() {
        Some(axis) => {
            let keys = chart.y_keys();
            let primary = keys
                .iter()
                .find(|k| **k != axis.y_key)
                .cloned()
                .unwrap_or_else(|| keys[0].clone());
            let secondary_color = colors
                .get(1)
                .cloned()
                .unwrap_or_else(|| color_hex("emerald"));
            formats.insert("y1", axis_format(axis.formatter));
            vec![
                json!({
                    "label": primary,
                    "data": series_values(series, &primary),
                    "borderColor": color(0),
                    "yAxisID": "y",
                    "pointRadius": 0,
                    "tension": 0.4,
                }),
                json!({
                    "label": axis.y_key,
                    "data": series_values(series, &axis.y_key),
                    "borderColor": secondary_color,
                    "yAxisID": "y1",
                    "pointRadius": 0,
                    "tension": 0.4,
                }),
            ]
        }
        None => series
            .categories
            .iter()
            .enumerate()
            .map(|(i, category)| {
                let background = if fill {
                    format!("{}40", color(i))
                } else {
                    color(i)
                };
                json!({
                    "label": category,
                    "data": series_values(series, category),
                    "borderColor": color(i),
                    "backgroundColor": background,
                    "fill": fill,
                    "spanGaps": true,
                    "tension": 0.4,
                })
            })
            .collect(),
    };

    let mut x_ticks = json!({ "autoSkip": true });
    if let Some(rotate) = &chart.rotate_label_x {
        x_ticks["minRotation"] = json!(rotate.angle.abs());
        x_ticks["maxRotation"] = json!(rotate.angle.abs());
    }

    let mut scales = json!({
        "x": { "ticks": x_ticks, "grid": { "display": false } },
        "y": { "beginAtZero": true, "position": "left" },
    });
    if formats.contains_key("y1") {
        scales["y1"] = json!({ "position": "right", "grid": { "drawOnChartArea": false } });
    }

    Some(json!({
        "type": kind,
        "data": { "labels": labels, "datasets": datasets },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "interaction": { "mode": "index", "intersect": false },
            "plugins": { "legend": { "position": "top" } },
            "scales": scales,
        },
        "formats": formats,
    }))
}

fn canvas_id(chart_id: &str, ordinal: usize) -> String {
    let base: String = chart_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("chart-{}-{}", ordinal, base)
}

/// Collects Chart.js configs keyed by canvas id while views are built
#[derive(Default)]
struct ChartRegistry {
    configs: BTreeMap<String, serde_json::Value>,
}

impl ChartRegistry {
    fn view(&mut self, chart: &ChartConfig, series: &Series) -> ChartView {
        let canvas_id = canvas_id(&chart.id, self.configs.len());
        let config = chart_js_config(chart, series);
        let supported = config.is_some();
        if let Some(config) = config {
            self.configs.insert(canvas_id.clone(), config);
        }

        ChartView {
            id: chart.id.clone(),
            title: chart.title.clone(),
            description: chart.description.clone(),
            kind: chart.kind.to_string(),
            supported,
            canvas_id,
            download_name: format!("{}.png", sanitize_filename(&chart.title)),
            qa_status: json_label(&chart.qa_status()),
            original_screenshot: chart
                .has_original_screenshot()
                .then(|| chart.original_screenshot_path.clone())
                .flatten(),
        }
    }

    /// Serialized configs, safe to embed in a script element
    fn to_script_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.configs)?.replace("</", "<\\/"))
    }
}

/// Serde name of a unit enum value (`needs_repair`, `high`, ...)
fn json_label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Number(n) => format_grouped(*n),
        Value::Text(s) => s.clone(),
    }
}

fn query_view(query: &QuerySection, registry: &mut ChartRegistry) -> QueryView {
    let dataset = query.dataset();
    let charts = query
        .charts
        .iter()
        .map(|chart| registry.view(chart, &pipeline::build(chart, &dataset)))
        .collect();
    let rows = dataset
        .rows
        .iter()
        .map(|row| {
            dataset
                .columns
                .iter()
                .map(|c| row.get(c).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    QueryView {
        id: query.id.clone(),
        title: query.title.clone(),
        summary: query.summary.clone(),
        sql: query.sql.clone(),
        observations: query.observations.clone(),
        csv_path: query.csv_path.clone(),
        charts,
        columns: dataset.columns.clone(),
        rows,
    }
}

fn kpi_view(kpi: &KpiMetric) -> KpiView {
    let value = match &kpi.value {
        Value::Number(n) => format_grouped(*n),
        Value::Text(s) => s.clone(),
    };
    let change = kpi.change.map(|c| {
        let sign = if c > 0.0 { "+" } else { "" };
        format!("{}{}", sign, format_percent(c))
    });

    KpiView {
        label: kpi.label.clone(),
        value,
        change,
        change_label: kpi.change_label.clone(),
        trend: kpi.trend.as_ref().map(json_label).unwrap_or_else(|| "neutral".to_string()),
    }
}

fn link(base: Option<&Url>, query: &str) -> String {
    match base {
        Some(base) => nav::href(base, query).to_string(),
        None => format!("?{}", query),
    }
}

fn table_views(
    tab: PrimaryTab,
    tables: &[TableAnalysis],
    directory: &TableDirectory,
    primary_index: usize,
    options: &RenderOptions,
    registry: &mut ChartRegistry,
) -> TableGroupView {
    let tables = tables
        .iter()
        .enumerate()
        .map(|(i, table)| TableView {
            name: table.table_name.clone(),
            slug: nav::table_slug(&table.table_name),
            href: link(
                options.base_url.as_ref(),
                &nav::encode(primary_index, i, directory),
            ),
            description: table.description.clone(),
            status: json_label(&table.status),
            row_count: table.row_count.map(|n| format_grouped(n as f64)),
            date_range: table.date_range.clone(),
            queries: table
                .queries
                .iter()
                .map(|q| query_view(q, registry))
                .collect(),
        })
        .collect();

    TableGroupView {
        slug: tab.slug(),
        tables,
    }
}

/// Generate the HTML report
pub fn generate_report(report: &Report, options: &RenderOptions) -> Result<String> {
    let env = environment()?;
    let template = env.get_template("report.html")?;

    let directory = report.table_directory();
    let layout = report.tab_layout();
    let mut registry = ChartRegistry::default();

    let tabs: Vec<TabView> = layout
        .tabs()
        .iter()
        .enumerate()
        .map(|(i, tab)| TabView {
            slug: tab.slug(),
            label: tab.label(),
            href: link(options.base_url.as_ref(), &nav::encode(i, 0, &directory)),
        })
        .collect();

    let mut table_groups = Vec::new();
    for (i, tab) in layout.tabs().iter().enumerate() {
        let tables = match tab {
            PrimaryTab::InitialAnalysis => &report.tables[..],
            PrimaryTab::AdvancedAnalysis => report.advanced(),
            _ => continue,
        };
        table_groups.push(table_views(
            *tab,
            tables,
            &directory,
            i,
            options,
            &mut registry,
        ));
    }

    let meta = &report.metadata;
    let header = HeaderView {
        title: meta.title.clone(),
        subtitle: meta.subtitle.clone(),
        generated_at: meta.generated_at.clone(),
        dataset: meta.dataset.clone(),
        date_range: meta.date_range.clone(),
    };

    let html = template.render(context! {
        report => header,
        tabs => tabs,
        kpis => report.kpis.iter().map(kpi_view).collect::<Vec<_>>(),
        executive_summary => &report.executive_summary,
        research_questions => &report.research_questions,
        table_groups => table_groups,
        recommendations => &report.recommendations,
        charts_json => registry.to_script_json()?,
    })?;

    Ok(html)
}

/// Write the report to `output_dir/index.html`
pub fn write_report(report: &Report, options: &RenderOptions, output_dir: &Path) -> Result<PathBuf> {
    crate::file_manager::ensure_dir_exists(output_dir)?;

    let html = generate_report(report, options)?;
    let index_path = output_dir.join("index.html");
    crate::file_manager::write_file(&index_path, html.as_bytes())?;

    Ok(index_path)
}

/// Standalone page showing a single chart
pub fn generate_chart_page(location: &ChartLocation<'_>) -> Result<String> {
    let env = environment()?;
    let template = env.get_template("chart_page.html")?;

    let mut registry = ChartRegistry::default();
    let series = pipeline::build(location.chart, &location.query.dataset());
    let chart = registry.view(location.chart, &series);

    let html = template.render(context! {
        chart => chart,
        table_name => &location.table.table_name,
        query_title => &location.query.title,
        charts_json => registry.to_script_json()?,
    })?;

    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_report_core::csv;

    const REPORT: &str = r#"{
        "metadata": {"title": "Sharing Report", "subtitle": "Q1", "generatedAt": "2024-04-01"},
        "kpis": [{"label": "Shares", "value": 1234567, "change": 12.5, "trend": "up"}],
        "executiveSummary": ["Shares grew <fast>."],
        "tables": [{
            "tableName": "fct_share_attempts",
            "description": "Share attempts",
            "status": "complete",
            "rowCount": 1500,
            "queries": [{
                "id": "fct_share_attempts-1",
                "title": "Weekly shares",
                "charts": [
                    {"id": "fct_share_attempts-1-chart-1", "title": "Shares by Week", "type": "bar",
                     "xKey": "week", "yKey": "count", "categoryKey": "platform"},
                    {"id": "fct_share_attempts-1-chart-2", "title": "Radar", "type": "radar",
                     "xKey": "week", "yKey": "count"}
                ],
                "csvData": "week,platform,count\n2024-01,ios,5\n2024-01,android,3\n2024-02,ios,7"
            }]
        }],
        "recommendations": [{"title": "Ship it", "description": "Now", "priority": "high"}]
    }"#;

    fn chart(json: &str) -> ChartConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_generate_report() {
        let report = Report::from_json(REPORT).unwrap();
        let html = generate_report(&report, &RenderOptions::default()).unwrap();

        assert!(html.contains("Sharing Report"));
        assert!(html.contains("1,234,567"));
        assert!(html.contains("+12.5%"));
        assert!(html.contains("Shares grew &lt;fast&gt;."));
        assert!(html.contains(r#"href="?tab=initial-analysis&amp;table=fct-share-attempts""#));
        assert!(html.contains(r#"data-chart-id="fct_share_attempts-1-chart-1""#));
        assert!(html.contains("Unsupported chart type: radar"));
        assert!(html.contains("1,500 rows"));
        assert!(!html.contains("advanced-analysis"));
    }

    #[test]
    fn test_report_links_use_base_url() {
        let report = Report::from_json(REPORT).unwrap();
        let options = RenderOptions {
            base_url: Some(Url::parse("https://reports.example.com/q1/#top").unwrap()),
        };
        let html = generate_report(&report, &options).unwrap();
        assert!(html.contains("reports.example.com"));
        assert!(html.contains(r#"?tab=research""#));
        assert!(!html.contains("#top"));
    }

    #[test]
    fn test_write_report() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let report = Report::from_json(REPORT).unwrap();
        let path = write_report(&report, &RenderOptions::default(), &temp_dir.path().join("out")).unwrap();

        assert!(path.ends_with("out/index.html"));
        assert!(std::fs::read_to_string(path).unwrap().contains("<canvas"));
    }

    #[test]
    fn test_pivoted_bar_config() {
        let c = chart(r#"{"id":"c","title":"t","type":"bar","xKey":"week","yKey":"count","categoryKey":"platform"}"#);
        let data = csv::parse("week,platform,count\n2024-02,ios,7\n2024-01,ios,5\n2024-01,android,3");
        let config = chart_js_config(&c, &pipeline::build(&c, &data)).unwrap();

        assert_eq!(config["type"], "bar");
        assert_eq!(config["data"]["labels"], json!(["2024-01", "2024-02"]));
        assert_eq!(config["data"]["datasets"][0]["label"], "android");
        assert_eq!(config["data"]["datasets"][0]["data"], json!([3.0, null]));
        assert_eq!(config["data"]["datasets"][1]["data"], json!([5.0, 7.0]));
    }

    #[test]
    fn test_dual_axis_line_config() {
        let c = chart(
            r#"{"id":"c","title":"t","type":"line","xKey":"day","yKey":["rate","users"],
                "secondaryYAxis":{"yKey":"rate","formatter":"percent"},"colors":["red"]}"#,
        );
        let data = csv::parse("day,users,rate\n1,100,5.5\n2,120,6");
        let config = chart_js_config(&c, &pipeline::build(&c, &data)).unwrap();

        assert_eq!(config["data"]["datasets"][0]["label"], "users");
        assert_eq!(config["data"]["datasets"][0]["borderColor"], "#ef4444");
        assert_eq!(config["data"]["datasets"][1]["yAxisID"], "y1");
        assert_eq!(config["data"]["datasets"][1]["borderColor"], "#10b981");
        assert_eq!(config["formats"]["y1"], "percent");
    }

    #[test]
    fn test_donut_and_unsupported_configs() {
        let donut = chart(r#"{"id":"c","title":"t","type":"donut","xKey":"k","yKey":"v","aggregate":true}"#);
        let data = csv::parse("k,v\na,1\nb,5\na,1");
        let config = chart_js_config(&donut, &pipeline::build(&donut, &data)).unwrap();
        assert_eq!(config["type"], "pie");
        assert_eq!(config["data"]["labels"], json!(["b", "a"]));

        let radar = chart(r#"{"id":"c","title":"t","type":"radar","xKey":"k","yKey":"v"}"#);
        assert!(chart_js_config(&radar, &pipeline::build(&radar, &data)).is_none());
    }

    #[test]
    fn test_chart_page() {
        let report = Report::from_json(REPORT).unwrap();
        let location = report.find_chart("fct_share_attempts-1-chart-1").unwrap();
        let html = generate_chart_page(&location).unwrap();

        assert!(html.contains("Shares by Week"));
        assert!(html.contains("fct_share_attempts · Weekly shares"));
        assert!(html.contains("chart-0-fct-share-attempts-1-chart-1"));
        assert!(html.contains(r#"download="shares_by_week.png""#));
        assert!(html.contains("Download Shares by Week as image"));
    }
}
