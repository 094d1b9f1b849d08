//! Output rendering for benchmark runs.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use hotelbench_core::{BenchmarkReport, Comparison, ResultRow};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format, full reports including samples
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a finished run.
pub fn render(reports: &[BenchmarkReport], format: OutputFormat, samples: bool) -> String {
    match format {
        OutputFormat::Table => {
            let comparison = Comparison::aggregate(reports);
            let mut out = render_table(&comparison);
            if samples {
                out.push_str(&render_samples(&comparison));
            }
            out
        }
        OutputFormat::Json => {
            let mut out =
                serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string());
            out.push('\n');
            out
        }
    }
}

/// The primary comparison table: one row per (backend, query) cell, sample
/// payloads excluded.
fn render_table(comparison: &Comparison) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Backend", "Query", "Duration [s]", "Rows", "Error"]);

    for row in comparison.rows() {
        table.add_row(vec![
            Cell::new(&row.backend),
            Cell::new(&row.query),
            Cell::new(format!("{:.4}", row.duration_secs)),
            Cell::new(row.row_count),
            Cell::new(row.error.as_deref().unwrap_or("")),
        ]);
    }

    format!("{}\n{} cell(s)\n", table, comparison.rows().len())
}

/// Secondary view: up to five sample rows per successful cell.
fn render_samples(comparison: &Comparison) -> String {
    let mut out = String::new();
    for row in comparison.rows() {
        let Some(samples) = comparison.samples(&row.backend, &row.query) else {
            continue;
        };
        if samples.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{} / {}\n", row.backend, row.query));
        out.push_str(&sample_table(samples));
        out.push('\n');
    }
    out
}

fn sample_table(samples: &[ResultRow]) -> String {
    let mut table = Table::new();
    if let Some(first) = samples.first() {
        table.set_header(first.field_names().collect::<Vec<_>>());
    }
    for sample in samples {
        table.add_row(
            sample
                .iter()
                .map(|(_, value)| Cell::new(value))
                .collect::<Vec<_>>(),
        );
    }
    table.to_string()
}
