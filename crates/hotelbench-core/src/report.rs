//! Per-cell benchmark reports and the comparison aggregator.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::Error;
use crate::row::ResultRow;

/// Maximum number of sample rows retained per report.
pub const SAMPLE_LIMIT: usize = 5;

/// Sentinel row count marking an errored cell, distinct from a successful
/// empty result (0).
pub const ERROR_ROW_COUNT: i64 = -1;

/// The outcome of one (backend, query) execution. Immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    /// Backend identifier.
    pub backend: String,
    /// Query name as requested (kept verbatim so unknown names stay visible).
    pub query: String,
    /// Wall-clock duration in seconds, sub-millisecond precision.
    pub duration_secs: f64,
    /// Result cardinality, or [`ERROR_ROW_COUNT`] on failure.
    pub row_count: i64,
    /// Up to [`SAMPLE_LIMIT`] sample rows for inspection.
    pub samples: Vec<ResultRow>,
    /// Error description when the cell failed.
    pub error: Option<String>,
}

impl BenchmarkReport {
    /// Build a report for a successful execution.
    pub fn success(
        backend: &str,
        query: &str,
        duration: std::time::Duration,
        rows: &[ResultRow],
    ) -> Self {
        Self {
            backend: backend.to_string(),
            query: query.to_string(),
            duration_secs: duration.as_secs_f64(),
            row_count: rows.len() as i64,
            samples: rows.iter().take(SAMPLE_LIMIT).cloned().collect(),
            error: None,
        }
    }

    /// Build a report for a failed execution. The duration is the partial
    /// elapsed time up to the failure point.
    pub fn failure(backend: &str, query: &str, duration: std::time::Duration, error: &Error) -> Self {
        Self {
            backend: backend.to_string(),
            query: query.to_string(),
            duration_secs: duration.as_secs_f64(),
            row_count: ERROR_ROW_COUNT,
            samples: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// Whether this cell failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// One row of the primary comparison table. Sample payloads are deliberately
/// excluded here: they may carry values unsuitable for uniform columnar
/// display and are surfaced through [`Comparison::samples`] instead.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub backend: String,
    pub query: String,
    pub duration_secs: f64,
    pub row_count: i64,
    pub error: Option<String>,
}

/// Aggregated view over a full run: the tabular comparison plus per-cell
/// sample payloads for on-demand inspection.
#[derive(Debug)]
pub struct Comparison {
    rows: Vec<ComparisonRow>,
    samples: HashMap<(String, String), Vec<ResultRow>>,
}

impl Comparison {
    /// Aggregate a sequence of reports, preserving their order.
    pub fn aggregate(reports: &[BenchmarkReport]) -> Self {
        let rows = reports
            .iter()
            .map(|r| ComparisonRow {
                backend: r.backend.clone(),
                query: r.query.clone(),
                duration_secs: r.duration_secs,
                row_count: r.row_count,
                error: r.error.clone(),
            })
            .collect();
        let samples = reports
            .iter()
            .map(|r| ((r.backend.clone(), r.query.clone()), r.samples.clone()))
            .collect();
        Self { rows, samples }
    }

    /// The primary comparison table, one row per report.
    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    /// Sample payloads for one cell, the secondary opt-in view.
    pub fn samples(&self, backend: &str, query: &str) -> Option<&[ResultRow]> {
        self.samples
            .get(&(backend.to_string(), query.to_string()))
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::time::Duration;

    fn rows(n: usize) -> Vec<ResultRow> {
        (0..n)
            .map(|i| {
                let mut row = ResultRow::new();
                row.push("id", i as i64);
                row
            })
            .collect()
    }

    #[test]
    fn success_caps_samples_at_five() {
        let report =
            BenchmarkReport::success("postgresql", "hotels_in_city", Duration::from_millis(3), &rows(8));
        assert_eq!(report.row_count, 8);
        assert_eq!(report.samples.len(), SAMPLE_LIMIT);
        assert!(!report.is_error());
        assert!(report.duration_secs > 0.0);
    }

    #[test]
    fn empty_success_is_not_an_error() {
        let report =
            BenchmarkReport::success("mongodb", "gmail_guests", Duration::from_micros(500), &[]);
        assert_eq!(report.row_count, 0);
        assert!(!report.is_error());
    }

    #[test]
    fn failure_uses_sentinel_row_count() {
        let err = Error::unavailable("cassandra", "connection refused");
        let report =
            BenchmarkReport::failure("cassandra", "available_rooms", Duration::from_millis(1), &err);
        assert_eq!(report.row_count, ERROR_ROW_COUNT);
        assert!(report.samples.is_empty());
        assert!(report.error.as_deref().unwrap().contains("backend unavailable"));
    }

    #[test]
    fn aggregate_excludes_samples_from_table() {
        let mut sample = ResultRow::new();
        sample.push("guest_id", "g-1");
        sample.push("total_spent", Value::Float(42.0));

        let reports = vec![
            BenchmarkReport::success(
                "mysql",
                "top_guests_total_spent",
                Duration::from_millis(2),
                &[sample],
            ),
            BenchmarkReport::failure(
                "cassandra",
                "top_guests_total_spent",
                Duration::from_millis(1),
                &Error::unavailable("cassandra", "timed out"),
            ),
        ];

        let comparison = Comparison::aggregate(&reports);
        assert_eq!(comparison.rows().len(), 2);

        let table_json = serde_json::to_string(comparison.rows()).unwrap();
        assert!(!table_json.contains("guest_id"));

        let samples = comparison.samples("mysql", "top_guests_total_spent").unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].get("guest_id"), Some(&Value::String("g-1".into())));

        let failed = comparison.samples("cassandra", "top_guests_total_spent").unwrap();
        assert!(failed.is_empty());
    }
}
