//! The `Translator` seam and the sequential matrix runner.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::catalog::{QueryName, ALL_QUERIES};
use crate::error::Error;
use crate::report::BenchmarkReport;
use crate::row::ResultRow;

/// A query translator for one backend.
///
/// One conforming implementation exists per store, selected once at
/// construction time. `execute` realizes the named query in the backend's
/// native language (or emulates it client-side) and returns normalized rows.
/// Failures must be classified: [`Error::BackendUnavailable`] for transport
/// problems, [`Error::Translation`] when the store rejects the generated
/// query.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Stable backend identifier (e.g. "postgresql").
    fn backend(&self) -> &str;

    /// Execute one logical query and return its normalized rows.
    async fn execute(&self, query: QueryName) -> Result<Vec<ResultRow>, Error>;
}

/// Executes a (backend x query) matrix sequentially and assembles reports.
///
/// Cells run one at a time in a single task so the timing of one backend is
/// never skewed by contention from another. Reports are emitted in exact
/// request order (backends outer, queries inner), one per cell, whether the
/// cell succeeded or failed. No retries: the benchmark measures first-attempt
/// latency and reliability.
pub struct Runner {
    translators: Vec<Box<dyn Translator>>,
}

impl Runner {
    /// Create a runner over a set of backend translators. Each translator
    /// owns its connection handle for the lifetime of the runner.
    pub fn new(translators: Vec<Box<dyn Translator>>) -> Self {
        Self { translators }
    }

    /// Ordered backend identifiers, as exposed to the dashboard.
    pub fn backends(&self) -> Vec<&str> {
        self.translators.iter().map(|t| t.backend()).collect()
    }

    /// Ordered catalog query names, as exposed to the dashboard.
    pub fn queries() -> Vec<&'static str> {
        ALL_QUERIES.iter().map(|q| q.as_str()).collect()
    }

    /// Run the full matrix of all translators against all catalog queries.
    pub async fn run_all(&self) -> Vec<BenchmarkReport> {
        let names: Vec<String> = ALL_QUERIES.iter().map(|q| q.as_str().to_string()).collect();
        self.run(&names).await
    }

    /// Run every translator against every named query.
    ///
    /// Query names are resolved against the catalog per cell, so a request
    /// naming an unknown query still yields a complete matrix with that
    /// column marked as failed. One cell's failure never aborts or skips
    /// other cells.
    pub async fn run(&self, queries: &[String]) -> Vec<BenchmarkReport> {
        let mut reports = Vec::with_capacity(self.translators.len() * queries.len());

        for translator in &self.translators {
            let backend = translator.backend();
            for name in queries {
                debug!(backend, query = %name, "executing cell");
                let started = Instant::now();
                let outcome = match QueryName::parse(name) {
                    Ok(query) => translator.execute(query).await,
                    Err(e) => Err(e),
                };
                let elapsed = started.elapsed();

                let report = match outcome {
                    Ok(rows) => {
                        info!(
                            backend,
                            query = %name,
                            rows = rows.len(),
                            duration_ms = elapsed.as_secs_f64() * 1e3,
                            "cell complete"
                        );
                        BenchmarkReport::success(backend, name, elapsed, &rows)
                    }
                    Err(e) => {
                        warn!(backend, query = %name, error = %e, "cell failed");
                        BenchmarkReport::failure(backend, name, elapsed, &e)
                    }
                };
                reports.push(report);
            }
        }

        reports
    }
}
