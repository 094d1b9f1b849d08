//! Backend query translators for hotelbench.
//!
//! One [`Translator`](hotelbench_core::Translator) implementation per store,
//! each realizing the full query catalog with the strategy its query language
//! affords:
//!
//! - [`postgres`] / [`mysql`] - server-side declarative SQL, dialect-specific
//!   where needed (month bucketing)
//! - [`mongo`] - find() filters plus aggregation pipelines with staged
//!   `$lookup` joins
//! - [`cassandra`] - equality-only CQL scans (`ALLOW FILTERING`) with the
//!   rest of the query emulated client-side; the full-scan cost is part of
//!   what the benchmark measures
//!
//! [`normalize`] converts every driver's native rows into the shared
//! primitive row model.

pub mod cassandra;
pub mod mongo;
pub mod mysql;
pub mod normalize;
pub mod postgres;
pub mod settings;

use hotelbench_core::{Error, Translator};

pub use cassandra::CassandraTranslator;
pub use mongo::MongoTranslator;
pub use mysql::MySqlTranslator;
pub use postgres::PostgresTranslator;
pub use settings::Settings;

/// The four stores under benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Postgres,
    MySql,
    Mongo,
    Cassandra,
}

/// All backends in canonical order.
pub const ALL_BACKENDS: [BackendKind; 4] = [
    BackendKind::Postgres,
    BackendKind::MySql,
    BackendKind::Mongo,
    BackendKind::Cassandra,
];

impl BackendKind {
    /// Stable backend identifier used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Postgres => "postgresql",
            BackendKind::MySql => "mysql",
            BackendKind::Mongo => "mongodb",
            BackendKind::Cassandra => "cassandra",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_BACKENDS
            .iter()
            .copied()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| format!("unknown backend: {} (expected one of postgresql, mysql, mongodb, cassandra)", s))
    }
}

/// Construct the translator for one backend.
///
/// Connections are established lazily where the driver allows it, so a store
/// that is down surfaces as per-cell `BackendUnavailable` reports rather than
/// aborting the run.
pub async fn connect(kind: BackendKind, settings: &Settings) -> Result<Box<dyn Translator>, Error> {
    Ok(match kind {
        BackendKind::Postgres => Box::new(PostgresTranslator::connect(&settings.postgres)?),
        BackendKind::MySql => Box::new(MySqlTranslator::connect(&settings.mysql)?),
        BackendKind::Mongo => Box::new(MongoTranslator::connect(&settings.mongo).await?),
        BackendKind::Cassandra => Box::new(CassandraTranslator::new(settings.cassandra.clone())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_roundtrip() {
        for kind in ALL_BACKENDS {
            assert_eq!(kind.as_str().parse::<BackendKind>().unwrap(), kind);
        }
        assert!("oracle".parse::<BackendKind>().is_err());
    }
}
