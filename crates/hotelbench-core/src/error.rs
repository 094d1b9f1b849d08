//! Core error types.

use thiserror::Error;

/// Benchmark engine errors.
///
/// The runner classifies per-cell failures by variant: `UnknownQuery` and
/// `Translation` indicate defects (a bad request or a translator/contract
/// mismatch), while `BackendUnavailable` covers transport and auth failures
/// that may be transient.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested query name is not in the catalog.
    #[error("unknown query: {0}")]
    UnknownQuery(String),

    /// Connection, auth or transport failure against a backend.
    #[error("backend unavailable ({backend}): {reason}")]
    BackendUnavailable { backend: String, reason: String },

    /// The backend rejected the generated native query.
    #[error("translation failure ({backend}): {reason}")]
    Translation { backend: String, reason: String },
}

impl Error {
    /// Build a `BackendUnavailable` from any displayable driver error.
    pub fn unavailable(backend: &str, reason: impl std::fmt::Display) -> Self {
        Error::BackendUnavailable {
            backend: backend.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Build a `Translation` failure from any displayable driver error.
    pub fn translation(backend: &str, reason: impl std::fmt::Display) -> Self {
        Error::Translation {
            backend: backend.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_classification_visible() {
        let e = Error::UnknownQuery("nope".into());
        assert_eq!(e.to_string(), "unknown query: nope");

        let e = Error::unavailable("cassandra", "connection refused");
        assert!(e.to_string().contains("backend unavailable (cassandra)"));

        let e = Error::translation("mysql", "syntax error near FROM");
        assert!(e.to_string().contains("translation failure (mysql)"));
    }
}
