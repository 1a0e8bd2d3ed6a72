//! Error kinds surfaced by the apportionment and gap engine.
//!
//! Computation paths return [`StockError`] so callers can match on the failure
//! kind (e.g. the tract assigner downgrades a [`StockError::DependencyMiss`] to the
//! next fallback level). File-level helpers and the CLI wrap these in `anyhow`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StockError {
    /// A conditional table violates the sum-to-one invariant, has no option
    /// columns, or repeats a dependency tuple.
    #[error("malformed distribution `{table}`: {reason}")]
    MalformedDistribution { table: String, reason: String },

    /// A dependency tuple matched no row of the table.
    #[error("no row of `{table}` matches dependencies [{tuple}]")]
    DependencyMiss { table: String, tuple: String },

    /// The attribute graph has a cycle or references an unknown attribute.
    #[error("unresolvable dependencies for attributes: {}", remaining.join(", "))]
    UnresolvableDependencies { remaining: Vec<String> },

    /// A geographic entity has no mapping into a required partition.
    #[error("no {partition} mapping for {} entities: {}", entities.len(), entities.join(", "))]
    CoverageGap { partition: String, entities: Vec<String> },

    /// The residential/commercial/industrial/total BA sets share no column.
    #[error("profile sets share no balancing authority")]
    UnalignedProfileSet,

    /// Rows still unassigned after all tract fallbacks.
    #[error("{count} rows could not be assigned a tract")]
    TractAssignmentFailure { count: usize },

    #[error("sampling error: {0}")]
    Sampling(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StockResult<T> = Result<T, StockError>;

impl From<polars::error::PolarsError> for StockError {
    fn from(err: polars::error::PolarsError) -> Self {
        StockError::Data(err.to_string())
    }
}

impl StockError {
    pub(crate) fn malformed(table: &str, reason: impl Into<String>) -> Self {
        StockError::MalformedDistribution { table: table.to_string(), reason: reason.into() }
    }

    pub(crate) fn miss(table: &str, tuple: &[&str]) -> Self {
        StockError::DependencyMiss { table: table.to_string(), tuple: tuple.join(", ") }
    }
}
