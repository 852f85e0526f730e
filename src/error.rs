//! Error handling for outage/temperature reconciliation.
//!
//! Provides error types with context for source loading, schema
//! validation, key reconciliation and output failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Source file not found at path: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Schema mismatch in {source_name}: expected {expected}, found {found} ({detail})")]
    SchemaMismatch {
        source_name: String,
        expected: String,
        found: String,
        detail: String,
    },

    #[error("Invalid encoded state identifier '{identifier}': {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error(
        "Reconciliation count mismatch: found {codes} distinct state codes but {names} state names are available"
    )]
    ReconciliationCountMismatch { codes: usize, names: usize },

    #[error("State code {code} has no entry in the state name mapping")]
    UnknownStateCode { code: String },

    #[error("Duplicate temperature key: {state} {year}-{month:02}")]
    DuplicateTemperatureKey {
        state: String,
        year: i32,
        month: u32,
    },

    #[error("Failed to write output {path}: {reason}")]
    OutputFailed { path: PathBuf, reason: String },

    #[error("Pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl OutageError {
    /// Build a schema mismatch error for a named source
    pub fn schema_mismatch(
        source_name: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
        detail: impl Into<String>,
    ) -> Self {
        Self::SchemaMismatch {
            source_name: source_name.into(),
            expected: expected.to_string(),
            found: found.to_string(),
            detail: detail.into(),
        }
    }

    /// Process exit code reported by the CLI for this error
    ///
    /// Reconciliation failures exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            OutageError::ReconciliationCountMismatch { .. }
            | OutageError::UnknownStateCode { .. }
            | OutageError::DuplicateTemperatureKey { .. } => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, OutageError>;
