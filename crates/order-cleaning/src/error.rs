//! Error types for the order cleaning pipeline.
//!
//! Quality-check failures (`MissingColumns`, `EmptyTable`, `DuplicateKey`,
//! `OutOfRange`) are ordinary variants of [`PipelineError`]; the driver
//! decides per check whether one of them stops the run.
//!
//! Errors serialize as `{ code, message }` so run summaries can carry them
//! as JSON.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// One or more required columns are absent.
    #[error("Missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// A table that must have rows has none.
    #[error("Table '{0}' has no rows")]
    EmptyTable(String),

    /// A nominally unique key column contains repeated values.
    #[error(
        "Column '{column}' is not unique: {duplicated_rows} rows share {distinct_keys} duplicated keys (e.g. {})",
        .sample.join(", ")
    )]
    DuplicateKey {
        column: String,
        duplicated_rows: usize,
        distinct_keys: usize,
        sample: Vec<String>,
    },

    /// A numeric column holds values outside the allowed bounds.
    #[error(
        "Column '{column}' has {count} values outside [{lo}, {}] (e.g. {})",
        .hi.map_or_else(|| "inf".to_string(), |h| h.to_string()),
        .sample.join(", ")
    )]
    OutOfRange {
        column: String,
        count: usize,
        lo: f64,
        hi: Option<f64>,
        sample: Vec<String>,
    },

    /// Checks running under the collect policy failed; all of them are listed.
    #[error("{} quality checks failed: {}", .failures.len(), .failures.join("; "))]
    ChecksFailed { failures: Vec<String> },

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Column has a dtype the operation cannot work with.
    #[error("Column '{column}' has type {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, independent of the message text.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingColumns { .. } => "MISSING_COLUMNS",
            Self::EmptyTable(_) => "EMPTY_TABLE",
            Self::DuplicateKey { .. } => "DUPLICATE_KEY",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::ChecksFailed { .. } => "CHECKS_FAILED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error came from a quality check rather than from I/O or setup.
    pub fn is_quality_failure(&self) -> bool {
        match self {
            Self::MissingColumns { .. }
            | Self::EmptyTable(_)
            | Self::DuplicateKey { .. }
            | Self::OutOfRange { .. }
            | Self::ChecksFailed { .. } => true,
            Self::WithContext { source, .. } => source.is_quality_failure(),
            _ => false,
        }
    }
}

impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Io(e).with_context(context))
    }
}
