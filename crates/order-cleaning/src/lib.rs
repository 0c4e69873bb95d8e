//! Order Cleaning Library
//!
//! Schema enforcement, quality checks and cleaning for tabular orders data,
//! built on Polars.
//!
//! # Overview
//!
//! A run takes an orders CSV through these stages:
//!
//! - **Schema Enforcement**: coerce declared columns to String, Int64 or
//!   Float64; unparseable values become null
//! - **Quality Checks**: required columns, non-empty table, unique order ids,
//!   amounts within bounds, unique user ids; each under its own failure policy
//! - **Missingness Report**: null count and percentage per column
//! - **Cleaning**: normalized copies of text columns and `__isna` flags
//! - **Output**: a Parquet table and a CSV report under `data/processed`
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use order_cleaning::{ChecksConfig, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .root(".")
//!     .checks(ChecksConfig::demo())
//!     .build()?;
//!
//! let summary = Pipeline::builder().config(config).build()?.run()?;
//! println!("{} rows written to {}", summary.rows, summary.output_path.display());
//! ```
//!
//! The stages are also usable on their own:
//!
//! ```rust,ignore
//! use order_cleaning::{enforce_schema, missingness_report, orders_schema};
//!
//! let typed = enforce_schema(&raw, &orders_schema())?;
//! let report = missingness_report(&typed);
//! ```
//!
//! # Failure Policies
//!
//! Every check aborts the run by default. [`CheckPolicy::Warn`] logs and
//! continues; [`CheckPolicy::Collect`] continues through the remaining checks
//! and then fails with [`PipelineError::ChecksFailed`] listing all of them.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod quality;
pub mod reporting;
pub mod schema;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{
    ValueMapping, add_missing_flags, apply_mapping, dedupe_keep_latest, normalize_text,
};
pub use config::{
    CheckPolicy, ChecksConfig, ConfigValidationError, Paths, PipelineConfig, PipelineConfigBuilder,
};
pub use error::{PipelineError, Result, ResultExt};
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineOutput, PipelineStage,
    ProgressReporter, ProgressUpdate, RunSummary,
};
pub use quality::{
    CheckRecord, QualityCheck, QualityGate, assert_in_range, assert_non_empty, assert_unique_key,
    require_columns,
};
pub use reporting::{MissingnessReport, MissingnessRow, missingness_report};
pub use schema::{ColumnType, SchemaEntry, enforce_schema, orders_schema};
