//! Pipeline driver.
//!
//! This module provides the `Pipeline` struct and its builder, which run the
//! stages in order: required columns, schema enforcement, quality checks,
//! missingness report, cleaning, and (for [`Pipeline::run`]) writing.

use crate::cleaner::{add_missing_flags, clean_column_name, normalize_text};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{PipelineError, Result, ResultExt};
use crate::io;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::quality::{
    CheckRecord, QualityCheck, QualityGate, assert_in_range, assert_non_empty, assert_unique_key,
    require_columns,
};
use crate::reporting::{MissingnessReport, missingness_report};
use crate::schema::{ColumnType, SchemaEntry, enforce_schema};
use crate::utils::{column_names, get_series};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span};

/// Key column of the optional users table.
const USER_KEY: &str = "user_id";

/// Result of [`Pipeline::process`].
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Typed orders with `<text>_clean` and `<flag>__isna` columns appended
    pub cleaned: DataFrame,
    /// Missingness of the typed orders, before cleaning
    pub report: MissingnessReport,
    /// One record per check that ran
    pub checks: Vec<CheckRecord>,
}

/// Result of [`Pipeline::run`], serializable for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub orders_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_path: Option<PathBuf>,
    pub output_path: PathBuf,
    pub report_path: PathBuf,
    pub rows: usize,
    pub columns: Vec<String>,
    pub checks: Vec<CheckRecord>,
    pub missingness: MissingnessReport,
}

/// The order cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use order_cleaning::{ChecksConfig, Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .root("/srv/bootcamp")
///     .checks(ChecksConfig::demo())
///     .build()?;
///
/// let summary = Pipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Ensure Pipeline is Send (can be moved to a worker thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Clean an orders table already in memory. Nothing is read or written.
    ///
    /// `users`, when given, is checked for unique `user_id` values.
    ///
    /// # Errors
    ///
    /// Returns the failing check's error under the `Abort` policy,
    /// `ChecksFailed` when checks under the `Collect` policy failed, and
    /// `ColumnNotFound` when a schema, text or flag column is absent.
    pub fn process(&self, orders: DataFrame, users: Option<&DataFrame>) -> Result<PipelineOutput> {
        self.finish_run(self.process_internal(orders, users))
    }

    /// Load the configured inputs, clean them, and write the cleaned table and
    /// then the report under the processed directory.
    ///
    /// Nothing is written unless every check passed or was tolerated. If the
    /// table cannot be written, no report is written either.
    pub fn run(&self) -> Result<RunSummary> {
        let span = info_span!("run", root = %self.config.root.display());
        let _guard = span.enter();
        self.finish_run(self.run_internal())
    }

    fn finish_run<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(value)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let config = &self.config;

        info!("Step 1: Loading data...");
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            "Reading orders",
        ));

        let orders_path = config.orders_path();
        let orders = io::read_table(&orders_path, &config.na_values)?;

        let users_path = config.users_path().filter(|path| {
            let exists = path.exists();
            if !exists {
                debug!("No users table at {}, skipping", path.display());
            }
            exists
        });
        let users = match &users_path {
            Some(path) => {
                self.report_progress(ProgressUpdate::new(
                    PipelineStage::Loading,
                    0.5,
                    "Reading users",
                ));
                let raw = io::read_table(path, &config.na_values)?;
                let schema = [SchemaEntry::new(USER_KEY, ColumnType::String)];
                Some(enforce_schema(&raw, &schema).context("Users table")?)
            }
            None => None,
        };

        let mut output = self.process_internal(orders, users.as_ref())?;

        info!("Step 7: Writing outputs...");
        let report_path = config.report_path();
        let output_path = config.output_path();

        let mut report_df = output.report.to_dataframe()?;

        // table first: a report on disk implies the run's table was written
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Writing,
            0.0,
            format!("Writing {}", output_path.display()),
        ));
        io::write_table(&mut output.cleaned, &output_path)?;

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Writing,
            0.5,
            format!("Writing {}", report_path.display()),
        ));
        io::write_report_csv(&mut report_df, &report_path)?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Run finished in {}ms: {} rows written to {}",
            duration_ms,
            output.cleaned.height(),
            output_path.display()
        );

        Ok(RunSummary {
            generated_at: Utc::now(),
            duration_ms,
            orders_path,
            users_path,
            output_path,
            report_path,
            rows: output.cleaned.height(),
            columns: column_names(&output.cleaned),
            checks: output.checks,
            missingness: output.report,
        })
    }

    fn process_internal(
        &self,
        orders: DataFrame,
        users: Option<&DataFrame>,
    ) -> Result<PipelineOutput> {
        let config = &self.config;
        let mut gate = QualityGate::new(&config.checks);

        // Required columns are checked on the raw table so a missing one is
        // reported as such rather than as a schema lookup failure.
        info!("Step 2: Enforcing schema...");
        self.report_progress(ProgressUpdate::with_items(
            PipelineStage::SchemaEnforcement,
            QualityCheck::RequiredColumns.name(),
            0,
            2,
            "Checking required columns",
        ));
        let required: Vec<&str> = config.required_columns.iter().map(String::as_str).collect();
        gate.run(QualityCheck::RequiredColumns, || {
            require_columns(&orders, &required)
        })?;

        self.report_progress(ProgressUpdate::with_items(
            PipelineStage::SchemaEnforcement,
            "schema",
            1,
            2,
            format!("Coercing {} columns", config.schema.len()),
        ));
        let typed = enforce_schema(&orders, &config.schema)?;

        info!("Step 3: Running quality checks...");
        let remaining = [
            QualityCheck::NonEmpty,
            QualityCheck::UniqueOrderId,
            QualityCheck::AmountRange,
            QualityCheck::UniqueUserId,
        ];
        for (i, check) in remaining.into_iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                PipelineStage::QualityChecks,
                check.name(),
                i,
                remaining.len(),
                format!("Running {}", check),
            ));

            match check {
                QualityCheck::NonEmpty => {
                    gate.run(check, || assert_non_empty(&typed, "orders"))?
                }
                QualityCheck::UniqueOrderId => {
                    gate.run(check, || assert_unique_key(&typed, &config.key_column))?
                }
                QualityCheck::AmountRange => gate.run(check, || {
                    let column = get_series(&typed, &config.range_column)?;
                    assert_in_range(
                        &column,
                        config.range_min,
                        config.range_max,
                        &config.range_column,
                    )
                })?,
                QualityCheck::UniqueUserId => match users {
                    Some(users) => gate.run(check, || assert_unique_key(users, USER_KEY))?,
                    None => gate.skip(check, "no users table"),
                },
                QualityCheck::RequiredColumns => {}
            }
        }
        let checks = gate.finish()?;
        debug!(
            "{} of {} checks passed",
            checks.iter().filter(|record| record.passed).count(),
            checks.len()
        );

        info!("Step 4: Computing missingness report...");
        self.report_progress(ProgressUpdate::new(
            PipelineStage::MissingnessReport,
            0.0,
            "Counting missing values",
        ));
        let report = missingness_report(&typed);
        info!(
            "{} missing cells across {} columns",
            report.total_missing(),
            report.rows().len()
        );

        info!("Step 5: Normalizing text columns...");
        let mut cleaned = typed;
        for (i, column) in config.text_columns.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                PipelineStage::Cleaning,
                column.as_str(),
                i,
                config.text_columns.len(),
                format!("Normalizing {}", column),
            ));
            let normalized = normalize_text(&get_series(&cleaned, column)?)?
                .with_name(clean_column_name(column).into());
            cleaned.with_column(normalized)?;
        }

        info!("Step 6: Adding missing-value flags...");
        let flag_columns: Vec<&str> = config.flag_columns.iter().map(String::as_str).collect();
        let cleaned = add_missing_flags(&cleaned, &flag_columns)?;

        info!("Cleaned table: {:?}", cleaned.shape());

        Ok(PipelineOutput {
            cleaned,
            report,
            checks,
        })
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// Convenience over [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns `InvalidConfig` if the configuration does not validate.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e: ConfigValidationError| PipelineError::InvalidConfig(e.to_string()))?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
