//! Progress reporting for the cleaning pipeline.
//!
//! A [`ProgressReporter`] is attached to one [`Pipeline`](super::Pipeline)
//! instance and receives a [`ProgressUpdate`] at every stage boundary. There
//! is no global logger state involved; tracing output is independent of it.
//!
//! # Example
//!
//! ```rust,ignore
//! use order_cleaning::Pipeline;
//!
//! let output = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .process(orders, None)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Reading input files
    Loading,
    /// Coercing columns to their declared types
    SchemaEnforcement,
    /// Running quality checks under their policies
    QualityChecks,
    /// Counting missing values per column
    MissingnessReport,
    /// Normalizing text and adding missing-value flags
    Cleaning,
    /// Persisting the report and the cleaned table
    Writing,
    /// Run completed successfully
    Complete,
    /// Run stopped with an error
    Failed,
}

impl PipelineStage {
    /// Human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::SchemaEnforcement => "Enforcing Schema",
            Self::QualityChecks => "Checking Quality",
            Self::MissingnessReport => "Reporting Missingness",
            Self::Cleaning => "Cleaning Data",
            Self::Writing => "Writing Outputs",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Typical share of a run spent in this stage (0.0 - 1.0).
    ///
    /// Weights of the working stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.15,
            Self::SchemaEnforcement => 0.10,
            Self::QualityChecks => 0.20,
            Self::MissingnessReport => 0.10,
            Self::Cleaning => 0.15,
            Self::Writing => 0.30,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::SchemaEnforcement => 0.15,
            Self::QualityChecks => 0.25,
            Self::MissingnessReport => 0.45,
            Self::Cleaning => 0.55,
            Self::Writing => 0.70,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Optional detail, e.g. the check or column being processed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within the current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a progress update for a stage.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a progress update for item `current` of `total` within a stage.
    pub fn with_items(
        stage: PipelineStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            ..Self::new(stage, stage_progress, message)
        }
    }

    /// Creates a completion update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            sub_stage: None,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    /// Creates a failure update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            sub_stage: None,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates from a pipeline run.
///
/// Implementations must be `Send + Sync` so a pipeline holding one can be
/// moved to a worker thread.
pub trait ProgressReporter: Send + Sync {
    /// Called at each stage boundary. Should return quickly.
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
