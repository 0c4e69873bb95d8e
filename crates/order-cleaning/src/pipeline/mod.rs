//! Pipeline module.
//!
//! This module provides the pipeline driver and its progress observer.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, PipelineOutput, RunSummary};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
