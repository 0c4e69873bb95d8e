//! Assertion-style validators.
//!
//! Each check returns `Ok(())` or the first violation it finds, with enough
//! context to locate the offending column and values. None of them decide
//! what a failure means for the run; that is the driver's job.

use crate::error::{PipelineError, Result};
use crate::utils::{format_number, get_series, is_numeric_dtype, series_as_text};
use polars::prelude::*;
use std::collections::HashMap;

/// Maximum number of offending values quoted in an error.
pub const SAMPLE_LIMIT: usize = 5;

const MISSING_LABEL: &str = "<missing>";

/// Fail with `MissingColumns` if any of `names` is absent from `df`.
///
/// Every absent name is reported, not only the first.
pub fn require_columns(df: &DataFrame, names: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    let missing: Vec<String> = names
        .iter()
        .filter(|name| !present.iter().any(|col| col.as_str() == **name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingColumns { missing })
    }
}

/// Fail with `EmptyTable` if `df` has no rows.
pub fn assert_non_empty(df: &DataFrame, label: &str) -> Result<()> {
    if df.height() == 0 {
        return Err(PipelineError::EmptyTable(label.to_string()));
    }
    Ok(())
}

/// Fail with `DuplicateKey` if any value of `key` occurs more than once.
///
/// Nulls count as equal to each other, so two missing keys are a duplicate.
pub fn assert_unique_key(df: &DataFrame, key: &str) -> Result<()> {
    let series = get_series(df, key)?;
    let values = series_as_text(&series)?;

    // first-seen order keeps the sample deterministic
    let mut counts: HashMap<Option<&str>, usize> = HashMap::new();
    let mut order: Vec<Option<&str>> = Vec::new();
    for value in &values {
        let value = value.as_deref();
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let duplicated: Vec<Option<&str>> = order
        .into_iter()
        .filter(|value| counts[value] > 1)
        .collect();

    if duplicated.is_empty() {
        return Ok(());
    }

    let duplicated_rows = duplicated.iter().map(|value| counts[value]).sum();
    let sample = duplicated
        .iter()
        .take(SAMPLE_LIMIT)
        .map(|value| value.unwrap_or(MISSING_LABEL).to_string())
        .collect();

    Err(PipelineError::DuplicateKey {
        column: key.to_string(),
        duplicated_rows,
        distinct_keys: duplicated.len(),
        sample,
    })
}

/// Fail with `OutOfRange` if a non-null value of `column` is below `lo` or,
/// when `hi` is given, above `hi`. Nulls are exempt.
pub fn assert_in_range(column: &Series, lo: f64, hi: Option<f64>, name: &str) -> Result<()> {
    if !is_numeric_dtype(column.dtype()) {
        return Err(PipelineError::TypeMismatch {
            column: name.to_string(),
            expected: "numeric".to_string(),
            found: column.dtype().to_string(),
        });
    }

    let floats = column.cast(&DataType::Float64)?;
    let offending: Vec<f64> = floats
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .filter(|&v| v < lo || hi.is_some_and(|h| v > h))
        .collect();

    if offending.is_empty() {
        return Ok(());
    }

    Err(PipelineError::OutOfRange {
        column: name.to_string(),
        count: offending.len(),
        lo,
        hi,
        sample: offending
            .iter()
            .take(SAMPLE_LIMIT)
            .map(|&v| format_number(v))
            .collect(),
    })
}
