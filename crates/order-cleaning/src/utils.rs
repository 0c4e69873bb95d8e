//! Shared helpers for the order cleaning pipeline.
//!
//! Dtype classification, strict number parsing, and value formatting used by
//! the schema enforcer, the quality checks and the cleaning transforms.

use crate::error::{PipelineError, Result};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for coercion purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

// =============================================================================
// Column Access
// =============================================================================

/// Fetch a column as a materialized Series, mapping absence to `ColumnNotFound`.
pub fn get_series(df: &DataFrame, name: &str) -> Result<Series> {
    df.column(name)
        .map(|col| col.as_materialized_series().clone())
        .map_err(|_| PipelineError::ColumnNotFound(name.to_string()))
}

/// Owned column names in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Render every value of a Series as text, keeping nulls as `None`.
pub fn series_as_text(series: &Series) -> Result<Vec<Option<String>>> {
    let as_str = series.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Boolean mask of missing values: null, or `NaN` in a float column.
pub fn missing_mask(series: &Series) -> BooleanChunked {
    let mask: BooleanChunked = if let Ok(floats) = series.f64() {
        floats
            .into_iter()
            .map(|v| Some(v.is_none_or(f64::is_nan)))
            .collect()
    } else if let Ok(floats) = series.f32() {
        floats
            .into_iter()
            .map(|v| Some(v.is_none_or(f32::is_nan)))
            .collect()
    } else {
        series.is_null()
    };
    mask.with_name(series.name().clone())
}

/// Number of missing values, counting float `NaN` as missing.
pub fn missing_count(series: &Series) -> usize {
    missing_mask(series)
        .into_iter()
        .filter(|v| *v == Some(true))
        .count()
}

// =============================================================================
// Number Parsing
// =============================================================================

/// Parse a textual number.
///
/// Only surrounding whitespace is tolerated; thousands separators or currency
/// symbols make the value unparseable. `NaN` is treated as unparseable so the
/// only missing representation downstream is null.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Largest magnitude below which `f64` represents every integer exactly (2^53).
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Parse a textual integer without losing precision.
///
/// Integer literals parse straight to `i64`. Other numeric text (`"4.0"`,
/// `"1e3"`) is accepted only when integral and no larger than 2^53, so a value
/// is either exact or unparseable, never silently rounded.
pub fn parse_integer(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    parse_number(trimmed)
        .filter(|v| v.abs() <= MAX_EXACT_FLOAT_INT)
        .and_then(float_to_int)
}

/// Convert a float to `i64` when it is integral and in range.
pub fn float_to_int(value: f64) -> Option<i64> {
    if value.is_finite()
        && value.fract() == 0.0
        && value >= i64::MIN as f64
        && value < i64::MAX as f64
    {
        Some(value as i64)
    } else {
        None
    }
}

/// Format a float compactly for messages (`5` rather than `5.0`).
pub fn format_number(value: f64) -> String {
    if let Some(int) = float_to_int(value) {
        int.to_string()
    } else {
        value.to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================
