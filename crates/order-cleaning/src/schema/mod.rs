//! Schema enforcement.
//!
//! Coerces raw (usually all-text) columns to their declared types. Coercion is
//! best-effort: values that cannot be represented become null instead of
//! failing the run. This silent loss is deliberate and shows up in the
//! missingness report.

mod converters;

use crate::error::Result;
use crate::utils::get_series;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Target semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Text; every value keeps its textual representation
    String,
    /// Nullable 64-bit integer
    Int64,
    /// Nullable 64-bit float
    Float64,
}

impl ColumnType {
    /// The polars dtype this column ends up with.
    pub fn dtype(&self) -> DataType {
        match self {
            Self::String => DataType::String,
            Self::Int64 => DataType::Int64,
            Self::Float64 => DataType::Float64,
        }
    }
}

/// One `(name, type)` pair of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub name: String,
    pub column_type: ColumnType,
}

impl SchemaEntry {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Default schema for the orders table.
pub fn orders_schema() -> Vec<SchemaEntry> {
    vec![
        SchemaEntry::new("order_id", ColumnType::String),
        SchemaEntry::new("user_id", ColumnType::String),
        SchemaEntry::new("amount", ColumnType::Float64),
        SchemaEntry::new("quantity", ColumnType::Int64),
    ]
}

/// Coerce the columns named in `schema`; all other columns pass through.
///
/// Returns a new frame; `df` is left as it was. Fails only when a schema entry
/// names a column the table does not have.
pub fn enforce_schema(df: &DataFrame, schema: &[SchemaEntry]) -> Result<DataFrame> {
    let mut out = df.clone();

    for entry in schema {
        let series = get_series(df, &entry.name)?;
        let coerced = match entry.column_type {
            ColumnType::String => converters::to_text(&series)?,
            ColumnType::Int64 => converters::to_int64(&series)?,
            ColumnType::Float64 => converters::to_float64(&series)?,
        };

        let lost = coerced.null_count().saturating_sub(series.null_count());
        if lost > 0 {
            debug!(
                "Coercing '{}' to {:?} turned {} unparseable values into nulls",
                entry.name, entry.column_type, lost
            );
        }

        out.replace(&entry.name, coerced)?;
    }

    Ok(out)
}
