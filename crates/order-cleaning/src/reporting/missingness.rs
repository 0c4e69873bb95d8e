use crate::error::Result;
use crate::utils::missing_count;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Null statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingnessRow {
    /// Column name in the source table
    pub column: String,
    /// Number of null values
    pub n_missing: usize,
    /// `100 * n_missing / row_count`; NaN for a table with no rows
    pub p_missing: f64,
}

/// Per-column missingness, sorted by `p_missing` descending.
///
/// Ties keep the column order of the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingnessReport {
    row_count: usize,
    rows: Vec<MissingnessRow>,
}

impl MissingnessReport {
    /// Rows of the report, highest missing percentage first.
    pub fn rows(&self) -> &[MissingnessRow] {
        &self.rows
    }

    /// Row count of the table the report was computed on.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Look up one column.
    pub fn get(&self, column: &str) -> Option<&MissingnessRow> {
        self.rows.iter().find(|row| row.column == column)
    }

    /// Total number of null cells.
    pub fn total_missing(&self) -> usize {
        self.rows.iter().map(|row| row.n_missing).sum()
    }

    /// Columns `column`, `n_missing` (UInt64) and `p_missing` (Float64).
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<&str> = self.rows.iter().map(|row| row.column.as_str()).collect();
        let counts: Vec<u64> = self.rows.iter().map(|row| row.n_missing as u64).collect();
        let percents: Vec<f64> = self.rows.iter().map(|row| row.p_missing).collect();

        Ok(df!(
            "column" => columns,
            "n_missing" => counts,
            "p_missing" => percents
        )?)
    }
}

/// Count missing values in every column of `df`.
///
/// Nulls are missing in every column; in float columns `NaN` is missing too.
///
/// Non-emptiness is not enforced here; on a zero-row table every percentage
/// is NaN.
pub fn missingness_report(df: &DataFrame) -> MissingnessReport {
    let row_count = df.height();

    let mut rows: Vec<MissingnessRow> = df
        .get_columns()
        .iter()
        .map(|col| {
            let n_missing = missing_count(col.as_materialized_series());
            MissingnessRow {
                column: col.name().to_string(),
                n_missing,
                p_missing: 100.0 * n_missing as f64 / row_count as f64,
            }
        })
        .collect();

    // sort_by is stable, so equal percentages keep source order
    rows.sort_by(|a, b| {
        b.p_missing
            .partial_cmp(&a.p_missing)
            .unwrap_or(Ordering::Equal)
    });

    MissingnessReport { row_count, rows }
}
