//! Keep-latest deduplication.

use crate::error::Result;
use crate::utils::{column_names, get_series, series_as_text};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Keep one row per key combination: the one with the latest timestamp.
///
/// Rows are stably sorted by `timestamp_column` ascending (nulls last), and
/// the last row of each key group is kept, so among equal timestamps the row
/// that came later in the input wins. Nulls in key columns compare equal to
/// each other. An empty `key_columns` slice means "all columns". The output is
/// in timestamp order with contiguous row positions.
pub fn dedupe_keep_latest(
    df: &DataFrame,
    key_columns: &[&str],
    timestamp_column: &str,
) -> Result<DataFrame> {
    get_series(df, timestamp_column)?;
    let keys: Vec<String> = if key_columns.is_empty() {
        column_names(df)
    } else {
        key_columns.iter().map(|k| k.to_string()).collect()
    };

    let sorted = df.sort(
        [timestamp_column],
        SortMultipleOptions::default()
            .with_maintain_order(true)
            .with_nulls_last(true),
    )?;

    let key_values: Vec<Vec<Option<String>>> = keys
        .iter()
        .map(|k| get_series(&sorted, k).and_then(|s| series_as_text(&s)))
        .collect::<Result<_>>()?;

    let row_key = |row: usize| -> Vec<Option<&str>> {
        key_values.iter().map(|col| col[row].as_deref()).collect()
    };

    let height = sorted.height();
    let mut last_seen: HashMap<Vec<Option<&str>>, usize> = HashMap::with_capacity(height);
    for row in 0..height {
        last_seen.insert(row_key(row), row);
    }

    let keep: Vec<bool> = (0..height).map(|row| last_seen[&row_key(row)] == row).collect();
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let deduped = sorted.filter(&mask)?;

    debug!(
        "Deduplicated on {:?}: {} rows -> {} rows",
        keys,
        height,
        deduped.height()
    );

    Ok(deduped)
}
