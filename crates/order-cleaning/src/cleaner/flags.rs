//! Missing-value indicator columns.

use crate::error::Result;
use crate::utils::{get_series, missing_mask};
use polars::prelude::*;

/// Suffix appended to a column name for its missing flag.
pub const MISSING_FLAG_SUFFIX: &str = "__isna";

/// Name of the flag column for `column`.
pub fn missing_flag_name(column: &str) -> String {
    format!("{}{}", column, MISSING_FLAG_SUFFIX)
}

/// Return a copy of `df` with a Boolean `<name>__isna` column per entry of
/// `columns`, appended in the given order. `NaN` in a float column counts as
/// missing. `df` itself is not modified.
pub fn add_missing_flags(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let mut out = df.clone();

    for name in columns {
        let flag = missing_mask(&get_series(&out, name)?)
            .with_name(missing_flag_name(name).into())
            .into_series();
        out.with_column(flag)?;
    }

    Ok(out)
}
