//! File boundary of the pipeline: CSV in, Parquet and CSV out.
//!
//! Input is read with every column as text; typing is left to
//! [`crate::schema::enforce_schema`].

use crate::error::{Result, ResultExt};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

/// Read a comma-separated file with a header row.
///
/// Every column is loaded as String. Fields equal to one of `na_values`
/// (exact, case-sensitive match) become null.
pub fn read_table(path: &Path, na_values: &[String]) -> Result<DataFrame> {
    debug!("Reading {} (missing tokens: {:?})", path.display(), na_values);

    let null_values = NullValues::AllColumns(na_values.iter().map(|v| v.as_str().into()).collect());

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_null_values(Some(null_values)),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Failed to open {}", path.display()))?
        .finish()
        .context(format!("Failed to parse {}", path.display()))?;

    info!("Loaded {}: {:?}", path.display(), df.shape());
    Ok(df)
}

/// Write `df` as Parquet, creating parent directories and replacing any
/// existing file.
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    create_parent(path)?;
    let file = File::create(path).context(format!("Failed to create {}", path.display()))?;

    ParquetWriter::new(file)
        .finish(df)
        .context(format!("Failed to write {}", path.display()))?;

    info!("Table saved: {}", path.display());
    Ok(())
}

/// Read a Parquet file written by [`write_table`].
pub fn read_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).context(format!("Failed to open {}", path.display()))?;
    ParquetReader::new(file)
        .finish()
        .context(format!("Failed to read {}", path.display()))
}

/// Write `df` as a CSV report with a header row.
pub fn write_report_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    create_parent(path)?;
    let mut file = File::create(path).context(format!("Failed to create {}", path.display()))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .context(format!("Failed to write {}", path.display()))?;

    info!("Report saved: {}", path.display());
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context(format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}
