//! Best-effort column conversions used by the schema enforcer.
//!
//! None of these fail on bad values: anything that cannot be represented in
//! the target type becomes null.

use crate::error::Result;
use crate::utils::{DtypeCategory, float_to_int, get_dtype_category, parse_integer, parse_number};
use polars::prelude::*;

/// Convert any series to `Float64`, nulling unparseable values and `NaN`.
pub(crate) fn to_float64(series: &Series) -> Result<Series> {
    let values = float_values(series)?;
    Ok(Series::new(series.name().clone(), values))
}

/// Convert any series to `Int64`.
///
/// Integer inputs are cast directly and integer text is parsed exactly, so
/// large ids keep full precision. Float inputs go through `f64` and only
/// integral values survive.
pub(crate) fn to_int64(series: &Series) -> Result<Series> {
    let values: Vec<Option<i64>> = match get_dtype_category(series.dtype()) {
        DtypeCategory::Numeric if series.dtype().is_integer() => {
            return Ok(series.cast(&DataType::Int64)?);
        }
        DtypeCategory::Numeric | DtypeCategory::Boolean => float_values(series)?
            .into_iter()
            .map(|v| v.and_then(float_to_int))
            .collect(),
        DtypeCategory::String => parse_integers(series)?,
        DtypeCategory::Other => parse_integers(&series.cast(&DataType::String)?)?,
    };

    Ok(Series::new(series.name().clone(), values))
}

/// Convert any series to its textual form. Nulls stay null.
pub(crate) fn to_text(series: &Series) -> Result<Series> {
    if series.dtype() == &DataType::String {
        return Ok(series.clone());
    }
    Ok(series.cast(&DataType::String)?)
}

fn float_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let values = match get_dtype_category(series.dtype()) {
        DtypeCategory::Numeric | DtypeCategory::Boolean => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect(),
        DtypeCategory::String => parse_text(series)?,
        DtypeCategory::Other => parse_text(&series.cast(&DataType::String)?)?,
    };
    Ok(values)
}

fn parse_integers(series: &Series) -> Result<Vec<Option<i64>>> {
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_integer))
        .collect())
}

fn parse_text(series: &Series) -> Result<Vec<Option<f64>>> {
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_number))
        .collect())
}
