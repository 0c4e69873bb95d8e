//! Text normalization and value mapping.

use crate::error::Result;
use crate::utils::series_as_text;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));

/// Trim, case-fold and collapse internal whitespace runs to one space.
///
/// Case folding is full Unicode folding, so `"Straße"` and `"STRASSE"`
/// normalize to the same value.
pub fn normalize_value(value: &str) -> String {
    let folded = caseless::default_case_fold_str(value.trim());
    WHITESPACE_RUN.replace_all(&folded, " ").into_owned()
}

/// Normalize every value of a column; the result is a String column.
///
/// Non-text columns are rendered as text first. Nulls stay null.
pub fn normalize_text(series: &Series) -> Result<Series> {
    let values: Vec<Option<String>> = series_as_text(series)?
        .into_iter()
        .map(|v| v.map(|s| normalize_value(&s)))
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

/// Replacement table for [`apply_mapping`].
///
/// Keys are compared against the text form of each value. Missing values are
/// only replaced when [`ValueMapping::map_missing`] was set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMapping {
    values: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    missing: Option<String>,
}

impl ValueMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `from` with `to`.
    pub fn map(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.values.insert(from.into(), to.into());
        self
    }

    /// Replace missing values with `to`.
    pub fn map_missing(mut self, to: impl Into<String>) -> Self {
        self.missing = Some(to.into());
        self
    }

    /// Replacement for one value, if any.
    pub fn lookup(&self, value: Option<&str>) -> Option<&str> {
        match value {
            Some(v) => self.values.get(v).map(String::as_str),
            None => self.missing.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.missing.is_none()
    }
}

impl From<HashMap<String, String>> for ValueMapping {
    fn from(values: HashMap<String, String>) -> Self {
        Self {
            values,
            missing: None,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ValueMapping
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |mapping, (from, to)| mapping.map(from, to))
    }
}

/// Replace values found in `mapping`; everything else is kept as is.
///
/// The result is a String column carrying the input's name.
pub fn apply_mapping(series: &Series, mapping: &ValueMapping) -> Result<Series> {
    let values: Vec<Option<String>> = series_as_text(series)?
        .into_iter()
        .map(|value| match mapping.lookup(value.as_deref()) {
            Some(replacement) => Some(replacement.to_string()),
            None => value,
        })
        .collect();

    Ok(Series::new(series.name().clone(), values))
}
