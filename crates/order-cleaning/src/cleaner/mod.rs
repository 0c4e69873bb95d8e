//! Stateless cleaning transforms.
//!
//! This module provides:
//! - Text normalization (trim, lowercase, whitespace collapse)
//! - Value mapping with explicit handling of missing values
//! - Missing-value indicator columns
//! - Keep-latest deduplication by key

mod dedupe;
mod flags;
mod text;

pub use dedupe::dedupe_keep_latest;
pub use flags::{MISSING_FLAG_SUFFIX, add_missing_flags, missing_flag_name};
pub use text::{ValueMapping, apply_mapping, normalize_text, normalize_value};

/// Suffix of the normalized copy of a text column.
pub const CLEAN_SUFFIX: &str = "_clean";

/// Name of the normalized copy of `column`.
pub fn clean_column_name(column: &str) -> String {
    format!("{}{}", column, CLEAN_SUFFIX)
}
