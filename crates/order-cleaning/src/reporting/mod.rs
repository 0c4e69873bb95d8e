//! Missingness reporting.
//!
//! [`missingness_report`] summarizes nulls per column. The report converts to
//! a DataFrame for the CSV output and serializes as JSON for run summaries.
//!
//! # Example
//!
//! ```rust,ignore
//! use order_cleaning::reporting::missingness_report;
//!
//! let report = missingness_report(&orders);
//! for row in report.rows() {
//!     println!("{}: {} missing ({:.1}%)", row.column, row.n_missing, row.p_missing);
//! }
//! ```

mod missingness;

pub use missingness::{MissingnessReport, MissingnessRow, missingness_report};
