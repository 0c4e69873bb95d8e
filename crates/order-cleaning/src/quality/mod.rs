//! Data quality checks and the policy gate the driver runs them through.

mod checks;

pub use checks::{SAMPLE_LIMIT, assert_in_range, assert_non_empty, assert_unique_key, require_columns};

use crate::config::{CheckPolicy, ChecksConfig};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Checks the driver runs, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCheck {
    RequiredColumns,
    NonEmpty,
    UniqueOrderId,
    AmountRange,
    UniqueUserId,
}

impl QualityCheck {
    pub const ALL: [QualityCheck; 5] = [
        Self::RequiredColumns,
        Self::NonEmpty,
        Self::UniqueOrderId,
        Self::AmountRange,
        Self::UniqueUserId,
    ];

    /// Stable snake_case name, as used in config files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequiredColumns => "required_columns",
            Self::NonEmpty => "non_empty",
            Self::UniqueOrderId => "unique_order_id",
            Self::AmountRange => "amount_range",
            Self::UniqueUserId => "unique_user_id",
        }
    }
}

impl fmt::Display for QualityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for QualityCheck {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|check| check.name() == s)
            .ok_or_else(|| format!("unknown check '{}'", s))
    }
}

/// Outcome of one check as seen by the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub check: QualityCheck,
    pub policy: CheckPolicy,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Runs checks under their configured policies and records the outcomes.
///
/// Errors that are not quality failures (a missing column inside a check, a
/// polars error) always propagate, whatever the policy.
pub struct QualityGate<'a> {
    policies: &'a ChecksConfig,
    records: Vec<CheckRecord>,
    collected: Vec<String>,
}

impl<'a> QualityGate<'a> {
    pub fn new(policies: &'a ChecksConfig) -> Self {
        Self {
            policies,
            records: Vec::new(),
            collected: Vec::new(),
        }
    }

    /// Run one check. Returns `Err` only when the run must stop now.
    pub fn run<F>(&mut self, check: QualityCheck, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let policy = self.policies.policy(check);

        let err = match f() {
            Ok(()) => {
                debug!("Check '{}' passed", check);
                self.records.push(CheckRecord {
                    check,
                    policy,
                    passed: true,
                    code: None,
                    message: None,
                });
                return Ok(());
            }
            Err(e) if !e.is_quality_failure() => return Err(e),
            Err(e) => e,
        };

        self.records.push(CheckRecord {
            check,
            policy,
            passed: false,
            code: Some(err.error_code().to_string()),
            message: Some(err.to_string()),
        });

        match policy {
            CheckPolicy::Abort => Err(err),
            CheckPolicy::Warn => {
                warn!("Check '{}' failed, continuing: {}", check, err);
                Ok(())
            }
            CheckPolicy::Collect => {
                info!("Check '{}' failed, collected: {}", check, err);
                self.collected.push(format!("{}: {}", check, err));
                Ok(())
            }
        }
    }

    /// Note a check that does not apply to this run (e.g. no users table).
    pub fn skip(&self, check: QualityCheck, reason: &str) {
        debug!("Check '{}' skipped: {}", check, reason);
    }

    /// Finish the gate: fails with `ChecksFailed` if any collected check failed.
    pub fn finish(self) -> Result<Vec<CheckRecord>> {
        if self.collected.is_empty() {
            Ok(self.records)
        } else {
            Err(PipelineError::ChecksFailed {
                failures: self.collected,
            })
        }
    }
}
