//! Configuration types for the order cleaning pipeline.
//!
//! This module provides the directory layout resolver, per-check failure
//! policies, and the pipeline configuration with its builder.

use crate::quality::QualityCheck;
use crate::schema::{SchemaEntry, orders_schema};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tokens read as missing when loading CSV input (case-sensitive).
pub const DEFAULT_NA_VALUES: [&str; 5] = ["", "NA", "N/A", "null", "None"];

// =============================================================================
// Paths
// =============================================================================

/// Conventional data directories under a project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paths {
    pub root: PathBuf,
    pub data: PathBuf,
    pub raw: PathBuf,
    pub cache: PathBuf,
    pub processed: PathBuf,
    pub external: PathBuf,
}

impl Paths {
    /// Resolve the `data/{raw,cache,processed,external}` layout under `root`.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let data = root.join("data");
        Self {
            raw: data.join("raw"),
            cache: data.join("cache"),
            processed: data.join("processed"),
            external: data.join("external"),
            data,
            root,
        }
    }
}

// =============================================================================
// Check Policies
// =============================================================================

/// What the driver does when a quality check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckPolicy {
    /// Stop the run with the check's error
    #[default]
    Abort,
    /// Log a warning and keep going
    Warn,
    /// Keep going through the remaining checks, then stop with every failure listed
    Collect,
}

impl std::str::FromStr for CheckPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "warn" => Ok(Self::Warn),
            "collect" => Ok(Self::Collect),
            other => Err(format!(
                "unknown policy '{}' (expected abort, warn or collect)",
                other
            )),
        }
    }
}

/// Failure policy for each check the driver runs.
///
/// Every check aborts by default. [`ChecksConfig::demo`] tolerates the two
/// failures the sample data is known to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChecksConfig {
    pub required_columns: CheckPolicy,
    pub non_empty: CheckPolicy,
    pub unique_order_id: CheckPolicy,
    pub amount_range: CheckPolicy,
    pub unique_user_id: CheckPolicy,
}

impl ChecksConfig {
    /// Duplicate order ids and negative amounts are logged instead of fatal.
    pub fn demo() -> Self {
        Self {
            unique_order_id: CheckPolicy::Warn,
            amount_range: CheckPolicy::Warn,
            ..Self::default()
        }
    }

    /// Policy for one check.
    pub fn policy(&self, check: QualityCheck) -> CheckPolicy {
        match check {
            QualityCheck::RequiredColumns => self.required_columns,
            QualityCheck::NonEmpty => self.non_empty,
            QualityCheck::UniqueOrderId => self.unique_order_id,
            QualityCheck::AmountRange => self.amount_range,
            QualityCheck::UniqueUserId => self.unique_user_id,
        }
    }

    /// Override the policy for one check.
    pub fn set(&mut self, check: QualityCheck, policy: CheckPolicy) {
        let slot = match check {
            QualityCheck::RequiredColumns => &mut self.required_columns,
            QualityCheck::NonEmpty => &mut self.non_empty,
            QualityCheck::UniqueOrderId => &mut self.unique_order_id,
            QualityCheck::AmountRange => &mut self.amount_range,
            QualityCheck::UniqueUserId => &mut self.unique_user_id,
        };
        *slot = policy;
    }
}

// =============================================================================
// Pipeline Configuration
// =============================================================================

/// Configuration for the cleaning pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use order_cleaning::config::{ChecksConfig, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .root("/srv/bootcamp")
///     .checks(ChecksConfig::demo())
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Project root; input and output directories are resolved under it.
    /// Default: "."
    pub root: PathBuf,

    /// Orders CSV file name inside the raw directory.
    /// Default: "orders.csv"
    pub orders_file: String,

    /// Optional users CSV file name inside the raw directory.
    /// Skipped when None or when the file does not exist.
    /// Default: Some("users.csv")
    pub users_file: Option<String>,

    /// Cleaned table file name inside the processed directory.
    /// Default: "orders_clean.parquet"
    pub output_file: String,

    /// Missingness report file name inside the processed directory.
    /// Default: "missingness_orders_missingness.csv"
    pub report_file: String,

    /// Tokens loaded as missing.
    pub na_values: Vec<String>,

    /// Types enforced on the orders table.
    pub schema: Vec<SchemaEntry>,

    /// Columns that must exist after loading.
    /// Default: order_id, user_id, amount
    pub required_columns: Vec<String>,

    /// Column expected to identify an order.
    /// Default: "order_id"
    pub key_column: String,

    /// Numeric column checked against the bounds below.
    /// Default: "amount"
    pub range_column: String,

    /// Inclusive lower bound for `range_column`.
    /// Default: 0.0
    pub range_min: f64,

    /// Optional inclusive upper bound for `range_column`.
    /// Default: None
    pub range_max: Option<f64>,

    /// Text columns normalized into `<name>_clean` columns.
    /// Default: status
    pub text_columns: Vec<String>,

    /// Columns that get a `<name>__isna` flag.
    /// Default: amount, quantity
    pub flag_columns: Vec<String>,

    /// Failure policy per check.
    pub checks: ChecksConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            orders_file: "orders.csv".to_string(),
            users_file: Some("users.csv".to_string()),
            output_file: "orders_clean.parquet".to_string(),
            report_file: "missingness_orders_missingness.csv".to_string(),
            na_values: DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect(),
            schema: orders_schema(),
            required_columns: vec![
                "order_id".to_string(),
                "user_id".to_string(),
                "amount".to_string(),
            ],
            key_column: "order_id".to_string(),
            range_column: "amount".to_string(),
            range_min: 0.0,
            range_max: None,
            text_columns: vec!["status".to_string()],
            flag_columns: vec!["amount".to_string(), "quantity".to_string()],
            checks: ChecksConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Directory layout under `root`.
    pub fn paths(&self) -> Paths {
        Paths::from_root(&self.root)
    }

    /// Full path of the orders input.
    pub fn orders_path(&self) -> PathBuf {
        self.paths().raw.join(&self.orders_file)
    }

    /// Full path of the users input, if one is configured.
    pub fn users_path(&self) -> Option<PathBuf> {
        self.users_file
            .as_ref()
            .map(|name| self.paths().raw.join(name))
    }

    /// Full path of the cleaned table output.
    pub fn output_path(&self) -> PathBuf {
        self.paths().processed.join(&self.output_file)
    }

    /// Full path of the missingness report output.
    pub fn report_path(&self) -> PathBuf {
        self.paths().processed.join(&self.report_file)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("orders_file", &self.orders_file),
            ("output_file", &self.output_file),
            ("report_file", &self.report_file),
            ("key_column", &self.key_column),
            ("range_column", &self.range_column),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigValidationError::EmptyField(field.to_string()));
            }
        }

        if !self.range_min.is_finite() {
            return Err(ConfigValidationError::InvalidBounds {
                min: self.range_min,
                max: self.range_max,
            });
        }

        if let Some(max) = self.range_max
            && (max.is_nan() || max < self.range_min)
        {
            return Err(ConfigValidationError::InvalidBounds {
                min: self.range_min,
                max: self.range_max,
            });
        }

        if self.output_file == self.report_file {
            return Err(ConfigValidationError::OutputCollision(
                self.output_file.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Configuration field '{0}' must not be empty")]
    EmptyField(String),

    #[error("Invalid range bounds: min {min}, max {max:?}")]
    InvalidBounds { min: f64, max: Option<f64> },

    #[error("Cleaned table and report would both be written to '{0}'")]
    OutputCollision(String),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    root: Option<PathBuf>,
    orders_file: Option<String>,
    users_file: Option<Option<String>>,
    output_file: Option<String>,
    report_file: Option<String>,
    na_values: Option<Vec<String>>,
    schema: Option<Vec<SchemaEntry>>,
    key_column: Option<String>,
    range_min: Option<f64>,
    range_max: Option<f64>,
    checks: Option<ChecksConfig>,
}

impl PipelineConfigBuilder {
    /// Set the project root.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Set the orders CSV file name.
    pub fn orders_file(mut self, name: impl Into<String>) -> Self {
        self.orders_file = Some(name.into());
        self
    }

    /// Set the users CSV file name.
    pub fn users_file(mut self, name: impl Into<String>) -> Self {
        self.users_file = Some(Some(name.into()));
        self
    }

    /// Do not load a users table.
    pub fn without_users(mut self) -> Self {
        self.users_file = Some(None);
        self
    }

    /// Set the cleaned table file name.
    pub fn output_file(mut self, name: impl Into<String>) -> Self {
        self.output_file = Some(name.into());
        self
    }

    /// Set the missingness report file name.
    pub fn report_file(mut self, name: impl Into<String>) -> Self {
        self.report_file = Some(name.into());
        self
    }

    /// Replace the tokens loaded as missing.
    pub fn na_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.na_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the enforced schema.
    pub fn schema(mut self, schema: Vec<SchemaEntry>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the unique key column.
    pub fn key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = Some(column.into());
        self
    }

    /// Set the inclusive lower bound of the range check.
    pub fn range_min(mut self, min: f64) -> Self {
        self.range_min = Some(min);
        self
    }

    /// Set the inclusive upper bound of the range check.
    pub fn range_max(mut self, max: f64) -> Self {
        self.range_max = Some(max);
        self
    }

    /// Set the failure policies.
    pub fn checks(mut self, checks: ChecksConfig) -> Self {
        self.checks = Some(checks);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            root: self.root.unwrap_or(defaults.root),
            orders_file: self.orders_file.unwrap_or(defaults.orders_file),
            users_file: self.users_file.unwrap_or(defaults.users_file),
            output_file: self.output_file.unwrap_or(defaults.output_file),
            report_file: self.report_file.unwrap_or(defaults.report_file),
            na_values: self.na_values.unwrap_or(defaults.na_values),
            schema: self.schema.unwrap_or(defaults.schema),
            key_column: self.key_column.unwrap_or(defaults.key_column),
            range_min: self.range_min.unwrap_or(defaults.range_min),
            range_max: self.range_max.or(defaults.range_max),
            checks: self.checks.unwrap_or(defaults.checks),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_paths_from_root() {
        let paths = Paths::from_root("/srv/project");
        assert_eq!(paths.raw, PathBuf::from("/srv/project/data/raw"));
        assert_eq!(paths.processed, PathBuf::from("/srv/project/data/processed"));
        assert_eq!(paths.cache, PathBuf::from("/srv/project/data/cache"));
        assert_eq!(paths.external, PathBuf::from("/srv/project/data/external"));
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.key_column, "order_id");
        assert_eq!(config.range_min, 0.0);
        assert_eq!(config.range_max, None);
        assert_eq!(config.na_values, vec!["", "NA", "N/A", "null", "None"]);
        assert_eq!(config.checks, ChecksConfig::default());
        assert_eq!(config.checks.unique_order_id, CheckPolicy::Abort);
    }

    #[test]
    fn test_resolved_file_paths() {
        let config = PipelineConfig::builder().root("/srv/p").build().unwrap();
        assert_eq!(
            config.orders_path(),
            PathBuf::from("/srv/p/data/raw/orders.csv")
        );
        assert_eq!(
            config.output_path(),
            PathBuf::from("/srv/p/data/processed/orders_clean.parquet")
        );
        assert_eq!(
            config.report_path(),
            PathBuf::from("/srv/p/data/processed/missingness_orders_missingness.csv")
        );
        assert_eq!(
            config.users_path(),
            Some(PathBuf::from("/srv/p/data/raw/users.csv"))
        );
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .orders_file("orders_2024.csv")
            .without_users()
            .key_column("id")
            .range_min(1.0)
            .range_max(500.0)
            .checks(ChecksConfig::demo())
            .build()
            .unwrap();

        assert_eq!(config.orders_file, "orders_2024.csv");
        assert_eq!(config.users_path(), None);
        assert_eq!(config.key_column, "id");
        assert_eq!(config.range_max, Some(500.0));
        assert_eq!(config.checks.amount_range, CheckPolicy::Warn);
    }

    #[test]
    fn test_validation_inverted_bounds() {
        let result = PipelineConfig::builder().range_min(10.0).range_max(1.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidBounds { .. }
        ));
    }

    #[test]
    fn test_validation_empty_field() {
        let result = PipelineConfig::builder().key_column(" ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyField(field) if field == "key_column"
        ));
    }

    #[test]
    fn test_validation_output_collision() {
        let result = PipelineConfig::builder()
            .output_file("out.csv")
            .report_file("out.csv")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::OutputCollision(_)
        ));
    }

    #[test]
    fn test_demo_checks() {
        let checks = ChecksConfig::demo();
        assert_eq!(checks.policy(QualityCheck::UniqueOrderId), CheckPolicy::Warn);
        assert_eq!(checks.policy(QualityCheck::AmountRange), CheckPolicy::Warn);
        assert_eq!(checks.policy(QualityCheck::RequiredColumns), CheckPolicy::Abort);
        assert_eq!(checks.policy(QualityCheck::UniqueUserId), CheckPolicy::Abort);
    }

    #[test]
    fn test_set_policy() {
        let mut checks = ChecksConfig::default();
        checks.set(QualityCheck::NonEmpty, CheckPolicy::Collect);
        assert_eq!(checks.policy(QualityCheck::NonEmpty), CheckPolicy::Collect);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("warn".parse::<CheckPolicy>().unwrap(), CheckPolicy::Warn);
        assert_eq!("COLLECT".parse::<CheckPolicy>().unwrap(), CheckPolicy::Collect);
        assert!("ignore".parse::<CheckPolicy>().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "root": "/data/bootcamp",
            "users_file": null,
            "range_max": 1000.0,
            "checks": { "unique_order_id": "warn", "amount_range": "collect" }
        }"#;

        let config: PipelineConfig =
            serde_json::from_str(json).expect("Should deserialize partial JSON");

        assert_eq!(config.root, PathBuf::from("/data/bootcamp"));
        assert_eq!(config.users_file, None);
        assert_eq!(config.range_max, Some(1000.0));
        assert_eq!(config.checks.unique_order_id, CheckPolicy::Warn);
        assert_eq!(config.checks.amount_range, CheckPolicy::Collect);
        assert_eq!(config.checks.non_empty, CheckPolicy::Abort);
        // unspecified fields fall back to defaults
        assert_eq!(config.orders_file, "orders.csv");
        assert_eq!(config.schema, orders_schema());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = PipelineConfig::builder()
            .checks(ChecksConfig::demo())
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.checks, config.checks);
        assert_eq!(back.flag_columns, config.flag_columns);
    }
}
