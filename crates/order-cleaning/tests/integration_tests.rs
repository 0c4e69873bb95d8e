//! Integration tests for the order cleaning pipeline.
//!
//! Each test builds a project root in a temporary directory, copies the
//! fixtures into `data/raw`, and runs the pipeline against it.

use order_cleaning::config::DEFAULT_NA_VALUES;
use order_cleaning::io::{read_parquet, read_table};
use order_cleaning::{
    CheckPolicy, ChecksConfig, Pipeline, PipelineConfig, PipelineError, PipelineStage,
    QualityCheck, dedupe_keep_latest, enforce_schema, missingness_report, orders_schema,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Temporary project root with the fixture files in `data/raw`.
fn project_with(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let raw = dir.path().join("data/raw");
    fs::create_dir_all(&raw).expect("Failed to create raw dir");
    for file in files {
        fs::copy(fixtures_path().join(file), raw.join(file)).expect("Failed to copy fixture");
    }
    dir
}

fn config_for(root: &Path, checks: ChecksConfig) -> PipelineConfig {
    PipelineConfig::builder()
        .root(root)
        .checks(checks)
        .build()
        .expect("Fixture config should validate")
}

fn na_values() -> Vec<String> {
    DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect()
}

fn processed_is_empty(root: &Path) -> bool {
    let processed = root.join("data/processed");
    !processed.exists()
        || fs::read_dir(&processed)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
}

fn strings(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    df.column(column)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

// ============================================================================
// End-to-End Runs
// ============================================================================

#[test]
fn test_demo_run_writes_outputs() {
    let project = project_with(&["orders.csv", "users.csv"]);
    let config = config_for(project.path(), ChecksConfig::demo());

    let summary = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run()
        .expect("Demo run should tolerate the known failures");

    assert!(summary.output_path.ends_with("data/processed/orders_clean.parquet"));
    assert!(
        summary
            .report_path
            .ends_with("data/processed/missingness_orders_missingness.csv")
    );
    assert!(summary.output_path.exists());
    assert!(summary.report_path.exists());
    assert!(summary.users_path.is_some());

    let cleaned = read_parquet(&summary.output_path).unwrap();
    assert_eq!(cleaned.height(), 6);
    assert_eq!(summary.rows, 6);

    let names: Vec<String> = cleaned
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "order_id",
            "user_id",
            "amount",
            "quantity",
            "status",
            "created_at",
            "status_clean",
            "amount__isna",
            "quantity__isna",
        ]
    );
    assert_eq!(summary.columns, names);

    assert_eq!(cleaned.column("amount").unwrap().dtype(), &DataType::Float64);
    assert_eq!(cleaned.column("quantity").unwrap().dtype(), &DataType::Int64);
    assert_eq!(
        strings(&cleaned, "user_id")[0].as_deref(),
        Some("0001"),
        "leading zeros must survive"
    );
    assert_eq!(
        strings(&cleaned, "status_clean"),
        vec![
            Some("paid".to_string()),
            Some("refunded".to_string()),
            Some("paid".to_string()),
            Some("paid".to_string()),
            Some("shipped late".to_string()),
            None,
        ]
    );

    let amount_flags: Vec<Option<bool>> = cleaned
        .column("amount__isna")
        .unwrap()
        .bool()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(
        amount_flags,
        vec![
            Some(false),
            Some(true),
            Some(false),
            Some(false),
            Some(false),
            Some(true)
        ]
    );

    let failed: Vec<QualityCheck> = summary
        .checks
        .iter()
        .filter(|record| !record.passed)
        .map(|record| record.check)
        .collect();
    assert_eq!(
        failed,
        vec![QualityCheck::UniqueOrderId, QualityCheck::AmountRange]
    );
    assert_eq!(summary.checks.len(), 5);
}

#[test]
fn test_report_csv_sorted_by_missing_share() {
    let project = project_with(&["orders.csv"]);
    let summary = Pipeline::builder()
        .config(config_for(project.path(), ChecksConfig::demo()))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let text = fs::read_to_string(&summary.report_path).unwrap();
    assert!(text.starts_with("column,n_missing,p_missing"));

    let report = read_table(&summary.report_path, &na_values()).unwrap();
    // ties keep the source column order
    assert_eq!(
        strings(&report, "column"),
        vec![
            Some("amount".to_string()),
            Some("quantity".to_string()),
            Some("user_id".to_string()),
            Some("status".to_string()),
            Some("order_id".to_string()),
            Some("created_at".to_string()),
        ]
    );
    assert_eq!(
        strings(&report, "n_missing"),
        ["2", "2", "1", "1", "0", "0"]
            .iter()
            .map(|s| Some(s.to_string()))
            .collect::<Vec<_>>()
    );

    let row = summary.missingness.get("amount").unwrap();
    assert!((row.p_missing - 100.0 * 2.0 / 6.0).abs() < 1e-9);
}

#[test]
fn test_run_without_users_table() {
    let project = project_with(&["orders.csv"]);
    let summary = Pipeline::builder()
        .config(config_for(project.path(), ChecksConfig::demo()))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(summary.users_path.is_none());
    assert!(
        summary
            .checks
            .iter()
            .all(|record| record.check != QualityCheck::UniqueUserId)
    );
}

#[test]
fn test_run_summary_serializes() {
    let project = project_with(&["orders.csv"]);
    let summary = Pipeline::builder()
        .config(config_for(project.path(), ChecksConfig::demo()))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["rows"], 6);
    assert_eq!(json["checks"][2]["check"], "unique_order_id");
    assert_eq!(json["checks"][2]["code"], "DUPLICATE_KEY");
    assert!(json.get("users_path").is_none());
    assert!(json["generated_at"].is_string());
}

// ============================================================================
// Failure Policies
// ============================================================================

#[test]
fn test_default_policy_aborts_without_writing() {
    let project = project_with(&["orders.csv", "users.csv"]);
    let err = Pipeline::builder()
        .config(config_for(project.path(), ChecksConfig::default()))
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    match err {
        PipelineError::DuplicateKey {
            column,
            duplicated_rows,
            distinct_keys,
            sample,
        } => {
            assert_eq!(column, "order_id");
            assert_eq!(duplicated_rows, 2);
            assert_eq!(distinct_keys, 1);
            assert_eq!(sample, vec!["A3".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(processed_is_empty(project.path()));
}

#[test]
fn test_collect_policy_lists_every_failure() {
    let project = project_with(&["orders.csv"]);
    let mut checks = ChecksConfig::default();
    checks.set(QualityCheck::UniqueOrderId, CheckPolicy::Collect);
    checks.set(QualityCheck::AmountRange, CheckPolicy::Collect);

    let err = Pipeline::builder()
        .config(config_for(project.path(), checks))
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    match err {
        PipelineError::ChecksFailed { failures } => {
            assert_eq!(failures.len(), 2);
            assert!(failures[0].contains("A3"));
            assert!(failures[1].contains("-5"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(processed_is_empty(project.path()));
}

#[test]
fn test_missing_required_column() {
    let project = project_with(&[]);
    fs::write(
        project.path().join("data/raw/orders.csv"),
        "order_id,user_id,quantity,status\nA1,0001,1,paid\n",
    )
    .unwrap();

    let err = Pipeline::builder()
        .config(config_for(project.path(), ChecksConfig::demo()))
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert!(
        matches!(err, PipelineError::MissingColumns { ref missing } if missing == &["amount"]),
        "unexpected error: {err}"
    );
}

#[test]
fn test_header_only_file_is_empty_table() {
    let project = project_with(&[]);
    fs::write(
        project.path().join("data/raw/orders.csv"),
        "order_id,user_id,amount,quantity,status\n",
    )
    .unwrap();

    let err = Pipeline::builder()
        .config(config_for(project.path(), ChecksConfig::demo()))
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert_eq!(err.error_code(), "EMPTY_TABLE");
}

#[test]
fn test_duplicate_users_abort_demo_run() {
    let project = project_with(&["orders.csv"]);
    fs::write(
        project.path().join("data/raw/users.csv"),
        "user_id,name\n0001,Ada\n0001,Ada again\n",
    )
    .unwrap();

    let err = Pipeline::builder()
        .config(config_for(project.path(), ChecksConfig::demo()))
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    match err {
        PipelineError::DuplicateKey { column, sample, .. } => {
            assert_eq!(column, "user_id");
            assert_eq!(sample, vec!["0001".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_failed_table_write_leaves_no_report() {
    let project = project_with(&["orders.csv"]);
    let config = config_for(project.path(), ChecksConfig::demo());
    // a directory where the Parquet file should go makes the write fail
    fs::create_dir_all(config.output_path()).unwrap();
    let report_path = config.report_path();

    let err = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert_eq!(err.error_code(), "IO_ERROR");
    assert!(!report_path.exists());
}

#[test]
fn test_non_schema_float_nan_is_reported_missing() {
    let mut raw = read_table(&fixtures_path().join("orders.csv"), &na_values()).unwrap();
    let discount = Series::new(
        "discount".into(),
        &[Some(0.1f64), Some(f64::NAN), None, Some(0.0), Some(0.2), Some(0.0)],
    );
    raw.with_column(discount).unwrap();

    let mut config = PipelineConfig::builder()
        .checks(ChecksConfig::demo())
        .build()
        .unwrap();
    config.flag_columns.push("discount".to_string());

    let output = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .process(raw, None)
        .unwrap();

    assert_eq!(output.report.get("discount").unwrap().n_missing, 2);
    let flags: Vec<Option<bool>> = output
        .cleaned
        .column("discount__isna")
        .unwrap()
        .bool()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(
        flags,
        vec![
            Some(false),
            Some(true),
            Some(true),
            Some(false),
            Some(false),
            Some(false)
        ]
    );
}

#[test]
fn test_missing_input_file_is_io_error() {
    let project = project_with(&[]);
    let err = Pipeline::builder()
        .config(config_for(project.path(), ChecksConfig::demo()))
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert!(!err.is_quality_failure());
    assert!(err.to_string().contains("orders.csv"));
}

// ============================================================================
// Progress Reporting
// ============================================================================

#[test]
fn test_run_reports_loading_and_writing() {
    let project = project_with(&["orders.csv", "users.csv"]);
    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = stages.clone();

    Pipeline::builder()
        .config(config_for(project.path(), ChecksConfig::demo()))
        .on_progress(move |update| sink.lock().unwrap().push(update.stage))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let stages = stages.lock().unwrap();
    assert_eq!(stages.first(), Some(&PipelineStage::Loading));
    assert!(stages.contains(&PipelineStage::Writing));
    assert_eq!(stages.last(), Some(&PipelineStage::Complete));
}

// ============================================================================
// Library Stages on Fixture Data
// ============================================================================

#[test]
fn test_schema_then_dedupe_keeps_latest_order() {
    let raw = read_table(&fixtures_path().join("orders.csv"), &na_values()).unwrap();
    let typed = enforce_schema(&raw, &orders_schema()).unwrap();

    let deduped = dedupe_keep_latest(&typed, &["order_id"], "created_at").unwrap();
    assert_eq!(deduped.height(), 5);

    let ids = strings(&deduped, "order_id");
    let a3 = ids
        .iter()
        .position(|id| id.as_deref() == Some("A3"))
        .unwrap();
    let amount = deduped.column("amount").unwrap().f64().unwrap().get(a3);
    assert_eq!(amount, Some(25.0));
}

#[test]
fn test_enforce_schema_does_not_touch_input() {
    let raw = read_table(&fixtures_path().join("orders.csv"), &na_values()).unwrap();
    let before = raw.clone();

    let typed = enforce_schema(&raw, &orders_schema()).unwrap();
    assert!(raw.equals_missing(&before));

    // "abc" is lost in coercion and shows up in the report
    assert_eq!(raw.column("amount").unwrap().null_count(), 1);
    assert_eq!(missingness_report(&typed).get("amount").unwrap().n_missing, 2);
}
