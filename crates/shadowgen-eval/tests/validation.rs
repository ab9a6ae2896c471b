use std::collections::BTreeMap;

use shadowgen_core::{
    ColumnKind, ColumnSpec, Row, SchemaGraph, SourceProfile, SourceStats, SyntheticDataset,
    TableSpec, Value, write_snapshot,
};
use shadowgen_eval::{EvaluateOptions, MatchStatus, Metric, ValidationEngine, render_report};
use shadowgen_generate::{GenerateOptions, SynthesisEngine};

fn schema() -> SchemaGraph {
    SchemaGraph::new()
        .with_table(
            TableSpec::new("customer")
                .column(ColumnSpec::new("customer_id", ColumnKind::Integer))
                .column(ColumnSpec::from_sql("first_name", "character varying(45)", false))
                .column(ColumnSpec::from_sql("email", "character varying(50)", true))
                .primary_key(["customer_id"]),
        )
        .with_table(
            TableSpec::new("rental")
                .column(ColumnSpec::new("rental_id", ColumnKind::Integer))
                .column(ColumnSpec::new("customer_id", ColumnKind::Integer))
                .column(ColumnSpec::from_sql(
                    "rental_date",
                    "timestamp without time zone",
                    false,
                ))
                .primary_key(["rental_id"])
                .foreign_key("customer_id", "customer"),
        )
}

fn row(cells: &[(&str, Value)]) -> Row {
    cells
        .iter()
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect()
}

fn customer(id: i64, email: &str) -> Row {
    row(&[
        ("customer_id", Value::Int(id)),
        ("first_name", Value::Text(format!("name{id}"))),
        ("email", Value::Text(email.to_string())),
    ])
}

fn rental(id: i64, customer_id: i64) -> Row {
    row(&[
        ("rental_id", Value::Int(id)),
        ("customer_id", Value::Int(customer_id)),
        ("rental_date", Value::Text(format!("2023-0{id}-01T10:00:00"))),
    ])
}

/// Three customers and five rentals; `refs` are the rentals' customer ids.
fn hand_dataset(refs: [i64; 5]) -> SyntheticDataset {
    let mut dataset = SyntheticDataset::new();
    dataset.insert_table(
        "customer",
        (1..=3)
            .map(|id| customer(id, &format!("user{id}@example.org")))
            .collect(),
    );
    dataset.insert_table(
        "rental",
        refs.iter()
            .enumerate()
            .map(|(index, customer_id)| rental(index as i64 + 1, *customer_id))
            .collect(),
    );
    dataset
}

#[test]
fn generated_dataset_passes_and_reports_null_gap() {
    let schema = schema();
    let counts: BTreeMap<String, u64> = [("customer".to_string(), 1000), ("rental".to_string(), 300)]
        .into_iter()
        .collect();
    let generated = SynthesisEngine::new(GenerateOptions::default())
        .synthesize(&schema, &counts)
        .expect("synthesize");

    let mut profile = SourceProfile::new();
    profile.set_row_count("customer", 599);
    profile.set_row_count("rental", 16044);
    for column in ["customer_id", "first_name", "email"] {
        profile.set_null_count("customer", column, 0);
    }

    let engine = ValidationEngine::new(EvaluateOptions::default());
    let report = engine.validate(
        &schema,
        &generated.dataset,
        Some(&profile as &dyn SourceStats),
    );

    let integrity = report.integrity.as_ref().expect("integrity ran");
    assert_eq!(integrity.orphans, 0);
    assert_eq!(integrity.total_checks, 300);
    assert!(report.passed());

    let nulls = report.null_rates.as_ref().expect("null rates ran");
    let email = nulls
        .comparisons
        .iter()
        .find(|comparison| comparison.column == "email")
        .expect("email compared");
    assert_eq!(email.source_null_pct, 0.0);
    assert_eq!(email.status, MatchStatus::Differ);
    let first_name = nulls
        .comparisons
        .iter()
        .find(|comparison| comparison.column == "first_name")
        .expect("first_name compared");
    assert_eq!(first_name.status, MatchStatus::Match);

    let cardinality = report.cardinality.as_ref().expect("cardinality ran");
    assert!(!cardinality.all_match());
    let rendered = render_report(&report);
    assert!(rendered.contains("NOTE: Row counts differ (expected for synthetic data)"));
    assert!(rendered.contains("Referential Integrity: PASS - All foreign keys valid"));
}

#[test]
fn orphans_fail_integrity_without_hiding_other_metrics() {
    let dataset = hand_dataset([1, 2, 99, 100, 101]);
    let engine = ValidationEngine::new(EvaluateOptions::default());
    let report = engine.validate(&schema(), &dataset, None);

    let integrity = report.integrity.as_ref().expect("integrity ran");
    assert_eq!(integrity.total_checks, 5);
    assert_eq!(integrity.orphans, 3);
    assert_eq!(integrity.examples.len(), 3);
    assert_eq!(integrity.examples[0].value, "99");
    assert!(!report.passed());

    assert!(report.cardinality.is_some());
    assert!(report.distribution.is_some());
    assert!(report.fk_ratios.is_some());
    assert!(report.temporal.is_some());
    assert!(report.failures.is_empty());

    let rendered = render_report(&report);
    assert!(rendered.contains("Referential Integrity: FAIL - 3 orphaned references"));
    assert!(rendered.contains("Orphaned Records: 3"));
}

#[test]
fn parent_table_missing_from_dataset_makes_every_reference_orphaned() {
    let rentals = hand_dataset([1, 1, 1, 1, 1])
        .rows("rental")
        .expect("rentals")
        .to_vec();
    let mut dataset = SyntheticDataset::new();
    dataset.insert_table("rental", rentals);

    let report = ValidationEngine::default().validate(&schema(), &dataset, None);
    assert_eq!(report.integrity.as_ref().map(|i| i.orphans), Some(5));
}

#[test]
fn fk_ratio_and_temporal_range_from_snapshot_text() {
    let dataset = hand_dataset([1, 1, 2, 2, 3]);
    let report = ValidationEngine::default().validate(&schema(), &dataset, None);

    let ratios = report.fk_ratios.as_ref().expect("fk ratios ran");
    assert_eq!(ratios.ratios.len(), 1);
    let ratio = &ratios.ratios[0];
    assert_eq!((ratio.rows, ratio.distinct_parents), (5, 3));
    assert!((ratio.avg_children_per_parent - 5.0 / 3.0).abs() < 1e-9);

    let temporal = report.temporal.as_ref().expect("temporal ran");
    assert_eq!(temporal.ranges.len(), 1);
    assert_eq!(temporal.ranges[0].min, "2023-01-01 10:00:00");
    assert_eq!(temporal.ranges[0].max, "2023-05-01 10:00:00");

    let nulls = report.null_rates.as_ref().expect("null rates ran");
    assert!(!nulls.source_available);
    assert!(render_report(&report).contains("Avg records per parent: 1.67"));
}

#[test]
fn constant_text_column_is_flagged_as_skewed() {
    let mut dataset = SyntheticDataset::new();
    dataset.insert_table(
        "customer",
        (1..=10).map(|id| customer(id, "same@example.org")).collect(),
    );
    let report = ValidationEngine::default().validate(&schema(), &dataset, None);
    let distribution = report.distribution.as_ref().expect("distribution ran");
    let email = distribution
        .columns
        .iter()
        .find(|finding| finding.column == "email")
        .expect("email sampled");
    assert!(email.high_skew);
    assert_eq!(email.unique_values, 1);
    let first_name = distribution
        .columns
        .iter()
        .find(|finding| finding.column == "first_name")
        .expect("first_name sampled");
    assert!(!first_name.high_skew);
    assert!(distribution.columns.iter().all(|finding| finding.column != "customer_id"));
}

struct BrokenStats;

impl SourceStats for BrokenStats {
    fn row_count(&self, _table: &str) -> Option<u64> {
        panic!("source connection dropped")
    }

    fn null_count(&self, _table: &str, _column: &str) -> Option<u64> {
        None
    }

    fn sample_values(&self, _table: &str, _column: &str) -> Option<&[String]> {
        None
    }
}

#[test]
fn failing_metric_is_recorded_and_others_still_run() {
    let dataset = hand_dataset([1, 2, 3, 1, 2]);
    let report = ValidationEngine::default().validate(&schema(), &dataset, Some(&BrokenStats as &dyn SourceStats));

    assert!(report.cardinality.is_none());
    assert!(report.null_rates.is_none());
    let failure = report.failure(Metric::Cardinality).expect("cardinality failure");
    assert!(failure.message.contains("source connection dropped"));

    assert_eq!(report.integrity.as_ref().map(|i| i.orphans), Some(0));
    assert!(report.temporal.is_some());
    assert!(report.passed());
    assert!(render_report(&report).contains("Metric failed"));
}

#[test]
fn privacy_check_detects_leaked_values() {
    let dataset = hand_dataset([1, 2, 3, 1, 2]);
    let mut profile = SourceProfile::new();
    profile.set_samples(
        "customer",
        "email",
        vec!["USER2@example.org".to_string(), "real@sakila.org".to_string()],
    );
    profile.set_samples("customer", "first_name", vec!["MARY".to_string()]);

    let report = ValidationEngine::default().validate(&schema(), &dataset, Some(&profile as &dyn SourceStats));
    let privacy = report.privacy.as_ref().expect("privacy ran");
    assert_eq!(privacy.columns_checked, vec!["customer.first_name", "customer.email"]);
    assert_eq!(privacy.findings.len(), 1);
    assert_eq!(privacy.findings[0].to_string(), "customer.email: 1 matches");
    assert!(!report.passed());
    assert!(render_report(&report).contains("FAIL: PII overlap detected"));
}

#[test]
fn privacy_is_skipped_without_source_or_when_disabled() {
    let dataset = hand_dataset([1, 2, 3, 1, 2]);
    let report = ValidationEngine::default().validate(&schema(), &dataset, None);
    assert!(report.privacy.is_none());

    let profile = SourceProfile::new();
    let engine = ValidationEngine::new(EvaluateOptions {
        check_privacy: false,
        ..EvaluateOptions::default()
    });
    let report = engine.validate(&schema(), &dataset, Some(&profile as &dyn SourceStats));
    assert!(report.privacy.is_none());
}

#[test]
fn run_reads_snapshot_and_renders() {
    let dir = std::env::temp_dir().join(format!("shadowgen_eval_{}", uuid::Uuid::new_v4()));
    let snapshot = dir.join("synthetic_data.json");
    write_snapshot(&snapshot, &hand_dataset([1, 2, 3, 3, 3])).expect("write snapshot");

    let result = ValidationEngine::default()
        .run(&schema(), &snapshot, None)
        .expect("run");
    assert!(result.report.passed());
    assert!(result.rendered.contains("## [6] REFERENTIAL INTEGRITY"));
    assert!(result.rendered.contains("- overall: PASS"));

    let _ = std::fs::remove_dir_all(dir);
}
