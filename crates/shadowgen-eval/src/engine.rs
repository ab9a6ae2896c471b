use std::collections::{HashMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use shadowgen_core::{Row, SchemaGraph, SourceStats, SyntheticDataset, Value, is_pii_column, read_snapshot};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::EvalError;
use crate::metrics::{
    CardinalityReport, CardinalityRow, DistributionReport, FkRatio, FkRatioReport,
    IntegrityReport, MatchStatus, Metric, MetricFailure, NullComparison, NullRateReport,
    OrphanReference, PrivacyFinding, PrivacyReport, REPORT_VERSION, SkewFinding, TemporalRange,
    TemporalReport, ValidationReport,
};
use crate::model::{EvaluateOptions, ValidationResult};
use crate::report::render_report;

/// Compare a synthetic dataset against its schema and, when available, the
/// source's aggregate statistics.
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    options: EvaluateOptions,
}

impl ValidationEngine {
    pub fn new(options: EvaluateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EvaluateOptions {
        &self.options
    }

    /// Load a snapshot from disk, validate it and render the text report.
    pub fn run(
        &self,
        schema: &SchemaGraph,
        snapshot: &Path,
        source: Option<&dyn SourceStats>,
    ) -> Result<ValidationResult, EvalError> {
        let dataset = read_snapshot(snapshot)?;
        if dataset.is_empty() {
            return Err(EvalError::InvalidDataset(format!(
                "snapshot '{}' contains no tables",
                snapshot.display()
            )));
        }
        let report = self.validate(schema, &dataset, source);
        let rendered = render_report(&report);
        Ok(ValidationResult { report, rendered })
    }

    /// Run every metric. A metric that errors or panics is recorded as a
    /// failure and the others still run.
    pub fn validate(
        &self,
        schema: &SchemaGraph,
        dataset: &SyntheticDataset,
        source: Option<&dyn SourceStats>,
    ) -> ValidationReport {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let options = &self.options;
        info!(
            run_id = %run_id,
            tables = dataset.len(),
            rows = dataset.total_rows(),
            source = source.is_some(),
            "validation started"
        );

        let mut failures = Vec::new();
        let cardinality = isolate(Metric::Cardinality, &mut failures, || {
            cardinality(dataset, source)
        });
        let distribution = isolate(Metric::Distribution, &mut failures, || {
            distribution(schema, dataset, options)
        });
        let null_rates = isolate(Metric::NullRates, &mut failures, || {
            null_rates(schema, dataset, source, options)
        });
        let fk_ratios = isolate(Metric::FkRatios, &mut failures, || {
            fk_ratios(schema, dataset, options)
        });
        let temporal = isolate(Metric::Temporal, &mut failures, || {
            temporal(schema, dataset, options)
        });
        let integrity = isolate(Metric::Integrity, &mut failures, || {
            integrity(schema, dataset, options)
        });
        let privacy = match source {
            Some(source) if options.check_privacy => {
                isolate(Metric::Privacy, &mut failures, || {
                    privacy(schema, dataset, source, options)
                })
            }
            _ => None,
        };

        let report = ValidationReport {
            report_version: REPORT_VERSION.to_string(),
            run_id,
            tables_analyzed: dataset.len(),
            cardinality,
            distribution,
            null_rates,
            fk_ratios,
            temporal,
            integrity,
            privacy,
            failures,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            run_id = %report.run_id,
            passed = report.passed(),
            orphans = report.integrity.as_ref().map(|integrity| integrity.orphans),
            failed_metrics = report.failures.len(),
            duration_ms = report.duration_ms,
            "validation finished"
        );
        report
    }
}

fn isolate<T>(
    metric: Metric,
    failures: &mut Vec<MetricFailure>,
    compute: impl FnOnce() -> Result<T, EvalError>,
) -> Option<T> {
    let message = match catch_unwind(AssertUnwindSafe(compute)) {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(err)) => err.to_string(),
        Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
    };
    warn!(metric = %metric, error = %message, "validation metric failed");
    failures.push(MetricFailure { metric, message });
    None
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Columns of a dataset table: schema order when the table is known, else the
/// keys of the first row.
fn table_columns(schema: &SchemaGraph, table: &str, rows: &[Row]) -> Vec<String> {
    match schema.table(table) {
        Ok(spec) => spec.columns.iter().map(|column| column.name.clone()).collect(),
        Err(_) => rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default(),
    }
}

fn pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn cardinality(
    dataset: &SyntheticDataset,
    source: Option<&dyn SourceStats>,
) -> Result<CardinalityReport, EvalError> {
    let tables = dataset
        .iter()
        .map(|(table, rows)| {
            let synthetic_rows = rows.len() as u64;
            let source_rows = source.and_then(|source| source.row_count(table));
            let status = match source_rows {
                Some(source_rows) if source_rows == synthetic_rows => MatchStatus::Match,
                Some(_) => MatchStatus::Differ,
                None => MatchStatus::Unknown,
            };
            CardinalityRow {
                table: table.to_string(),
                source_rows,
                synthetic_rows,
                status,
            }
        })
        .collect();
    Ok(CardinalityReport { tables })
}

fn is_text_column(schema: &SchemaGraph, table: &str, column: &str, rows: &[Row]) -> bool {
    if let Some(spec) = schema
        .table(table)
        .ok()
        .and_then(|spec| spec.find_column(column))
    {
        return spec.kind.is_textual();
    }
    let mut values = rows
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|value| !value.is_null())
        .peekable();
    values.peek().is_some() && values.all(|value| matches!(value, Value::Text(_)))
}

fn distribution(
    schema: &SchemaGraph,
    dataset: &SyntheticDataset,
    options: &EvaluateOptions,
) -> Result<DistributionReport, EvalError> {
    let mut columns = Vec::new();
    for (table, rows) in dataset.iter().take(options.skew_table_limit) {
        if rows.is_empty() {
            continue;
        }
        for column in table_columns(schema, table, rows) {
            if column.ends_with("_id") || !is_text_column(schema, table, &column, rows) {
                continue;
            }
            let mut counts: HashMap<String, u64> = HashMap::new();
            for value in dataset.column_values(table, &column) {
                if !value.is_null() {
                    *counts.entry(value.canonical_key()).or_default() += 1;
                }
            }
            let Some(top) = counts.values().copied().max() else {
                continue;
            };
            let top_share_pct = pct(top, rows.len() as u64);
            columns.push(SkewFinding {
                table: table.to_string(),
                column,
                unique_values: counts.len() as u64,
                top_share_pct,
                high_skew: top_share_pct > options.skew_threshold_pct,
            });
        }
    }
    Ok(DistributionReport {
        threshold_pct: options.skew_threshold_pct,
        columns,
    })
}

fn null_rates(
    schema: &SchemaGraph,
    dataset: &SyntheticDataset,
    source: Option<&dyn SourceStats>,
    options: &EvaluateOptions,
) -> Result<NullRateReport, EvalError> {
    let Some(source) = source else {
        return Ok(NullRateReport {
            source_available: false,
            comparisons: Vec::new(),
        });
    };

    let mut comparisons = Vec::new();
    'tables: for (table, rows) in dataset.iter().take(options.null_table_limit) {
        let Some(source_rows) = source.row_count(table) else {
            continue;
        };
        let columns = table_columns(schema, table, rows);
        for column in columns.into_iter().take(options.null_columns_per_table) {
            if comparisons.len() >= options.null_pair_limit {
                break 'tables;
            }
            let Some(source_nulls) = source.null_count(table, &column) else {
                continue;
            };
            let synthetic_nulls = dataset
                .column_values(table, &column)
                .filter(|value| value.is_null())
                .count() as u64;
            let source_null_pct = pct(source_nulls, source_rows);
            let synthetic_null_pct = pct(synthetic_nulls, rows.len() as u64);
            let status = if (source_null_pct - synthetic_null_pct).abs()
                < options.null_gap_threshold_pct
            {
                MatchStatus::Match
            } else {
                MatchStatus::Differ
            };
            comparisons.push(NullComparison {
                table: table.to_string(),
                column,
                source_null_pct,
                synthetic_null_pct,
                status,
            });
        }
    }
    Ok(NullRateReport {
        source_available: true,
        comparisons,
    })
}

fn fk_ratios(
    schema: &SchemaGraph,
    dataset: &SyntheticDataset,
    options: &EvaluateOptions,
) -> Result<FkRatioReport, EvalError> {
    let mut ratios = Vec::new();
    for (table, rows) in dataset.iter().take(options.fk_table_limit) {
        let Ok(spec) = schema.table(table) else {
            continue;
        };
        for (column, referenced) in &spec.foreign_keys {
            let distinct: HashSet<String> = dataset
                .column_values(table, column)
                .filter(|value| !value.is_null())
                .map(Value::canonical_key)
                .collect();
            let rows = rows.len() as u64;
            let distinct_parents = distinct.len() as u64;
            let avg_children_per_parent = if distinct_parents == 0 {
                0.0
            } else {
                rows as f64 / distinct_parents as f64
            };
            ratios.push(FkRatio {
                table: table.to_string(),
                column: column.clone(),
                referenced_table: referenced.clone(),
                rows,
                distinct_parents,
                avg_children_per_parent,
            });
        }
    }
    Ok(FkRatioReport { ratios })
}

const TEXT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Best-effort timestamp for a temporal cell.
fn parse_temporal(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(date) => Some(date.and_time(NaiveTime::MIN)),
        Value::Timestamp(timestamp) => Some(*timestamp),
        Value::Text(raw) => {
            let raw = raw.trim();
            TEXT_DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .or_else(|| {
                    DateTime::parse_from_rfc3339(raw)
                        .ok()
                        .map(|parsed| parsed.naive_utc())
                })
                .or_else(|| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .ok()
                        .map(|date| date.and_time(NaiveTime::MIN))
                })
        }
        _ => None,
    }
}

fn temporal(
    schema: &SchemaGraph,
    dataset: &SyntheticDataset,
    options: &EvaluateOptions,
) -> Result<TemporalReport, EvalError> {
    let mut ranges = Vec::new();
    for (table, rows) in dataset.iter() {
        for column in table_columns(schema, table, rows) {
            let lowered = column.to_lowercase();
            if !options
                .temporal_keywords
                .iter()
                .any(|keyword| lowered.contains(keyword.as_str()))
            {
                continue;
            }
            let parsed: Vec<NaiveDateTime> = dataset
                .column_values(table, &column)
                .filter_map(parse_temporal)
                .collect();
            let (Some(min), Some(max)) = (parsed.iter().min(), parsed.iter().max()) else {
                continue;
            };
            ranges.push(TemporalRange {
                table: table.to_string(),
                column,
                min: min.format("%Y-%m-%d %H:%M:%S").to_string(),
                max: max.format("%Y-%m-%d %H:%M:%S").to_string(),
                parsed_values: parsed.len() as u64,
            });
        }
    }
    Ok(TemporalReport { ranges })
}

/// Key set of a referenced table: the union of its declared primary-key
/// columns' values. Empty when the table is missing from the dataset.
fn parent_keys(schema: &SchemaGraph, dataset: &SyntheticDataset, table: &str) -> HashSet<String> {
    let Ok(spec) = schema.table(table) else {
        return HashSet::new();
    };
    spec.primary_key
        .iter()
        .flat_map(|column| dataset.column_values(table, column))
        .filter(|value| !value.is_null())
        .map(Value::canonical_key)
        .collect()
}

fn integrity(
    schema: &SchemaGraph,
    dataset: &SyntheticDataset,
    options: &EvaluateOptions,
) -> Result<IntegrityReport, EvalError> {
    let mut parents: HashMap<&str, HashSet<String>> = HashMap::new();
    let mut report = IntegrityReport {
        total_checks: 0,
        orphans: 0,
        examples: Vec::new(),
    };

    for (table, rows) in dataset.iter() {
        let Ok(spec) = schema.table(table) else {
            continue;
        };
        for (column, referenced) in &spec.foreign_keys {
            let keys = parents
                .entry(referenced.as_str())
                .or_insert_with(|| parent_keys(schema, dataset, referenced));
            for value in rows.iter().filter_map(|row| row.get(column)) {
                // NULL references satisfy the constraint.
                if value.is_null() {
                    continue;
                }
                report.total_checks += 1;
                let key = value.canonical_key();
                if keys.contains(&key) {
                    continue;
                }
                report.orphans += 1;
                if report.examples.len() < options.max_orphan_examples {
                    report.examples.push(OrphanReference {
                        table: table.to_string(),
                        column: column.clone(),
                        referenced_table: referenced.clone(),
                        value: key,
                    });
                }
            }
        }
    }

    if report.orphans > 0 {
        warn!(
            orphans = report.orphans,
            total_checks = report.total_checks,
            "orphaned foreign key references"
        );
    }
    Ok(report)
}

fn privacy(
    schema: &SchemaGraph,
    dataset: &SyntheticDataset,
    source: &dyn SourceStats,
    options: &EvaluateOptions,
) -> Result<PrivacyReport, EvalError> {
    let mut report = PrivacyReport {
        columns_checked: Vec::new(),
        findings: Vec::new(),
    };
    for (table, rows) in dataset.iter() {
        for column in table_columns(schema, table, rows) {
            if !is_pii_column(&column) {
                continue;
            }
            let Some(sample) = source.sample_values(table, &column) else {
                continue;
            };
            let real: HashSet<String> = sample
                .iter()
                .take(options.privacy_sample_limit)
                .map(|value| value.trim().to_lowercase())
                .collect();
            let synthetic: HashSet<String> = dataset
                .column_values(table, &column)
                .filter(|value| !value.is_null())
                .map(|value| value.canonical_key().trim().to_lowercase())
                .collect();
            let matches = synthetic.intersection(&real).count() as u64;
            report.columns_checked.push(format!("{table}.{column}"));
            if matches > 0 {
                warn!(table, column = %column, matches, "synthetic values overlap real sample");
                report.findings.push(PrivacyFinding {
                    table: table.to_string(),
                    column,
                    matches,
                });
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snapshot_and_typed_temporal_values() {
        let expected = NaiveDate::from_ymd_opt(2023, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            parse_temporal(&Value::Text("2023-05-01T10:30:00".into())),
            Some(expected)
        );
        assert_eq!(
            parse_temporal(&Value::Text("2023-05-01 10:30:00".into())),
            Some(expected)
        );
        assert_eq!(parse_temporal(&Value::Timestamp(expected)), Some(expected));
        assert!(parse_temporal(&Value::Text("2023-05-01".into())).is_some());
        assert!(parse_temporal(&Value::Text("not a date".into())).is_none());
        assert!(parse_temporal(&Value::Int(3)).is_none());
    }

    #[test]
    fn isolate_records_panics_as_failures() {
        let mut failures = Vec::new();
        let value: Option<u8> = isolate(Metric::Temporal, &mut failures, || panic!("boom"));
        assert!(value.is_none());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].metric, Metric::Temporal);
        assert!(failures[0].message.contains("boom"));
    }

    #[test]
    fn isolate_records_errors_as_failures() {
        let mut failures = Vec::new();
        let value: Option<u8> = isolate(Metric::Cardinality, &mut failures, || {
            Err(EvalError::SourceUnavailable("closed".to_string()))
        });
        assert!(value.is_none());
        assert!(failures[0].message.contains("closed"));
    }

    #[test]
    fn percentage_of_empty_total_is_zero() {
        assert_eq!(pct(3, 0), 0.0);
        assert_eq!(pct(1, 4), 25.0);
    }
}
