use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;

/// Options for the synthesis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Seed for every table's random stream.
    pub seed: u64,
    /// Chance that a nullable non-key column emits null.
    pub null_probability: f64,
    /// Retry budget for `sample_unique` and uniqueness-sensitive columns.
    pub unique_attempts: u32,
    /// Retry budget for all-foreign-key composite primary keys.
    pub composite_key_attempts: u32,
    /// Keys handed out when a referenced table has no reserved values yet.
    pub fallback_key_range: RangeInclusive<i64>,
    /// Rows per table when no explicit or profiled count exists.
    pub default_rows: u64,
    /// Multiplier applied to profiled source row counts.
    pub row_scale: f64,
    /// Reference "today" for date and timestamp generators.
    pub base_date: NaiveDate,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            null_probability: 0.10,
            unique_attempts: 50,
            composite_key_attempts: 100,
            fallback_key_range: 1..=10,
            default_rows: 50,
            row_scale: 1.0,
            base_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }
}

impl GenerateOptions {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if !(0.0..=1.0).contains(&self.null_probability) {
            return Err(GenerationError::InvalidOptions(format!(
                "null_probability must be within 0..=1, got {}",
                self.null_probability
            )));
        }
        if self.fallback_key_range.is_empty() {
            return Err(GenerationError::InvalidOptions(format!(
                "fallback_key_range is empty: {:?}",
                self.fallback_key_range
            )));
        }
        if !self.row_scale.is_finite() || self.row_scale < 0.0 {
            return Err(GenerationError::InvalidOptions(format!(
                "row_scale must be a non-negative number, got {}",
                self.row_scale
            )));
        }
        if self.unique_attempts == 0 || self.composite_key_attempts == 0 {
            return Err(GenerationError::InvalidOptions(
                "retry budgets must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Summary of a synthesized table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub rows_requested: u64,
    pub rows_generated: u64,
    pub retries: u64,
}

/// Structured generation issue. Repeated issues for the same table, column
/// and code are folded into one entry with an occurrence count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub occurrences: u64,
}

impl GenerationIssue {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.to_string(),
            message: message.into(),
            table: None,
            column: None,
            occurrences: 1,
        }
    }

    pub fn info(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: "info".to_string(),
            ..Self::warning(code, message)
        }
    }

    pub fn at(mut self, table: &str, column: Option<&str>) -> Self {
        self.table = Some(table.to_string());
        self.column = column.map(str::to_string);
        self
    }
}

/// Report for a synthesis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub order: Vec<String>,
    pub tables: Vec<TableReport>,
    pub skipped_tables: Vec<String>,
    pub total_records: u64,
    pub retries_total: u64,
    pub rule_usage: BTreeMap<String, u64>,
    pub degraded_count: u64,
    pub fallback_key_count: u64,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<GenerationIssue>,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64) -> Self {
        Self {
            run_id,
            seed,
            order: Vec::new(),
            tables: Vec::new(),
            skipped_tables: Vec::new(),
            total_records: 0,
            retries_total: 0,
            rule_usage: BTreeMap::new(),
            degraded_count: 0,
            fallback_key_count: 0,
            warnings_by_code: BTreeMap::new(),
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn record_rule_usage(&mut self, id: &str) {
        *self.rule_usage.entry(id.to_string()).or_insert(0) += 1;
    }

    pub fn record_degraded(&mut self) {
        self.degraded_count += 1;
    }

    pub fn record_fallback_key(&mut self) {
        self.fallback_key_count += 1;
    }

    pub fn record_warning(&mut self, issue: GenerationIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        let existing = self.warnings.iter_mut().find(|known| {
            known.code == issue.code && known.table == issue.table && known.column == issue.column
        });
        match existing {
            Some(known) => known.occurrences += 1,
            None => self.warnings.push(issue),
        }
    }

    pub fn record_skipped(&mut self, table: &str, reason: impl Into<String>) {
        self.skipped_tables.push(table.to_string());
        self.record_warning(GenerationIssue::warning("table_skipped", reason).at(table, None));
    }

    pub fn push_table(&mut self, table: TableReport) {
        self.total_records += table.rows_generated;
        self.retries_total += table.retries;
        self.tables.push(table);
    }

    pub fn warning_count(&self, code: &str) -> u64 {
        self.warnings_by_code.get(code).copied().unwrap_or(0)
    }
}
