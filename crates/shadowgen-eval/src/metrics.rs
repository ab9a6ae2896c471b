use std::fmt;

use serde::{Deserialize, Serialize};

/// Report contract version for dataset validation.
pub const REPORT_VERSION: &str = "0.1";

/// Machine-readable outcome of a validation run.
///
/// Each metric section is `None` when that metric failed; the failure itself is
/// listed in `failures` and the remaining sections are still populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub report_version: String,
    pub run_id: String,
    pub tables_analyzed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<CardinalityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<DistributionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_rates: Option<NullRateReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fk_ratios: Option<FkRatioReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<IntegrityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy: Option<PrivacyReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<MetricFailure>,
    pub duration_ms: u64,
}

impl ValidationReport {
    /// Overall verdict: integrity must have run and passed; a privacy check,
    /// when present, must pass too.
    pub fn passed(&self) -> bool {
        let integrity = self
            .integrity
            .as_ref()
            .is_some_and(IntegrityReport::passed);
        let privacy = self.privacy.as_ref().is_none_or(PrivacyReport::passed);
        integrity && privacy
    }

    pub fn failure(&self, metric: Metric) -> Option<&MetricFailure> {
        self.failures.iter().find(|failure| failure.metric == metric)
    }
}

/// Identifies one metric of the validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cardinality,
    Distribution,
    NullRates,
    FkRatios,
    Temporal,
    Integrity,
    Privacy,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cardinality => "cardinality",
            Metric::Distribution => "distribution",
            Metric::NullRates => "null_rates",
            Metric::FkRatios => "fk_ratios",
            Metric::Temporal => "temporal",
            Metric::Integrity => "integrity",
            Metric::Privacy => "privacy",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric that errored or panicked; the run continued without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricFailure {
    pub metric: Metric,
    pub message: String,
}

/// Comparison verdict for a source/synthetic pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Match,
    Differ,
    /// The source side was not available.
    Unknown,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchStatus::Match => "MATCH",
            MatchStatus::Differ => "DIFFER",
            MatchStatus::Unknown => "N/A",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardinalityReport {
    pub tables: Vec<CardinalityRow>,
}

impl CardinalityReport {
    pub fn all_match(&self) -> bool {
        self.tables
            .iter()
            .all(|row| row.status == MatchStatus::Match)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardinalityRow {
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_rows: Option<u64>,
    pub synthetic_rows: u64,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionReport {
    pub threshold_pct: f64,
    pub columns: Vec<SkewFinding>,
}

/// Value concentration of one text column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkewFinding {
    pub table: String,
    pub column: String,
    pub unique_values: u64,
    /// Share of all rows (nulls included) held by the most frequent value.
    pub top_share_pct: f64,
    pub high_skew: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullRateReport {
    pub source_available: bool,
    pub comparisons: Vec<NullComparison>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullComparison {
    pub table: String,
    pub column: String,
    pub source_null_pct: f64,
    pub synthetic_null_pct: f64,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkRatioReport {
    pub ratios: Vec<FkRatio>,
}

/// Average number of child rows per distinct referenced parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkRatio {
    pub table: String,
    pub column: String,
    pub referenced_table: String,
    pub rows: u64,
    pub distinct_parents: u64,
    pub avg_children_per_parent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalReport {
    pub ranges: Vec<TemporalRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalRange {
    pub table: String,
    pub column: String,
    pub min: String,
    pub max: String,
    pub parsed_values: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub total_checks: u64,
    pub orphans: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<OrphanReference>,
}

impl IntegrityReport {
    pub fn passed(&self) -> bool {
        self.orphans == 0
    }

    /// The verdict line printed in the text report.
    pub fn verdict(&self) -> String {
        if self.passed() {
            "Referential Integrity: PASS - All foreign keys valid".to_string()
        } else {
            format!(
                "Referential Integrity: FAIL - {} orphaned references",
                self.orphans
            )
        }
    }
}

/// A foreign-key value with no matching parent key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanReference {
    pub table: String,
    pub column: String,
    pub referenced_table: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacyReport {
    pub columns_checked: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<PrivacyFinding>,
}

impl PrivacyReport {
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Synthetic values of a PII column that also occur in the real sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacyFinding {
    pub table: String,
    pub column: String,
    pub matches: u64,
}

impl fmt::Display for PrivacyFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {} matches", self.table, self.column, self.matches)
    }
}
