use serde::{Deserialize, Serialize};

/// Options for dataset validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluateOptions {
    /// Top-value share (percent) above which a column is flagged as skewed.
    pub skew_threshold_pct: f64,
    /// Null-rate gap (percentage points) at or above which a pair differs.
    pub null_gap_threshold_pct: f64,
    /// Number of leading tables sampled by the skew check.
    pub skew_table_limit: usize,
    /// Number of leading tables sampled by the null-rate check.
    pub null_table_limit: usize,
    /// Leading columns per table compared by the null-rate check.
    pub null_columns_per_table: usize,
    /// Upper bound on compared (table, column) null-rate pairs.
    pub null_pair_limit: usize,
    /// Number of leading tables covered by FK ratio analysis.
    pub fk_table_limit: usize,
    /// Real values sampled per PII column for the privacy check.
    pub privacy_sample_limit: usize,
    /// Orphan references kept as examples in the integrity report.
    pub max_orphan_examples: usize,
    /// Column-name keywords that mark a column as temporal.
    pub temporal_keywords: Vec<String>,
    /// Run the privacy check when source samples are available.
    pub check_privacy: bool,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            skew_threshold_pct: 30.0,
            null_gap_threshold_pct: 5.0,
            skew_table_limit: 3,
            null_table_limit: 5,
            null_columns_per_table: 3,
            null_pair_limit: 10,
            fk_table_limit: 5,
            privacy_sample_limit: 1000,
            max_orphan_examples: 20,
            temporal_keywords: ["date", "time", "created", "updated"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            check_privacy: true,
        }
    }
}

/// Output of [`ValidationEngine::run`](crate::ValidationEngine::run).
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub report: crate::metrics::ValidationReport,
    /// Human-readable report text.
    pub rendered: String,
}
