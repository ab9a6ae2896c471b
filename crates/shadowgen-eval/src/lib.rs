//! Validation of synthetic datasets for shadowgen.
//!
//! Six metrics compare a dataset with its schema and the source's aggregate
//! statistics: cardinality, value skew, null rates, foreign-key ratios,
//! temporal ranges and referential integrity. An optional privacy check looks
//! for real PII values that leaked into the synthetic output.

pub mod engine;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod report;

pub use engine::ValidationEngine;
pub use errors::EvalError;
pub use metrics::{
    CardinalityReport, CardinalityRow, DistributionReport, FkRatio, FkRatioReport,
    IntegrityReport, MatchStatus, Metric, MetricFailure, NullComparison, NullRateReport,
    OrphanReference, PrivacyFinding, PrivacyReport, REPORT_VERSION, SkewFinding, TemporalRange,
    TemporalReport, ValidationReport,
};
pub use model::{EvaluateOptions, ValidationResult};
pub use report::render_report;
