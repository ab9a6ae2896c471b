use thiserror::Error;

/// Errors emitted by the validation engine.
///
/// Inside a validation run these are caught per metric and recorded as
/// [`MetricFailure`](crate::metrics::MetricFailure) entries.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("source statistics unavailable: {0}")]
    SourceUnavailable(String),
    #[error("schema error: {0}")]
    Schema(#[from] shadowgen_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
