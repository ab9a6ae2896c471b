use thiserror::Error;

/// Errors emitted by the synthesis engine.
///
/// Per-table problems never surface here; they are recorded in the
/// [`GenerationReport`](crate::model::GenerationReport) and the table is skipped.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("schema has no tables")]
    EmptySchema,
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("schema error: {0}")]
    Schema(#[from] shadowgen_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
