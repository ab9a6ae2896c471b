use thiserror::Error;

/// Core error type shared across shadowgen crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A table was referenced that the schema model does not know about.
    #[error("schema not found for table '{0}'")]
    SchemaNotFound(String),
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Database error or adapter failure.
    #[error("database error: {0}")]
    Db(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by shadowgen crates.
pub type Result<T> = std::result::Result<T, Error>;
