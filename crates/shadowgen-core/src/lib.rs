//! Core contracts and helpers for shadowgen.
//!
//! This crate defines the schema model, the generation-order resolver, the
//! value and snapshot types, and the source-statistics contract shared by the
//! synthesis and validation engines.

pub mod dataset;
pub mod error;
pub mod graph;
pub mod profile;
pub mod redaction;
pub mod schema;
pub mod types;
pub mod validation;
pub mod value;

pub use dataset::{Row, SyntheticDataset, read_snapshot, write_bytes_atomic, write_snapshot};
pub use error::{Error, Result};
pub use graph::{
    FkGraphReport, FkGraphSummary, UnresolvedEdge, build_fk_graph_report,
    resolve_generation_order, unresolved_edges,
};
pub use profile::{PII_KEYWORDS, SourceProfile, SourceStats, is_pii_column};
pub use redaction::{RedactedConnection, redact_connection_string};
pub use schema::{ColumnSpec, SchemaGraph, TableSpec};
pub use types::{ColumnKind, parse_max_length};
pub use validation::{dangling_references, validate_schema};
pub use value::Value;

/// Current contract version for `schema.json` artifacts.
pub const SCHEMA_VERSION: &str = "0.1";
