//! Dependency-aware synthesis engine for shadowgen.
//!
//! This crate consumes a `SchemaGraph` and per-table row counts to produce a
//! deterministic, referentially consistent `SyntheticDataset` without reading
//! any source values.

pub mod engine;
pub mod errors;
pub mod generators;
pub mod model;
pub mod planner;
pub mod registry;

pub use engine::{SynthesisEngine, SynthesisResult};
pub use errors::GenerationError;
pub use model::{GenerateOptions, GenerationIssue, GenerationReport, TableReport};
pub use planner::{RowCountSource, plan_row_counts, row_count_for};
pub use registry::{IdentityRegistry, Pick, PickSource};
