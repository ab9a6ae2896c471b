//! Database adapters for shadowgen: schema introspection, source profiling
//! and snapshot loading.

pub mod adapter;
pub mod options;
pub mod postgres;

pub use adapter::Adapter;
pub use options::{IntrospectOptions, LoadOptions, ProfileOptions};
pub use postgres::{
    LoadReport, PostgresAdapter, collect_source_profile, introspect_schema, load_snapshot,
};

pub use shadowgen_core::SchemaGraph;
