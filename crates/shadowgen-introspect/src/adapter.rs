use async_trait::async_trait;

use shadowgen_core::{Result, SchemaGraph, SourceProfile, SyntheticDataset};

use crate::options::{IntrospectOptions, LoadOptions, ProfileOptions};
use crate::postgres::LoadReport;

/// Trait implemented by database adapters that can introspect schemas,
/// profile live data and replay snapshots.
#[async_trait]
pub trait Adapter {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Introspect the database and return the schema model.
    async fn introspect(&self, opts: &IntrospectOptions) -> Result<SchemaGraph>;

    /// Collect aggregate statistics (and bounded PII samples) for `schema`.
    async fn profile(&self, schema: &SchemaGraph, opts: &ProfileOptions) -> Result<SourceProfile>;

    /// Recreate tables and insert the dataset's rows.
    async fn load(
        &self,
        schema: &SchemaGraph,
        dataset: &SyntheticDataset,
        opts: &LoadOptions,
    ) -> Result<LoadReport>;
}
