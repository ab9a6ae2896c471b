use sqlx::PgPool;
use tracing::{debug, info};

use shadowgen_core::{Result, SchemaGraph, SourceProfile, SyntheticDataset};

use crate::adapter::Adapter;
use crate::options::{IntrospectOptions, LoadOptions, ProfileOptions};

pub mod ddl;
mod loader;
mod mapper;
mod profile;
mod queries;

pub use loader::{LoadReport, load_snapshot};
pub use profile::collect_source_profile;

/// Adapter for PostgreSQL databases.
#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    pool: PgPool,
}

impl PostgresAdapter {
    /// Create a new adapter using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl Adapter for PostgresAdapter {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn introspect(&self, opts: &IntrospectOptions) -> Result<SchemaGraph> {
        introspect_schema(&self.pool, opts).await
    }

    async fn profile(&self, schema: &SchemaGraph, opts: &ProfileOptions) -> Result<SourceProfile> {
        collect_source_profile(&self.pool, schema, opts).await
    }

    async fn load(
        &self,
        schema: &SchemaGraph,
        dataset: &SyntheticDataset,
        opts: &LoadOptions,
    ) -> Result<LoadReport> {
        load_snapshot(&self.pool, schema, dataset, opts).await
    }
}

/// Read tables, columns, keys and enum domains of one namespace.
pub async fn introspect_schema(pool: &PgPool, opts: &IntrospectOptions) -> Result<SchemaGraph> {
    let database = queries::fetch_database_name(pool).await?;
    let tables = mapper::filter_tables(
        queries::list_tables(pool, &opts.schema).await?,
        opts.tables.as_deref(),
    );

    let mut enums = mapper::EnumCache::new();
    let mut graph = SchemaGraph::new();
    graph.database = Some(database);

    for table in &tables {
        let raw_columns = queries::list_columns(pool, &opts.schema, table).await?;
        for type_name in mapper::enum_type_names(&raw_columns) {
            if !enums.contains_key(&type_name) {
                let labels = queries::list_enum_labels(pool, &type_name).await?;
                enums.insert(type_name, labels);
            }
        }

        let columns = raw_columns
            .into_iter()
            .map(|raw| {
                let labels = enums.get(&raw.udt_name).map(Vec::as_slice);
                mapper::map_column(raw, labels)
            })
            .collect();
        let primary_key = queries::get_primary_key(pool, &opts.schema, table).await?;
        let foreign_keys = queries::list_foreign_keys(pool, &opts.schema, table).await?;
        debug!(table = %table, foreign_keys = foreign_keys.len(), "table introspected");

        graph.insert(mapper::map_table(table, columns, primary_key, foreign_keys));
    }

    info!(
        schema = %opts.schema,
        tables = graph.len(),
        enum_types = enums.len(),
        "introspection finished"
    );
    Ok(graph)
}
