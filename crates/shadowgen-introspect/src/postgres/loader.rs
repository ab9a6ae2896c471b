use std::collections::HashSet;

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use shadowgen_core::{Result, Row, SchemaGraph, SyntheticDataset, TableSpec, resolve_generation_order};

use super::ddl;
use super::queries::{self, db_err};
use crate::options::LoadOptions;

/// Outcome of replaying a snapshot into a destination database.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub loaded: Vec<LoadedTable>,
    /// Snapshot tables absent from the schema model.
    pub skipped: Vec<String>,
    pub failed: Vec<LoadFailure>,
    pub dropped_types: usize,
}

impl LoadReport {
    pub fn total_rows(&self) -> u64 {
        self.loaded.iter().map(|table| table.rows).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadedTable {
    pub table: String,
    pub rows: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub table: String,
    pub error: String,
}

/// Recreate each snapshot table in generation order and insert its rows in
/// batches. A table that fails to load is rolled back, logged and skipped.
pub async fn load_snapshot(
    pool: &PgPool,
    schema: &SchemaGraph,
    dataset: &SyntheticDataset,
    opts: &LoadOptions,
) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    if opts.drop_enum_types {
        for name in queries::list_enum_types(pool, &opts.schema).await? {
            match sqlx::query(&ddl::drop_type_sql(&opts.schema, &name))
                .execute(pool)
                .await
            {
                Ok(_) => report.dropped_types += 1,
                Err(err) => warn!(type_name = %name, error = %err, "drop type failed"),
            }
        }
    }

    for table in dataset.table_names() {
        if !schema.contains(table) {
            warn!(table, "snapshot table not in schema, skipping");
            report.skipped.push(table.to_string());
        }
    }

    let mut created_types = HashSet::new();
    for name in resolve_generation_order(schema) {
        let Some(rows) = dataset.rows(&name) else {
            continue;
        };
        if rows.is_empty() {
            continue;
        }
        let table = schema.table(&name)?;
        match load_table(pool, table, rows, opts, &created_types).await {
            Ok(types) => {
                created_types.extend(types);
                info!(table = %name, rows = rows.len(), "table loaded");
                report.loaded.push(LoadedTable {
                    table: name,
                    rows: rows.len() as u64,
                });
            }
            Err(err) => {
                warn!(table = %name, error = %err, "table load failed");
                report.failed.push(LoadFailure {
                    table: name,
                    error: err.to_string(),
                });
            }
        }
    }

    info!(
        tables = report.loaded.len(),
        rows = report.total_rows(),
        failed = report.failed.len(),
        "snapshot load finished"
    );
    Ok(report)
}

/// Load one table in its own transaction; returns the enum types it created.
async fn load_table(
    pool: &PgPool,
    table: &TableSpec,
    rows: &[Row],
    opts: &LoadOptions,
    created_types: &HashSet<String>,
) -> Result<Vec<String>> {
    let mut tx = pool.begin().await.map_err(db_err)?;

    execute(&mut tx, &ddl::drop_table_sql(&opts.schema, &table.name)).await?;

    let mut created = Vec::new();
    for (type_name, labels) in ddl::enum_types(table) {
        if created_types.contains(&type_name) || created.contains(&type_name) {
            continue;
        }
        execute(&mut tx, &ddl::create_enum_sql(&opts.schema, &type_name, &labels)).await?;
        created.push(type_name);
    }

    execute(&mut tx, &ddl::create_table_sql(&opts.schema, table)).await?;

    if !table.columns.is_empty() {
        let batch = ddl::rows_per_batch(opts.batch_size, table.columns.len());
        for chunk in rows.chunks(batch) {
            let sql = ddl::insert_sql(&opts.schema, table, chunk.len());
            let mut query = sqlx::query(&sql);
            for row in chunk {
                for column in &table.columns {
                    query = query.bind(row.get(&column.name).and_then(ddl::to_sql_text));
                }
            }
            query.execute(&mut *tx).await.map_err(db_err)?;
        }
    }

    tx.commit().await.map_err(db_err)?;
    Ok(created)
}

async fn execute(tx: &mut Transaction<'_, Postgres>, sql: &str) -> Result<()> {
    sqlx::query(sql).execute(&mut **tx).await.map_err(db_err)?;
    Ok(())
}
