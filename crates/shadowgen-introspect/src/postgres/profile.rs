use sqlx::PgPool;
use tracing::{info, warn};

use shadowgen_core::{Result, SchemaGraph, SourceProfile, is_pii_column};

use super::queries;
use crate::options::ProfileOptions;

/// Collect live row counts, null counts for each table's leading columns and
/// bounded samples of PII columns.
///
/// A failing query is logged and skipped; the profile then lacks that entry.
pub async fn collect_source_profile(
    pool: &PgPool,
    schema: &SchemaGraph,
    opts: &ProfileOptions,
) -> Result<SourceProfile> {
    let mut profile = SourceProfile::new();
    let mut failed = 0usize;

    for (name, table) in &schema.tables {
        match queries::count_rows(pool, &opts.schema, name).await {
            Ok(rows) => profile.set_row_count(name.as_str(), rows),
            Err(err) => {
                failed += 1;
                warn!(table = %name, error = %err, "row count failed");
            }
        }

        for column in table.columns.iter().take(opts.null_columns_per_table) {
            match queries::count_nulls(pool, &opts.schema, name, &column.name).await {
                Ok(nulls) => profile.set_null_count(name.as_str(), column.name.as_str(), nulls),
                Err(err) => {
                    failed += 1;
                    warn!(table = %name, column = %column.name, error = %err, "null count failed");
                }
            }
        }

        for column in table.columns.iter().filter(|column| is_pii_column(&column.name)) {
            match queries::sample_values(pool, &opts.schema, name, &column.name, opts.sample_limit)
                .await
            {
                Ok(values) => profile.set_samples(name.as_str(), column.name.as_str(), values),
                Err(err) => {
                    failed += 1;
                    warn!(table = %name, column = %column.name, error = %err, "value sample failed");
                }
            }
        }
    }

    info!(
        tables = profile.row_counts.len(),
        failed_queries = failed,
        "source profile collected"
    );
    Ok(profile)
}
