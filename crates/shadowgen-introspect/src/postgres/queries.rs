use sqlx::PgPool;

use shadowgen_core::{Error, Result};

use super::ddl::{qualified, quote_ident};

pub(super) fn db_err(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

pub async fn fetch_database_name(pool: &PgPool) -> Result<String> {
    sqlx::query_scalar::<_, String>("select current_database()::text")
        .fetch_one(pool)
        .await
        .map_err(db_err)
}

pub async fn list_tables(pool: &PgPool, schema: &str) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select c.relname::text
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relkind in ('r','p')
        order by c.relname
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(db_err)
}

pub struct RawColumn {
    pub name: String,
    /// `format_type` output, e.g. `character varying(45)`.
    pub data_type: String,
    pub udt_name: String,
    pub is_enum: bool,
    pub is_nullable: bool,
}

pub async fn list_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query_as::<_, (String, String, String, bool, bool)>(
        r#"
        select
          a.attname::text,
          pg_catalog.format_type(a.atttypid, a.atttypmod),
          t.typname::text,
          (t.typtype = 'e'),
          (not a.attnotnull)
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        join pg_type t on t.oid = a.atttypid
        where n.nspname = $1
          and c.relname = $2
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    Ok(rows
        .into_iter()
        .map(
            |(name, data_type, udt_name, is_enum, is_nullable)| RawColumn {
                name,
                data_type,
                udt_name,
                is_enum,
                is_nullable,
            },
        )
        .collect())
}

/// Enum labels in declaration order.
pub async fn list_enum_labels(pool: &PgPool, type_name: &str) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select e.enumlabel::text
        from pg_type t
        join pg_enum e on e.enumtypid = t.oid
        where t.typname = $1
        order by e.enumsortorder
        "#,
    )
    .bind(type_name)
    .fetch_all(pool)
    .await
    .map_err(db_err)
}

pub async fn get_primary_key(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select kcu.column_name::text
        from information_schema.table_constraints tc
        join information_schema.key_column_usage kcu
          on kcu.constraint_name = tc.constraint_name
         and kcu.table_schema = tc.table_schema
         and kcu.table_name = tc.table_name
        where tc.constraint_type = 'PRIMARY KEY'
          and tc.table_schema = $1
          and tc.table_name = $2
        order by kcu.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)
}

/// Foreign key column to referenced table pairs.
pub async fn list_foreign_keys(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<(String, String)>> {
    sqlx::query_as::<_, (String, String)>(
        r#"
        select kcu.column_name::text, ccu.table_name::text
        from information_schema.table_constraints tc
        join information_schema.key_column_usage kcu
          on kcu.constraint_name = tc.constraint_name
         and kcu.table_schema = tc.table_schema
        join information_schema.constraint_column_usage ccu
          on ccu.constraint_name = tc.constraint_name
         and ccu.constraint_schema = tc.constraint_schema
        where tc.constraint_type = 'FOREIGN KEY'
          and tc.table_schema = $1
          and tc.table_name = $2
        order by kcu.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)
}

pub async fn count_rows(pool: &PgPool, schema: &str, table: &str) -> Result<u64> {
    let sql = format!("select count(*) from {}", qualified(schema, table));
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(pool)
        .await
        .map_err(db_err)?;
    Ok(count.max(0) as u64)
}

pub async fn count_nulls(pool: &PgPool, schema: &str, table: &str, column: &str) -> Result<u64> {
    let sql = format!(
        "select count(*) from {} where {} is null",
        qualified(schema, table),
        quote_ident(column)
    );
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(pool)
        .await
        .map_err(db_err)?;
    Ok(count.max(0) as u64)
}

pub async fn sample_values(
    pool: &PgPool,
    schema: &str,
    table: &str,
    column: &str,
    limit: usize,
) -> Result<Vec<String>> {
    let column = quote_ident(column);
    let sql = format!(
        "select {column}::text from {} where {column} is not null limit $1",
        qualified(schema, table)
    );
    sqlx::query_scalar::<_, String>(&sql)
        .bind(limit as i64)
        .fetch_all(pool)
        .await
        .map_err(db_err)
}

pub async fn list_enum_types(pool: &PgPool, schema: &str) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select t.typname::text
        from pg_type t
        join pg_namespace n on n.oid = t.typnamespace
        where t.typtype = 'e'
          and n.nspname = $1
        order by t.typname
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(db_err)
}
