use shadowgen_core::{ColumnKind, ColumnSpec, TableSpec, Value};

/// Postgres caps bind parameters per statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Declared type used when recreating a column.
pub fn column_type(column: &ColumnSpec) -> String {
    match &column.sql_type {
        Some(sql_type) => sql_type.clone(),
        None => kind_type(&column.kind, column.max_length),
    }
}

fn kind_type(kind: &ColumnKind, max_length: Option<u32>) -> String {
    match kind {
        ColumnKind::Integer => "integer".to_string(),
        ColumnKind::Decimal => "numeric".to_string(),
        ColumnKind::Boolean => "boolean".to_string(),
        ColumnKind::Text | ColumnKind::Enum => match max_length {
            Some(length) => format!("character varying({length})"),
            None => "text".to_string(),
        },
        ColumnKind::Date => "date".to_string(),
        ColumnKind::Timestamp => "timestamp without time zone".to_string(),
        ColumnKind::Array(inner) => format!("{}[]", kind_type(inner, None)),
        ColumnKind::Other(raw) => raw.clone(),
    }
}

/// Enum types (name, labels) a table needs before it can be created.
pub fn enum_types(table: &TableSpec) -> Vec<(String, Vec<String>)> {
    table
        .columns
        .iter()
        .filter(|column| column.kind == ColumnKind::Enum)
        .filter_map(|column| {
            let name = column.sql_type.clone()?;
            let labels = column.enum_domain.clone()?;
            Some((name, labels))
        })
        .collect()
}

pub fn create_enum_sql(schema: &str, name: &str, labels: &[String]) -> String {
    let labels: Vec<String> = labels.iter().map(|label| quote_literal(label)).collect();
    format!(
        "create type {} as enum ({})",
        qualified(schema, name),
        labels.join(", ")
    )
}

pub fn drop_type_sql(schema: &str, name: &str) -> String {
    format!("drop type if exists {} cascade", qualified(schema, name))
}

pub fn drop_table_sql(schema: &str, table: &str) -> String {
    format!("drop table if exists {} cascade", qualified(schema, table))
}

/// `CREATE TABLE` with columns, nullability and the primary key. Foreign keys
/// are not recreated.
pub fn create_table_sql(schema: &str, table: &TableSpec) -> String {
    let mut parts: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let not_null = if column.nullable { "" } else { " not null" };
            format!("{} {}{}", quote_ident(&column.name), column_type(column), not_null)
        })
        .collect();
    if table.has_primary_key() {
        let keys: Vec<String> = table.primary_key.iter().map(|key| quote_ident(key)).collect();
        parts.push(format!("primary key ({})", keys.join(", ")));
    }
    format!(
        "create table {} ({})",
        qualified(schema, &table.name),
        parts.join(", ")
    )
}

/// Multi-row insert with text parameters cast to each column's type.
pub fn insert_sql(schema: &str, table: &TableSpec, rows: usize) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|column| quote_ident(&column.name))
        .collect();
    let types: Vec<String> = table.columns.iter().map(column_type).collect();

    let mut param = 0;
    let tuples: Vec<String> = (0..rows)
        .map(|_| {
            let casts: Vec<String> = types
                .iter()
                .map(|sql_type| {
                    param += 1;
                    format!("cast(${param} as {sql_type})")
                })
                .collect();
            format!("({})", casts.join(", "))
        })
        .collect();

    format!(
        "insert into {} ({}) values {}",
        qualified(schema, &table.name),
        columns.join(", "),
        tuples.join(", ")
    )
}

/// Rows per insert statement, bounded by the bind parameter cap.
pub fn rows_per_batch(batch_size: usize, columns: usize) -> usize {
    let by_params = MAX_BIND_PARAMS / columns.max(1);
    batch_size.min(by_params).max(1)
}

/// Text form of a cell as Postgres input syntax; `None` binds SQL NULL.
pub fn to_sql_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(array_literal(items)),
        other => Some(other.canonical_key()),
    }
}

fn array_literal(items: &[Value]) -> String {
    let elements: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::Null => "NULL".to_string(),
            Value::Array(inner) => array_literal(inner),
            other => {
                let text = other.canonical_key();
                format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
            }
        })
        .collect();
    format!("{{{}}}", elements.join(","))
}
