use std::collections::BTreeMap;

use shadowgen_core::{ColumnSpec, TableSpec};

use super::queries::RawColumn;

/// Map a catalog column; enum columns take their ordered labels.
pub fn map_column(raw: RawColumn, enum_labels: Option<&[String]>) -> ColumnSpec {
    let column = ColumnSpec::from_sql(raw.name, &raw.data_type, raw.is_nullable);
    match (raw.is_enum, enum_labels) {
        (true, Some(labels)) => column.with_enum_domain(labels.iter().cloned()),
        _ => column,
    }
}

pub fn map_table(
    name: &str,
    columns: Vec<ColumnSpec>,
    primary_key: Vec<String>,
    foreign_keys: Vec<(String, String)>,
) -> TableSpec {
    let mut table = columns
        .into_iter()
        .fold(TableSpec::new(name), TableSpec::column)
        .primary_key(primary_key);
    for (column, referenced) in foreign_keys {
        table = table.foreign_key(column, referenced);
    }
    table
}

/// Enum type names used by a table's columns, for label lookups.
pub fn enum_type_names(raw: &[RawColumn]) -> Vec<String> {
    let mut names: Vec<String> = raw
        .iter()
        .filter(|column| column.is_enum)
        .map(|column| column.udt_name.clone())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Keep only the requested tables when a filter is set.
pub fn filter_tables(raw: Vec<String>, only: Option<&[String]>) -> Vec<String> {
    match only {
        Some(list) => raw
            .into_iter()
            .filter(|table| list.iter().any(|item| item == table))
            .collect(),
        None => raw,
    }
}

pub type EnumCache = BTreeMap<String, Vec<String>>;

#[cfg(test)]
mod tests {
    use super::*;
    use shadowgen_core::ColumnKind;

    fn raw(name: &str, data_type: &str, udt_name: &str, is_enum: bool) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            data_type: data_type.to_string(),
            udt_name: udt_name.to_string(),
            is_enum,
            is_nullable: true,
        }
    }

    #[test]
    fn enum_columns_take_labels_in_order() {
        let labels = vec!["G".to_string(), "PG".to_string(), "NC-17".to_string()];
        let column = map_column(raw("rating", "mpaa_rating", "mpaa_rating", true), Some(labels.as_slice()));
        assert_eq!(column.kind, ColumnKind::Enum);
        assert_eq!(column.enum_domain.as_deref(), Some(labels.as_slice()));
        assert_eq!(column.sql_type.as_deref(), Some("mpaa_rating"));
    }

    #[test]
    fn declared_types_map_to_kinds() {
        let column = map_column(raw("title", "character varying(255)", "varchar", false), None);
        assert_eq!(column.kind, ColumnKind::Text);
        assert_eq!(column.max_length, Some(255));

        let column = map_column(raw("fulltext", "tsvector", "tsvector", false), None);
        assert_eq!(column.kind, ColumnKind::Other("tsvector".to_string()));
    }

    #[test]
    fn table_carries_keys() {
        let table = map_table(
            "rental",
            vec![
                ColumnSpec::from_sql("rental_id", "integer", false),
                ColumnSpec::from_sql("customer_id", "smallint", false),
            ],
            vec!["rental_id".to_string()],
            vec![("customer_id".to_string(), "customer".to_string())],
        );
        assert_eq!(table.primary_key, vec!["rental_id"]);
        assert_eq!(table.referenced_table("customer_id"), Some("customer"));
        assert_eq!(table.columns.len(), 2);
    }

    #[test]
    fn enum_names_are_deduplicated() {
        let columns = vec![
            raw("a", "mood", "mood", true),
            raw("b", "mood", "mood", true),
            raw("c", "text", "text", false),
        ];
        assert_eq!(enum_type_names(&columns), vec!["mood"]);
    }

    #[test]
    fn filters_requested_tables() {
        let all = vec!["actor".to_string(), "film".to_string()];
        let only = vec!["film".to_string()];
        assert_eq!(filter_tables(all.clone(), Some(only.as_slice())), vec!["film"]);
        assert_eq!(filter_tables(all, None).len(), 2);
    }
}
