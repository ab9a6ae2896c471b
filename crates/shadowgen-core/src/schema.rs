use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ColumnKind, parse_max_length};

/// Normalized schema snapshot: table name to table definition.
///
/// Edges are the foreign-key references between tables. The graph may contain
/// cycles (self references, mutually referencing tables).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SchemaGraph {
    /// Database name when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub tables: BTreeMap<String, TableSpec>,
}

/// A table with its ordered columns and key structure.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    /// Primary key columns in declaration order. Composite keys are allowed.
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Foreign key column name to referenced table name (its primary key).
    #[serde(default)]
    pub foreign_keys: BTreeMap<String, String>,
}

/// Column metadata as loaded from the source catalog.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    /// Declared SQL type, kept for DDL replay (e.g. `character varying(45)`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Ordered labels for enum columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_domain: Option<Vec<String>>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sql_type: None,
            nullable: false,
            max_length: None,
            enum_domain: None,
        }
    }

    /// Build a column from a declared SQL type, deriving kind and max length.
    pub fn from_sql(name: impl Into<String>, sql_type: &str, nullable: bool) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::from_sql_type(sql_type),
            sql_type: Some(sql_type.to_string()),
            nullable,
            max_length: parse_max_length(sql_type),
            enum_domain: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_enum_domain<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kind = ColumnKind::Enum;
        self.enum_domain = Some(labels.into_iter().map(Into::into).collect());
        self
    }
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: BTreeMap::new(),
        }
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn foreign_key(mut self, column: impl Into<String>, table: impl Into<String>) -> Self {
        self.foreign_keys.insert(column.into(), table.into());
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.iter().any(|pk| pk == column)
    }

    /// Referenced table for a foreign key column.
    pub fn referenced_table(&self, column: &str) -> Option<&str> {
        self.foreign_keys.get(column).map(String::as_str)
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// True when the table has a key and every key column is also a foreign key.
    /// Such keys are drawn from the referenced tables instead of reserved.
    pub fn is_foreign_key_only(&self) -> bool {
        self.has_primary_key()
            && self
                .primary_key
                .iter()
                .all(|column| self.foreign_keys.contains_key(column))
    }

    pub fn enum_domain(&self, column: &str) -> Option<&[String]> {
        self.find_column(column)
            .and_then(|column| column.enum_domain.as_deref())
    }
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableSpec) -> Self {
        self.insert(table);
        self
    }

    pub fn insert(&mut self, table: TableSpec) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Look up a table, failing with `SchemaNotFound` when it is unknown.
    pub fn table(&self, name: &str) -> Result<&TableSpec> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::SchemaNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Ordered enum labels for a column, `None` if the column has no domain.
    pub fn enum_domain(&self, table: &str, column: &str) -> Result<Option<&[String]>> {
        Ok(self.table(table)?.enum_domain(column))
    }

    /// All foreign-key edges as `(table, column, referenced_table)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.tables.values().flat_map(|table| {
            table.foreign_keys.iter().map(move |(column, referenced)| {
                (table.name.as_str(), column.as_str(), referenced.as_str())
            })
        })
    }
}
