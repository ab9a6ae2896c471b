use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::SchemaGraph;

/// Validate internal consistency of a schema graph.
///
/// This checks:
/// - table map keys match table names
/// - duplicate columns
/// - primary key columns exist
/// - foreign key columns appear in the column sequence
///
/// References to tables outside the graph are allowed here; see
/// [`dangling_references`].
pub fn validate_schema(schema: &SchemaGraph) -> Result<()> {
    for (key, table) in &schema.tables {
        if key != &table.name {
            return Err(Error::InvalidSchema(format!(
                "table registered as '{key}' is named '{}'",
                table.name
            )));
        }

        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}",
                    table.name, column.name
                )));
            }
        }

        for column in &table.primary_key {
            if !columns.contains(column.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "primary key column not found: {}.{}",
                    table.name, column
                )));
            }
        }

        for column in table.foreign_keys.keys() {
            if !columns.contains(column.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "foreign key column not found: {}.{}",
                    table.name, column
                )));
            }
        }
    }

    Ok(())
}

/// Foreign keys whose referenced table is missing from the graph, as
/// `table.column -> referenced` strings.
pub fn dangling_references(schema: &SchemaGraph) -> Vec<String> {
    schema
        .edges()
        .filter(|(_, _, referenced)| !schema.contains(referenced))
        .map(|(table, column, referenced)| format!("{table}.{column} -> {referenced}"))
        .collect()
}
