use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

static NULL: Value = Value::Null;

/// One synthetic row: column name to value, in column declaration order.
pub type Row = IndexMap<String, Value>;

/// Table name to ordered rows, in generation order.
///
/// Serializes as the snapshot format: a JSON object mapping each table to an
/// array of row objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SyntheticDataset {
    tables: IndexMap<String, Vec<Row>>,
}

impl SyntheticDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&mut self, table: impl Into<String>, rows: Vec<Row>) {
        self.tables.insert(table.into(), rows);
    }

    pub fn rows(&self, table: &str) -> Option<&[Row]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.tables
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Values of one column across a table, `Null` where the row lacks it.
    pub fn column_values<'a>(
        &'a self,
        table: &str,
        column: &'a str,
    ) -> impl Iterator<Item = &'a Value> + 'a {
        self.tables
            .get(table)
            .into_iter()
            .flatten()
            .map(move |row| row.get(column).unwrap_or(&NULL))
    }
}

/// Read a dataset snapshot from disk.
pub fn read_snapshot(path: &Path) -> Result<SyntheticDataset> {
    let contents = std::fs::read(path)?;
    Ok(serde_json::from_slice(&contents)?)
}

/// Write a dataset snapshot atomically (temp file, fsync, rename).
pub fn write_snapshot(path: &Path, dataset: &SyntheticDataset) -> Result<()> {
    let data = serde_json::to_vec_pretty(dataset)?;
    write_bytes_atomic(path, &data)
}

/// Write arbitrary bytes atomically next to `path`.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = parent {
        OpenOptions::new().read(true).open(parent)?.sync_all()?;
    }

    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Io(std::io::Error::other("invalid path for atomic write")))?;
    Ok(path.with_file_name(format!("{}.tmp", file_name.to_string_lossy())))
}
