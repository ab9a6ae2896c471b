use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Column-name keywords that mark a column as personally identifying.
pub const PII_KEYWORDS: &[&str] = &["email", "first_name", "last_name", "phone"];

/// True when the column name suggests PII (identifier columns excluded).
pub fn is_pii_column(column: &str) -> bool {
    let lowered = column.to_lowercase();
    !lowered.ends_with("_id") && PII_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Aggregate facts about the live source database, consumed by validation.
///
/// Implementations are synchronous from the caller's perspective; adapters that
/// talk to a database collect everything up front.
pub trait SourceStats {
    /// Live row count for a table.
    fn row_count(&self, table: &str) -> Option<u64>;
    /// Number of null values in a column.
    fn null_count(&self, table: &str, column: &str) -> Option<u64>;
    /// Bounded sample of real values for a column, used only for leak checks.
    fn sample_values(&self, table: &str, column: &str) -> Option<&[String]>;
}

/// In-memory source profile.
///
/// Value samples are never serialized: a profile written to disk carries
/// aggregates only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SourceProfile {
    #[serde(default)]
    pub row_counts: BTreeMap<String, u64>,
    /// Table to column to null count.
    #[serde(default)]
    pub null_counts: BTreeMap<String, BTreeMap<String, u64>>,
    #[serde(skip)]
    pub samples: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl SourceProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_row_count(&mut self, table: impl Into<String>, rows: u64) {
        self.row_counts.insert(table.into(), rows);
    }

    pub fn set_null_count(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        nulls: u64,
    ) {
        self.null_counts
            .entry(table.into())
            .or_default()
            .insert(column.into(), nulls);
    }

    pub fn set_samples(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        values: Vec<String>,
    ) {
        self.samples
            .entry(table.into())
            .or_default()
            .insert(column.into(), values);
    }
}

impl SourceStats for SourceProfile {
    fn row_count(&self, table: &str) -> Option<u64> {
        self.row_counts.get(table).copied()
    }

    fn null_count(&self, table: &str, column: &str) -> Option<u64> {
        self.null_counts
            .get(table)
            .and_then(|columns| columns.get(column))
            .copied()
    }

    fn sample_values(&self, table: &str, column: &str) -> Option<&[String]> {
        self.samples
            .get(table)
            .and_then(|columns| columns.get(column))
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pii_detection_skips_identifiers() {
        assert!(is_pii_column("email"));
        assert!(is_pii_column("Customer_First_Name"));
        assert!(is_pii_column("phone"));
        assert!(!is_pii_column("phone_id"));
        assert!(!is_pii_column("title"));
    }

    #[test]
    fn samples_are_not_serialized() {
        let mut profile = SourceProfile::new();
        profile.set_row_count("customer", 599);
        profile.set_null_count("customer", "email", 0);
        profile.set_samples("customer", "email", vec!["real@sakila.org".to_string()]);

        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("sakila"));
        assert_eq!(profile.row_count("customer"), Some(599));
        assert_eq!(profile.null_count("customer", "email"), Some(0));
        assert_eq!(
            profile.sample_values("customer", "email"),
            Some(&["real@sakila.org".to_string()][..])
        );
    }
}
