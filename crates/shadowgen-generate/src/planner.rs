use std::collections::BTreeMap;

use shadowgen_core::{SchemaGraph, SourceStats};

use crate::model::GenerateOptions;

/// Row count used when the source could not report one for a table.
pub const UNCOUNTED_SOURCE_ROWS: u64 = 1000;

/// Where a table's row count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCountSource {
    Explicit,
    Profile,
    ProfileMissing,
    Default,
}

/// Derive per-table row counts for every table of the schema.
///
/// Precedence: explicit count, then the profiled source count scaled by
/// `row_scale`, then [`UNCOUNTED_SOURCE_ROWS`] scaled when a profile exists
/// but lacks the table, then `default_rows`.
pub fn plan_row_counts(
    schema: &SchemaGraph,
    profile: Option<&dyn SourceStats>,
    explicit: &BTreeMap<String, u64>,
    options: &GenerateOptions,
) -> BTreeMap<String, u64> {
    schema
        .table_names()
        .map(|table| {
            let (rows, _) = row_count_for(table, profile, explicit, options);
            (table.to_string(), rows)
        })
        .collect()
}

pub fn row_count_for(
    table: &str,
    profile: Option<&dyn SourceStats>,
    explicit: &BTreeMap<String, u64>,
    options: &GenerateOptions,
) -> (u64, RowCountSource) {
    if let Some(rows) = explicit.get(table) {
        return (*rows, RowCountSource::Explicit);
    }
    match profile {
        Some(profile) => match profile.row_count(table) {
            Some(rows) => (scale(rows, options.row_scale), RowCountSource::Profile),
            None => (
                scale(UNCOUNTED_SOURCE_ROWS, options.row_scale),
                RowCountSource::ProfileMissing,
            ),
        },
        None => (options.default_rows, RowCountSource::Default),
    }
}

fn scale(rows: u64, factor: f64) -> u64 {
    (rows as f64 * factor).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowgen_core::{ColumnKind, ColumnSpec, SourceProfile, TableSpec};

    fn schema() -> SchemaGraph {
        ["actor", "film", "language"]
            .into_iter()
            .fold(SchemaGraph::new(), |schema, name| {
                schema.with_table(
                    TableSpec::new(name)
                        .column(ColumnSpec::new(format!("{name}_id"), ColumnKind::Integer))
                        .primary_key([format!("{name}_id")]),
                )
            })
    }

    #[test]
    fn explicit_counts_win_then_profile_then_defaults() {
        let mut profile = SourceProfile::new();
        profile.set_row_count("film", 1000);
        let explicit: BTreeMap<String, u64> = [("actor".to_string(), 7)].into_iter().collect();
        let options = GenerateOptions {
            row_scale: 0.5,
            ..GenerateOptions::default()
        };

        let counts = plan_row_counts(&schema(), Some(&profile as &dyn SourceStats), &explicit, &options);
        assert_eq!(counts["actor"], 7);
        assert_eq!(counts["film"], 500);
        assert_eq!(counts["language"], 500);

        let counts = plan_row_counts(&schema(), None, &BTreeMap::new(), &options);
        assert!(counts.values().all(|rows| *rows == 50));
    }

    #[test]
    fn reports_count_source() {
        let profile = SourceProfile::new();
        let stats: &dyn SourceStats = &profile;
        let (rows, source) =
            row_count_for("film", Some(stats), &BTreeMap::new(), &GenerateOptions::default());
        assert_eq!((rows, source), (1000, RowCountSource::ProfileMissing));
    }
}
