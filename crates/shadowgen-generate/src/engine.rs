use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use shadowgen_core::{
    ColumnSpec, Row, SchemaGraph, SyntheticDataset, TableSpec, Value, resolve_generation_order,
    unresolved_edges,
};

use crate::errors::GenerationError;
use crate::generators::{ColumnContext, SynthRng, synthesize_value};
use crate::model::{GenerateOptions, GenerationIssue, GenerationReport, TableReport};
use crate::registry::{IdentityRegistry, PickSource};

/// Result of a synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub dataset: SyntheticDataset,
    pub report: GenerationReport,
}

/// Drives dependency order, per-row value synthesis and identity registry
/// updates for a whole schema.
#[derive(Debug, Clone, Default)]
pub struct SynthesisEngine {
    options: GenerateOptions,
}

impl SynthesisEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Synthesize every table of `schema` in resolver order.
    ///
    /// Tables missing from `row_counts` get `default_rows`. Entries of
    /// `row_counts` naming unknown tables, and tables without a primary key,
    /// are skipped with a recorded warning. Only an empty schema or invalid
    /// options fail the run.
    pub fn synthesize(
        &self,
        schema: &SchemaGraph,
        row_counts: &BTreeMap<String, u64>,
    ) -> Result<SynthesisResult, GenerationError> {
        self.options.validate()?;
        if schema.is_empty() {
            return Err(GenerationError::EmptySchema);
        }

        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let order = resolve_generation_order(schema);
        let mut report = GenerationReport::new(run_id.clone(), self.options.seed);
        report.order = order.clone();

        info!(
            run_id = %run_id,
            tables = order.len(),
            seed = self.options.seed,
            null_probability = self.options.null_probability,
            "synthesis started"
        );

        for edge in unresolved_edges(schema, &order) {
            debug!(
                table = %edge.table,
                column = %edge.column,
                referenced = %edge.referenced_table,
                "reference not resolved by generation order"
            );
            report.record_warning(
                GenerationIssue::info(
                    "unresolved_reference",
                    format!(
                        "{}.{} references {} which is not generated earlier",
                        edge.table, edge.column, edge.referenced_table
                    ),
                )
                .at(&edge.table, Some(edge.column.as_str())),
            );
        }

        for table in row_counts.keys().filter(|table| !schema.contains(table)) {
            warn!(table = %table, "row count given for unknown table; skipped");
            report.record_skipped(table, format!("table '{table}' not found in schema"));
        }

        let mut registry = IdentityRegistry::new(
            self.options.fallback_key_range.clone(),
            self.options.unique_attempts,
        );
        let mut dataset = SyntheticDataset::new();

        for table_name in &order {
            let table = match schema.table(table_name) {
                Ok(table) => table,
                Err(err) => {
                    warn!(table = %table_name, error = %err, "table lookup failed; skipped");
                    report.record_skipped(table_name, err.to_string());
                    continue;
                }
            };
            if !table.has_primary_key() {
                warn!(table = %table_name, "table has no primary key; skipped");
                report.record_skipped(
                    table_name,
                    format!("table '{table_name}' has no primary key"),
                );
                continue;
            }

            let rows = row_counts
                .get(table_name)
                .copied()
                .unwrap_or(self.options.default_rows);
            let table_start = Instant::now();
            info!(table = %table_name, rows, "synthesizing table");

            let plan = plan_columns(table);
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let mut synthesizer = TableSynthesizer {
                    table,
                    plan: &plan,
                    options: &self.options,
                    registry: &mut registry,
                    report: &mut report,
                    rng: SynthRng::seed_from_u64(hash_seed(self.options.seed, table_name)),
                    used_tuples: HashSet::new(),
                    used_values: HashMap::new(),
                    retries: 0,
                };
                let generated: Vec<Row> = (0..rows).map(|_| synthesizer.next_row()).collect();
                (generated, synthesizer.retries)
            }));

            match outcome {
                Ok((generated, retries)) => {
                    let rows_generated = generated.len() as u64;
                    dataset.insert_table(table_name.clone(), generated);
                    report.push_table(TableReport {
                        table: table_name.clone(),
                        rows_requested: rows,
                        rows_generated,
                        retries,
                    });
                    info!(
                        table = %table_name,
                        rows_generated,
                        retries,
                        duration_ms = table_start.elapsed().as_millis() as u64,
                        "table synthesized"
                    );
                }
                Err(panic) => {
                    let message = panic_message(panic);
                    registry.forget(table_name);
                    warn!(table = %table_name, error = %message, "table synthesis failed; skipped");
                    report.record_skipped(table_name, format!("synthesis failed: {message}"));
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            tables = report.tables.len(),
            skipped = report.skipped_tables.len(),
            records = report.total_records,
            duration_ms = report.duration_ms,
            "synthesis completed"
        );

        Ok(SynthesisResult { dataset, report })
    }
}

#[derive(Debug, Clone, Copy)]
enum ColumnRole<'a> {
    /// Non-foreign primary-key column: next sequential key.
    SequentialKey,
    /// Primary-key column of a table whose key is made only of foreign keys.
    SampledKey { referenced: &'a str },
    ForeignKey { referenced: &'a str, unique: bool },
    Value { unique: bool },
}

#[derive(Debug)]
struct ColumnPlan<'a> {
    column: &'a ColumnSpec,
    /// Lower-cased name used by keyword rules.
    name: String,
    role: ColumnRole<'a>,
}

fn plan_columns(table: &TableSpec) -> Vec<ColumnPlan<'_>> {
    let sampled_key = table.is_foreign_key_only();

    table
        .columns
        .iter()
        .map(|column| {
            let name = column.name.to_lowercase();
            let referenced = table.referenced_table(&column.name);
            let role = match (table.is_primary_key(&column.name), referenced) {
                (true, Some(referenced)) if sampled_key => ColumnRole::SampledKey { referenced },
                // The sequential part of a mixed key keeps rows unique.
                (true, Some(referenced)) => ColumnRole::ForeignKey {
                    referenced,
                    unique: false,
                },
                (true, None) => ColumnRole::SequentialKey,
                (false, Some(referenced)) => ColumnRole::ForeignKey {
                    referenced,
                    unique: expects_unique_reference(&name),
                },
                (false, None) => ColumnRole::Value {
                    unique: is_uniqueness_sensitive(&name),
                },
            };
            ColumnPlan { column, name, role }
        })
        .collect()
}

/// Manager-style references are expected to be one-to-one.
fn expects_unique_reference(name: &str) -> bool {
    name.contains("manager") || name.ends_with("_unique") || name.ends_with("owner_id")
}

fn is_uniqueness_sensitive(name: &str) -> bool {
    name.contains("email") || name.contains("username")
}

struct TableSynthesizer<'a> {
    table: &'a TableSpec,
    plan: &'a [ColumnPlan<'a>],
    options: &'a GenerateOptions,
    registry: &'a mut IdentityRegistry,
    report: &'a mut GenerationReport,
    rng: SynthRng,
    used_tuples: HashSet<Vec<String>>,
    /// Canonical values already emitted, per column index, for columns that
    /// try to stay unique.
    used_values: HashMap<usize, HashSet<String>>,
    retries: u64,
}

impl<'a> TableSynthesizer<'a> {
    fn next_row(&mut self) -> Row {
        let plan = self.plan;
        let mut values = vec![Value::Null; plan.len()];

        // Keys first, so the row's own key is visible to self references.
        let sampled: Vec<usize> = plan
            .iter()
            .enumerate()
            .filter(|(_, column)| matches!(column.role, ColumnRole::SampledKey { .. }))
            .map(|(idx, _)| idx)
            .collect();
        if !sampled.is_empty() {
            let tuple = self.sample_key_tuple(&sampled);
            if let [single] = tuple.as_slice() {
                self.registry.record(&self.table.name, single.clone());
            }
            for (idx, value) in sampled.into_iter().zip(tuple) {
                values[idx] = value;
            }
        }
        for (idx, column) in plan.iter().enumerate() {
            if matches!(column.role, ColumnRole::SequentialKey) {
                let key = self.registry.reserve(&self.table.name, &column.column.name);
                values[idx] = Value::Int(key);
            }
        }

        for (idx, column) in plan.iter().enumerate() {
            match column.role {
                ColumnRole::SequentialKey | ColumnRole::SampledKey { .. } => {}
                ColumnRole::ForeignKey { referenced, unique } => {
                    values[idx] = self.foreign_value(idx, column, referenced, unique);
                }
                ColumnRole::Value { unique } => {
                    values[idx] = self.column_value(idx, column, unique);
                }
            }
        }

        let mut row = Row::with_capacity(plan.len());
        for (column, value) in plan.iter().zip(values) {
            row.insert(column.column.name.clone(), value);
        }
        row
    }

    /// Sample every key component; resample the whole tuple on collision.
    fn sample_key_tuple(&mut self, indices: &[usize]) -> Vec<Value> {
        let plan = self.plan;
        let attempts = self.options.composite_key_attempts;
        let mut tuple = Vec::new();

        for attempt in 0..attempts {
            tuple = indices
                .iter()
                .map(|&idx| match plan[idx].role {
                    ColumnRole::SampledKey { referenced } => {
                        let pick = self.registry.sample(referenced, &mut self.rng);
                        if pick.source == PickSource::Fallback {
                            self.note_fallback(&plan[idx].column.name, referenced);
                        }
                        pick.value
                    }
                    _ => Value::Null,
                })
                .collect();
            let key: Vec<String> = tuple.iter().map(Value::canonical_key).collect();
            if self.used_tuples.insert(key) {
                self.retries += u64::from(attempt);
                return tuple;
            }
        }

        self.retries += u64::from(attempts);
        self.report.record_warning(
            GenerationIssue::warning(
                "retry_exhausted",
                format!("duplicate primary key accepted after {attempts} attempts"),
            )
            .at(&self.table.name, None),
        );
        warn!(table = %self.table.name, attempts, "composite key retries exhausted");
        tuple
    }

    fn foreign_value(
        &mut self,
        idx: usize,
        column: &ColumnPlan<'_>,
        referenced: &str,
        unique: bool,
    ) -> Value {
        let pick = if unique {
            let used = self.used_values.entry(idx).or_default();
            let pick = self.registry.sample_unique(referenced, used, &mut self.rng);
            used.insert(pick.value.canonical_key());
            pick
        } else {
            self.registry.sample(referenced, &mut self.rng)
        };

        match pick.source {
            PickSource::Reserved => {}
            PickSource::Fallback => self.note_fallback(&column.column.name, referenced),
            PickSource::Exhausted => {
                self.retries += u64::from(self.options.unique_attempts);
                self.note_exhausted(&column.column.name);
            }
        }
        pick.value
    }

    fn column_value(&mut self, idx: usize, column: &ColumnPlan<'_>, unique: bool) -> Value {
        if column.column.nullable && self.rng.random_bool(self.options.null_probability) {
            return Value::Null;
        }

        let ctx = ColumnContext::new(
            self.table,
            column.column,
            &column.name,
            self.options.base_date,
        );
        let mut attempts = 0;
        loop {
            let out = synthesize_value(&ctx, &mut self.rng);
            attempts += 1;

            let accepted = !unique
                || out.value.is_null()
                || self
                    .used_values
                    .entry(idx)
                    .or_default()
                    .insert(out.value.canonical_key());
            let exhausted = !accepted && attempts >= self.options.unique_attempts;
            if accepted || exhausted {
                self.report.record_rule_usage(out.rule);
                if out.degraded {
                    self.report.record_degraded();
                    self.report.record_warning(
                        GenerationIssue::warning(
                            "generation_degraded",
                            format!("generic value used for type {:?}", column.column.kind),
                        )
                        .at(&self.table.name, Some(column.column.name.as_str())),
                    );
                }
                if exhausted {
                    self.note_exhausted(&column.column.name);
                }
                self.retries += u64::from(attempts - 1);
                return out.value;
            }
        }
    }

    fn note_fallback(&mut self, column: &str, referenced: &str) {
        self.report.record_fallback_key();
        self.report.record_warning(
            GenerationIssue::info(
                "fallback_key",
                format!("no keys generated yet for '{referenced}'; used fallback range"),
            )
            .at(&self.table.name, Some(column)),
        );
    }

    fn note_exhausted(&mut self, column: &str) {
        self.report.record_warning(
            GenerationIssue::warning(
                "retry_exhausted",
                format!(
                    "duplicate value accepted after {} attempts",
                    self.options.unique_attempts
                ),
            )
            .at(&self.table.name, Some(column)),
        );
        debug!(table = %self.table.name, column = %column, "uniqueness retries exhausted");
    }
}

/// Stable per-table seed derived from the run seed.
fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during synthesis".to_string()
    }
}
