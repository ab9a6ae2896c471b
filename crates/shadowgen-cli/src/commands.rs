use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use shadowgen_core::{
    RedactedConnection, SchemaGraph, SourceProfile, SourceStats, build_fk_graph_report,
    dangling_references, redact_connection_string, validate_schema, write_snapshot,
};
use shadowgen_eval::ValidationEngine;
use shadowgen_generate::{SynthesisEngine, plan_row_counts};
use shadowgen_introspect::{
    Adapter, IntrospectOptions, LoadOptions, PostgresAdapter, ProfileOptions,
};

use crate::config::{GenerateOverrides, ShadowgenConfig, load_config};
use crate::registry::{RunContext, RunPaths, init_run_logging, start_run, write_json, write_text};
use crate::{
    CliError, GenerateArgs, IntrospectArgs, LoadArgs, ProfileArgs, ValidateArgs,
};

/// Flags shared by every subcommand.
pub struct Common {
    pub config: Option<PathBuf>,
    pub run_dir: PathBuf,
}

pub async fn introspect(common: &Common, args: IntrospectArgs) -> Result<ExitCode, CliError> {
    let connection = check_engine(&args.conn)?;
    let settings = serde_json::json!({
        "namespace": args.namespace,
        "tables": args.tables,
        "strict": args.strict,
    });
    let paths = begin(common, "introspect", settings, Some(connection))?;

    let adapter = PostgresAdapter::new(connect(&args.conn).await?);
    let opts = IntrospectOptions {
        schema: args.namespace.clone(),
        tables: (!args.tables.is_empty()).then(|| args.tables.clone()),
    };
    let schema = adapter.introspect(&opts).await?;
    for warning in dangling_references(&schema) {
        warn!(warning = %warning, "schema reference outside the introspected tables");
    }

    let graph = build_fk_graph_report(&schema);
    let schema_path = write_json(&paths, "schema.json", &schema, args.out.as_deref())?;
    write_json(&paths, "fk_graph.json", &graph, None)?;
    info!(
        engine = adapter.engine(),
        tables = schema.len(),
        edges = graph.summary.edges,
        path = %schema_path.display(),
        "schema written"
    );

    if let Some(cycle) = &graph.cycle {
        if args.strict {
            return Err(CliError::InvalidConfig(format!(
                "foreign key cycle detected: {}",
                cycle.join(" -> ")
            )));
        }
        warn!(cycle = %cycle.join(" -> "), "foreign key cycle detected");
    }

    println!("{}", schema_path.display());
    Ok(ExitCode::SUCCESS)
}

pub async fn profile(common: &Common, args: ProfileArgs) -> Result<ExitCode, CliError> {
    let connection = check_engine(&args.conn)?;
    let config = load_config(common.config.as_deref())?;
    let settings = serde_json::json!({
        "namespace": args.namespace,
        "schema": args.schema,
        "null_columns_per_table": config.evaluate.null_columns_per_table,
    });
    let paths = begin(common, "profile", settings, Some(connection))?;

    let schema = read_schema(&args.schema)?;
    let adapter = PostgresAdapter::new(connect(&args.conn).await?);
    let opts = ProfileOptions {
        schema: args.namespace.clone(),
        null_columns_per_table: config.evaluate.null_columns_per_table,
        sample_limit: config.evaluate.privacy_sample_limit,
    };
    let profile = adapter.profile(&schema, &opts).await?;

    let path = write_json(&paths, "profile.json", &profile, args.out.as_deref())?;
    info!(tables = profile.row_counts.len(), path = %path.display(), "profile written");
    println!("{}", path.display());
    Ok(ExitCode::SUCCESS)
}

pub async fn generate(common: &Common, args: GenerateArgs) -> Result<ExitCode, CliError> {
    let connection = args.conn.as_deref().map(check_engine).transpose()?;
    let mut config = load_config(common.config.as_deref())?;
    config.apply(&GenerateOverrides {
        seed: args.seed,
        null_probability: args.null_probability,
        row_scale: args.row_scale,
        default_rows: args.default_rows,
        rows: args.rows.clone(),
    });
    config.generate.validate()?;
    let paths = begin(common, "generate", settings_of(&config)?, connection)?;

    let (schema, profile) = match &args.conn {
        Some(conn) => {
            let adapter = PostgresAdapter::new(connect(conn).await?);
            let schema = adapter
                .introspect(&IntrospectOptions {
                    schema: args.namespace.clone(),
                    tables: None,
                })
                .await?;
            let profile = adapter
                .profile(
                    &schema,
                    &ProfileOptions {
                        schema: args.namespace.clone(),
                        null_columns_per_table: 0,
                        sample_limit: 0,
                    },
                )
                .await?;
            write_json(&paths, "schema.json", &schema, None)?;
            (schema, Some(profile))
        }
        None => {
            let schema_path = args.schema.as_deref().ok_or_else(|| {
                CliError::InvalidConfig("either --schema or --conn is required".to_string())
            })?;
            let profile = args.profile.as_deref().map(read_profile).transpose()?;
            (read_schema(schema_path)?, profile)
        }
    };

    validate_schema(&schema)?;
    for warning in dangling_references(&schema) {
        warn!(warning = %warning, "schema references a table that is not modeled");
    }
    if let Some(cycle) = build_fk_graph_report(&schema).cycle {
        warn!(cycle = %cycle.join(" -> "), "cyclic schema; some references may use fallback keys");
    }

    let source = profile.as_ref().map(|profile| profile as &dyn SourceStats);
    let mut row_counts = plan_row_counts(&schema, source, &config.rows, &config.generate);
    for (table, rows) in &config.rows {
        // Unknown tables reach the engine so the report records them as skipped.
        row_counts.entry(table.clone()).or_insert(*rows);
    }

    let engine = SynthesisEngine::new(config.generate.clone());
    let result = engine.synthesize(&schema, &row_counts)?;

    let snapshot_path = paths.artifact("synthetic_data.json");
    write_snapshot(&snapshot_path, &result.dataset)?;
    if let Some(out) = args.out.as_deref() {
        write_snapshot(out, &result.dataset)?;
    }
    write_json(&paths, "generation_report.json", &result.report, None)?;

    info!(
        tables = result.report.tables.len(),
        records = result.report.total_records,
        skipped = result.report.skipped_tables.len(),
        path = %snapshot_path.display(),
        "snapshot written"
    );
    println!("{}", args.out.as_deref().unwrap_or(snapshot_path.as_path()).display());
    Ok(ExitCode::SUCCESS)
}

pub async fn validate(common: &Common, args: ValidateArgs) -> Result<ExitCode, CliError> {
    let connection = args.conn.as_deref().map(check_engine).transpose()?;
    let config = load_config(common.config.as_deref())?;
    let settings = serde_json::json!({
        "schema": args.schema,
        "snapshot": args.snapshot,
        "profile": args.profile,
        "evaluate": config.evaluate,
    });
    let paths = begin(common, "validate", settings, connection)?;

    let schema = read_schema(&args.schema)?;
    let profile = match (&args.conn, args.profile.as_deref()) {
        (Some(conn), _) => {
            let adapter = PostgresAdapter::new(connect(conn).await?);
            let opts = ProfileOptions {
                schema: args.namespace.clone(),
                null_columns_per_table: config.evaluate.null_columns_per_table,
                sample_limit: config.evaluate.privacy_sample_limit,
            };
            Some(adapter.profile(&schema, &opts).await?)
        }
        (None, Some(path)) => Some(read_profile(path)?),
        (None, None) => None,
    };

    let engine = ValidationEngine::new(config.evaluate.clone());
    let source = profile.as_ref().map(|profile| profile as &dyn SourceStats);
    let result = engine.run(&schema, &args.snapshot, source)?;

    write_json(&paths, "validation.json", &result.report, None)?;
    write_text(&paths, "report.md", &result.rendered, args.out.as_deref())?;
    println!("{}", result.rendered);

    if result.report.passed() {
        info!(run_id = %result.report.run_id, "validation passed");
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(
            run_id = %result.report.run_id,
            failures = result.report.failures.len(),
            "validation failed"
        );
        Ok(ExitCode::FAILURE)
    }
}

pub async fn load(common: &Common, args: LoadArgs) -> Result<ExitCode, CliError> {
    let connection = check_engine(&args.dest)?;
    let settings = serde_json::json!({
        "namespace": args.namespace,
        "schema": args.schema,
        "snapshot": args.snapshot,
        "batch_size": args.batch_size,
        "drop_enum_types": !args.keep_enum_types,
    });
    let paths = begin(common, "load", settings, Some(connection))?;

    let schema = read_schema(&args.schema)?;
    let dataset = shadowgen_core::read_snapshot(&args.snapshot)?;
    let adapter = PostgresAdapter::new(connect(&args.dest).await?);
    let opts = LoadOptions {
        schema: args.namespace.clone(),
        batch_size: args.batch_size,
        drop_enum_types: !args.keep_enum_types,
    };
    let report = adapter.load(&schema, &dataset, &opts).await?;
    write_json(&paths, "load_report.json", &report, None)?;

    println!(
        "loaded {} rows into {} tables ({} failed, {} skipped)",
        report.total_rows(),
        report.loaded.len(),
        report.failed.len(),
        report.skipped.len()
    );
    if report.failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Create the run directory, then route logs into it.
fn begin(
    common: &Common,
    command: &str,
    settings: serde_json::Value,
    connection: Option<RedactedConnection>,
) -> Result<RunPaths, CliError> {
    let ctx = RunContext {
        run_id: uuid::Uuid::new_v4().to_string(),
        started_at: Utc::now(),
        command: command.to_string(),
        run_dir: common.run_dir.clone(),
        settings,
        connection,
    };
    let paths = start_run(&ctx)?;
    init_run_logging(&paths.logs_path)?;
    info!(
        run_id = %ctx.run_id,
        command,
        connection = ctx.connection.as_ref().map(|conn| conn.redacted.as_str()),
        run_dir = %paths.root.display(),
        "run started"
    );
    Ok(paths)
}

fn check_engine(conn: &str) -> Result<RedactedConnection, CliError> {
    let redacted = redact_connection_string(conn);
    match redacted.engine.as_deref() {
        Some("postgres") | Some("postgresql") => Ok(redacted),
        Some(other) => Err(CliError::UnsupportedEngine(other.to_string())),
        None => Err(CliError::UnsupportedEngine(redacted.redacted)),
    }
}

async fn connect(conn: &str) -> Result<PgPool, CliError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(conn)
        .await?;
    Ok(pool)
}

fn read_schema(path: &Path) -> Result<SchemaGraph, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn read_profile(path: &Path) -> Result<SourceProfile, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn settings_of(config: &ShadowgenConfig) -> Result<serde_json::Value, CliError> {
    Ok(serde_json::to_value(Settings {
        generate: &config.generate,
        rows: &config.rows,
    })?)
}

#[derive(Serialize)]
struct Settings<'a> {
    generate: &'a shadowgen_generate::GenerateOptions,
    rows: &'a std::collections::BTreeMap<String, u64>,
}
