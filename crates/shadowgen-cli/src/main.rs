mod commands;
mod config;
mod registry;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use shadowgen_core::Error as CoreError;
use shadowgen_eval::EvalError;
use shadowgen_generate::GenerationError;
use thiserror::Error;

use config::parse_row_count;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("validation error: {0}")]
    Eval(#[from] EvalError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
}

#[derive(Parser, Debug)]
#[command(name = "shadowgen", version, about = "Schema-driven synthetic data generator")]
struct Cli {
    /// Config file (defaults to ./shadowgen.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output directory for runs.
    #[arg(long, global = true, default_value = "runs")]
    run_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read the source schema into schema.json.
    Introspect(IntrospectArgs),
    /// Collect source row and null counts into profile.json.
    Profile(ProfileArgs),
    /// Synthesize a dataset snapshot.
    Generate(GenerateArgs),
    /// Validate a snapshot; exits non-zero when integrity or privacy fails.
    Validate(ValidateArgs),
    /// Replay a snapshot into a destination database.
    Load(LoadArgs),
}

#[derive(Args, Debug)]
struct IntrospectArgs {
    /// Source connection string.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: String,
    /// Database namespace to read.
    #[arg(long, default_value = "public")]
    namespace: String,
    /// Restrict to these tables.
    #[arg(long = "table", value_name = "TABLE")]
    tables: Vec<String>,
    /// Optional copy of schema.json.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Fail when the foreign key graph has cycles.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: String,
    /// schema.json produced by `introspect`.
    #[arg(long)]
    schema: PathBuf,
    #[arg(long, default_value = "public")]
    namespace: String,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// schema.json produced by `introspect`.
    #[arg(long, required_unless_present = "conn")]
    schema: Option<PathBuf>,
    /// Introspect and profile the source directly instead of reading files.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: Option<String>,
    #[arg(long, default_value = "public")]
    namespace: String,
    /// profile.json used for row counts.
    #[arg(long, conflicts_with = "conn")]
    profile: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    null_probability: Option<f64>,
    /// Multiplier applied to source row counts.
    #[arg(long)]
    row_scale: Option<f64>,
    /// Rows per table when no count is known.
    #[arg(long)]
    default_rows: Option<u64>,
    /// Explicit row count, repeatable.
    #[arg(long = "rows", value_name = "TABLE=ROWS", value_parser = parse_row_count)]
    rows: Vec<(String, u64)>,
    /// Optional copy of the snapshot.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[arg(long)]
    schema: PathBuf,
    /// Snapshot produced by `generate`.
    #[arg(long)]
    snapshot: PathBuf,
    /// profile.json with source aggregates.
    #[arg(long, conflicts_with = "conn")]
    profile: Option<PathBuf>,
    /// Profile the live source, including value samples for the privacy check.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: Option<String>,
    #[arg(long, default_value = "public")]
    namespace: String,
    /// Optional copy of the rendered report.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Destination connection string.
    #[arg(long, value_name = "CONNECTION_STRING")]
    dest: String,
    #[arg(long)]
    schema: PathBuf,
    #[arg(long)]
    snapshot: PathBuf,
    #[arg(long, default_value = "public")]
    namespace: String,
    #[arg(long, default_value_t = 500)]
    batch_size: usize,
    /// Keep existing enum types instead of dropping them first.
    #[arg(long, default_value_t = false)]
    keep_enum_types: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    let common = commands::Common {
        config: cli.config,
        run_dir: cli.run_dir,
    };

    match cli.command {
        Command::Introspect(args) => commands::introspect(&common, args).await,
        Command::Profile(args) => commands::profile(&common, args).await,
        Command::Generate(args) => commands::generate(&common, args).await,
        Command::Validate(args) => commands::validate(&common, args).await,
        Command::Load(args) => commands::load(&common, args).await,
    }
}
