use std::env;
use std::fs;
use std::path::PathBuf;

use shadowgen_core::{SchemaGraph, SourceProfile, SourceStats};
use shadowgen_eval::{EvaluateOptions, ValidationEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut schema_path: Option<PathBuf> = None;
    let mut snapshot_path: Option<PathBuf> = None;
    let mut profile_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--schema" => schema_path = args.next().map(PathBuf::from),
            "--snapshot" => snapshot_path = args.next().map(PathBuf::from),
            "--profile" => profile_path = args.next().map(PathBuf::from),
            _ => return Err(format!("unexpected argument '{arg}'").into()),
        }
    }

    let schema_path = schema_path.ok_or("missing --schema path")?;
    let snapshot_path = snapshot_path.ok_or("missing --snapshot path")?;
    let schema: SchemaGraph = serde_json::from_str(&fs::read_to_string(schema_path)?)?;
    let profile: Option<SourceProfile> = match profile_path {
        Some(path) => Some(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => None,
    };

    let engine = ValidationEngine::new(EvaluateOptions::default());
    let result = engine.run(
        &schema,
        &snapshot_path,
        profile.as_ref().map(|profile| profile as &dyn SourceStats),
    )?;
    println!("{}", result.rendered);
    if !result.report.passed() {
        std::process::exit(1);
    }
    Ok(())
}
