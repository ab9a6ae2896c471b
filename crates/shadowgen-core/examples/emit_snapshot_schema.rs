use schemars::schema_for;
use shadowgen_core::{SchemaGraph, SyntheticDataset};

fn main() {
    let which = std::env::args().nth(1).unwrap_or_else(|| "snapshot".to_string());
    let schema = match which.as_str() {
        "schema" => schema_for!(SchemaGraph),
        _ => schema_for!(SyntheticDataset),
    };
    let json = serde_json::to_string_pretty(&schema).expect("serialize json schema");
    println!("{json}");
}
